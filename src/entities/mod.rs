// Blog entities - rows owned by the relational store

pub mod ent_comment;
pub mod ent_follow;
pub mod ent_group;
pub mod ent_post;
pub mod ent_user;

pub use ent_comment::{CommentRecord, EntComment, NewComment};
pub use ent_follow::EntFollow;
pub use ent_group::{EntGroup, NewGroup};
pub use ent_post::{EntPost, NewPost, PostChanges, PostRecord};
pub use ent_user::EntUser;

use crate::error::AppError;

pub type UserId = i64;
pub type GroupId = i64;
pub type PostId = i64;
pub type CommentId = i64;

/// Entity trait that all stored rows implement
pub trait Entity: Clone + Send + Sync {
    fn entity_type() -> &'static str;

    /// Not-found error naming this entity and the identifier looked up.
    fn not_found(key: impl std::fmt::Display) -> AppError {
        AppError::NotFound(format!("{} {} not found", Self::entity_type(), key))
    }
}

/// First `limit` characters of `text`, used for short labels.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

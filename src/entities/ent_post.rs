// EntPost - authored text with optional group and image

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{truncate_chars, Entity, GroupId, PostId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EntPost {
    pub id: PostId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: UserId,
    pub group_id: Option<GroupId>,
    /// Media-relative path such as `posts/small.gif`.
    pub image: Option<String>,
}

impl Entity for EntPost {
    fn entity_type() -> &'static str {
        "post"
    }
}

impl std::fmt::Display for EntPost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&truncate_chars(&self.text, 15))
    }
}

/// Post joined with its author and group, as listed in feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostRecord {
    pub id: PostId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: UserId,
    pub author_username: String,
    pub group_id: Option<GroupId>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author_id: UserId,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

/// Editable fields of an existing post. `pub_date` and `author_id` never change.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

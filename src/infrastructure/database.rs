// Database Interface - relational persistence port for the blog
// Handlers only see this trait; the SQLite adapter lives in sqlite_database.rs

use async_trait::async_trait;

use crate::entities::{
    CommentRecord, EntComment, EntFollow, EntGroup, EntPost, EntUser, GroupId, NewComment,
    NewGroup, NewPost, PostChanges, PostId, PostRecord, UserId,
};
use crate::error::AppResult;

/// Which posts a feed covers. Every feed is ordered newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(GroupId),
    Author(UserId),
    /// Posts by any of the given authors; an empty set matches nothing.
    Authors(Vec<UserId>),
}

/// Database interface trait for blog storage
#[async_trait]
pub trait DatabaseInterface: Send + Sync {
    // Users
    async fn create_user(&self, username: &str) -> AppResult<EntUser>;
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<EntUser>>;
    /// Removes the user together with their posts, comments and follow edges.
    async fn delete_user(&self, id: UserId) -> AppResult<bool>;

    // Groups
    async fn create_group(&self, group: NewGroup) -> AppResult<EntGroup>;
    async fn get_group_by_slug(&self, slug: &str) -> AppResult<Option<EntGroup>>;
    /// All groups ordered by title.
    async fn list_groups(&self) -> AppResult<Vec<EntGroup>>;
    /// Removes the group; its posts survive without a group.
    async fn delete_group(&self, id: GroupId) -> AppResult<bool>;

    // Posts
    async fn create_post(&self, post: NewPost) -> AppResult<EntPost>;
    async fn get_post(&self, id: PostId) -> AppResult<Option<PostRecord>>;
    async fn update_post(&self, id: PostId, changes: PostChanges) -> AppResult<()>;
    async fn delete_post(&self, id: PostId) -> AppResult<bool>;
    async fn count_posts(&self, filter: &PostFilter) -> AppResult<u64>;
    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<PostRecord>>;

    // Comments
    async fn create_comment(&self, comment: NewComment) -> AppResult<EntComment>;
    /// Comments on a post, newest first.
    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentRecord>>;
    async fn count_comments(&self, post_id: PostId) -> AppResult<u64>;

    // Follow edges
    /// Get-or-create of the edge. Returns the edge only when it was newly stored.
    async fn follow(&self, user_id: UserId, author_id: UserId) -> AppResult<Option<EntFollow>>;
    /// Deletes the matching edge if any. Returns the number of edges removed.
    async fn unfollow(&self, user_id: UserId, author_id: UserId) -> AppResult<u64>;
    async fn is_following(&self, user_id: UserId, author_id: UserId) -> AppResult<bool>;
    async fn count_follows(&self, user_id: UserId, author_id: UserId) -> AppResult<u64>;
    /// Distinct authors the user follows.
    async fn followed_author_ids(&self, user_id: UserId) -> AppResult<Vec<UserId>>;
}

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    QueryBuilder,
};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::entities::{
    CommentRecord, EntComment, EntFollow, EntGroup, EntPost, EntUser, Entity, GroupId, NewComment,
    NewGroup, NewPost, PostChanges, PostId, PostRecord, UserId,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DatabaseInterface, PostFilter};

const POST_RECORD_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author_username,
           p.group_id, g.slug AS group_slug, g.title AS group_title, p.image
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN blog_groups g ON g.id = p.group_id
"#;

/// SQLite implementation of the blog database interface
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connects to `url`, creating the database file and schema when missing.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let in_memory = url.contains(":memory:");
        if !in_memory {
            if let Some(parent) = sqlite_file_path(url).and_then(|p| p.parent().map(PathBuf::from)) {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(&parent).await?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid database URL {}: {}", url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every pooled connection to :memory: is a separate database, so pin one.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;

        let db = Self { pool };
        db.initialize().await?;
        info!("SQLite database ready at {}", url);
        Ok(db)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Initialize blog tables for SQLite
    pub async fn initialize(&self) -> AppResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                date_joined TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS blog_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                pub_date TEXT NOT NULL,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                group_id INTEGER REFERENCES blog_groups(id) ON DELETE SET NULL,
                image TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                created TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_posts_pub_date ON posts(pub_date DESC)",
            "CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id)",
            "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",
            "CREATE INDEX IF NOT EXISTS idx_comments_created ON comments(post_id, created DESC)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_follows_edge ON follows(user_id, author_id)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to initialize schema: {}", e)))?;
        }
        Ok(())
    }
}

/// Filesystem path of a file-backed SQLite URL.
fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next()?;
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

fn push_post_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            qb.push(" WHERE p.group_id = ");
            qb.push_bind(*group_id);
        }
        PostFilter::Author(author_id) => {
            qb.push(" WHERE p.author_id = ");
            qb.push_bind(*author_id);
        }
        PostFilter::Authors(author_ids) if author_ids.is_empty() => {
            qb.push(" WHERE 0");
        }
        PostFilter::Authors(author_ids) => {
            qb.push(" WHERE p.author_id IN (");
            let mut separated = qb.separated(", ");
            for author_id in author_ids {
                separated.push_bind(*author_id);
            }
            separated.push_unseparated(")");
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl DatabaseInterface for SqliteDatabase {
    #[instrument(skip(self))]
    async fn create_user(&self, username: &str) -> AppResult<EntUser> {
        let date_joined = Utc::now();
        let result = sqlx::query("INSERT INTO users (username, date_joined) VALUES (?, ?)")
            .bind(username)
            .bind(date_joined)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Validation(format!("User {} already exists", username))
                } else {
                    AppError::DatabaseError(format!("Failed to create user {}: {}", username, e))
                }
            })?;

        Ok(EntUser {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            date_joined,
        })
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<EntUser>> {
        let user = sqlx::query_as::<_, EntUser>(
            "SELECT id, username, date_joined FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", username, e)))?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete user {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, group), fields(slug = %group.slug))]
    async fn create_group(&self, group: NewGroup) -> AppResult<EntGroup> {
        let result = sqlx::query("INSERT INTO blog_groups (title, slug, description) VALUES (?, ?, ?)")
            .bind(&group.title)
            .bind(&group.slug)
            .bind(&group.description)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Validation(format!("Group with slug {} already exists", group.slug))
                } else {
                    AppError::DatabaseError(format!("Failed to create group {}: {}", group.slug, e))
                }
            })?;

        Ok(EntGroup {
            id: result.last_insert_rowid(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        })
    }

    async fn get_group_by_slug(&self, slug: &str) -> AppResult<Option<EntGroup>> {
        let group = sqlx::query_as::<_, EntGroup>(
            "SELECT id, title, slug, description FROM blog_groups WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get group {}: {}", slug, e)))?;
        Ok(group)
    }

    async fn list_groups(&self) -> AppResult<Vec<EntGroup>> {
        let groups = sqlx::query_as::<_, EntGroup>(
            "SELECT id, title, slug, description FROM blog_groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list groups: {}", e)))?;
        Ok(groups)
    }

    #[instrument(skip(self))]
    async fn delete_group(&self, id: GroupId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM blog_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete group {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, post), fields(author_id = post.author_id))]
    async fn create_post(&self, post: NewPost) -> AppResult<EntPost> {
        let pub_date = Utc::now();
        let result = sqlx::query(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.text)
        .bind(pub_date)
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create post: {}", e)))?;

        let id = result.last_insert_rowid();
        debug!("Created post {}", id);
        Ok(EntPost {
            id,
            text: post.text,
            pub_date,
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        })
    }

    async fn get_post(&self, id: PostId) -> AppResult<Option<PostRecord>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_RECORD_SELECT);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let post = qb
            .build_query_as::<PostRecord>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get post {}: {}", id, e)))?;
        Ok(post)
    }

    #[instrument(skip(self, changes))]
    async fn update_post(&self, id: PostId, changes: PostChanges) -> AppResult<()> {
        let result = sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
            .bind(&changes.text)
            .bind(changes.group_id)
            .bind(&changes.image)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update post {}: {}", id, e)))?;

        if result.rows_affected() == 0 {
            return Err(EntPost::not_found(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: PostId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete post {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_posts(&self, filter: &PostFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
        push_post_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count posts: {}", e)))?;
        Ok(count as u64)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<PostRecord>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_RECORD_SELECT);
        push_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let posts = qb
            .build_query_as::<PostRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list posts: {}", e)))?;
        Ok(posts)
    }

    #[instrument(skip(self, comment), fields(post_id = comment.post_id))]
    async fn create_comment(&self, comment: NewComment) -> AppResult<EntComment> {
        let created = Utc::now();
        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_id, text, created) VALUES (?, ?, ?, ?)",
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .bind(created)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create comment: {}", e)))?;

        Ok(EntComment {
            id: result.last_insert_rowid(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created,
        })
    }

    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentRecord>> {
        let comments = sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username AS author_username, c.text, c.created
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ?
            ORDER BY c.created DESC, c.id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list comments of post {}: {}", post_id, e))
        })?;
        Ok(comments)
    }

    async fn count_comments(&self, post_id: PostId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to count comments of post {}: {}", post_id, e))
            })?;
        Ok(count as u64)
    }

    #[instrument(skip(self))]
    async fn follow(&self, user_id: UserId, author_id: UserId) -> AppResult<Option<EntFollow>> {
        let edge = sqlx::query_as::<_, EntFollow>(
            "INSERT INTO follows (user_id, author_id) VALUES (?, ?) \
             ON CONFLICT(user_id, author_id) DO NOTHING \
             RETURNING id, user_id, author_id",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to follow {} -> {}: {}", user_id, author_id, e))
        })?;
        Ok(edge)
    }

    #[instrument(skip(self))]
    async fn unfollow(&self, user_id: UserId, author_id: UserId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to unfollow {} -> {}: {}",
                    user_id, author_id, e
                ))
            })?;
        Ok(result.rows_affected())
    }

    async fn is_following(&self, user_id: UserId, author_id: UserId) -> AppResult<bool> {
        Ok(self.count_follows(user_id, author_id).await? > 0)
    }

    async fn count_follows(&self, user_id: UserId, author_id: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE user_id = ? AND author_id = ?",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to count follows: {}", e)))?;
        Ok(count as u64)
    }

    async fn followed_author_ids(&self, user_id: UserId) -> AppResult<Vec<UserId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT author_id FROM follows WHERE user_id = ? ORDER BY author_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list authors followed by {}: {}", user_id, e))
        })?;
        Ok(ids)
    }
}

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    entities::{EntGroup, EntUser, NewComment, NewPost},
    error::{AppError, AppResult},
    forms::{GroupForm, GroupFormData},
    infrastructure::database::DatabaseInterface,
};

const SAMPLE_USERS: [&str; 5] = ["leo", "anna", "mark", "olga", "ivan"];

const SAMPLE_GROUPS: [(&str, &str, &str); 3] = [
    ("Cats", "cats", "Everything about cats"),
    ("Travel", "travel", "Trip reports and photos"),
    ("Books", "books", "What we are reading"),
];

/// Counts of what a seeding run created.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub groups: usize,
    pub posts: usize,
    pub comments: usize,
    pub follows: usize,
}

/// Seeds users, groups, posts, comments and follow edges.
/// Users and groups that already exist are reused.
pub async fn seed_sample_data(db: &dyn DatabaseInterface, posts_per_user: usize) -> AppResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut users: Vec<EntUser> = Vec::with_capacity(SAMPLE_USERS.len());
    for username in SAMPLE_USERS {
        let user = match db.get_user_by_username(username).await? {
            Some(user) => user,
            None => {
                summary.users += 1;
                db.create_user(username).await?
            }
        };
        users.push(user);
    }

    let mut groups: Vec<EntGroup> = Vec::with_capacity(SAMPLE_GROUPS.len());
    for (title, slug, description) in SAMPLE_GROUPS {
        if let Some(group) = db.get_group_by_slug(slug).await? {
            groups.push(group);
            continue;
        }
        let form = GroupForm::bind(GroupFormData {
            title: Some(title.to_string()),
            slug: Some(slug.to_string()),
            description: Some(description.to_string()),
        });
        if !form.is_valid() {
            warn!("Skipping sample group {}: {:?}", slug, form.errors);
            continue;
        }
        let new_group = form
            .into_new_group()
            .ok_or_else(|| AppError::Validation(format!("Group {} did not clean", slug)))?;
        groups.push(db.create_group(new_group).await?);
        summary.groups += 1;
    }

    for (user_index, user) in users.iter().enumerate() {
        for n in 0..posts_per_user {
            // Every third post stays outside any group.
            let group_id = if (user_index + n) % 3 == 0 {
                None
            } else {
                groups.get(n % groups.len().max(1)).map(|group| group.id)
            };
            let post = db
                .create_post(NewPost {
                    text: format!("Post number {} from {}", n + 1, user.username),
                    author_id: user.id,
                    group_id,
                    image: None,
                })
                .await?;
            summary.posts += 1;

            let commenter = &users[(user_index + n + 1) % users.len()];
            if commenter.id != user.id {
                db.create_comment(NewComment {
                    post_id: post.id,
                    author_id: commenter.id,
                    text: format!("Nice one, {}!", user.username),
                })
                .await?;
                summary.comments += 1;
            }
        }
    }

    // Each user follows the next one round the ring.
    for (index, user) in users.iter().enumerate() {
        let author = &users[(index + 1) % users.len()];
        if author.id != user.id && db.follow(user.id, author.id).await?.is_some() {
            summary.follows += 1;
        }
    }

    info!(
        "Seeded {} users, {} groups, {} posts, {} comments, {} follows",
        summary.users, summary.groups, summary.posts, summary.comments, summary.follows
    );
    Ok(summary)
}

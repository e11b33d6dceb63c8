// EntFollow - directed edge from a follower to an author

use serde::{Deserialize, Serialize};

use super::{Entity, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EntFollow {
    pub id: i64,
    /// The follower.
    pub user_id: UserId,
    /// The followed author.
    pub author_id: UserId,
}

impl Entity for EntFollow {
    fn entity_type() -> &'static str {
        "follow"
    }
}

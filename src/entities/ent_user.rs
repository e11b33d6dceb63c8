// EntUser - external identity referenced by posts, comments and follows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EntUser {
    pub id: UserId,
    pub username: String,
    pub date_joined: DateTime<Utc>,
}

impl Entity for EntUser {
    fn entity_type() -> &'static str {
        "user"
    }
}

impl std::fmt::Display for EntUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

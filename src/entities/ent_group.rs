// EntGroup - named collection of posts addressed by slug

use serde::{Deserialize, Serialize};

use super::{Entity, GroupId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EntGroup {
    pub id: GroupId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Validated input for inserting a group.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
}

impl Entity for EntGroup {
    fn entity_type() -> &'static str {
        "group"
    }
}

impl std::fmt::Display for EntGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

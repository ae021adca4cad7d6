use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::extractors::Owned;

pub const CATEGORIES: [&str; 4] = ["career", "financial", "health", "learning"];

/// Goal row; `(user_id, year, category)` is unique.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Goal {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub year: i32,
    pub category: String,
    pub description: String,
    pub completed: Option<bool>,
    pub version: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Owned for Goal {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub year: i32,
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct GoalWrite {
    pub id: i64,
    pub observed_version: i32,
    pub description: String,
    pub completed: Option<bool>,
}

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::extractors::Owned;

/// Habit row. `version` starts at 1 and grows by exactly one per accepted
/// update.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Habit {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub name: String,
    pub impact: String,
    pub goal_id: Option<i64>,
    pub version: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Owned for Habit {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewHabit {
    pub name: String,
    pub impact: String,
    pub goal_id: Option<i64>,
}

/// Full replacement values plus the version the caller last observed.
#[derive(Debug, Clone)]
pub struct HabitWrite {
    pub id: i64,
    pub observed_version: i32,
    pub name: String,
    pub impact: String,
    pub goal_id: Option<i64>,
}

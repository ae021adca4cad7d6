use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// One day on which a habit was done. `(habit_id, completed_date)` is unique.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HabitCompletion {
    pub id: i64,
    pub habit_id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    #[serde(with = "super::iso_date")]
    pub completed_date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

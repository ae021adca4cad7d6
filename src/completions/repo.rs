use sqlx::PgPool;
use time::Date;

use super::repo_types::HabitCompletion;
use crate::{
    db::bounded,
    error::{AppError, AppResult},
};

impl HabitCompletion {
    /// Records `date` for the habit. Marking a day twice returns the
    /// existing row.
    pub async fn mark(db: &PgPool, habit_id: i64, user_id: i64, date: Date) -> AppResult<Self> {
        bounded(async {
            let inserted = sqlx::query_as::<_, HabitCompletion>(
                r#"
                INSERT INTO habit_completions (habit_id, user_id, completed_date)
                VALUES ($1, $2, $3)
                ON CONFLICT (habit_id, completed_date) DO NOTHING
                RETURNING id, habit_id, user_id, completed_date, created_at
                "#,
            )
            .bind(habit_id)
            .bind(user_id)
            .bind(date)
            .fetch_optional(db)
            .await?;

            if let Some(row) = inserted {
                return Ok(row);
            }

            let existing = sqlx::query_as::<_, HabitCompletion>(
                r#"
                SELECT id, habit_id, user_id, completed_date, created_at
                FROM habit_completions
                WHERE habit_id = $1 AND user_id = $2 AND completed_date = $3
                "#,
            )
            .bind(habit_id)
            .bind(user_id)
            .bind(date)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound)?;
            Ok::<_, AppError>(existing)
        })
        .await
    }

    pub async fn unmark(db: &PgPool, habit_id: i64, user_id: i64, date: Date) -> AppResult<()> {
        bounded(async {
            let res = sqlx::query(
                r#"
                DELETE FROM habit_completions
                WHERE habit_id = $1 AND user_id = $2 AND completed_date = $3
                "#,
            )
            .bind(habit_id)
            .bind(user_id)
            .bind(date)
            .execute(db)
            .await?;
            if res.rows_affected() == 0 {
                return Err(AppError::NotFound);
            }
            Ok::<_, AppError>(())
        })
        .await
    }

    /// Completions in `[from, to]`, newest first.
    pub async fn list(
        db: &PgPool,
        habit_id: i64,
        user_id: i64,
        from: Date,
        to: Date,
    ) -> AppResult<Vec<Self>> {
        bounded(async {
            let rows = sqlx::query_as::<_, HabitCompletion>(
                r#"
                SELECT id, habit_id, user_id, completed_date, created_at
                FROM habit_completions
                WHERE habit_id = $1 AND user_id = $2
                  AND completed_date BETWEEN $3 AND $4
                ORDER BY completed_date DESC
                "#,
            )
            .bind(habit_id)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(db)
            .await?;
            Ok::<_, AppError>(rows)
        })
        .await
    }
}

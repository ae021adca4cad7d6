use sqlx::PgPool;

use super::repo_types::{Habit, HabitWrite, NewHabit};
use crate::{
    db::bounded,
    error::{AppError, AppResult},
};

pub(crate) const EDIT_CONFLICT: &str = "edit conflict: the record was changed by another request";

impl Habit {
    pub async fn create(db: &PgPool, user_id: i64, new: &NewHabit) -> AppResult<Habit> {
        bounded(async {
            let habit = sqlx::query_as::<_, Habit>(
                r#"
                INSERT INTO habits (user_id, name, impact, goal_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id, user_id, name, impact, goal_id, version, created_at, updated_at
                "#,
            )
            .bind(user_id)
            .bind(&new.name)
            .bind(&new.impact)
            .bind(new.goal_id)
            .fetch_one(db)
            .await?;
            Ok::<_, AppError>(habit)
        })
        .await
    }

    /// Missing rows and rows owned by someone else are both `NotFound`.
    pub async fn get_by_id(db: &PgPool, id: i64, user_id: i64) -> AppResult<Habit> {
        bounded(async {
            let habit = sqlx::query_as::<_, Habit>(
                r#"
                SELECT id, user_id, name, impact, goal_id, version, created_at, updated_at
                FROM habits
                WHERE id = $1 AND user_id = $2
                "#,
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound)?;
            Ok::<_, AppError>(habit)
        })
        .await
    }

    /// Conditional write on `(id, version, owner)`.
    ///
    /// When nothing matches, an owner-scoped probe decides the outcome: the
    /// row still being there means the version moved (`Conflict`), otherwise
    /// it is gone or not the caller's (`NotFound`).
    pub async fn update(db: &PgPool, write: &HabitWrite, user_id: i64) -> AppResult<Habit> {
        bounded(async {
            let updated = sqlx::query_as::<_, Habit>(
                r#"
                UPDATE habits
                SET name = $1, impact = $2, goal_id = $3, version = version + 1, updated_at = NOW()
                WHERE id = $4 AND version = $5 AND user_id = $6
                RETURNING id, user_id, name, impact, goal_id, version, created_at, updated_at
                "#,
            )
            .bind(&write.name)
            .bind(&write.impact)
            .bind(write.goal_id)
            .bind(write.id)
            .bind(write.observed_version)
            .bind(user_id)
            .fetch_optional(db)
            .await?;

            if let Some(habit) = updated {
                return Ok(habit);
            }

            let current = sqlx::query_scalar::<_, i32>(
                r#"SELECT version FROM habits WHERE id = $1 AND user_id = $2"#,
            )
            .bind(write.id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;

            match current {
                Some(_) => Err(AppError::Conflict(EDIT_CONFLICT.into())),
                None => Err(AppError::NotFound),
            }
        })
        .await
    }

    pub async fn delete(db: &PgPool, id: i64, user_id: i64) -> AppResult<()> {
        bounded(async {
            let res = sqlx::query(r#"DELETE FROM habits WHERE id = $1 AND user_id = $2"#)
                .bind(id)
                .bind(user_id)
                .execute(db)
                .await?;
            if res.rows_affected() == 0 {
                return Err(AppError::NotFound);
            }
            Ok::<_, AppError>(())
        })
        .await
    }
}

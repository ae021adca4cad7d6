use sqlx::PgPool;
use tracing::warn;

use super::repo_types::{Goal, GoalWrite, NewGoal};
use crate::{
    db::{bounded, unique_violation},
    error::{AppError, AppResult},
    habits::repo::EDIT_CONFLICT,
};

pub(crate) const DUPLICATE_GOAL: &str = "you already have a goal for this category in this year";

fn goal_write_error(err: sqlx::Error) -> AppError {
    match unique_violation(&err) {
        Some("goals_user_id_year_category_key") => AppError::Conflict(DUPLICATE_GOAL.into()),
        Some(other) => {
            warn!(constraint = other, "unexpected unique violation on goals");
            AppError::Conflict(DUPLICATE_GOAL.into())
        }
        None => AppError::Database(err),
    }
}

impl Goal {
    pub async fn create(db: &PgPool, user_id: i64, new: &NewGoal) -> AppResult<Goal> {
        bounded(async {
            let goal = sqlx::query_as::<_, Goal>(
                r#"
                INSERT INTO goals (user_id, year, category, description)
                VALUES ($1, $2, $3, $4)
                RETURNING id, user_id, year, category, description, completed, version, created_at, updated_at
                "#,
            )
            .bind(user_id)
            .bind(new.year)
            .bind(&new.category)
            .bind(&new.description)
            .fetch_one(db)
            .await
            .map_err(goal_write_error)?;
            Ok::<_, AppError>(goal)
        })
        .await
    }

    pub async fn get_by_id(db: &PgPool, id: i64, user_id: i64) -> AppResult<Goal> {
        bounded(async {
            let goal = sqlx::query_as::<_, Goal>(
                r#"
                SELECT id, user_id, year, category, description, completed, version, created_at, updated_at
                FROM goals
                WHERE id = $1 AND user_id = $2
                "#,
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound)?;
            Ok::<_, AppError>(goal)
        })
        .await
    }

    /// Same protocol as [`crate::habits::repo_types::Habit::update`].
    pub async fn update(db: &PgPool, write: &GoalWrite, user_id: i64) -> AppResult<Goal> {
        bounded(async {
            let updated = sqlx::query_as::<_, Goal>(
                r#"
                UPDATE goals
                SET description = $1, completed = $2, version = version + 1, updated_at = NOW()
                WHERE id = $3 AND version = $4 AND user_id = $5
                RETURNING id, user_id, year, category, description, completed, version, created_at, updated_at
                "#,
            )
            .bind(&write.description)
            .bind(write.completed)
            .bind(write.id)
            .bind(write.observed_version)
            .bind(user_id)
            .fetch_optional(db)
            .await?;

            if let Some(goal) = updated {
                return Ok(goal);
            }

            let exists = sqlx::query_scalar::<_, i64>(
                r#"SELECT id FROM goals WHERE id = $1 AND user_id = $2"#,
            )
            .bind(write.id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;

            match exists {
                Some(_) => Err(AppError::Conflict(EDIT_CONFLICT.into())),
                None => Err(AppError::NotFound),
            }
        })
        .await
    }

    pub async fn delete(db: &PgPool, id: i64, user_id: i64) -> AppResult<()> {
        bounded(async {
            let res = sqlx::query(r#"DELETE FROM goals WHERE id = $1 AND user_id = $2"#)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::unique_err;

    #[test]
    fn duplicate_year_category_is_a_conflict() {
        match goal_write_error(unique_err("goals_user_id_year_category_key")) {
            AppError::Conflict(msg) => assert_eq!(msg, DUPLICATE_GOAL),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            goal_write_error(sqlx::Error::PoolClosed),
            AppError::Database(_)
        ));
    }
}

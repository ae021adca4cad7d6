use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    db::{bounded, unique_violation},
    error::{AppError, AppResult},
};

/// Maps a unique violation on `users` to the matching duplicate error.
pub(crate) fn user_write_error(err: sqlx::Error) -> AppError {
    match unique_violation(&err) {
        Some("users_email_key") => AppError::DuplicateEmail,
        Some("users_username_key") => AppError::DuplicateUsername,
        Some(other) => {
            warn!(constraint = other, "unexpected unique violation on users");
            AppError::Conflict("user already exists".into())
        }
        None => AppError::Database(err),
    }
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> AppResult<Option<User>> {
        bounded(async {
            let user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, public_id, username, email, password_hash, is_active, created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(db)
            .await?;
            Ok::<_, AppError>(user)
        })
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> AppResult<Option<User>> {
        bounded(async {
            let user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, public_id, username, email, password_hash, is_active, created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(db)
            .await?;
            Ok::<_, AppError>(user)
        })
        .await
    }

    /// Resolve a verified token subject.
    pub async fn find_by_public_id(db: &PgPool, public_id: Uuid) -> AppResult<Option<User>> {
        bounded(async {
            let user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, public_id, username, email, password_hash, is_active, created_at, updated_at
                FROM users
                WHERE public_id = $1
                "#,
            )
            .bind(public_id)
            .fetch_optional(db)
            .await?;
            Ok::<_, AppError>(user)
        })
        .await
    }

    /// Insert a pending user together with the hash of its invitation secret.
    pub async fn create_and_invite(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
        invitation_hash: &[u8],
        invitation_expiry: OffsetDateTime,
    ) -> AppResult<User> {
        bounded(async {
            let mut tx = db.begin().await?;

            let user = sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (public_id, username, email, password_hash)
                VALUES ($1, $2, $3, $4)
                RETURNING id, public_id, username, email, password_hash, is_active, created_at, updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(user_write_error)?;

            sqlx::query(
                r#"
                INSERT INTO user_invitations (token_hash, user_id, expiry)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(invitation_hash)
            .bind(user.id)
            .bind(invitation_expiry)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, AppError>(user)
        })
        .await
    }

    /// Consume a live invitation and flip its user to active, atomically.
    pub async fn activate(db: &PgPool, invitation_hash: &[u8], now: OffsetDateTime) -> AppResult<i64> {
        bounded(async {
            let mut tx = db.begin().await?;

            let user_id = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT user_id
                FROM user_invitations
                WHERE token_hash = $1 AND expiry > $2 AND consumed_at IS NULL
                FOR UPDATE
                "#,
            )
            .bind(invitation_hash)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound)?;

            sqlx::query(r#"UPDATE users SET is_active = TRUE, updated_at = NOW() WHERE id = $1"#)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(r#"UPDATE user_invitations SET consumed_at = $2 WHERE token_hash = $1"#)
                .bind(invitation_hash)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, AppError>(user_id)
        })
        .await
    }

    pub async fn delete(db: &PgPool, id: i64) -> AppResult<()> {
        bounded(async {
            let res = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
                .bind(id)
                .execute(db)
                .await?;
            if res.rows_affected() == 0 {
                return Err(AppError::NotFound);
            }
            Ok::<_, AppError>(())
        })
        .await
    }

    pub async fn update_email(db: &PgPool, id: i64, email: &str) -> AppResult<User> {
        bounded(async {
            let user = sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET email = $1, updated_at = NOW()
                WHERE id = $2
                RETURNING id, public_id, username, email, password_hash, is_active, created_at, updated_at
                "#,
            )
            .bind(email)
            .bind(id)
            .fetch_optional(db)
            .await
            .map_err(user_write_error)?
            .ok_or(AppError::NotFound)?;
            Ok::<_, AppError>(user)
        })
        .await
    }

    pub async fn update_password(db: &PgPool, id: i64, password_hash: &str) -> AppResult<()> {
        bounded(async {
            let res = sqlx::query(
                r#"UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2"#,
            )
            .bind(password_hash)
            .bind(id)
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
    fn unique_violations_map_to_duplicate_errors() {
        assert!(matches!(
            user_write_error(unique_err("users_email_key")),
            AppError::DuplicateEmail
        ));
        assert!(matches!(
            user_write_error(unique_err("users_username_key")),
            AppError::DuplicateUsername
        ));
        assert!(matches!(
            user_write_error(unique_err("users_public_id_key")),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            user_write_error(sqlx::Error::RowNotFound),
            AppError::Database(_)
        ));
    }
}

use sqlx::PgPool;
use time::OffsetDateTime;

use crate::{
    db::bounded,
    error::{AppError, AppResult},
};

/// Single-use password reset token. A row is live while `used_at IS NULL`
/// and `expiry > now`; expiry is a query-time predicate, rows are never
/// deleted for correctness.
pub struct PasswordResetToken;

impl PasswordResetToken {
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        token_hash: &[u8],
        expiry: OffsetDateTime,
    ) -> AppResult<()> {
        bounded(async {
            sqlx::query(
                r#"
                INSERT INTO password_reset_tokens (token_hash, user_id, expiry)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(token_hash)
            .bind(user_id)
            .bind(expiry)
            .execute(db)
            .await?;
            Ok::<_, AppError>(())
        })
        .await
    }

    /// Rotates the owner's password and marks the token used in one
    /// transaction.
    ///
    /// `FOR UPDATE` serializes concurrent consumers of the same token: the
    /// second one blocks until the first commits, then re-evaluates the
    /// filter against the now-used row and gets nothing back. Returns the
    /// owning user id.
    pub async fn consume(
        db: &PgPool,
        token_hash: &[u8],
        now: OffsetDateTime,
        password_hash: &str,
    ) -> AppResult<i64> {
        bounded(async {
            let mut tx = db.begin().await?;

            let user_id = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT user_id
                FROM password_reset_tokens
                WHERE token_hash = $1 AND expiry > $2 AND used_at IS NULL
                FOR UPDATE
                "#,
            )
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound)?;

            sqlx::query(r#"UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2"#)
                .bind(password_hash)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            let res = sqlx::query(
                r#"UPDATE password_reset_tokens SET used_at = $1 WHERE token_hash = $2 AND used_at IS NULL"#,
            )
            .bind(now)
            .bind(token_hash)
            .execute(&mut *tx)
            .await?;
            if res.rows_affected() == 0 {
                // Dropping `tx` rolls back the password change.
                return Err(AppError::NotFound);
            }

            tx.commit().await?;
            Ok::<_, AppError>(user_id)
        })
        .await
    }
}

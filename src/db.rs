use std::{future::Future, time::Duration};

use anyhow::anyhow;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{config::AppConfig, error::AppError};

/// Upper bound for a single store operation, including every statement of a
/// transaction.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(QUERY_TIMEOUT)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Runs a store operation under [`QUERY_TIMEOUT`].
///
/// When the deadline passes the future is dropped, which aborts the query on
/// its connection and rolls back any transaction it had open.
pub async fn bounded<T, F>(op: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, op).await {
        Ok(res) => res,
        Err(_) => Err(AppError::Internal(anyhow!(
            "database operation timed out after {:?}",
            QUERY_TIMEOUT
        ))),
    }
}

/// Name of the unique constraint a statement tripped over, if any.
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().is_some_and(|c| c == "23505") => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error as StdError, fmt};

    #[derive(Debug)]
    pub(crate) struct FakeDbError {
        pub code: &'static str,
        pub constraint: Option<&'static str>,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake database error {}", self.code)
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    pub(crate) fn unique_err(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError {
            code: "23505",
            constraint: Some(constraint),
        }))
    }

    #[test]
    fn unique_violation_reports_constraint() {
        let err = unique_err("users_email_key");
        assert_eq!(unique_violation(&err), Some("users_email_key"));
    }

    #[test]
    fn other_errors_are_not_unique_violations() {
        let err = sqlx::Error::Database(Box::new(FakeDbError {
            code: "40001",
            constraint: None,
        }));
        assert_eq!(unique_violation(&err), None);
        assert_eq!(unique_violation(&sqlx::Error::RowNotFound), None);
    }

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let v = bounded(async { Ok::<_, AppError>(7) }).await.unwrap();
        assert_eq!(v, 7);
        let err = bounded(async { Err::<(), _>(AppError::NotFound) }).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out_stalled_operations() {
        let err = bounded(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, AppError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}

use chronicle_core::DomainError;
use sqlx::{Postgres, Transaction};
use tracing::warn;

/// Maps a `sqlx` failure of `operation` to a storage error.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            DomainError::Storage(format!("database error in {operation}: {}", db_err.message()))
        }
        other => DomainError::Storage(format!("{operation} failed: {other}")),
    }
}

/// Rolls back `tx` after `operation` failed with `err`.
///
/// Always returns the failure of `operation`. A failed rollback is only
/// logged; the transaction is discarded when the connection drops it.
pub(crate) async fn abort(
    tx: Transaction<'_, Postgres>,
    operation: &str,
    err: sqlx::Error,
) -> DomainError {
    if let Err(rollback) = tx.rollback().await {
        warn!(operation, error = %rollback, "rollback failed");
    }
    map_sqlx_error(operation, err)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::PgPool;

    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_abort_returns_the_operation_error_when_rollback_fails(pool: PgPool) {
        // Arrange
        let mut tx = pool.begin().await.unwrap();
        let (pid,): (i32,) = sqlx::query_as("SELECT pg_backend_pid()")
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        sqlx::query("SELECT pg_terminate_backend($1)")
            .bind(pid)
            .execute(&pool)
            .await
            .unwrap();
        for _ in 0..50 {
            let (alive,): (i64,) =
                sqlx::query_as("SELECT count(*) FROM pg_stat_activity WHERE pid = $1")
                    .bind(pid)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            if alive == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let failed = sqlx::query("SELECT 1").execute(&mut *tx).await.unwrap_err();

        // Act
        let err = abort(tx, "insert_event", failed).await;

        // Assert
        match err {
            DomainError::Storage(message) => {
                assert!(message.contains("insert_event"), "{message}");
                assert!(!message.contains("rollback"), "{message}");
            }
            other => panic!("expected Storage, got {other:?}"),
        }
    }
}

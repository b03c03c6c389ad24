//! `PostgreSQL` implementation of the `ReadmodelRepository` trait.

use async_trait::async_trait;
use chronicle_core::{DomainError, ReadmodelRecord, ReadmodelRepository};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{abort, map_sqlx_error};
use crate::schema;

/// PostgreSQL-backed readmodel repository, one row per aggregate.
#[derive(Debug, Clone)]
pub struct PgReadmodelRepository {
    pool: PgPool,
}

impl PgReadmodelRepository {
    /// Creates a new `PgReadmodelRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadmodelRepository for PgReadmodelRepository {
    #[instrument(
        skip(self, record),
        fields(aggregate_id = %record.aggregate_id, readmodel_type = %record.readmodel_type),
        err
    )]
    async fn save_record(&self, record: ReadmodelRecord) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let upserted = sqlx::query(schema::UPSERT_READMODEL)
            .bind(record.aggregate_id)
            .bind(&record.readmodel_type)
            .bind(&record.data)
            .execute(&mut *tx)
            .await;
        if let Err(e) = upserted {
            return Err(abort(tx, "upsert_readmodel", e).await);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn load_record(
        &self,
        aggregate_id: Uuid,
    ) -> Result<Option<ReadmodelRecord>, DomainError> {
        let row: Option<(String, serde_json::Value)> = sqlx::query_as(schema::SELECT_READMODEL)
            .bind(aggregate_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_readmodel", e))?;

        Ok(row.map(|(readmodel_type, data)| ReadmodelRecord {
            aggregate_id,
            readmodel_type,
            data,
        }))
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, aggregate_id: Uuid) -> Result<(), DomainError> {
        sqlx::query(schema::DELETE_READMODEL)
            .bind(aggregate_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_readmodel", e))?;
        Ok(())
    }
}

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use super::{IndexName, RecordStore, RecordType, StoredRecord, StoreError};

/// PostgreSQL-backed record store: a JSONB `records` table plus a
/// `record_indexes` side table (see `migrations/`).
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn put(&self, record_type: RecordType, record: StoredRecord) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO records (record_type, key, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (record_type, key)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(record_type.as_str())
        .bind(&record.key)
        .bind(&record.data)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM record_indexes WHERE record_type = $1 AND key = $2")
            .bind(record_type.as_str())
            .bind(&record.key)
            .execute(&mut *tx)
            .await?;

        for (index, value) in &record.indexes {
            sqlx::query(
                r#"
                INSERT INTO record_indexes (record_type, key, index_name, index_value)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(record_type.as_str())
            .bind(&record.key)
            .bind(index.as_str())
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Stored {record_type} record {}", record.key);
        Ok(())
    }

    async fn get(&self, record_type: RecordType, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(sqlx::query_scalar::<_, Value>(
            "SELECT data FROM records WHERE record_type = $1 AND key = $2",
        )
        .bind(record_type.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get_all(&self, record_type: RecordType) -> Result<Vec<Value>, StoreError> {
        Ok(
            sqlx::query_scalar::<_, Value>("SELECT data FROM records WHERE record_type = $1")
                .bind(record_type.as_str())
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn get_all_by_index(
        &self,
        record_type: RecordType,
        index: IndexName,
        value: &str,
    ) -> Result<Vec<Value>, StoreError> {
        Ok(sqlx::query_scalar::<_, Value>(
            r#"
            SELECT r.data
            FROM records r
            JOIN record_indexes i ON i.record_type = r.record_type AND i.key = r.key
            WHERE i.record_type = $1 AND i.index_name = $2 AND i.index_value = $3
            "#,
        )
        .bind(record_type.as_str())
        .bind(index.as_str())
        .bind(value)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete(&self, record_type: RecordType, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM records WHERE record_type = $1 AND key = $2")
            .bind(record_type.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::engine::{AvailabilityStore, StoreError};
use crate::models::{AvailabilityRecord, AvailabilityRole, TimeInterval};

const SELECT_BLOCKS_SQL: &str = r#"
    SELECT id, user_id, start_time, end_time
    FROM availability
    WHERE user_id = $1
    ORDER BY start_time, end_time
"#;

// One statement per batch: blocks arrive as parallel arrays and are expanded
// with UNNEST. The batch must not repeat a (start_time, end_time) pair.
const UPSERT_BLOCKS_SQL: &str = r#"
    INSERT INTO availability (id, org_id, user_id, role, start_time, end_time, matched, created_at, updated_at)
    SELECT block.id, $1, $2, $3, block.start_time, block.end_time, $4, $5, $5
    FROM UNNEST($6::uuid[], $7::timestamptz[], $8::timestamptz[]) AS block(id, start_time, end_time)
    ON CONFLICT (user_id, start_time, end_time) DO UPDATE
    SET org_id = EXCLUDED.org_id,
        role = EXCLUDED.role,
        matched = EXCLUDED.matched,
        updated_at = EXCLUDED.updated_at
"#;

const DELETE_BLOCKS_SQL: &str = "DELETE FROM availability WHERE user_id = $1";

/// [`AvailabilityStore`] backed by the `availability` table.
#[derive(Debug, Clone)]
pub struct PgAvailabilityStore {
    pool: PgPool,
}

impl PgAvailabilityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[allow(clippy::too_many_arguments)]
async fn upsert_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    org_id: &str,
    role: AvailabilityRole,
    matched: bool,
    now: DateTime<Utc>,
    blocks: &[TimeInterval],
) -> Result<u64, sqlx::Error> {
    if blocks.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = blocks.iter().map(|_| Uuid::new_v4()).collect();
    let starts: Vec<DateTime<Utc>> = blocks.iter().map(|b| b.start).collect();
    let ends: Vec<DateTime<Utc>> = blocks.iter().map(|b| b.end).collect();

    let result = sqlx::query(UPSERT_BLOCKS_SQL)
        .bind(org_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(matched)
        .bind(now)
        .bind(ids)
        .bind(starts)
        .bind(ends)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

#[async_trait]
impl AvailabilityStore for PgAvailabilityStore {
    async fn select_blocks(&self, user_id: &str) -> Result<Vec<AvailabilityRecord>, StoreError> {
        let records = sqlx::query_as::<_, AvailabilityRecord>(SELECT_BLOCKS_SQL)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn upsert_blocks_batch(
        &self,
        user_id: &str,
        org_id: &str,
        role: AvailabilityRole,
        matched: bool,
        now: DateTime<Utc>,
        blocks: &[TimeInterval],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let affected = upsert_in_tx(&mut tx, user_id, org_id, role, matched, now, blocks).await?;
        tx.commit().await?;

        tracing::debug!(user_id, affected, "Upserted availability blocks");
        Ok(())
    }

    async fn replace_blocks(
        &self,
        user_id: &str,
        org_id: &str,
        role: AvailabilityRole,
        blocks: &[TimeInterval],
    ) -> Result<(), StoreError> {
        // Dropping the transaction on error rolls it back
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(DELETE_BLOCKS_SQL)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let inserted = upsert_in_tx(&mut tx, user_id, org_id, role, false, Utc::now(), blocks).await?;
        tx.commit().await?;

        tracing::debug!(user_id, deleted, inserted, "Replaced availability blocks");
        Ok(())
    }
}

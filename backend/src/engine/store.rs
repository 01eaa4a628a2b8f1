use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::engine::error::StoreError;
use crate::models::{AvailabilityBlock, AvailabilityRecord, AvailabilityRole, TimeInterval};

/// Persistence for canonical availability blocks.
///
/// Implementations must make `upsert_blocks_batch` and `replace_blocks` atomic:
/// a failed call leaves the user's rows exactly as they were, and concurrent
/// readers never observe a partially applied write.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// All blocks stored for `user_id`, ordered by start time.
    async fn select_blocks(&self, user_id: &str) -> Result<Vec<AvailabilityRecord>, StoreError>;

    /// Insert blocks, updating org, role, `matched` and `updated_at` of any
    /// block that already exists for (user_id, start_time, end_time).
    async fn upsert_blocks_batch(
        &self,
        user_id: &str,
        org_id: &str,
        role: AvailabilityRole,
        matched: bool,
        now: DateTime<Utc>,
        blocks: &[TimeInterval],
    ) -> Result<(), StoreError>;

    /// Delete every block of `user_id` and insert `blocks` in their place.
    async fn replace_blocks(
        &self,
        user_id: &str,
        org_id: &str,
        role: AvailabilityRole,
        blocks: &[TimeInterval],
    ) -> Result<(), StoreError>;
}

/// Process-local store backed by a map of rows per user.
///
/// Writes stage their result on a copy of the user's rows and swap it in
/// only on success, so an injected failure never leaves partial state.
#[derive(Debug)]
pub struct InMemoryAvailabilityStore {
    rows: RwLock<HashMap<String, Vec<AvailabilityBlock>>>,
    // Number of block writes allowed before the next write fails.
    write_budget: AtomicUsize,
}

impl Default for InMemoryAvailabilityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            write_budget: AtomicUsize::new(usize::MAX),
        }
    }

    /// Make writes fail once `blocks` more block rows have been staged.
    #[cfg(test)]
    pub(crate) fn fail_writes_after(&self, blocks: usize) {
        self.write_budget.store(blocks, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn clear_failure(&self) {
        self.write_budget.store(usize::MAX, Ordering::SeqCst);
    }

    /// Full rows stored for `user_id`, ordered by start time.
    pub(crate) async fn rows_for(&self, user_id: &str) -> Vec<AvailabilityBlock> {
        let rows = self.rows.read().await;
        let mut blocks = rows.get(user_id).cloned().unwrap_or_default();
        blocks.sort_by_key(|b| (b.start_time, b.end_time));
        blocks
    }

    /// Stand-in for the external matching process.
    #[cfg(test)]
    pub(crate) async fn set_matched(&self, user_id: &str, start_time: DateTime<Utc>, matched: bool) -> bool {
        let mut rows = self.rows.write().await;
        match rows
            .get_mut(user_id)
            .and_then(|blocks| blocks.iter_mut().find(|b| b.start_time == start_time))
        {
            Some(block) => {
                block.matched = matched;
                true
            }
            None => false,
        }
    }

    fn consume_write(&self) -> Result<(), StoreError> {
        let budget = self.write_budget.load(Ordering::SeqCst);
        if budget == 0 {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        if budget != usize::MAX {
            self.write_budget.store(budget - 1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn new_block(
        user_id: &str,
        org_id: &str,
        role: AvailabilityRole,
        matched: bool,
        now: DateTime<Utc>,
        interval: &TimeInterval,
    ) -> AvailabilityBlock {
        AvailabilityBlock {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
            role,
            start_time: interval.start,
            end_time: interval.end,
            matched,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn select_blocks(&self, user_id: &str) -> Result<Vec<AvailabilityRecord>, StoreError> {
        Ok(self
            .rows_for(user_id)
            .await
            .iter()
            .map(AvailabilityRecord::from)
            .collect())
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
        let mut rows = self.rows.write().await;
        let mut staged = rows.get(user_id).cloned().unwrap_or_default();

        for interval in blocks {
            self.consume_write()?;
            match staged
                .iter_mut()
                .find(|b| b.start_time == interval.start && b.end_time == interval.end)
            {
                Some(existing) => {
                    existing.org_id = org_id.to_string();
                    existing.role = role;
                    existing.matched = matched;
                    existing.updated_at = now;
                }
                None => staged.push(Self::new_block(user_id, org_id, role, matched, now, interval)),
            }
        }

        rows.insert(user_id.to_string(), staged);
        Ok(())
    }

    async fn replace_blocks(
        &self,
        user_id: &str,
        org_id: &str,
        role: AvailabilityRole,
        blocks: &[TimeInterval],
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let now = Utc::now();
        let mut staged = Vec::with_capacity(blocks.len());

        for interval in blocks {
            self.consume_write()?;
            staged.push(Self::new_block(user_id, org_id, role, false, now, interval));
        }

        rows.insert(user_id.to_string(), staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn block(h: u32, m: u32) -> TimeInterval {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap();
        TimeInterval::new(start, start + chrono::Duration::minutes(15))
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_resets_matched() {
        let store = InMemoryAvailabilityStore::new();
        let now = Utc::now();

        store
            .upsert_blocks_batch("u1", "org1", AvailabilityRole::Tutor, false, now, &[block(9, 0), block(9, 15)])
            .await
            .unwrap();
        assert!(store.set_matched("u1", block(9, 0).start, true).await);

        store
            .upsert_blocks_batch("u1", "org2", AvailabilityRole::Tutor, false, now, &[block(9, 0)])
            .await
            .unwrap();

        let rows = store.rows_for("u1").await;
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].matched);
        assert_eq!(rows[0].org_id, "org2");
        assert_eq!(rows[1].org_id, "org1");
    }

    #[tokio::test]
    async fn test_failed_upsert_leaves_rows_unchanged() {
        let store = InMemoryAvailabilityStore::new();
        let now = Utc::now();
        store
            .upsert_blocks_batch("u1", "org1", AvailabilityRole::Student, false, now, &[block(8, 0)])
            .await
            .unwrap();

        store.fail_writes_after(1);
        let result = store
            .upsert_blocks_batch("u1", "org1", AvailabilityRole::Student, false, now, &[block(9, 0), block(9, 15)])
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let records = store.select_blocks("u1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].interval(), block(8, 0));
    }

    #[tokio::test]
    async fn test_replace_swaps_all_rows() {
        let store = InMemoryAvailabilityStore::new();
        store
            .upsert_blocks_batch("u1", "org1", AvailabilityRole::Tutor, false, Utc::now(), &[block(8, 0)])
            .await
            .unwrap();
        store
            .replace_blocks("u1", "org1", AvailabilityRole::Tutor, &[block(10, 0), block(9, 45)])
            .await
            .unwrap();

        let records = store.select_blocks("u1").await.unwrap();
        let intervals: Vec<_> = records.iter().map(AvailabilityRecord::interval).collect();
        assert_eq!(intervals, vec![block(9, 45), block(10, 0)]);
        assert!(store.select_blocks("u2").await.unwrap().is_empty());
    }
}

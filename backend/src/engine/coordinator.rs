use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::constants::MAX_BLOCKS_PER_REQUEST;
use crate::engine::error::{AvailabilityError, IntervalError};
use crate::engine::normalizer;
use crate::engine::store::AvailabilityStore;
use crate::models::{Availability, AvailabilityRecord, AvailabilityRole, Principal, RawInterval, TimeInterval};

/// Applies availability operations on top of an [`AvailabilityStore`].
///
/// Callers are expected to have authorized the acting principal for
/// `create`, `get` and `update`; `get_batch` checks it itself because the
/// decision depends on every requested ID.
///
/// Two concurrent `update`s for the same user are not merged: each replaces
/// the full block set and the last transaction to commit wins.
#[derive(Debug)]
pub struct AvailabilityCoordinator<S> {
    store: S,
}

impl<S: AvailabilityStore> AvailabilityCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Store `ranges` for a user, merging with whatever is already stored.
    ///
    /// Blocks that already exist are overwritten in place, which resets their
    /// `matched` flag. The returned availability echoes the submitted ranges.
    pub async fn create(
        &self,
        user_id: &str,
        org_id: &str,
        role: AvailabilityRole,
        ranges: &[RawInterval],
    ) -> Result<Availability, AvailabilityError> {
        if ranges.is_empty() {
            return Err(AvailabilityError::NoIntervals);
        }

        let intervals = normalizer::validate_all(ranges)?;
        check_block_limit(&intervals)?;
        let mut blocks = normalizer::ranges_to_blocks(&intervals)?;
        if blocks.is_empty() {
            return Err(AvailabilityError::NoValidIntervals);
        }

        // One row per key within a single batch
        blocks.sort_by_key(|block| (block.start, block.end));
        blocks.dedup();

        self.store
            .upsert_blocks_batch(user_id, org_id, role, false, Utc::now(), &blocks)
            .await
            .map_err(|e| {
                error!(user_id, error = %e, "Failed to create availability");
                AvailabilityError::storage("create", user_id, e)
            })?;

        info!(
            user_id,
            org_id,
            role = %role,
            block_count = blocks.len(),
            "Availability created"
        );

        Ok(Availability::new(user_id, intervals))
    }

    pub async fn get(&self, user_id: &str) -> Result<Availability, AvailabilityError> {
        let ranges = self.load_ranges("get", user_id).await?;
        Ok(Availability::new(user_id, ranges))
    }

    /// Availability for several users, in the order requested.
    ///
    /// A non-elevated caller asking for anyone but themselves is rejected
    /// before any storage access.
    pub async fn get_batch(
        &self,
        principal: &Principal,
        user_ids: &[String],
    ) -> Result<Vec<Availability>, AvailabilityError> {
        if user_ids.is_empty() {
            return Err(AvailabilityError::NoUsers);
        }

        if !principal.is_elevated() {
            if let Some(foreign) = user_ids.iter().find(|id| **id != principal.user_id) {
                return Err(AvailabilityError::Forbidden(format!(
                    "user {} may only request their own availability, not {}",
                    principal.user_id, foreign
                )));
            }
        }

        let mut result = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let ranges = self.load_ranges("get_batch", user_id).await?;
            result.push(Availability::new(user_id.as_str(), ranges));
        }
        Ok(result)
    }

    /// Apply removals then additions to the stored availability and replace
    /// the user's blocks with the result.
    ///
    /// Removals apply in order, each to the output of the previous one. A
    /// removal entry without exactly two endpoints is skipped.
    pub async fn update(
        &self,
        user_id: &str,
        org_id: &str,
        role: AvailabilityRole,
        add_ranges: &[RawInterval],
        remove_ranges: &[RawInterval],
    ) -> Result<Availability, AvailabilityError> {
        let additions = normalizer::validate_all(add_ranges)?;
        let removals = valid_removals(user_id, remove_ranges)?;
        check_block_limit(&additions)?;

        let mut ranges = self.load_ranges("update", user_id).await?;

        for removal in &removals {
            ranges = normalizer::subtract(&ranges, removal);
        }

        ranges.extend(additions);
        let merged = normalizer::to_ranges(&normalizer::ranges_to_blocks(&ranges)?);
        let final_blocks = normalizer::ranges_to_blocks(&merged)?;

        self.store
            .replace_blocks(user_id, org_id, role, &final_blocks)
            .await
            .map_err(|e| {
                error!(user_id, error = %e, "Failed to update availability");
                AvailabilityError::storage("update", user_id, e)
            })?;

        info!(
            user_id,
            org_id,
            role = %role,
            final_block_count = final_blocks.len(),
            "Availability updated"
        );

        Ok(Availability::new(user_id, merged))
    }

    async fn load_ranges(
        &self,
        operation: &'static str,
        user_id: &str,
    ) -> Result<Vec<TimeInterval>, AvailabilityError> {
        let records = self.store.select_blocks(user_id).await.map_err(|e| {
            error!(user_id, operation, error = %e, "Failed to load availability");
            AvailabilityError::storage(operation, user_id, e)
        })?;

        debug!(user_id, block_count = records.len(), "Loaded availability blocks");

        let blocks: Vec<TimeInterval> = records.iter().map(AvailabilityRecord::interval).collect();
        Ok(normalizer::to_ranges(&blocks))
    }
}

// Checked before expansion so an oversized range is never materialized
fn check_block_limit(ranges: &[TimeInterval]) -> Result<(), AvailabilityError> {
    let count = normalizer::block_count(ranges);
    if count > MAX_BLOCKS_PER_REQUEST {
        return Err(AvailabilityError::TooManyBlocks {
            count,
            limit: MAX_BLOCKS_PER_REQUEST,
        });
    }
    Ok(())
}

fn valid_removals(
    user_id: &str,
    remove_ranges: &[RawInterval],
) -> Result<Vec<TimeInterval>, AvailabilityError> {
    let mut removals = Vec::with_capacity(remove_ranges.len());
    for entry in remove_ranges {
        match normalizer::validate(entry) {
            Ok(removal) => removals.push(removal),
            Err(IntervalError::MalformedInterval { arity }) => {
                warn!(user_id, arity, "Ignoring malformed remove interval");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(removals)
}

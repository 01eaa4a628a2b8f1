//! Conversion between submitted time ranges and canonical 15-minute blocks.
//!
//! Everything here is pure: no I/O, deterministic output for a given input.

use chrono::{DateTime, Duration, Utc};

use crate::constants::{BLOCK_MINUTES, BLOCK_SECONDS};
use crate::engine::error::{Endpoint, IntervalError};
use crate::models::{RawInterval, TimeInterval};

pub fn block_duration() -> Duration {
    Duration::minutes(BLOCK_MINUTES)
}

/// True when `t` sits exactly on a 15-minute boundary of the absolute
/// timeline (which also makes the minute of hour 00, 15, 30 or 45).
pub fn is_aligned(t: &DateTime<Utc>) -> bool {
    t.timestamp().rem_euclid(BLOCK_SECONDS) == 0 && t.timestamp_subsec_nanos() == 0
}

/// Check arity and alignment of a single submitted interval.
pub fn validate(interval: &RawInterval) -> Result<TimeInterval, IntervalError> {
    let [start, end] = interval.0.as_slice() else {
        return Err(IntervalError::MalformedInterval {
            arity: interval.0.len(),
        });
    };
    let interval = TimeInterval::new(*start, *end);
    check_alignment(&interval)?;
    Ok(interval)
}

pub fn validate_all(intervals: &[RawInterval]) -> Result<Vec<TimeInterval>, IntervalError> {
    intervals.iter().map(validate).collect()
}

fn check_alignment(interval: &TimeInterval) -> Result<(), IntervalError> {
    if !is_aligned(&interval.start) {
        return Err(IntervalError::InvalidBoundary {
            field: Endpoint::Start,
            value: interval.start,
        });
    }
    if !is_aligned(&interval.end) {
        return Err(IntervalError::InvalidBoundary {
            field: Endpoint::End,
            value: interval.end,
        });
    }
    Ok(())
}

/// Split submitted intervals into canonical blocks.
///
/// Each interval is walked independently from start to end in 15-minute
/// steps. The output is neither sorted nor deduplicated, and an interval whose
/// start is not before its end contributes no blocks.
pub fn to_blocks(intervals: &[RawInterval]) -> Result<Vec<TimeInterval>, IntervalError> {
    ranges_to_blocks(&validate_all(intervals)?)
}

/// Same as [`to_blocks`] for intervals that already have two endpoints.
pub fn ranges_to_blocks(ranges: &[TimeInterval]) -> Result<Vec<TimeInterval>, IntervalError> {
    let step = block_duration();
    let mut blocks = Vec::new();

    for range in ranges {
        check_alignment(range)?;

        let mut current = range.start;
        while current < range.end {
            let next = current + step;
            blocks.push(TimeInterval::new(current, next));
            current = next;
        }
    }

    Ok(blocks)
}

/// Number of blocks [`ranges_to_blocks`] would emit, without building them.
pub fn block_count(ranges: &[TimeInterval]) -> usize {
    ranges
        .iter()
        .map(|range| {
            let seconds = range.duration().num_seconds().max(0);
            usize::try_from(seconds / BLOCK_SECONDS).unwrap_or(usize::MAX)
        })
        .fold(0, usize::saturating_add)
}

/// Collapse blocks into ascending, disjoint, non-adjacent ranges.
///
/// Input may be unordered, overlapping or contain duplicates.
pub fn to_ranges(blocks: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut sorted = blocks.to_vec();
    sorted.sort_by_key(|block| (block.start, block.end));

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for block in sorted {
        match merged.last_mut() {
            // Overlapping or touching
            Some(last) if block.start <= last.end => last.end = last.end.max(block.end),
            _ => merged.push(block),
        }
    }

    group_consecutive(merged)
}

/// Fuse ranges where one ends exactly where the next starts.
fn group_consecutive(ranges: Vec<TimeInterval>) -> Vec<TimeInterval> {
    let mut grouped: Vec<TimeInterval> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match grouped.last_mut() {
            Some(last) if last.end == range.start => last.end = range.end,
            _ => grouped.push(range),
        }
    }
    grouped
}

/// Remove `removal` from every range in `ranges`.
///
/// Ranges entirely inside the removal window are dropped, partially
/// overlapping ranges keep the parts before and after it, and ranges that do
/// not overlap are returned unchanged. An empty removal window is a no-op.
pub fn subtract(ranges: &[TimeInterval], removal: &TimeInterval) -> Vec<TimeInterval> {
    if removal.start >= removal.end {
        return ranges.to_vec();
    }

    let mut surviving = Vec::with_capacity(ranges.len() + 1);
    for range in ranges {
        if range.end <= removal.start || range.start >= removal.end {
            surviving.push(*range);
            continue;
        }
        if range.start < removal.start {
            surviving.push(TimeInterval::new(range.start, removal.start));
        }
        if range.end > removal.end {
            surviving.push(TimeInterval::new(removal.end, range.end));
        }
    }
    surviving
}

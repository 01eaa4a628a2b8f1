use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::AvailabilityRole;

/// A half-open time range `[start, end)`.
///
/// Used both for canonical 15-minute blocks and for merged ranges. On the
/// wire it is a two-element array `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl Serialize for TimeInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.start, self.end).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TimeInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start, end) = <(DateTime<Utc>, DateTime<Utc>)>::deserialize(deserializer)?;
        Ok(Self { start, end })
    }
}

/// A submitted interval before validation: any number of timestamps.
///
/// Arity is only checked by the normalizer so that a wrong-sized entry can be
/// reported (or skipped) per entry instead of rejecting the whole body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInterval(pub Vec<DateTime<Utc>>);

impl RawInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self(vec![start, end])
    }
}

impl From<TimeInterval> for RawInterval {
    fn from(interval: TimeInterval) -> Self {
        Self::new(interval.start, interval.end)
    }
}

/// Persisted availability row, one per canonical block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub user_id: String,
    pub org_id: String,
    pub role: AvailabilityRole,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub matched: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The columns the engine reads back from storage.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub id: Uuid,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl AvailabilityRecord {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_time, self.end_time)
    }
}

impl From<&AvailabilityBlock> for AvailabilityRecord {
    fn from(block: &AvailabilityBlock) -> Self {
        Self {
            id: block.id,
            user_id: block.user_id.clone(),
            start_time: block.start_time,
            end_time: block.end_time,
        }
    }
}

/// A user's availability as merged, human-facing ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub user_id: String,
    pub available_time_intervals: Vec<TimeInterval>,
}

impl Availability {
    pub fn new(user_id: impl Into<String>, available_time_intervals: Vec<TimeInterval>) -> Self {
        Self {
            user_id: user_id.into(),
            available_time_intervals,
        }
    }
}

/// Request body for creating availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAvailability {
    pub user_id: String,
    pub available_time_intervals: Vec<RawInterval>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAvailabilityRequest {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityChanges {
    #[serde(default)]
    pub add: Vec<RawInterval>,
    #[serde(default)]
    pub remove: Vec<RawInterval>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityUpdate {
    pub user_id: String,
    #[serde(default)]
    pub changes: AvailabilityChanges,
}

//! Error types for availability operations.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Which end of an interval failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Start => f.write_str("start"),
            Endpoint::End => f.write_str("end"),
        }
    }
}

/// Structural problems with a submitted interval.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("interval must have exactly 2 time values, got {arity}")]
    MalformedInterval { arity: usize },

    #[error("{field} time must be on 00, 15, 30, or 45 minutes, got {}", .value.to_rfc3339())]
    InvalidBoundary { field: Endpoint, value: DateTime<Utc> },
}

/// Failure reported by an [`AvailabilityStore`](crate::engine::AvailabilityStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error(transparent)]
    Interval(#[from] IntervalError),

    #[error("at least one time interval is required")]
    NoIntervals,

    #[error("no valid time intervals after processing")]
    NoValidIntervals,

    #[error("request covers {count} blocks, at most {limit} are allowed")]
    TooManyBlocks { count: usize, limit: usize },

    #[error("at least one user ID is required")]
    NoUsers,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{operation} availability failed for user {user_id}: {source}")]
    Storage {
        operation: &'static str,
        user_id: String,
        #[source]
        source: StoreError,
    },
}

impl AvailabilityError {
    pub fn storage(operation: &'static str, user_id: &str, source: StoreError) -> Self {
        AvailabilityError::Storage {
            operation,
            user_id: user_id.to_string(),
            source,
        }
    }
}

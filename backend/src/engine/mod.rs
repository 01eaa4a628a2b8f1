//! The availability interval engine.
//!
//! [`normalizer`] converts between submitted ranges and canonical 15-minute
//! blocks; [`coordinator`] applies create/update/read operations against an
//! [`AvailabilityStore`].

pub mod coordinator;
pub mod error;
pub mod normalizer;
pub mod store;

pub use coordinator::AvailabilityCoordinator;
pub use error::{AvailabilityError, Endpoint, IntervalError, StoreError};
pub use store::{AvailabilityStore, InMemoryAvailabilityStore};

pub mod availability;
pub mod principal;
pub mod roles;

pub use availability::{
    Availability, AvailabilityBlock, AvailabilityChanges, AvailabilityRecord, AvailabilityUpdate,
    BatchAvailabilityRequest, NewAvailability, RawInterval, TimeInterval,
};
pub use principal::Principal;
pub use roles::{AccountRole, AvailabilityRole, UnknownRole};

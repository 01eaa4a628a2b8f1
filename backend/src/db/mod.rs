pub mod availability;
pub mod connection;
pub mod migrations;

pub use availability::PgAvailabilityStore;
pub use connection::{get_db_pool, DatabaseConfig};

pub mod constants;
pub mod db;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod utils;

pub use utils::config::Config;
pub use db::connection::get_db_pool;

// Re-export common types
pub use sqlx::PgPool;

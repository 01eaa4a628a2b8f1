pub mod availability;
pub mod cors;
pub mod principal;

pub use availability::{
    create_availability, get_availability, get_batch_availability, routes, update_availability,
};
pub use cors::cors_layer;

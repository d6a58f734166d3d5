pub mod configurations;
pub mod health;
pub mod nodes;

pub use health::{health_check, metrics_handler, readiness_check};

pub mod config;
pub mod error;
pub mod listings;
pub mod profiles;
pub mod query;
pub mod store;
pub mod telemetry;

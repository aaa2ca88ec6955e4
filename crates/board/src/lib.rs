pub mod base_url;
pub mod client;
pub mod config;
pub mod cycle;
pub mod error;
pub mod metrics;
pub mod observability;
pub mod render;
pub mod scheduler;
pub mod sinks;
pub mod types;

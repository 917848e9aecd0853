pub mod cli;
pub mod contracts;
pub mod env;
pub mod eth_client;
pub mod prometheus_metrics;
pub mod scripts;
pub mod tracing;
pub mod utils;

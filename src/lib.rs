pub mod config;
pub mod core;
pub mod logging;
pub mod orchestrator;
pub mod types;

pub mod amount;
pub mod constants;
pub mod error;
pub mod indexer;
pub mod math;
pub mod optimization;
pub mod paths;
pub mod pool;
pub mod pools;
pub mod router;
pub mod token_graph;
pub mod types;
pub use anyhow::{Context, Result};

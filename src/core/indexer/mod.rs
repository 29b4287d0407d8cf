pub mod pool;
pub use super::types;
pub use anyhow::Result;

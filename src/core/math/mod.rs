pub mod fixed_point;
pub mod log_exp;

pub use fixed_point::*;

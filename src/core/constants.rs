use num_bigint::{BigInt, BigUint};

// 18 decimal fixed point
pub const WAD_DECIMALS: u32 = 18;
// Internal precision of the log/exp and elliptic math
pub const HIGH_PRECISION_DECIMALS: u32 = 36;

// Weighted pools refuse trades moving more than 30% of a balance
pub const MAX_IN_RATIO: u64 = 300_000_000_000_000_000;
pub const MAX_OUT_RATIO: u64 = 300_000_000_000_000_000;

// Relative error allowed on pow results (1e-14 in 18 decimals)
pub const MAX_POW_RELATIVE_ERROR: u64 = 10_000;

pub const AMP_PRECISION: u64 = 1_000;
pub const STABLE_MAX_ITERATIONS: usize = 255;

// Corrections applied to an exact output quote before giving up
pub const ROUND_TRIP_MAX_STEPS: usize = 32;

pub const DEFAULT_SPLIT_STEPS: usize = 20;
pub const MAX_ROUTE_ATTEMPTS: usize = 2;

#[allow(non_snake_case)]
pub fn ONE() -> BigUint {
    BigUint::from(10u64).pow(WAD_DECIMALS)
}

#[allow(non_snake_case)]
pub fn ONE_HP() -> BigInt {
    BigInt::from(10u64).pow(HIGH_PRECISION_DECIMALS)
}

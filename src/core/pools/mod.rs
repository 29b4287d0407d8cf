//! Pricing math, one module per invariant family. Everything here works on
//! 18 decimal, rate adjusted balances; fees and decimal scaling are handled
//! by `Pool` in `core::pool`.

pub mod gyro_2clp;
pub mod gyro_eclp;
pub mod quant_amm;
pub mod stable;
pub mod weighted;

use thiserror::Error;

/// Arithmetic failures inside fixed-point and invariant math.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("subtraction underflow")]
    Underflow,
    #[error("amounts of different tokens: {0} and {1}")]
    TokenMismatch(String, String),
    #[error("token decimals {0} exceed 18")]
    UnsupportedDecimals(u8),
    #[error("value outside of function domain: {0}")]
    Domain(&'static str),
    #[error("iteration did not converge: {0}")]
    NoConvergence(&'static str),
}

/// A single pool refused to quote a hop. The path containing the hop is
/// dropped, the request carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("token {token} is not in pool {pool}")]
    TokenNotInPool { pool: String, token: String },
    #[error("token in and token out are the same")]
    SameToken,
    #[error("trade exceeds the maximum in ratio of pool {0}")]
    MaxInRatio(String),
    #[error("trade exceeds the maximum out ratio of pool {0}")]
    MaxOutRatio(String),
    #[error("pool {0} does not hold enough liquidity")]
    InsufficientLiquidity(String),
    #[error("trade moves pool {0} outside its price range")]
    PriceRange(String),
    #[error("invalid parameters for pool {0}: {1}")]
    InvalidPool(String, &'static str),
    #[error("pool {0} not present in snapshot")]
    UnknownPool(String),
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Caller errors, surfaced before any graph work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("token address cannot be empty")]
    EmptyToken,
    #[error("token in and token out are identical: {0}")]
    IdenticalTokens(String),
    #[error("swap amount must be positive")]
    NonPositiveAmount,
    #[error("invalid swap amount: {0}")]
    InvalidAmount(String),
    #[error("unsupported protocol version: {0}")]
    UnsupportedUniverse(String),
}

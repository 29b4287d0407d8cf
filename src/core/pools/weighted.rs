use super::super::constants::{MAX_IN_RATIO, MAX_OUT_RATIO, ONE};
use super::super::error::QuoteError;
use super::super::math::{self, complement, div_down, div_up, mul_down, mul_up, pow_up};
use num_bigint::BigUint;
use num_traits::Zero;

pub fn validate_weights(id: &str, weights: &[BigUint], token_count: usize) -> Result<(), QuoteError> {
    if weights.len() != token_count {
        return Err(QuoteError::InvalidPool(id.to_string(), "one weight per token"));
    }
    if weights.iter().any(|w| w.is_zero() || *w > ONE()) {
        return Err(QuoteError::InvalidPool(id.to_string(), "weights must be in (0, 1]"));
    }
    Ok(())
}

// out = balanceOut * (1 - (balanceIn / (balanceIn + amountIn)) ^ (weightIn / weightOut))
pub fn out_given_in(
    id: &str,
    balance_in: &BigUint,
    weight_in: &BigUint,
    balance_out: &BigUint,
    weight_out: &BigUint,
    amount_in: &BigUint,
) -> Result<BigUint, QuoteError> {
    if *amount_in > mul_down(balance_in, &BigUint::from(MAX_IN_RATIO)) {
        return Err(QuoteError::MaxInRatio(id.to_string()));
    }
    let denominator = balance_in + amount_in;
    let base = div_up(balance_in, &denominator)?;
    let exponent = div_down(weight_in, weight_out)?;
    let power = pow_up(&base, &exponent)?;

    Ok(mul_down(balance_out, &complement(&power)))
}

// in = balanceIn * ((balanceOut / (balanceOut - amountOut)) ^ (weightOut / weightIn) - 1)
pub fn in_given_out(
    id: &str,
    balance_in: &BigUint,
    weight_in: &BigUint,
    balance_out: &BigUint,
    weight_out: &BigUint,
    amount_out: &BigUint,
) -> Result<BigUint, QuoteError> {
    if *amount_out > mul_down(balance_out, &BigUint::from(MAX_OUT_RATIO)) {
        return Err(QuoteError::MaxOutRatio(id.to_string()));
    }
    let remaining = math::checked_sub(balance_out, amount_out)?;
    let base = div_up(balance_out, &remaining)?;
    let exponent = div_up(weight_out, weight_in)?;
    let power = pow_up(&base, &exponent)?;
    let ratio = math::checked_sub(&power, &ONE())?;

    Ok(mul_up(balance_in, &ratio))
}

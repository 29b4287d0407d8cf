//! Two token concentrated liquidity: a constant product over virtual balances
//! `(x + L/sqrt(beta)) * (y + L*sqrt(alpha)) = L^2`, which keeps the price of
//! token 0 in token 1 inside `[alpha, beta]`.

use super::super::error::QuoteError;
use super::super::math::{self, complement, div_down, div_up, mul_down, mul_up, Rounding};
use num_bigint::BigUint;
use num_traits::Zero;

pub fn validate(id: &str, sqrt_alpha: &BigUint, sqrt_beta: &BigUint, token_count: usize) -> Result<(), QuoteError> {
    if token_count != 2 {
        return Err(QuoteError::InvalidPool(id.to_string(), "exactly two tokens"));
    }
    if sqrt_alpha.is_zero() || sqrt_alpha >= sqrt_beta {
        return Err(QuoteError::InvalidPool(id.to_string(), "sqrt alpha must be in (0, sqrt beta)"));
    }
    Ok(())
}

/// Liquidity `L`, the positive root of `a*L^2 - mb*L - x*y = 0` with
/// `a = 1 - sqrt(alpha)/sqrt(beta)` and `mb = y/sqrt(beta) + x*sqrt(alpha)`.
/// Returns the root rounded down and rounded up.
pub fn compute_invariant(
    balances: &[BigUint],
    sqrt_alpha: &BigUint,
    sqrt_beta: &BigUint,
) -> Result<(BigUint, BigUint), QuoteError> {
    let (x, y) = (&balances[0], &balances[1]);
    let a = complement(&div_up(sqrt_alpha, sqrt_beta)?);
    let mb = div_down(y, sqrt_beta)? + mul_down(x, sqrt_alpha);
    let c = mul_down(x, y);

    let discriminant = mul_down(&mb, &mb) + mul_down(&(&a * 4u32), &c);
    let root = math::sqrt(&discriminant);
    let two_a = &a * 2u32;

    let down = div_down(&(&mb + &root), &two_a)?;
    let up = div_up(&(&mb + &root + 1u32), &two_a)?;
    Ok((down, up))
}

// Offsets added to the in and out balances. The in side uses the invariant
// rounded up and the out side the invariant rounded down, both against the
// trader.
fn virtual_offsets(
    invariant: &(BigUint, BigUint),
    sqrt_alpha: &BigUint,
    sqrt_beta: &BigUint,
    index_in: usize,
) -> Result<(BigUint, BigUint), QuoteError> {
    let (down, up) = invariant;
    if index_in == 0 {
        Ok((div_up(up, sqrt_beta)?, mul_down(down, sqrt_alpha)))
    } else {
        Ok((mul_up(up, sqrt_alpha), div_down(down, sqrt_beta)?))
    }
}

pub fn out_given_in(
    id: &str,
    balances: &[BigUint],
    sqrt_alpha: &BigUint,
    sqrt_beta: &BigUint,
    index_in: usize,
    index_out: usize,
    amount_in: &BigUint,
) -> Result<BigUint, QuoteError> {
    let invariant = compute_invariant(balances, sqrt_alpha, sqrt_beta)?;
    let (virtual_in, virtual_out) = virtual_offsets(&invariant, sqrt_alpha, sqrt_beta, index_in)?;

    let out = math::mul_div(
        &(&balances[index_out] + &virtual_out),
        amount_in,
        &(&balances[index_in] + &virtual_in + amount_in),
        Rounding::Down,
    )?;
    if out >= balances[index_out] {
        return Err(QuoteError::PriceRange(id.to_string()));
    }
    Ok(out)
}

pub fn in_given_out(
    id: &str,
    balances: &[BigUint],
    sqrt_alpha: &BigUint,
    sqrt_beta: &BigUint,
    index_in: usize,
    index_out: usize,
    amount_out: &BigUint,
) -> Result<BigUint, QuoteError> {
    if *amount_out >= balances[index_out] {
        return Err(QuoteError::PriceRange(id.to_string()));
    }
    let invariant = compute_invariant(balances, sqrt_alpha, sqrt_beta)?;
    let (virtual_in, virtual_out) = virtual_offsets(&invariant, sqrt_alpha, sqrt_beta, index_in)?;

    let remaining = math::checked_sub(&(&balances[index_out] + &virtual_out), amount_out)?;
    Ok(math::mul_div(
        &(&balances[index_in] + &virtual_in),
        amount_out,
        &remaining,
        Rounding::Up,
    )?)
}

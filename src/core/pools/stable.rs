//! Curve style stable swap invariant, solved by Newton iteration.
//!
//! `amp` here already carries `AMP_PRECISION`. All balances are 18 decimal and
//! rate adjusted.

use super::super::constants::{AMP_PRECISION, STABLE_MAX_ITERATIONS};
use super::super::error::{MathError, QuoteError};
use super::super::math::{self, Rounding};
use num_bigint::BigUint;
use num_traits::{CheckedSub, One, Zero};

fn converged(current: &BigUint, previous: &BigUint) -> bool {
    let diff = if current > previous {
        current - previous
    } else {
        previous - current
    };
    diff <= BigUint::one()
}

pub fn compute_invariant(amp: &BigUint, balances: &[BigUint]) -> Result<BigUint, MathError> {
    let sum: BigUint = balances.iter().sum();
    if sum.is_zero() {
        return Ok(BigUint::zero());
    }
    let n = BigUint::from(balances.len());
    let precision = BigUint::from(AMP_PRECISION);
    let amp_times_total = amp * &n;

    let mut invariant = sum.clone();
    for _ in 0..STABLE_MAX_ITERATIONS {
        let mut d_p = invariant.clone();
        for balance in balances {
            d_p = math::mul_div(&d_p, &invariant, &(balance * &n), Rounding::Down)?;
        }
        let previous = invariant.clone();
        let numerator = ((&amp_times_total * &sum) / &precision + &d_p * &n) * &invariant;
        let denominator = (math::checked_sub(&amp_times_total, &precision)? * &invariant) / &precision
            + (&n + 1u32) * &d_p;
        invariant = math::mul_div(&numerator, &BigUint::one(), &denominator, Rounding::Down)?;
        if converged(&invariant, &previous) {
            return Ok(invariant);
        }
    }
    Err(MathError::NoConvergence("stable invariant"))
}

// Balance of `token_index` that keeps `invariant` given every other balance
fn compute_balance(
    amp: &BigUint,
    balances: &[BigUint],
    invariant: &BigUint,
    token_index: usize,
) -> Result<BigUint, MathError> {
    let n = BigUint::from(balances.len());
    let precision = BigUint::from(AMP_PRECISION);
    let amp_times_total = amp * &n;

    let mut sum = balances[0].clone();
    let mut p_d = &balances[0] * &n;
    for balance in &balances[1..] {
        p_d = math::mul_div(&(&p_d * balance), &n, invariant, Rounding::Down)?;
        sum += balance;
    }
    sum = math::checked_sub(&sum, &balances[token_index])?;

    let invariant_squared = invariant * invariant;
    let c = math::mul_div(
        &(&invariant_squared * &precision),
        &BigUint::one(),
        &(&amp_times_total * &p_d),
        Rounding::Up,
    )? * &balances[token_index];
    let b = sum + (invariant * &precision) / &amp_times_total;

    let mut token_balance = math::mul_div(
        &(&invariant_squared + &c),
        &BigUint::one(),
        &(invariant + &b),
        Rounding::Up,
    )?;
    for _ in 0..STABLE_MAX_ITERATIONS {
        let previous = token_balance.clone();
        let denominator = math::checked_sub(&(&token_balance * 2u32 + &b), invariant)?;
        token_balance = math::mul_div(
            &(&token_balance * &token_balance + &c),
            &BigUint::one(),
            &denominator,
            Rounding::Up,
        )?;
        if converged(&token_balance, &previous) {
            return Ok(token_balance);
        }
    }
    Err(MathError::NoConvergence("stable balance"))
}

pub fn out_given_in(
    id: &str,
    amp: &BigUint,
    balances: &[BigUint],
    index_in: usize,
    index_out: usize,
    amount_in: &BigUint,
) -> Result<BigUint, QuoteError> {
    let invariant = compute_invariant(amp, balances)?;
    let mut updated = balances.to_vec();
    updated[index_in] += amount_in;
    let final_balance_out = compute_balance(amp, &updated, &invariant, index_out)?;

    // One wei stays in the pool to absorb iteration error
    balances[index_out]
        .checked_sub(&final_balance_out)
        .and_then(|out| out.checked_sub(&BigUint::one()))
        .ok_or_else(|| QuoteError::InsufficientLiquidity(id.to_string()))
}

pub fn in_given_out(
    id: &str,
    amp: &BigUint,
    balances: &[BigUint],
    index_in: usize,
    index_out: usize,
    amount_out: &BigUint,
) -> Result<BigUint, QuoteError> {
    if *amount_out >= balances[index_out] {
        return Err(QuoteError::InsufficientLiquidity(id.to_string()));
    }
    let invariant = compute_invariant(amp, balances)?;
    let mut updated = balances.to_vec();
    updated[index_out] -= amount_out;
    let final_balance_in = compute_balance(amp, &updated, &invariant, index_in)?;

    Ok(math::checked_sub(&final_balance_in, &balances[index_in])? + 1u32)
}

//! 18 decimal fixed-point helpers over `BigUint`.
//!
//! Every multiplication and division names its rounding direction. Pool math
//! rounds in favor of the pool: amounts paid out are rounded down, amounts
//! owed to the pool are rounded up.

use super::super::constants::{MAX_POW_RELATIVE_ERROR, ONE};
use super::super::error::MathError;
use super::log_exp;
use num_bigint::BigUint;
use num_traits::Zero;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

pub fn mul_down(a: &BigUint, b: &BigUint) -> BigUint {
    (a * b) / ONE()
}

pub fn mul_up(a: &BigUint, b: &BigUint) -> BigUint {
    let product = a * b;
    if product.is_zero() {
        return BigUint::zero();
    }
    (product - 1u32) / ONE() + 1u32
}

pub fn div_down(a: &BigUint, b: &BigUint) -> Result<BigUint, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok((a * ONE()) / b)
}

pub fn div_up(a: &BigUint, b: &BigUint) -> Result<BigUint, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    if a.is_zero() {
        return Ok(BigUint::zero());
    }
    Ok((a * ONE() - 1u32) / b + 1u32)
}

/// Plain integer `a * b / c` with explicit rounding.
pub fn mul_div(
    a: &BigUint,
    b: &BigUint,
    c: &BigUint,
    rounding: Rounding,
) -> Result<BigUint, MathError> {
    if c.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = a * b;
    match rounding {
        Rounding::Down => Ok(product / c),
        Rounding::Up => {
            if product.is_zero() {
                Ok(BigUint::zero())
            } else {
                Ok((product - 1u32) / c + 1u32)
            }
        }
    }
}

pub fn checked_sub(a: &BigUint, b: &BigUint) -> Result<BigUint, MathError> {
    if b > a {
        return Err(MathError::Underflow);
    }
    Ok(a - b)
}

/// `1 - x`, saturating at zero.
pub fn complement(x: &BigUint) -> BigUint {
    let one = ONE();
    if *x >= one {
        BigUint::zero()
    } else {
        one - x
    }
}

/// Square root of an 18 decimal value, rounded down.
pub fn sqrt(x: &BigUint) -> BigUint {
    (x * ONE()).sqrt()
}

/// `x^y` rounded up, both 18 decimal.
pub fn pow_up(x: &BigUint, y: &BigUint) -> Result<BigUint, MathError> {
    if let Some(exact) = pow_exact(x, y) {
        return Ok(exact);
    }
    let raw = log_exp::pow(x, y)?;
    let max_error = mul_up(&raw, &BigUint::from(MAX_POW_RELATIVE_ERROR)) + 1u32;
    Ok(raw + max_error)
}

// Exponents 0, 1, 2 and 4 skip the log/exp approximation. Each product is
// rounded up and carries no extra error margin, so it can sit a wei below the
// margin-padded general path. Exact output quotes are checked against the
// forward quote in `Pool::quote_given_out` and never rely on this bound alone.
fn pow_exact(x: &BigUint, y: &BigUint) -> Option<BigUint> {
    let one = ONE();
    if y.is_zero() {
        Some(one)
    } else if *y == one {
        Some(x.clone())
    } else if *y == &one * 2u32 {
        Some(mul_up(x, x))
    } else if *y == &one * 4u32 {
        let square = mul_up(x, x);
        Some(mul_up(&square, &square))
    } else {
        None
    }
}

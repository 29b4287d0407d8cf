//! Natural log and exponential on 36 decimal signed fixed point, used to
//! evaluate non-integer powers for weighted invariants.
//!
//! The results carry an absolute error far below 1e-18, so callers only need
//! to widen by a small relative bound to get a safe rounding direction.

use super::super::constants::{HIGH_PRECISION_DECIMALS, ONE_HP, WAD_DECIMALS};
use super::super::error::MathError;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, Zero};
use std::sync::OnceLock;

// exp() refuses arguments whose result would exceed 2^MAX_EXP_SHIFT
const MAX_EXP_SHIFT: i64 = 512;

static LN_2: OnceLock<BigInt> = OnceLock::new();

fn ln_2() -> &'static BigInt {
    LN_2.get_or_init(|| ln_mantissa(&(ONE_HP() * 2)))
}

// ln(m) for m in [1, 2] through the atanh series:
// ln(m) = 2 * (z + z^3/3 + z^5/5 + ...), z = (m - 1) / (m + 1)
fn ln_mantissa(m: &BigInt) -> BigInt {
    let one = ONE_HP();
    let z = ((m - &one) * &one) / (m + &one);
    let z_squared = (&z * &z) / &one;

    let mut term = z.clone();
    let mut sum = BigInt::zero();
    let mut n = 1u32;
    while !term.is_zero() {
        sum += &term / BigInt::from(n);
        term = (&term * &z_squared) / &one;
        n += 2;
    }
    sum * 2
}

/// Natural logarithm of a positive 36 decimal value.
pub fn ln_hp(x: &BigInt) -> Result<BigInt, MathError> {
    if !x.is_positive() {
        return Err(MathError::Domain("ln of non-positive value"));
    }
    let one = ONE_HP();
    let two = &one * 2;

    // Reduce to m in [1, 2) with x = m * 2^k
    let mut k = x.bits() as i64 - one.bits() as i64;
    let mut m = if k >= 0 {
        x >> (k as usize)
    } else {
        x << ((-k) as usize)
    };
    while m >= two {
        m >>= 1;
        k += 1;
    }
    while m < one {
        m <<= 1;
        k -= 1;
    }

    Ok(ln_2() * k + ln_mantissa(&m))
}

/// `e^y` for a 36 decimal argument.
pub fn exp_hp(y: &BigInt) -> Result<BigInt, MathError> {
    let one = ONE_HP();
    let ln2 = ln_2();

    // y = k * ln2 + r with |r| < ln2
    let k = y / ln2;
    let r = y - &k * ln2;
    let k: i64 = i64::try_from(&k).map_err(|_| MathError::Domain("exp argument too large"))?;
    if k > MAX_EXP_SHIFT {
        return Err(MathError::Domain("exp argument too large"));
    }
    if k < -MAX_EXP_SHIFT {
        return Ok(BigInt::zero());
    }

    let mut term = one.clone();
    let mut sum = BigInt::zero();
    let mut n = 1u32;
    while !term.is_zero() {
        sum += &term;
        term = (&term * &r) / (&one * BigInt::from(n));
        n += 1;
    }

    if k >= 0 {
        Ok(sum << (k as usize))
    } else {
        Ok(sum >> ((-k) as usize))
    }
}

/// `x^y` for 18 decimal operands, result 18 decimal rounded down before any
/// error margin is applied.
pub fn pow(x: &BigUint, y: &BigUint) -> Result<BigUint, MathError> {
    if y.is_zero() {
        return Ok(BigUint::from(10u64).pow(WAD_DECIMALS));
    }
    if x.is_zero() {
        return Ok(BigUint::zero());
    }
    let widen = BigInt::from(10u64).pow(HIGH_PRECISION_DECIMALS - WAD_DECIMALS);
    let x_hp = BigInt::from_biguint(Sign::Plus, x.clone()) * &widen;
    let y_hp = BigInt::from_biguint(Sign::Plus, y.clone()) * &widen;

    let exponent = (ln_hp(&x_hp)? * y_hp) / ONE_HP();
    let result = exp_hp(&exponent)? / widen;
    result
        .to_biguint()
        .ok_or(MathError::Domain("negative power result"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hp(v: i64) -> BigInt {
        BigInt::from(v) * ONE_HP()
    }

    fn close(a: &BigInt, b: &BigInt, tolerance: i64) -> bool {
        (a - b).abs() <= BigInt::from(tolerance)
    }

    #[test]
    fn ln_of_one_is_zero() {
        assert!(close(&ln_hp(&hp(1)).unwrap(), &BigInt::zero(), 10));
    }

    #[test]
    fn exp_inverts_ln() {
        for v in [2i64, 7, 1000, 123_456_789] {
            let x = hp(v);
            let back = exp_hp(&ln_hp(&x).unwrap()).unwrap();
            // relative error below 1e-30
            let tolerance = (&x / BigInt::from(10u64).pow(30)) + 10;
            assert!((back - &x).abs() <= tolerance, "round trip for {v}");
        }
    }

    #[test]
    fn ln_rejects_non_positive() {
        assert!(ln_hp(&BigInt::zero()).is_err());
        assert!(ln_hp(&hp(-1)).is_err());
    }

    #[test]
    fn fractional_power() {
        // 8^(1/3) = 2
        let one = BigUint::from(10u64).pow(18);
        let third = &one / 3u32;
        let result = pow(&(&one * 8u32), &third).unwrap();
        let two = &one * 2u32;
        let diff = if result > two { &result - &two } else { &two - &result };
        // 1/3 truncated in 18 decimals costs a little precision
        assert!(diff < BigUint::from(10_000u64));
    }
}

//! Elliptic concentrated liquidity.
//!
//! Balances `v = (x, y)` live on the lower-left arc of the ellipse
//! `|A (v - center)| = r`, where `A` rotates by `phi` (`c = cos phi`,
//! `s = sin phi`) and squeezes the first axis by `lambda`:
//!
//! ```text
//! A    = [[c/lambda, -s/lambda], [s, c]]
//! A^-1 = [[lambda*c, s], [-lambda*s, c]]
//! ```
//!
//! The arc ends where the price of token 0 in token 1 reaches `alpha`
//! (y = 0) and `beta` (x = 0). All curve math runs in 36 decimal signed fixed
//! point so that intermediate offsets can go negative.

use super::super::constants::{ONE_HP, HIGH_PRECISION_DECIMALS, WAD_DECIMALS};
use super::super::error::QuoteError;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, Zero};

type Vec2 = (BigInt, BigInt);

fn widen() -> BigInt {
    BigInt::from(10u64).pow(HIGH_PRECISION_DECIMALS - WAD_DECIMALS)
}

fn to_hp(value: &BigUint) -> BigInt {
    BigInt::from_biguint(Sign::Plus, value.clone()) * widen()
}

fn mul(a: &BigInt, b: &BigInt) -> BigInt {
    (a * b) / ONE_HP()
}

fn div(a: &BigInt, b: &BigInt) -> BigInt {
    (a * ONE_HP()) / b
}

fn sqrt(x: &BigInt) -> BigInt {
    (x * ONE_HP()).sqrt()
}

fn dot(a: &Vec2, b: &Vec2) -> BigInt {
    mul(&a.0, &b.0) + mul(&a.1, &b.1)
}

/// Curve parameters in high precision, with `(c, s)` renormalized to a unit
/// vector.
#[derive(Debug, Clone)]
pub struct Ellipse {
    c: BigInt,
    s: BigInt,
    lambda: BigInt,
    // Unit vectors in circle space for the two ends of the price range
    tau_alpha: Vec2,
    tau_beta: Vec2,
}

impl Ellipse {
    pub fn new(
        id: &str,
        alpha: &BigUint,
        beta: &BigUint,
        c: &BigUint,
        s: &BigUint,
        lambda: &BigUint,
    ) -> Result<Self, QuoteError> {
        let one = ONE_HP();
        let (alpha, beta, c, s, lambda) = (to_hp(alpha), to_hp(beta), to_hp(c), to_hp(s), to_hp(lambda));
        if !alpha.is_positive() || alpha >= beta {
            return Err(QuoteError::InvalidPool(id.to_string(), "alpha must be in (0, beta)"));
        }
        if lambda < one {
            return Err(QuoteError::InvalidPool(id.to_string(), "lambda must be at least 1"));
        }
        let norm = sqrt(&(mul(&c, &c) + mul(&s, &s)));
        if norm.is_zero() {
            return Err(QuoteError::InvalidPool(id.to_string(), "rotation vector is zero"));
        }
        let (c, s) = (div(&c, &norm), div(&s, &norm));

        let mut ellipse = Self {
            c,
            s,
            lambda,
            tau_alpha: (BigInt::zero(), BigInt::zero()),
            tau_beta: (BigInt::zero(), BigInt::zero()),
        };
        ellipse.tau_alpha = ellipse.tau(id, &alpha)?;
        ellipse.tau_beta = ellipse.tau(id, &beta)?;
        Ok(ellipse)
    }

    // Direction in circle space whose preimage has price `p`
    fn tau(&self, id: &str, p: &BigInt) -> Result<Vec2, QuoteError> {
        let denominator = &self.c + mul(&self.s, p);
        if !denominator.is_positive() {
            return Err(QuoteError::InvalidPool(id.to_string(), "price outside rotation range"));
        }
        let zeta = mul(&self.lambda, &div(&(mul(&self.c, p) - &self.s), &denominator));
        let norm = sqrt(&(ONE_HP() + mul(&zeta, &zeta)));
        Ok((div(&zeta, &norm), div(&ONE_HP(), &norm)))
    }

    fn a_mul(&self, v: &Vec2) -> Vec2 {
        (
            div(&(mul(&self.c, &v.0) - mul(&self.s, &v.1)), &self.lambda),
            mul(&self.s, &v.0) + mul(&self.c, &v.1),
        )
    }

    fn a_inv_mul(&self, v: &Vec2) -> Vec2 {
        let lambda_c = mul(&self.lambda, &self.c);
        let lambda_s = mul(&self.lambda, &self.s);
        (
            mul(&lambda_c, &v.0) + mul(&self.s, &v.1),
            mul(&self.c, &v.1) - mul(&lambda_s, &v.0),
        )
    }

    // Center of the ellipse per unit of invariant
    fn chi(&self) -> Vec2 {
        (self.a_inv_mul(&self.tau_beta).0, self.a_inv_mul(&self.tau_alpha).1)
    }

    /// Invariant `r` for the given balances and the matching ellipse center.
    pub fn invariant(&self, id: &str, balances: &Vec2) -> Result<(BigInt, Vec2), QuoteError> {
        let chi = self.chi();
        let a_chi = self.a_mul(&chi);
        let a_v = self.a_mul(balances);

        let v_chi = dot(&a_v, &a_chi);
        let denominator = dot(&a_chi, &a_chi) - ONE_HP();
        if !denominator.is_positive() {
            return Err(QuoteError::InvalidPool(id.to_string(), "degenerate price range"));
        }
        let mut discriminant = mul(&v_chi, &v_chi) - mul(&denominator, &dot(&a_v, &a_v));
        if discriminant.is_negative() {
            discriminant = BigInt::zero();
        }
        let r = div(&(v_chi + sqrt(&discriminant)), &denominator);
        let center = (mul(&r, &chi.0), mul(&r, &chi.1));
        Ok((r, center))
    }

    // Solves |A(v - center)| = r for one coordinate, taking the root on the
    // lower-left arc. `unknown_weight` and `known_weight` are the squared
    // coefficients of the two offsets in the expanded norm.
    fn lower_root(
        &self,
        id: &str,
        known_offset: &BigInt,
        r: &BigInt,
        unknown_weight: &BigInt,
        known_weight: &BigInt,
    ) -> Result<BigInt, QuoteError> {
        let one = ONE_HP();
        let lambda_squared = mul(&self.lambda, &self.lambda);
        let skew = one - div(&ONE_HP(), &lambda_squared);

        let qa = unknown_weight.clone();
        let qb = mul(&(mul(&mul(&self.c, &self.s), known_offset) * 2), &skew);
        let qc = mul(&mul(known_offset, known_offset), known_weight) - mul(r, r);

        let discriminant = mul(&qb, &qb) - mul(&(&qa * 4), &qc);
        if discriminant.is_negative() {
            return Err(QuoteError::PriceRange(id.to_string()));
        }
        Ok(div(&(-qb - sqrt(&discriminant)), &(qa * 2)))
    }

    fn weights(&self) -> (BigInt, BigInt) {
        let lambda_squared = mul(&self.lambda, &self.lambda);
        let c2 = mul(&self.c, &self.c);
        let s2 = mul(&self.s, &self.s);
        // (weight of x offset, weight of y offset)
        (div(&c2, &lambda_squared) + &s2, div(&s2, &lambda_squared) + c2)
    }

    fn y_given_x(&self, id: &str, x: &BigInt, r: &BigInt, center: &Vec2) -> Result<BigInt, QuoteError> {
        let (wx, wy) = self.weights();
        Ok(&center.1 + self.lower_root(id, &(x - &center.0), r, &wy, &wx)?)
    }

    fn x_given_y(&self, id: &str, y: &BigInt, r: &BigInt, center: &Vec2) -> Result<BigInt, QuoteError> {
        let (wx, wy) = self.weights();
        Ok(&center.0 + self.lower_root(id, &(y - &center.1), r, &wx, &wy)?)
    }

    // New balance of `index` once the other token's balance is `other`
    fn solve(&self, id: &str, index: usize, other: &BigInt, r: &BigInt, center: &Vec2) -> Result<BigInt, QuoteError> {
        if index == 1 {
            self.y_given_x(id, other, r, center)
        } else {
            self.x_given_y(id, other, r, center)
        }
    }
}

fn balances_hp(balances: &[BigUint]) -> Vec2 {
    (to_hp(&balances[0]), to_hp(&balances[1]))
}

fn coordinate(v: &Vec2, index: usize) -> &BigInt {
    if index == 0 {
        &v.0
    } else {
        &v.1
    }
}

pub fn out_given_in(
    id: &str,
    ellipse: &Ellipse,
    balances: &[BigUint],
    index_in: usize,
    index_out: usize,
    amount_in: &BigUint,
) -> Result<BigUint, QuoteError> {
    let current = balances_hp(balances);
    let (r, center) = ellipse.invariant(id, &current)?;

    let new_in = coordinate(&current, index_in) + to_hp(amount_in);
    // Past the end of the arc the ellipse keeps going but prices turn negative
    let limit = ellipse.solve(id, index_in, &BigInt::zero(), &r, &center)?;
    if new_in > limit {
        return Err(QuoteError::PriceRange(id.to_string()));
    }
    let new_out = ellipse.solve(id, index_out, &new_in, &r, &center)?;
    if new_out.is_negative() {
        return Err(QuoteError::PriceRange(id.to_string()));
    }

    // Round down then keep one wei in the pool
    let out: BigInt = (coordinate(&current, index_out) - new_out) / widen() - 1;
    let out = out.to_biguint().unwrap_or_default();
    if out >= balances[index_out] {
        return Err(QuoteError::PriceRange(id.to_string()));
    }
    Ok(out)
}

pub fn in_given_out(
    id: &str,
    ellipse: &Ellipse,
    balances: &[BigUint],
    index_in: usize,
    index_out: usize,
    amount_out: &BigUint,
) -> Result<BigUint, QuoteError> {
    if *amount_out >= balances[index_out] {
        return Err(QuoteError::PriceRange(id.to_string()));
    }
    let current = balances_hp(balances);
    let (r, center) = ellipse.invariant(id, &current)?;

    let new_out = coordinate(&current, index_out) - to_hp(amount_out);
    let new_in = ellipse.solve(id, index_in, &new_out, &r, &center)?;
    let delta = new_in - coordinate(&current, index_in);
    if delta.is_negative() {
        return Err(QuoteError::PriceRange(id.to_string()));
    }

    // Round up then add one wei
    let widen = widen();
    let amount_in: BigInt = (&delta + &widen - 1) / &widen + 1;
    amount_in
        .to_biguint()
        .ok_or_else(|| QuoteError::PriceRange(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::ONE;

    fn wad(v: u64) -> BigUint {
        BigUint::from(v) * ONE()
    }

    // Symmetric ellipse rotated by 45 degrees with price range [0.5, 2]
    fn ellipse(lambda: u64) -> Ellipse {
        let half_sqrt2 = BigUint::from(707_106_781_186_547_524u64);
        Ellipse::new(
            "e",
            &(ONE() / 2u32),
            &wad(2),
            &half_sqrt2,
            &half_sqrt2,
            &wad(lambda),
        )
        .unwrap()
    }

    #[test]
    fn current_balances_sit_on_the_curve() {
        let e = ellipse(10);
        let balances = (to_hp(&wad(1_200)), to_hp(&wad(900)));
        let (r, center) = e.invariant("e", &balances).unwrap();
        let y = e.y_given_x("e", &balances.0, &r, &center).unwrap();
        let x = e.x_given_y("e", &balances.1, &r, &center).unwrap();
        let tolerance = BigInt::from(10u64).pow(24);
        assert!((y - &balances.1).abs() < tolerance);
        assert!((x - &balances.0).abs() < tolerance);
    }

    #[test]
    fn balanced_pool_trades_near_par() {
        let e = ellipse(10);
        let balances = vec![wad(1_000), wad(1_000)];
        let out = out_given_in("e", &e, &balances, 0, 1, &wad(10)).unwrap();
        // constant product would give 9.90099
        assert!(out > wad(99) / 10u32);
        assert!(out < wad(10));

        let reverse = out_given_in("e", &e, &balances, 1, 0, &wad(10)).unwrap();
        let diff = if reverse > out { &reverse - &out } else { &out - &reverse };
        assert!(diff < BigUint::from(1_000_000u64));
    }

    #[test]
    fn draining_past_the_range_fails() {
        let e = ellipse(10);
        let balances = vec![wad(1_000), wad(1_000)];
        assert_eq!(
            out_given_in("e", &e, &balances, 0, 1, &wad(1_000_000)),
            Err(QuoteError::PriceRange("e".to_string()))
        );
        assert_eq!(
            in_given_out("e", &e, &balances, 0, 1, &wad(1_000)),
            Err(QuoteError::PriceRange("e".to_string()))
        );
    }

    #[test]
    fn in_given_out_lands_near_forward_quote() {
        let e = ellipse(4);
        let balances = vec![wad(1_200), wad(900)];
        let amount_in = wad(30);
        let out = out_given_in("e", &e, &balances, 0, 1, &amount_in).unwrap();
        let back = in_given_out("e", &e, &balances, 0, 1, &out).unwrap();
        let diff = if back > amount_in { &back - &amount_in } else { &amount_in - &back };
        assert!(diff < BigUint::from(1_000u32));
    }

    #[test]
    fn rejects_bad_parameters() {
        let half_sqrt2 = BigUint::from(707_106_781_186_547_524u64);
        assert!(Ellipse::new("e", &wad(2), &wad(1), &half_sqrt2, &half_sqrt2, &wad(2)).is_err());
        assert!(Ellipse::new("e", &wad(1), &wad(2), &half_sqrt2, &half_sqrt2, &(ONE() / 2u32)).is_err());
    }
}

use super::constants::{ONE, WAD_DECIMALS};
use super::error::MathError;
use super::math::{self, Rounding};
use super::types::Token;
use num_bigint::BigUint;
use num_traits::Zero;
use std::fmt;

/// A raw token amount together with its 18 decimal representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenAmount {
    pub token: Token,
    pub raw: BigUint,
    pub scale18: BigUint,
}

pub fn scaling_factor(token: &Token) -> Result<BigUint, MathError> {
    if token.decimals as u32 > WAD_DECIMALS {
        return Err(MathError::UnsupportedDecimals(token.decimals));
    }
    Ok(BigUint::from(10u64).pow(WAD_DECIMALS - token.decimals as u32))
}

impl TokenAmount {
    pub fn from_raw(token: &Token, raw: BigUint) -> Result<Self, MathError> {
        let scale18 = &raw * scaling_factor(token)?;
        Ok(Self {
            token: token.clone(),
            raw,
            scale18,
        })
    }

    /// Raw amount of a rate-bearing token; `scale18` includes the rate.
    pub fn from_raw_with_rate(
        token: &Token,
        raw: BigUint,
        rate: &BigUint,
        rounding: Rounding,
    ) -> Result<Self, MathError> {
        let scaled = &raw * scaling_factor(token)?;
        let scale18 = math::mul_div(&scaled, rate, &ONE(), rounding)?;
        Ok(Self {
            token: token.clone(),
            raw,
            scale18,
        })
    }

    /// Converts an 18 decimal, rate-adjusted value back to the native
    /// representation.
    pub fn from_scale18(
        token: &Token,
        scale18: BigUint,
        rate: &BigUint,
        rounding: Rounding,
    ) -> Result<Self, MathError> {
        let divisor = scaling_factor(token)? * rate;
        let raw = math::mul_div(&scale18, &ONE(), &divisor, rounding)?;
        // Keep scale18 consistent with what the raw amount is actually worth
        let scale18 = math::mul_div(&(&raw * scaling_factor(token)?), rate, &ONE(), rounding)?;
        Ok(Self {
            token: token.clone(),
            raw,
            scale18,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn checked_add(&self, other: &TokenAmount) -> Result<TokenAmount, MathError> {
        self.ensure_same_token(other)?;
        Ok(TokenAmount {
            token: self.token.clone(),
            raw: &self.raw + &other.raw,
            scale18: &self.scale18 + &other.scale18,
        })
    }

    pub fn checked_sub(&self, other: &TokenAmount) -> Result<TokenAmount, MathError> {
        self.ensure_same_token(other)?;
        Ok(TokenAmount {
            token: self.token.clone(),
            raw: math::checked_sub(&self.raw, &other.raw)?,
            scale18: math::checked_sub(&self.scale18, &other.scale18)?,
        })
    }

    fn ensure_same_token(&self, other: &TokenAmount) -> Result<(), MathError> {
        if !self.token.is(&other.token.address) {
            return Err(MathError::TokenMismatch(
                self.token.address.clone(),
                other.token.address.clone(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token.symbol {
            Some(symbol) => write!(f, "{} {}", self.raw, symbol),
            None => write!(f, "{} {}", self.raw, self.token.address),
        }
    }
}

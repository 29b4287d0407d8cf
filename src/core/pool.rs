use super::amount::TokenAmount;
use super::constants::{AMP_PRECISION, ONE, ROUND_TRIP_MAX_STEPS};
use super::error::{MathError, QuoteError};
use super::math::{self, complement, mul_up, Rounding};
use super::pools::gyro_eclp::Ellipse;
use super::pools::quant_amm::QuantAmmState;
use super::pools::{gyro_2clp, gyro_eclp, stable, weighted};
use super::types::{Pool, PoolToken, PoolType, SwapKind};
use num_bigint::BigUint;
use num_traits::{CheckedSub, One, Zero};

impl Pool {
    pub fn token_index(&self, address: &str) -> Result<usize, QuoteError> {
        self.tokens
            .iter()
            .position(|t| t.token.is(address))
            .ok_or_else(|| QuoteError::TokenNotInPool {
                pool: self.id.clone(),
                token: address.to_string(),
            })
    }

    pub fn pool_token(&self, address: &str) -> Result<&PoolToken, QuoteError> {
        Ok(&self.tokens[self.token_index(address)?])
    }

    /// Buffers wrap and unwrap ERC4626 shares. They are counted against the
    /// boosted hop budget rather than the ordinary one.
    pub fn is_boosted(&self) -> bool {
        matches!(self.pool_type, PoolType::Buffer)
    }

    /// Structural checks on the snapshot data. Pools failing here never make it
    /// into the graph.
    pub fn validate(&self) -> Result<(), QuoteError> {
        let id = self.id.as_str();
        let invalid = |reason: &'static str| -> Result<(), QuoteError> {
            Err(QuoteError::InvalidPool(id.to_string(), reason))
        };
        if self.tokens.len() < 2 {
            return invalid("fewer than two tokens");
        }
        if self.swap_fee >= ONE() {
            return invalid("swap fee must be below 1");
        }
        if self.tokens.iter().any(|t| t.token.decimals > 18) {
            return invalid("token decimals above 18");
        }
        if self.tokens.iter().any(|t| t.rate.is_zero()) {
            return invalid("token rate is zero");
        }

        match &self.pool_type {
            PoolType::Weighted { weights } => {
                weighted::validate_weights(id, weights, self.tokens.len())
            }
            PoolType::Stable { amp } if amp.is_zero() => invalid("amplification is zero"),
            PoolType::Stable { .. } => Ok(()),
            PoolType::Buffer if self.tokens.len() != 2 => invalid("buffer holds exactly two tokens"),
            PoolType::Buffer => Ok(()),
            PoolType::Gyro2Clp {
                sqrt_alpha,
                sqrt_beta,
            } => gyro_2clp::validate(id, sqrt_alpha, sqrt_beta, self.tokens.len()),
            PoolType::GyroEclp {
                alpha,
                beta,
                c,
                s,
                lambda,
            } => {
                if self.tokens.len() != 2 {
                    return invalid("exactly two tokens");
                }
                Ellipse::new(id, alpha, beta, c, s, lambda).map(|_| ())
            }
            PoolType::QuantAmm {
                weights,
                multipliers,
                ..
            } => {
                if weights.len() != self.tokens.len() || multipliers.len() != self.tokens.len() {
                    return invalid("one weight and multiplier per token");
                }
                Ok(())
            }
        }
    }

    // Live balances in 18 decimals with rates applied, rounded down
    fn scaled_balances(&self) -> Result<Vec<BigUint>, QuoteError> {
        self.tokens
            .iter()
            .map(|t| {
                TokenAmount::from_raw_with_rate(&t.token, t.balance.clone(), &t.rate, Rounding::Down)
                    .map(|amount| amount.scale18)
                    .map_err(QuoteError::from)
            })
            .collect()
    }

    fn pair_indices(&self, token_in: &str, token_out: &str) -> Result<(usize, usize), QuoteError> {
        let index_in = self.token_index(token_in)?;
        let index_out = self.token_index(token_out)?;
        if index_in == index_out {
            return Err(QuoteError::SameToken);
        }
        Ok((index_in, index_out))
    }

    // Family dispatch on scaled amounts. For GivenIn `amount` is the input
    // after fees and the result is the output; for GivenOut `amount` is the
    // output and the result the input before fees.
    fn swap_scaled(
        &self,
        kind: SwapKind,
        balances: &[BigUint],
        index_in: usize,
        index_out: usize,
        amount: &BigUint,
    ) -> Result<BigUint, QuoteError> {
        let id = self.id.as_str();
        match &self.pool_type {
            PoolType::Weighted { weights } => {
                let (b_in, w_in) = (&balances[index_in], &weights[index_in]);
                let (b_out, w_out) = (&balances[index_out], &weights[index_out]);
                match kind {
                    SwapKind::GivenIn => weighted::out_given_in(id, b_in, w_in, b_out, w_out, amount),
                    SwapKind::GivenOut => weighted::in_given_out(id, b_in, w_in, b_out, w_out, amount),
                }
            }
            PoolType::Stable { amp } => {
                let amp = amp * BigUint::from(AMP_PRECISION);
                match kind {
                    SwapKind::GivenIn => stable::out_given_in(id, &amp, balances, index_in, index_out, amount),
                    SwapKind::GivenOut => stable::in_given_out(id, &amp, balances, index_in, index_out, amount),
                }
            }
            // Rates already carry the share price, so wrapping is 1:1 in
            // scaled terms
            PoolType::Buffer => Ok(amount.clone()),
            PoolType::Gyro2Clp {
                sqrt_alpha,
                sqrt_beta,
            } => match kind {
                SwapKind::GivenIn => gyro_2clp::out_given_in(
                    id, balances, sqrt_alpha, sqrt_beta, index_in, index_out, amount,
                ),
                SwapKind::GivenOut => gyro_2clp::in_given_out(
                    id, balances, sqrt_alpha, sqrt_beta, index_in, index_out, amount,
                ),
            },
            PoolType::GyroEclp {
                alpha,
                beta,
                c,
                s,
                lambda,
            } => {
                let ellipse = Ellipse::new(id, alpha, beta, c, s, lambda)?;
                match kind {
                    SwapKind::GivenIn => {
                        gyro_eclp::out_given_in(id, &ellipse, balances, index_in, index_out, amount)
                    }
                    SwapKind::GivenOut => {
                        gyro_eclp::in_given_out(id, &ellipse, balances, index_in, index_out, amount)
                    }
                }
            }
            PoolType::QuantAmm {
                weights,
                multipliers,
                last_update_time,
                last_interpolation_time,
                timestamp,
            } => {
                let state = QuantAmmState {
                    weights,
                    multipliers,
                    last_update_time: *last_update_time,
                    last_interpolation_time: *last_interpolation_time,
                    timestamp: *timestamp,
                };
                match kind {
                    SwapKind::GivenIn => state.out_given_in(id, balances, index_in, index_out, amount),
                    SwapKind::GivenOut => state.in_given_out(id, balances, index_in, index_out, amount),
                }
            }
        }
    }

    fn fee(&self) -> BigUint {
        if self.is_boosted() {
            BigUint::zero()
        } else {
            self.swap_fee.clone()
        }
    }

    // Buffers with an empty balance wrap straight through the vault
    fn check_liquidity(&self, out: &PoolToken, amount_out: &BigUint) -> Result<(), QuoteError> {
        let unbounded = self.is_boosted() && out.balance.is_zero();
        if !unbounded && *amount_out >= out.balance {
            return Err(QuoteError::InsufficientLiquidity(self.id.clone()));
        }
        Ok(())
    }

    /// Output for an exact raw input, fee deducted from the input.
    pub fn quote_given_in(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: &BigUint,
    ) -> Result<TokenAmount, QuoteError> {
        self.validate()?;
        let (index_in, index_out) = self.pair_indices(token_in, token_out)?;
        let (pool_in, pool_out) = (&self.tokens[index_in], &self.tokens[index_out]);

        let scaled_in = TokenAmount::from_raw_with_rate(
            &pool_in.token,
            amount_in.clone(),
            &pool_in.rate,
            Rounding::Down,
        )?
        .scale18;
        let fee_amount = mul_up(&scaled_in, &self.fee());
        let net_in = math::checked_sub(&scaled_in, &fee_amount)?;

        let balances = self.scaled_balances()?;
        let scaled_out = self.swap_scaled(SwapKind::GivenIn, &balances, index_in, index_out, &net_in)?;
        let amount_out =
            TokenAmount::from_scale18(&pool_out.token, scaled_out, &pool_out.rate, Rounding::Down)?;

        self.check_liquidity(pool_out, &amount_out.raw)?;
        Ok(amount_out)
    }

    /// Input required for an exact raw output. Paying the result as an exact
    /// input always buys more than `amount_out`, so no forward trade pays
    /// more for the same output.
    pub fn quote_given_out(
        &self,
        token_in: &str,
        token_out: &str,
        amount_out: &BigUint,
    ) -> Result<TokenAmount, QuoteError> {
        let mut amount_in = self.estimate_given_out(token_in, token_out, amount_out)?;
        let pool_in = self.pool_token(token_in)?;

        for _ in 0..ROUND_TRIP_MAX_STEPS {
            let bought = match self.quote_given_in(token_in, token_out, &amount_in.raw) {
                Ok(bought) => bought.raw,
                // Past the forward domain, so above any input it accepts
                Err(_) => return Ok(amount_in),
            };
            if bought > *amount_out {
                return Ok(amount_in);
            }
            // Close the gap at the average price paid so far
            let missing = amount_out + 1u32 - &bought;
            let step = (missing * &amount_in.raw / bought.max(BigUint::one())).max(BigUint::one());
            amount_in = TokenAmount::from_raw_with_rate(
                &pool_in.token,
                &amount_in.raw + step,
                &pool_in.rate,
                Rounding::Up,
            )?;
        }
        Err(QuoteError::from(MathError::NoConvergence("exact output quote")))
    }

    // Closed form input for `amount_out`, grossed up by the fee
    fn estimate_given_out(
        &self,
        token_in: &str,
        token_out: &str,
        amount_out: &BigUint,
    ) -> Result<TokenAmount, QuoteError> {
        self.validate()?;
        let (index_in, index_out) = self.pair_indices(token_in, token_out)?;
        let (pool_in, pool_out) = (&self.tokens[index_in], &self.tokens[index_out]);
        self.check_liquidity(pool_out, amount_out)?;

        let scaled_out = TokenAmount::from_raw_with_rate(
            &pool_out.token,
            amount_out.clone(),
            &pool_out.rate,
            Rounding::Up,
        )?
        .scale18;

        let balances = self.scaled_balances()?;
        let scaled_in = self.swap_scaled(SwapKind::GivenOut, &balances, index_in, index_out, &scaled_out)?;
        let gross_in = math::div_up(&scaled_in, &complement(&self.fee()))?;

        Ok(TokenAmount::from_scale18(
            &pool_in.token,
            gross_in,
            &pool_in.rate,
            Rounding::Up,
        )?)
    }

    /// Pool state after a hop moved `amount_in` in and `amount_out` out.
    pub fn apply_swap(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: &BigUint,
        amount_out: &BigUint,
    ) -> Result<Pool, QuoteError> {
        let (index_in, index_out) = self.pair_indices(token_in, token_out)?;
        let mut updated = self.clone();
        updated.tokens[index_in].balance += amount_in;

        let out = &mut updated.tokens[index_out];
        out.balance = if self.is_boosted() && out.balance.is_zero() {
            BigUint::zero()
        } else {
            out.balance
                .checked_sub(amount_out)
                .ok_or_else(|| QuoteError::InsufficientLiquidity(self.id.clone()))?
        };
        Ok(updated)
    }
}

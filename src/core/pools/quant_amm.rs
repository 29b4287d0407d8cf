use super::super::error::QuoteError;
use super::weighted;
use num_bigint::{BigInt, BigUint, Sign};

/// Weights drift linearly from `last_update_time` at `multipliers` per
/// second and stop moving at `last_interpolation_time`.
pub fn interpolated_weights(
    id: &str,
    weights: &[BigUint],
    multipliers: &[i128],
    last_update_time: u64,
    last_interpolation_time: u64,
    timestamp: u64,
) -> Result<Vec<BigUint>, QuoteError> {
    if weights.len() != multipliers.len() {
        return Err(QuoteError::InvalidPool(id.to_string(), "one multiplier per weight"));
    }
    let elapsed = timestamp.min(last_interpolation_time).saturating_sub(last_update_time);

    weights
        .iter()
        .zip(multipliers)
        .map(|(weight, multiplier)| {
            let drift = BigInt::from(*multiplier) * BigInt::from(elapsed);
            let current = BigInt::from_biguint(Sign::Plus, weight.clone()) + drift;
            current
                .to_biguint()
                .ok_or_else(|| QuoteError::InvalidPool(id.to_string(), "interpolated weight below zero"))
        })
        .collect()
}

pub struct QuantAmmState<'a> {
    pub weights: &'a [BigUint],
    pub multipliers: &'a [i128],
    pub last_update_time: u64,
    pub last_interpolation_time: u64,
    pub timestamp: u64,
}

impl QuantAmmState<'_> {
    fn current(&self, id: &str, token_count: usize) -> Result<Vec<BigUint>, QuoteError> {
        let weights = interpolated_weights(
            id,
            self.weights,
            self.multipliers,
            self.last_update_time,
            self.last_interpolation_time,
            self.timestamp,
        )?;
        weighted::validate_weights(id, &weights, token_count)?;
        Ok(weights)
    }

    pub fn out_given_in(
        &self,
        id: &str,
        balances: &[BigUint],
        index_in: usize,
        index_out: usize,
        amount_in: &BigUint,
    ) -> Result<BigUint, QuoteError> {
        let weights = self.current(id, balances.len())?;
        weighted::out_given_in(
            id,
            &balances[index_in],
            &weights[index_in],
            &balances[index_out],
            &weights[index_out],
            amount_in,
        )
    }

    pub fn in_given_out(
        &self,
        id: &str,
        balances: &[BigUint],
        index_in: usize,
        index_out: usize,
        amount_out: &BigUint,
    ) -> Result<BigUint, QuoteError> {
        let weights = self.current(id, balances.len())?;
        weighted::in_given_out(
            id,
            &balances[index_in],
            &weights[index_in],
            &balances[index_out],
            &weights[index_out],
            amount_out,
        )
    }
}

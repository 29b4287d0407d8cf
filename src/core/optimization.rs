use super::amount::TokenAmount;
use super::constants::ONE;
use super::error::QuoteError;
use super::math::{self, complement, Rounding};
use super::types::{PathWithAmount, PoolMap, SwapKind, SwapRoute, TradePath};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

// Spot rate is sampled with this fraction of the swap amount
const SPOT_SAMPLE_DIVISOR: u32 = 10_000;

/// Splits a trade across candidate paths by handing out equal increments to
/// whichever path has the best marginal price at that point.
pub struct Optimizer<'a> {
    pools: &'a PoolMap,
    kind: SwapKind,
    total_amount: BigUint,
    max_paths: usize,
    split_steps: usize,
    cancel: &'a CancellationToken,
}

pub fn optimize_route(
    paths: &[TradePath],
    pools: &PoolMap,
    kind: SwapKind,
    amount: &BigUint,
    max_paths: usize,
    split_steps: usize,
    cancel: &CancellationToken,
) -> Option<SwapRoute> {
    Optimizer::new(pools, kind, amount.clone(), max_paths, split_steps, cancel).optimize(paths)
}

impl<'a> Optimizer<'a> {
    pub fn new(
        pools: &'a PoolMap,
        kind: SwapKind,
        total_amount: BigUint,
        max_paths: usize,
        split_steps: usize,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            pools,
            kind,
            total_amount,
            max_paths,
            split_steps,
            cancel,
        }
    }

    // True when `a` returns a better amount than `b` for this trade direction
    fn better(&self, a: &BigUint, b: &BigUint) -> bool {
        match self.kind {
            SwapKind::GivenIn => a > b,
            SwapKind::GivenOut => a < b,
        }
    }

    fn price(&self, path: &TradePath, amount: &BigUint) -> Result<PathWithAmount, QuoteError> {
        path.price(self.kind, amount, self.pools)
    }

    // Full amount on one path. Paths that fail or return nothing drop out.
    fn rank_candidate(&self, path: &TradePath) -> Option<PathWithAmount> {
        match self.price(path, &self.total_amount) {
            Ok(priced) if !priced.return_amount(self.kind).is_zero() => Some(priced),
            Ok(_) => {
                tracing::debug!(target: "optimizer", path=%path, "Path returns nothing");
                None
            }
            Err(e) => {
                tracing::debug!(target: "optimizer", path=%path, error=%e, "Path rejected");
                None
            }
        }
    }

    /// `None` when no candidate path can carry the full amount or the search
    /// was cancelled before any could be priced.
    pub fn optimize(&self, paths: &[TradePath]) -> Option<SwapRoute> {
        let ranked: Vec<PathWithAmount> = paths
            .par_iter()
            .filter_map(|path| {
                // Keep whatever was priced before the deadline
                if self.cancel.is_cancelled() {
                    return None;
                }
                self.rank_candidate(path)
            })
            .collect();
        self.allocate(ranked)
    }

    /// Picks between the best single path and a split across the top
    /// `max_paths` of `ranked`. Once cancelled the best single path stands.
    pub fn allocate(&self, mut ranked: Vec<PathWithAmount>) -> Option<SwapRoute> {
        if ranked.is_empty() {
            return None;
        }

        // Stable sort keeps enumeration order between equal quotes
        ranked.sort_by(|a, b| {
            let (a, b) = (&a.return_amount(self.kind).raw, &b.return_amount(self.kind).raw);
            match self.kind {
                SwapKind::GivenIn => b.cmp(a),
                SwapKind::GivenOut => a.cmp(b),
            }
        });
        ranked.truncate(self.max_paths.max(1));

        let best_path = ranked[0].path.clone();
        let single = self.single_route(ranked[0].clone());
        let route = if ranked.len() > 1 && self.split_steps > 1 {
            match self.split(&ranked) {
                Some(split) if self.better(&split.return_amount, &single.return_amount) => split,
                _ => single,
            }
        } else {
            single
        };

        Some(self.with_price_impact(route, &best_path))
    }

    fn single_route(&self, priced: PathWithAmount) -> SwapRoute {
        let return_amount = priced.return_amount(self.kind).raw.clone();
        SwapRoute {
            swap_kind: self.kind,
            paths: vec![priced],
            swap_amount: self.total_amount.clone(),
            return_amount,
            price_impact: BigUint::zero(),
        }
    }

    // Greedy marginal allocation, then a joint re-price of the chosen split.
    // Gives up (None) when cancelled or when an increment fits nowhere.
    fn split(&self, candidates: &[PathWithAmount]) -> Option<SwapRoute> {
        let steps = BigUint::from(self.split_steps);
        let increment = &self.total_amount / &steps;
        if increment.is_zero() {
            return None;
        }
        let last_increment = &self.total_amount - &increment * (&steps - BigUint::one());

        let mut allocations = vec![BigUint::zero(); candidates.len()];
        // Return amount of every candidate at its current allocation
        let mut values: Vec<Option<TokenAmount>> = vec![None; candidates.len()];

        for step in 0..self.split_steps {
            if self.cancel.is_cancelled() {
                tracing::debug!(target: "optimizer", step, "Cancelled, keeping best single path");
                return None;
            }
            let increment = if step + 1 == self.split_steps {
                &last_increment
            } else {
                &increment
            };

            let quotes: Vec<Option<TokenAmount>> = candidates
                .par_iter()
                .zip(allocations.par_iter())
                .map(|(candidate, allocated)| {
                    self.price(&candidate.path, &(allocated + increment))
                        .ok()
                        .map(|priced| priced.return_amount(self.kind).clone())
                })
                .collect();

            let mut chosen: Option<(usize, BigUint, TokenAmount)> = None;
            for (i, quote) in quotes.into_iter().enumerate() {
                let Some(quote) = quote else { continue };
                // GivenIn gains output, GivenOut pays more input
                let marginal = match &values[i] {
                    Some(current) => quote.checked_sub(current).map(|gap| gap.raw).unwrap_or_default(),
                    None => quote.raw.clone(),
                };
                let replace = match &chosen {
                    None => true,
                    Some((_, best, _)) => self.better(&marginal, best),
                };
                if replace {
                    chosen = Some((i, marginal, quote));
                }
            }

            let (i, _, quote) = chosen?;
            allocations[i] += increment;
            values[i] = Some(quote);
        }

        self.reprice(candidates, &allocations)
    }

    // Prices the allocation path after path against one working copy of the
    // pools so that shared pools are only drained once.
    fn reprice(&self, candidates: &[PathWithAmount], allocations: &[BigUint]) -> Option<SwapRoute> {
        let mut working = PoolMap::new();
        for candidate in candidates {
            for hop in &candidate.path.hops {
                if let Some(pool) = self.pools.get(&hop.pool_id) {
                    working.entry(hop.pool_id.clone()).or_insert_with(|| pool.clone());
                }
            }
        }

        let mut paths = Vec::new();
        let mut total: Option<TokenAmount> = None;
        for (candidate, allocated) in candidates.iter().zip(allocations) {
            if allocated.is_zero() {
                continue;
            }
            let priced = match candidate.path.price_on(self.kind, allocated, &mut working) {
                Ok(priced) => priced,
                Err(e) => {
                    tracing::debug!(target: "optimizer", path=%candidate.path, error=%e, "Split no longer fits");
                    return None;
                }
            };
            let leg = priced.return_amount(self.kind);
            total = match total {
                None => Some(leg.clone()),
                Some(sum) => match sum.checked_add(leg) {
                    Ok(sum) => Some(sum),
                    Err(e) => {
                        tracing::warn!(target: "optimizer", path=%candidate.path, error=%e, "Split legs disagree on token");
                        return None;
                    }
                },
            };
            paths.push(priced);
        }

        Some(SwapRoute {
            swap_kind: self.kind,
            paths,
            swap_amount: self.total_amount.clone(),
            return_amount: total?.raw,
            price_impact: BigUint::zero(),
        })
    }

    // 1 - effective rate / spot rate, the spot rate taken from a small sample
    // trade on the best path. Zero when the sample cannot be priced.
    fn with_price_impact(&self, mut route: SwapRoute, best_path: &TradePath) -> SwapRoute {
        let sample = (&self.total_amount / SPOT_SAMPLE_DIVISOR).max(BigUint::one());
        let sample_return = match self.price(best_path, &sample) {
            Ok(priced) => priced.return_amount(self.kind).raw.clone(),
            Err(_) => return route,
        };

        let ratio = match self.kind {
            SwapKind::GivenIn => math::mul_div(
                &(&route.return_amount * &sample),
                &ONE(),
                &(&self.total_amount * &sample_return),
                Rounding::Up,
            ),
            SwapKind::GivenOut => math::mul_div(
                &(&self.total_amount * &sample_return),
                &ONE(),
                &(&route.return_amount * &sample),
                Rounding::Up,
            ),
        };
        if let Ok(ratio) = ratio {
            route.price_impact = complement(&ratio);
        }
        route
    }
}

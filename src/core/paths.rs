use super::amount::TokenAmount;
use super::error::QuoteError;
use super::types::{Graph, GraphTraversalConfig, Hop, PathWithAmount, PoolMap, SwapKind, TradePath};
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::HashSet;
use std::fmt;
use tokio_util::sync::CancellationToken;

impl Graph {
    /// Every simple path from `token_in` to `token_out` within the hop
    /// budgets. A path never uses a pool twice nor visits a token twice.
    pub fn find_paths(
        &self,
        token_in: &str,
        token_out: &str,
        config: &GraphTraversalConfig,
    ) -> Vec<TradePath> {
        self.find_paths_until(token_in, token_out, config, &CancellationToken::new())
    }

    /// `find_paths` that stops descending once `cancel` fires and returns
    /// the paths found so far.
    pub fn find_paths_until(
        &self,
        token_in: &str,
        token_out: &str,
        config: &GraphTraversalConfig,
        cancel: &CancellationToken,
    ) -> Vec<TradePath> {
        let (start, target) = (token_in.to_lowercase(), token_out.to_lowercase());
        let mut all_paths = Vec::new();
        if start == target {
            return all_paths;
        }
        let mut visited = HashSet::new();
        let mut used_pools = HashSet::new();
        let mut current_path = Vec::new();

        self.dfs(
            &start,
            &target,
            config,
            cancel,
            &mut visited,
            &mut used_pools,
            &mut current_path,
            &mut all_paths,
        );

        all_paths
    }

    #[allow(clippy::too_many_arguments)]
    fn dfs(
        &self,
        current: &str,
        target: &str,
        config: &GraphTraversalConfig,
        cancel: &CancellationToken,
        visited: &mut HashSet<String>,
        used_pools: &mut HashSet<String>,
        current_path: &mut Vec<Hop>,
        all_paths: &mut Vec<TradePath>,
    ) {
        if current == target {
            all_paths.push(TradePath {
                hops: current_path.clone(),
            });
            return;
        }
        if cancel.is_cancelled() {
            return;
        }
        visited.insert(current.to_string());

        let boosted = current_path.iter().filter(|h| h.boosted).count();
        let ordinary = current_path.len() - boosted;

        for hop in self.neighbors(current) {
            if visited.contains(&hop.token_out) || used_pools.contains(&hop.pool_id) {
                continue;
            }
            let within_budget = if hop.boosted {
                boosted < config.max_boosted_depth
            } else {
                ordinary < config.max_depth
            };
            if !within_budget {
                continue;
            }

            used_pools.insert(hop.pool_id.clone());
            current_path.push(hop.clone());
            self.dfs(
                &hop.token_out,
                target,
                config,
                cancel,
                visited,
                used_pools,
                current_path,
                all_paths,
            );
            current_path.pop();
            used_pools.remove(&hop.pool_id);
        }

        visited.remove(current);
    }
}

impl TradePath {
    pub fn token_in(&self) -> &str {
        self.hops.first().map(|h| h.token_in.as_str()).unwrap_or_default()
    }

    pub fn token_out(&self) -> &str {
        self.hops.last().map(|h| h.token_out.as_str()).unwrap_or_default()
    }

    /// Tokens visited in order, endpoints included.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.hops.iter().map(|h| h.token_in.clone()).collect();
        if let Some(last) = self.hops.last() {
            tokens.push(last.token_out.clone());
        }
        tokens
    }

    pub fn pool_ids(&self) -> Vec<String> {
        self.hops.iter().map(|h| h.pool_id.clone()).collect()
    }

    /// Prices the path against a snapshot without touching it.
    pub fn price(
        &self,
        kind: SwapKind,
        amount: &BigUint,
        pools: &PoolMap,
    ) -> Result<PathWithAmount, QuoteError> {
        let mut working = PoolMap::new();
        for hop in &self.hops {
            let pool = pools
                .get(&hop.pool_id)
                .ok_or_else(|| QuoteError::UnknownPool(hop.pool_id.clone()))?;
            working.insert(hop.pool_id.clone(), pool.clone());
        }
        self.price_on(kind, amount, &mut working)
    }

    /// Prices the path and leaves the moved balances in `pools`, so paths
    /// priced one after the other see each other's effect on shared pools.
    pub fn price_on(
        &self,
        kind: SwapKind,
        amount: &BigUint,
        pools: &mut PoolMap,
    ) -> Result<PathWithAmount, QuoteError> {
        match kind {
            SwapKind::GivenIn => self.price_forward(amount, pools),
            SwapKind::GivenOut => self.price_backward(amount, pools),
        }
    }

    fn price_forward(&self, amount_in: &BigUint, pools: &mut PoolMap) -> Result<PathWithAmount, QuoteError> {
        let mut hop_amounts = Vec::with_capacity(self.hops.len());
        let mut current = amount_in.clone();

        for hop in &self.hops {
            let pool = pools
                .get(&hop.pool_id)
                .ok_or_else(|| QuoteError::UnknownPool(hop.pool_id.clone()))?;
            let hop_in = TokenAmount::from_raw(&pool.pool_token(&hop.token_in)?.token, current.clone())?;
            let hop_out = pool.quote_given_in(&hop.token_in, &hop.token_out, &current)?;
            if hop_out.is_zero() && !current.is_zero() {
                return Err(QuoteError::InsufficientLiquidity(hop.pool_id.clone()));
            }

            let updated = pool.apply_swap(&hop.token_in, &hop.token_out, &current, &hop_out.raw)?;
            pools.insert(hop.pool_id.clone(), updated);
            current = hop_out.raw.clone();
            hop_amounts.push((hop_in, hop_out));
        }

        self.assemble(hop_amounts)
    }

    fn price_backward(&self, amount_out: &BigUint, pools: &mut PoolMap) -> Result<PathWithAmount, QuoteError> {
        let mut hop_amounts = Vec::with_capacity(self.hops.len());
        let mut current = amount_out.clone();

        for hop in self.hops.iter().rev() {
            let pool = pools
                .get(&hop.pool_id)
                .ok_or_else(|| QuoteError::UnknownPool(hop.pool_id.clone()))?;
            let hop_out = TokenAmount::from_raw(&pool.pool_token(&hop.token_out)?.token, current.clone())?;
            let hop_in = pool.quote_given_out(&hop.token_in, &hop.token_out, &current)?;

            let updated = pool.apply_swap(&hop.token_in, &hop.token_out, &hop_in.raw, &current)?;
            pools.insert(hop.pool_id.clone(), updated);
            current = hop_in.raw.clone();
            hop_amounts.push((hop_in, hop_out));
        }
        hop_amounts.reverse();

        self.assemble(hop_amounts)
    }

    fn assemble(&self, hop_amounts: Vec<(TokenAmount, TokenAmount)>) -> Result<PathWithAmount, QuoteError> {
        let (input_amount, output_amount) = match (hop_amounts.first(), hop_amounts.last()) {
            (Some(first), Some(last)) => (first.0.clone(), last.1.clone()),
            _ => return Err(QuoteError::SameToken),
        };
        Ok(PathWithAmount {
            path: self.clone(),
            hop_amounts,
            input_amount,
            output_amount,
        })
    }
}

impl fmt::Display for TradePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token_in())?;
        for hop in &self.hops {
            write!(f, " -[{}]-> {}", hop.pool_id, hop.token_out)?;
        }
        Ok(())
    }
}

use super::constants::MAX_ROUTE_ATTEMPTS;
use super::optimization::optimize_route;
use super::token_graph::build_graph;
use super::types::{GraphTraversalConfig, Pool, PoolMap, ProtocolVersion, SwapKind, SwapRoute};
use num_bigint::BigUint;
use tokio_util::sync::CancellationToken;

/// Everything needed to route one request inside one universe.
#[derive(Clone, Debug)]
pub struct UniverseQuery {
    pub universe: ProtocolVersion,
    pub token_in: String,
    pub token_out: String,
    pub swap_kind: SwapKind,
    pub amount: BigUint,
    pub traversal: GraphTraversalConfig,
    pub split_steps: usize,
}

/// Builds the graph once, then enumerates and prices paths. When nothing
/// prices feasibly the search is repeated once with one more ordinary hop
/// allowed. `None` means the universe has no route.
pub fn route_universe(
    query: &UniverseQuery,
    pools: &[Pool],
    cancel: &CancellationToken,
) -> Option<SwapRoute> {
    let pools: Vec<Pool> = pools
        .iter()
        .filter(|p| p.protocol_version == query.universe)
        .cloned()
        .collect();
    let graph = build_graph(&pools, query.universe);
    let pool_map: PoolMap = pools.into_iter().map(|p| (p.id.clone(), p)).collect();

    let mut traversal = query.traversal.clone();
    for attempt in 1..=MAX_ROUTE_ATTEMPTS {
        let paths = graph.find_paths_until(&query.token_in, &query.token_out, &traversal, cancel);
        tracing::debug!(
            target: "router",
            universe=%query.universe,
            attempt,
            max_depth=traversal.max_depth,
            paths=paths.len(),
            "Enumerated candidate paths"
        );

        if let Some(route) = optimize_route(
            &paths,
            &pool_map,
            query.swap_kind,
            &query.amount,
            traversal.max_paths,
            query.split_steps,
            cancel,
        ) {
            return Some(route);
        }
        if cancel.is_cancelled() {
            break;
        }
        traversal.max_depth += 1;
    }

    tracing::debug!(target: "router", universe=%query.universe, "No feasible route");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::ONE;
    use crate::core::types::{PoolToken, PoolType, Token};

    fn pair(id: &str, a: &str, b: &str, balance: u64) -> Pool {
        Pool {
            id: id.to_string(),
            address: id.to_string(),
            protocol_version: ProtocolVersion::V3,
            pool_type: PoolType::Weighted {
                weights: vec![ONE() / 2u32, ONE() / 2u32],
            },
            tokens: vec![
                PoolToken::new(Token::new(a, 18), ONE() * BigUint::from(balance)),
                PoolToken::new(Token::new(b, 18), ONE() * BigUint::from(balance)),
            ],
            swap_fee: ONE() * 3u32 / 1_000u32,
        }
    }

    fn query(max_depth: usize) -> UniverseQuery {
        UniverseQuery {
            universe: ProtocolVersion::V3,
            token_in: "a".to_string(),
            token_out: "d".to_string(),
            swap_kind: SwapKind::GivenIn,
            amount: ONE() * 10u32,
            traversal: GraphTraversalConfig {
                max_depth,
                max_boosted_depth: 0,
                max_paths: 4,
            },
            split_steps: 20,
        }
    }

    #[test]
    fn retry_adds_one_hop() {
        let pools = vec![pair("ab", "a", "b", 1_000), pair("bc", "b", "c", 1_000), pair("cd", "c", "d", 1_000)];
        let cancel = CancellationToken::new();

        let route = route_universe(&query(2), &pools, &cancel).unwrap();
        assert_eq!(route.paths[0].path.hops.len(), 3);

        // Only one retry is made
        assert!(route_universe(&query(1), &pools, &cancel).is_none());
    }

    #[test]
    fn other_universe_pools_are_ignored() {
        let mut v2 = pair("ad", "a", "d", 1_000);
        v2.protocol_version = ProtocolVersion::V2;
        let cancel = CancellationToken::new();
        assert!(route_universe(&query(3), &[v2], &cancel).is_none());
    }
}

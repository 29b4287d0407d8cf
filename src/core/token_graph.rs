use super::types::{Graph, Hop, Pool, ProtocolVersion};
use std::collections::HashMap;

/// Token graph of one liquidity universe. Every pool contributes an edge for
/// each ordered pair of its tokens; edges of different pools between the same
/// tokens stay separate. Edge order follows snapshot order.
pub fn build_graph(pools: &[Pool], version: ProtocolVersion) -> Graph {
    let mut graph = Graph::new();

    for pool in pools.iter().filter(|p| p.protocol_version == version) {
        if let Err(e) = pool.validate() {
            tracing::warn!(target: "graph", pool=%pool.id, error=%e, "Skipping pool with invalid snapshot data");
            continue;
        }
        let boosted = pool.is_boosted();
        for (i, from) in pool.tokens.iter().enumerate() {
            for to in pool.tokens.iter().skip(i + 1) {
                graph.add_edge(&pool.id, &from.token.address, &to.token.address, boosted);
            }
        }
    }

    tracing::debug!(target: "graph", universe=%version, tokens=graph.edges.len(), "Token graph built");
    graph
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            edges: HashMap::new(),
        }
    }

    // Add edge for both directions since a pool swaps either way
    pub fn add_edge(&mut self, pool_id: &str, from: &str, to: &str, boosted: bool) {
        let (from, to) = (from.to_lowercase(), to.to_lowercase());

        self.edges.entry(from.clone()).or_default().push(Hop {
            pool_id: pool_id.to_string(),
            token_in: from.clone(),
            token_out: to.clone(),
            boosted,
        });

        self.edges.entry(to.clone()).or_default().push(Hop {
            pool_id: pool_id.to_string(),
            token_in: to,
            token_out: from,
            boosted,
        });
    }

    pub fn neighbors(&self, token: &str) -> &[Hop] {
        self.edges
            .get(&token.to_lowercase())
            .map(|hops| hops.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::ONE;
    use crate::core::types::{PoolToken, PoolType, Token};
    use num_bigint::BigUint;

    fn pool(id: &str, version: ProtocolVersion, tokens: &[&str]) -> Pool {
        let weight = ONE() / BigUint::from(tokens.len());
        Pool {
            id: id.to_string(),
            address: id.to_string(),
            protocol_version: version,
            pool_type: PoolType::Weighted {
                weights: vec![weight; tokens.len()],
            },
            tokens: tokens
                .iter()
                .map(|t| PoolToken::new(Token::new(t, 18), ONE() * 1_000u32))
                .collect(),
            swap_fee: BigUint::from(0u32),
        }
    }

    #[test]
    fn three_token_pool_connects_every_pair() {
        let graph = build_graph(&[pool("p", ProtocolVersion::V3, &["a", "b", "c"])], ProtocolVersion::V3);
        assert_eq!(graph.neighbors("a").len(), 2);
        assert_eq!(graph.neighbors("b").len(), 2);
        assert_eq!(graph.neighbors("c").len(), 2);
    }

    #[test]
    fn parallel_pools_keep_separate_edges() {
        let pools = vec![
            pool("p1", ProtocolVersion::V2, &["a", "b"]),
            pool("p2", ProtocolVersion::V2, &["A", "B"]),
        ];
        let graph = build_graph(&pools, ProtocolVersion::V2);
        let ids: Vec<&str> = graph.neighbors("a").iter().map(|h| h.pool_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn other_universes_and_invalid_pools_are_left_out() {
        let mut broken = pool("broken", ProtocolVersion::V3, &["a", "c"]);
        broken.pool_type = PoolType::Weighted { weights: vec![] };
        let pools = vec![
            pool("v2", ProtocolVersion::V2, &["a", "b"]),
            broken,
            pool("v3", ProtocolVersion::V3, &["a", "d"]),
        ];
        let graph = build_graph(&pools, ProtocolVersion::V3);
        let hops = graph.neighbors("a");
        assert_eq!(hops.len(), 1);
        assert_eq!(hops[0].pool_id, "v3");
        assert!(graph.neighbors("b").is_empty());
    }
}

use num_bigint::BigUint;
use std::time::{Duration, Instant};
use swap_router::core::constants::ONE;
use swap_router::core::error::RouterError;
use swap_router::core::indexer::pool::{write_pool_snapshot_on_disk, FileSnapshotProvider};
use swap_router::core::types::{
    GraphTraversalConfig, Pool, PoolToken, PoolType, ProtocolVersion, RouteRequest, SwapKind, Token,
};
use swap_router::orchestrator::{get_aggregator_quotes, route};
use swap_router::types::{Quote, RouterConfig, SwapKindParam};

const DAI: &str = "0x6B175474E89094C44DA98B954EEDEAC495271D0F";
const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

fn units(n: u64) -> BigUint {
    ONE() * BigUint::from(n)
}

fn weighted_pool(id: &str, version: ProtocolVersion, a: &str, b: &str, balance_a: u64, balance_b: u64) -> Pool {
    Pool {
        id: id.to_string(),
        address: id.to_string(),
        protocol_version: version,
        pool_type: PoolType::Weighted {
            weights: vec![ONE() / 2u32, ONE() / 2u32],
        },
        tokens: vec![
            PoolToken::new(Token::new(a, 18), units(balance_a)),
            PoolToken::new(Token::new(b, 18), units(balance_b)),
        ],
        swap_fee: ONE() * 3u32 / 1_000u32,
    }
}

fn request(kind: SwapKind, amount: BigUint, pools: Vec<Pool>, max_depth: usize) -> RouteRequest {
    RouteRequest {
        token_in: DAI.to_string(),
        token_out: USDC.to_string(),
        swap_kind: kind,
        amount,
        universe: None,
        pools,
        traversal: GraphTraversalConfig {
            max_depth,
            max_boosted_depth: 0,
            max_paths: 4,
        },
    }
}

fn between(value: &BigUint, low: u64, high: u64) -> bool {
    *value > units(low) && *value < units(high)
}

#[tokio::test]
async fn single_pool_quote_pays_the_fee() {
    let config = RouterConfig::default();
    let pools = vec![weighted_pool("p", ProtocolVersion::V3, DAI, USDC, 1_000_000, 1_000_000)];

    let response = route(&config, request(SwapKind::GivenIn, units(1_000), pools, 3))
        .await
        .unwrap();

    assert!(between(&response.return_amount, 990, 997));
    assert_eq!(response.chosen_universe, Some(ProtocolVersion::V3));
    assert_eq!(response.paths.len(), 1);
    assert_eq!(response.paths[0].pools, vec!["p".to_string()]);
    assert_eq!(response.paths[0].tokens, vec![DAI.to_lowercase(), USDC.to_string()]);
    assert_eq!(response.token_in, DAI.to_lowercase());
}

#[tokio::test]
async fn depth_controls_multi_hop_routes() {
    let config = RouterConfig::default();
    let pools = vec![
        weighted_pool("direct", ProtocolVersion::V3, DAI, USDC, 100, 100),
        weighted_pool("dai-weth", ProtocolVersion::V3, DAI, WETH, 1_000_000, 1_000_000),
        weighted_pool("weth-usdc", ProtocolVersion::V3, WETH, USDC, 1_000_000, 1_000_000),
    ];

    let shallow = route(&config, request(SwapKind::GivenIn, units(10), pools.clone(), 1))
        .await
        .unwrap();
    assert!(shallow.paths.iter().all(|p| p.pools.len() == 1));

    let deep = route(&config, request(SwapKind::GivenIn, units(10), pools, 2))
        .await
        .unwrap();
    assert!(deep.paths.iter().any(|p| p.pools.len() == 2));
    assert!(deep.return_amount > shallow.return_amount);
}

#[tokio::test]
async fn identical_tokens_rejected() {
    let config = RouterConfig::default();
    let mut req = request(SwapKind::GivenIn, units(1), vec![], 3);
    req.token_out = DAI.to_lowercase();

    assert_eq!(
        route(&config, req).await,
        Err(RouterError::IdenticalTokens(DAI.to_lowercase()))
    );
}

#[tokio::test]
async fn zero_amount_rejected() {
    let config = RouterConfig::default();
    let req = request(SwapKind::GivenIn, BigUint::from(0u32), vec![], 3);
    assert_eq!(route(&config, req).await, Err(RouterError::NonPositiveAmount));
}

#[tokio::test]
async fn depleted_pool_cannot_serve_exact_output() {
    let config = RouterConfig::default();
    let pools = vec![weighted_pool("thin", ProtocolVersion::V3, DAI, USDC, 1_000, 100)];

    let response = route(&config, request(SwapKind::GivenOut, units(100), pools, 3))
        .await
        .unwrap();
    assert_eq!(response.return_amount, BigUint::from(0u32));
    assert!(response.paths.is_empty());
    assert_eq!(response.chosen_universe, None);
}

#[tokio::test]
async fn unconnected_tokens_have_no_route() {
    let config = RouterConfig::default();
    let pools = vec![weighted_pool("other", ProtocolVersion::V3, DAI, WETH, 1_000, 1_000)];

    let response = route(&config, request(SwapKind::GivenIn, units(1), pools, 3))
        .await
        .unwrap();
    assert_eq!(response.return_amount, BigUint::from(0u32));
    assert!(response.paths.is_empty());
    assert_eq!(response.price_impact, 0.0);
}

#[tokio::test]
async fn routing_is_deterministic() {
    let config = RouterConfig::default();
    let pools = vec![
        weighted_pool("a", ProtocolVersion::V3, DAI, USDC, 50_000, 50_000),
        weighted_pool("b", ProtocolVersion::V3, DAI, USDC, 80_000, 80_000),
        weighted_pool("dai-weth", ProtocolVersion::V3, DAI, WETH, 60_000, 60_000),
        weighted_pool("weth-usdc", ProtocolVersion::V3, WETH, USDC, 60_000, 60_000),
    ];

    let first = route(&config, request(SwapKind::GivenIn, units(5_000), pools.clone(), 2))
        .await
        .unwrap();
    let second = route(&config, request(SwapKind::GivenIn, units(5_000), pools, 2))
        .await
        .unwrap();
    assert_eq!(first, second);
    assert!(first.paths.len() > 1);
}

#[tokio::test]
async fn deeper_universe_wins_for_both_kinds() {
    let config = RouterConfig::default();
    let pools = vec![
        weighted_pool("shallow", ProtocolVersion::V2, DAI, USDC, 10_000, 10_000),
        weighted_pool("deep", ProtocolVersion::V3, DAI, USDC, 1_000_000, 1_000_000),
    ];

    let given_in = route(&config, request(SwapKind::GivenIn, units(1_000), pools.clone(), 3))
        .await
        .unwrap();
    assert_eq!(given_in.chosen_universe, Some(ProtocolVersion::V3));

    // Exact output: the universe asking for less input wins
    let given_out = route(&config, request(SwapKind::GivenOut, units(1_000), pools, 3))
        .await
        .unwrap();
    assert_eq!(given_out.chosen_universe, Some(ProtocolVersion::V3));
    assert!(between(&given_out.return_amount, 1_000, 1_010));
}

#[tokio::test]
async fn tie_goes_to_first_configured_universe() {
    let config = RouterConfig::default();
    let pools = vec![
        weighted_pool("v2", ProtocolVersion::V2, DAI, USDC, 10_000, 10_000),
        weighted_pool("v3", ProtocolVersion::V3, DAI, USDC, 10_000, 10_000),
    ];

    let response = route(&config, request(SwapKind::GivenIn, units(10), pools.clone(), 3))
        .await
        .unwrap();
    assert_eq!(response.chosen_universe, Some(ProtocolVersion::V2));

    let mut reversed = config.clone();
    reversed.supported_universes = vec![ProtocolVersion::V3, ProtocolVersion::V2];
    let response = route(&reversed, request(SwapKind::GivenIn, units(10), pools, 3))
        .await
        .unwrap();
    assert_eq!(response.chosen_universe, Some(ProtocolVersion::V3));
}

#[tokio::test]
async fn requested_universe_restricts_search() {
    let config = RouterConfig::default();
    let pools = vec![
        weighted_pool("shallow", ProtocolVersion::V2, DAI, USDC, 10_000, 10_000),
        weighted_pool("deep", ProtocolVersion::V3, DAI, USDC, 1_000_000, 1_000_000),
    ];
    let mut req = request(SwapKind::GivenIn, units(1_000), pools, 3);
    req.universe = Some(ProtocolVersion::V2);

    let response = route(&config, req).await.unwrap();
    assert_eq!(response.chosen_universe, Some(ProtocolVersion::V2));
    assert_eq!(response.paths[0].pools, vec!["shallow".to_string()]);
}

#[tokio::test]
async fn request_timeout_bounds_dense_search() {
    let tokens: Vec<String> = (0..18).map(|i| format!("0xt{i:02}")).collect();
    let mut pools = Vec::new();
    for (i, a) in tokens.iter().enumerate() {
        for b in &tokens[i + 1..] {
            let id = format!("{a}-{b}");
            pools.push(weighted_pool(&id, ProtocolVersion::V3, a, b, 1_000_000, 1_000_000));
        }
    }
    let mut config = RouterConfig::default();
    config.request_timeout_ms = 50;
    let mut req = request(SwapKind::GivenIn, units(1_000), pools, 4);
    req.token_in = tokens[0].clone();
    req.token_out = tokens[1].clone();

    let started = Instant::now();
    let response = route(&config, req).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
    assert!(response.paths.len() <= 4);
}

#[tokio::test]
async fn quotes_served_from_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RouterConfig::default();
    config.working_dir = dir.path().to_string_lossy().to_string();
    write_pool_snapshot_on_disk(
        config.snapshot_path(),
        &[
            weighted_pool("p", ProtocolVersion::V3, DAI, USDC, 1_000_000, 1_000_000),
            weighted_pool("q", ProtocolVersion::V3, DAI, USDC, 10, 10),
        ],
    )
    .unwrap();
    let provider = FileSnapshotProvider::new(config.snapshot_path());

    let params = Quote {
        token_in: DAI.to_string(),
        token_out: USDC.to_string(),
        swap_kind: SwapKindParam::GivenIn,
        amount: units(1_000).to_string(),
        protocol_version: Some(3),
        pool_ids: Some("p".to_string()),
    };
    let response = get_aggregator_quotes(&config, &provider, params).await.unwrap();

    assert_eq!(response.protocol_version, Some(3));
    assert_eq!(response.routes.len(), 1);
    let hop = &response.routes[0].path[0];
    assert_eq!(hop.pool_id, "p");
    assert_eq!(hop.amount_in, units(1_000).to_string());
    assert_eq!(hop.amount_out, response.return_amount);
    assert!(between(&response.return_amount.parse::<BigUint>().unwrap(), 990, 997));
}

#[tokio::test]
async fn invalid_quote_never_reads_snapshot() {
    let config = RouterConfig::default();
    let provider = FileSnapshotProvider::new("/nonexistent/pools.json");
    let params = Quote {
        token_in: DAI.to_string(),
        token_out: DAI.to_string(),
        swap_kind: SwapKindParam::GivenOut,
        amount: "5".to_string(),
        protocol_version: None,
        pool_ids: None,
    };

    let err = get_aggregator_quotes(&config, &provider, params).await.unwrap_err();
    assert!(err.to_string().contains("identical"));
}

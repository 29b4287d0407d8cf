use super::core::constants::ONE;
use super::core::error::RouterError;
use super::core::indexer::pool::SnapshotProvider;
use super::core::router::{route_universe, UniverseQuery};
use super::core::types::{
    PathWithAmount, Pool, ProtocolVersion, RoutePath, RouteRequest, RouteResponse, SwapKind,
    SwapRoute,
};
use super::types::{Quote, QuoteResponse, ResponseHop, Route, RouterConfig, SwapKindParam};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

// Time a cancelled search gets to hand back what it already priced
const CANCEL_GRACE: Duration = Duration::from_millis(100);

/// Failure of a quote request as seen by the HTTP layer.
#[derive(Error, Debug)]
pub enum QuoteServiceError {
    #[error(transparent)]
    Request(#[from] RouterError),
    #[error("pool snapshot unavailable: {0:#}")]
    Snapshot(anyhow::Error),
}

pub fn validate_request(config: &RouterConfig, request: &RouteRequest) -> Result<(), RouterError> {
    if request.token_in.trim().is_empty() || request.token_out.trim().is_empty() {
        return Err(RouterError::EmptyToken);
    }
    if request.token_in.trim().eq_ignore_ascii_case(request.token_out.trim()) {
        return Err(RouterError::IdenticalTokens(request.token_in.trim().to_lowercase()));
    }
    if request.amount.is_zero() {
        return Err(RouterError::NonPositiveAmount);
    }
    if let Some(universe) = request.universe {
        if !config.supported_universes.contains(&universe) {
            return Err(RouterError::UnsupportedUniverse(universe.to_string()));
        }
    }
    Ok(())
}

pub fn parse_amount(amount: &str) -> Result<BigUint, RouterError> {
    let amount = amount.trim();
    if amount.starts_with('-') {
        return Err(RouterError::NonPositiveAmount);
    }
    let parsed =
        BigUint::from_str(amount).map_err(|_| RouterError::InvalidAmount(amount.to_string()))?;
    if parsed.is_zero() {
        return Err(RouterError::NonPositiveAmount);
    }
    Ok(parsed)
}

pub fn parse_universe(version: Option<u8>) -> Result<Option<ProtocolVersion>, RouterError> {
    version
        .map(|v| ProtocolVersion::try_from(v).map_err(RouterError::UnsupportedUniverse))
        .transpose()
}

/// Routes `request` through every requested universe concurrently and keeps
/// the best result. GivenIn prefers the larger output, GivenOut the smaller
/// input; ties go to the universe listed first.
pub async fn route(config: &RouterConfig, request: RouteRequest) -> Result<RouteResponse, RouterError> {
    validate_request(config, &request)?;

    let universes = match request.universe {
        Some(universe) => vec![universe],
        None => config.supported_universes.clone(),
    };
    let token_in = request.token_in.trim().to_lowercase();
    let token_out = request.token_out.trim().to_lowercase();
    let pools: Arc<Vec<Pool>> = Arc::new(request.pools);
    let cancel = CancellationToken::new();

    let mut handles = Vec::with_capacity(universes.len());
    for universe in universes {
        let query = UniverseQuery {
            universe,
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            swap_kind: request.swap_kind,
            amount: request.amount.clone(),
            traversal: request.traversal.clone(),
            split_steps: config.split_steps,
        };
        let pools = Arc::clone(&pools);
        let cancel = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || route_universe(&query, &pools, &cancel));
        handles.push((universe, handle));
    }

    let deadline = tokio::time::Instant::now() + Duration::from_millis(config.request_timeout_ms);
    let mut best: Option<(ProtocolVersion, SwapRoute)> = None;
    for (universe, mut handle) in handles {
        let joined = match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(target: "orchestrator", universe=%universe, "Request timed out, cancelling search");
                cancel.cancel();
                match tokio::time::timeout(CANCEL_GRACE, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        tracing::warn!(target: "orchestrator", universe=%universe, "Search ignored cancellation, dropping universe");
                        Ok(None)
                    }
                }
            }
        };
        let route = match joined {
            Ok(route) => route,
            Err(e) => {
                tracing::warn!(target: "orchestrator", universe=%universe, error=%e, "Universe task failed");
                None
            }
        };

        if let Some(route) = route {
            let replace = match &best {
                None => true,
                Some((_, incumbent)) => route.is_better_than(incumbent),
            };
            if replace {
                best = Some((universe, route));
            }
        }
    }

    let response = build_route_response(token_in, token_out, request.swap_kind, request.amount, best);
    tracing::info!(
        target: "orchestrator",
        universe=?response.chosen_universe,
        paths=response.paths.len(),
        return_amount=%response.return_amount,
        "Route computed"
    );
    Ok(response)
}

fn fraction_to_f64(numerator: &BigUint, denominator: &BigUint) -> f64 {
    match (numerator.to_f64(), denominator.to_f64()) {
        (Some(n), Some(d)) if d > 0.0 => n / d,
        _ => 0.0,
    }
}

fn build_route_path(priced: &PathWithAmount, kind: SwapKind, swap_amount: &BigUint) -> RoutePath {
    RoutePath {
        pools: priced.path.pool_ids(),
        tokens: priced.path.tokens(),
        hop_amounts: priced
            .hop_amounts
            .iter()
            .map(|(amount_in, amount_out)| (amount_in.raw.clone(), amount_out.raw.clone()))
            .collect(),
        input_amount: priced.input_amount.raw.clone(),
        output_amount: priced.output_amount.raw.clone(),
        share: fraction_to_f64(&priced.given_amount(kind).raw, swap_amount),
    }
}

fn build_route_response(
    token_in: String,
    token_out: String,
    swap_kind: SwapKind,
    swap_amount: BigUint,
    best: Option<(ProtocolVersion, SwapRoute)>,
) -> RouteResponse {
    match best {
        Some((universe, route)) => RouteResponse {
            chosen_universe: Some(universe),
            swap_kind,
            token_in,
            token_out,
            paths: route
                .paths
                .iter()
                .map(|p| build_route_path(p, swap_kind, &swap_amount))
                .collect(),
            swap_amount,
            return_amount: route.return_amount,
            price_impact: fraction_to_f64(&route.price_impact, &ONE()),
        },
        // No liquidity between the tokens
        None => RouteResponse {
            chosen_universe: None,
            swap_kind,
            token_in,
            token_out,
            swap_amount,
            return_amount: BigUint::zero(),
            paths: vec![],
            price_impact: 0.0,
        },
    }
}

/// HTTP entry: validates the query, loads the snapshot of the requested
/// universes and routes.
pub async fn get_aggregator_quotes(
    config: &RouterConfig,
    provider: &dyn SnapshotProvider,
    params: Quote,
) -> Result<QuoteResponse, QuoteServiceError> {
    let amount = parse_amount(&params.amount)?;
    let universe = parse_universe(params.protocol_version)?;
    let pool_ids: Option<Vec<String>> = params.pool_ids.as_ref().map(|ids| {
        ids.split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect()
    });

    let mut request = RouteRequest {
        token_in: params.token_in.clone(),
        token_out: params.token_out.clone(),
        swap_kind: params.swap_kind.into(),
        amount,
        universe,
        pools: vec![],
        traversal: config.traversal.clone(),
    };
    // Caller errors surface before the snapshot is touched
    validate_request(config, &request)?;

    let universes = match universe {
        Some(universe) => vec![universe],
        None => config.supported_universes.clone(),
    };
    for version in universes {
        let pools = provider
            .pools(version, pool_ids.as_deref())
            .map_err(QuoteServiceError::Snapshot)?;
        request.pools.extend(pools);
    }

    let response = route(config, request).await?;
    Ok(to_quote_response(response, params.swap_kind))
}

fn to_quote_response(response: RouteResponse, swap_kind: SwapKindParam) -> QuoteResponse {
    let routes = response
        .paths
        .iter()
        .map(|path| Route {
            share: path.share,
            input_amount: path.input_amount.to_string(),
            output_amount: path.output_amount.to_string(),
            path: path
                .pools
                .iter()
                .zip(path.tokens.windows(2))
                .zip(&path.hop_amounts)
                .map(|((pool_id, tokens), (amount_in, amount_out))| ResponseHop {
                    pool_id: pool_id.clone(),
                    token_in: tokens[0].clone(),
                    token_out: tokens[1].clone(),
                    amount_in: amount_in.to_string(),
                    amount_out: amount_out.to_string(),
                })
                .collect(),
        })
        .collect();

    QuoteResponse {
        protocol_version: response.chosen_universe.map(u8::from),
        swap_kind,
        token_in: response.token_in,
        token_out: response.token_out,
        swap_amount: response.swap_amount.to_string(),
        return_amount: response.return_amount.to_string(),
        price_impact: response.price_impact,
        routes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_must_be_positive_integers() {
        assert_eq!(parse_amount(" 1000 "), Ok(BigUint::from(1000u32)));
        assert_eq!(parse_amount("0"), Err(RouterError::NonPositiveAmount));
        assert_eq!(parse_amount("-5"), Err(RouterError::NonPositiveAmount));
        assert_eq!(
            parse_amount("1.5"),
            Err(RouterError::InvalidAmount("1.5".to_string()))
        );
    }

    #[test]
    fn unknown_protocol_version_rejected() {
        assert_eq!(parse_universe(None), Ok(None));
        assert_eq!(parse_universe(Some(3)), Ok(Some(ProtocolVersion::V3)));
        assert!(matches!(
            parse_universe(Some(4)),
            Err(RouterError::UnsupportedUniverse(_))
        ));
    }
}

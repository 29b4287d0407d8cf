use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use swap_router::core::indexer::pool::{FileSnapshotProvider, SnapshotProvider};
use swap_router::logging::setup_logging;
use swap_router::orchestrator::{get_aggregator_quotes, QuoteServiceError};
use swap_router::types::{Quote, QuoteResponse, ResponseHop, Route, RouterConfig, SwapKindParam};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Hold configuration and the snapshot source
#[derive(Clone)]
struct RouterState {
    config: Arc<RouterConfig>,
    provider: Arc<dyn SnapshotProvider>,
}

// Generate the OpenAPI schema
#[derive(OpenApi)]
#[openapi(
    paths(get_quotes),
    components(
        schemas(Quote, QuoteResponse, Route, ResponseHop, SwapKindParam)
    ),
    tags(
        (name = "quotes", description = "Swap routes for a token pair")
    )
)]
struct ApiDoc;

#[utoipa::path(
get,
path = "/quotes",
params(
    ("tokenIn" = String, Query, description = "Address of token being sold"),
    ("tokenOut" = String, Query, description = "Address of token being bought"),
    ("swapKind" = SwapKindParam, Query, description = "givenIn fixes the input, givenOut the output"),
    ("amount" = String, Query, description = "Raw amount on the fixed side of the trade"),
    ("protocolVersion" = Option<u8>, Query, description = "Restrict the search to one protocol version"),
    ("poolIds" = Option<String>, Query, description = "Comma separated pool ids to route through")
),
responses(
    (status = 200, description = "Swap route", body = QuoteResponse),
    (status = 400, description = "Invalid request"),
    (status = 500, description = "Pool snapshot unavailable")
),
tag = "quotes"
)]
async fn get_quotes(
    State(state): State<RouterState>,
    Query(params): Query<Quote>,
) -> Result<Json<QuoteResponse>, (StatusCode, String)> {
    match get_aggregator_quotes(state.config.as_ref(), state.provider.as_ref(), params).await {
        Ok(response) => Ok(Json(response)),
        Err(QuoteServiceError::Request(e)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e @ QuoteServiceError::Snapshot(_)) => {
            tracing::error!(target: "http", error=%e, "Quote failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Create API documentation
    let openapi = ApiDoc::openapi();
    let config_path = PathBuf::from("router_config.toml");
    let config = RouterConfig::load_from(config_path)?;
    setup_logging(&config.log_level, config.log_json);

    let provider = FileSnapshotProvider::new(config.snapshot_path());
    let listen_addr = config.listen_addr.clone();
    let state = RouterState {
        config: Arc::new(config),
        provider: Arc::new(provider),
    };

    // Build router with our endpoints and Swagger UI
    let app = Router::new()
        .route("/quotes", get(get_quotes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(target: "http", addr=%listen_addr, "Server running, Swagger UI at /swagger-ui/");
    axum::serve(listener, app).await?;
    Ok(())
}

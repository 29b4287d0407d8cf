use super::core::types::{GraphTraversalConfig, ProtocolVersion, SwapKind};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RouterConfig {
    pub working_dir: String,
    // Pool snapshot inside `working_dir`
    pub snapshot_file: String,
    pub listen_addr: String,
    // Universes searched when a request does not name one, in tie-break order
    pub supported_universes: Vec<ProtocolVersion>,
    pub split_steps: usize,
    pub request_timeout_ms: u64,
    pub log_level: String,
    pub log_json: bool,
    pub traversal: GraphTraversalConfig,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SwapKindParam {
    GivenIn,
    GivenOut,
}

impl From<SwapKindParam> for SwapKind {
    fn from(value: SwapKindParam) -> Self {
        match value {
            SwapKindParam::GivenIn => SwapKind::GivenIn,
            SwapKindParam::GivenOut => SwapKind::GivenOut,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, IntoParams, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[schema(example = "0x6b175474e89094c44da98b954eedeac495271d0f")]
    pub token_in: String,

    #[schema(example = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")]
    pub token_out: String,

    pub swap_kind: SwapKindParam,

    // Raw amount of token in for givenIn, of token out for givenOut
    #[schema(example = "1000000000000000000000")]
    pub amount: String,

    #[schema(example = 3, nullable = true)]
    pub protocol_version: Option<u8>,

    // Comma separated pool ids restricting the snapshot
    #[schema(nullable = true)]
    pub pool_ids: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseHop {
    pub pool_id: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub amount_out: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub share: f64,
    pub input_amount: String,
    pub output_amount: String,
    pub path: Vec<ResponseHop>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub protocol_version: Option<u8>,
    pub swap_kind: SwapKindParam,
    pub token_in: String,
    pub token_out: String,
    pub swap_amount: String,
    pub return_amount: String,
    pub price_impact: f64,
    pub routes: Vec<Route>,
}

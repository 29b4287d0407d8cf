use super::amount::TokenAmount;
use super::constants::ONE;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type PoolMap = HashMap<String, Pool>;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Token {
    pub fn new(address: &str, decimals: u8) -> Self {
        Self {
            address: address.to_lowercase(),
            decimals,
            symbol: None,
        }
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    pub fn is(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }
}

/// Independent liquidity universe. Pools of different versions never share a
/// path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProtocolVersion {
    V2,
    V3,
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(ProtocolVersion::V2),
            3 => Ok(ProtocolVersion::V3),
            other => Err(format!("{}", other)),
        }
    }
}

impl From<ProtocolVersion> for u8 {
    fn from(value: ProtocolVersion) -> Self {
        match value {
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", u8::from(*self))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapKind {
    GivenIn,
    GivenOut,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolToken {
    #[serde(flatten)]
    pub token: Token,
    // Raw balance in the token's native decimals
    #[serde(with = "decimal_string")]
    pub balance: BigUint,
    // 18 decimal rate applied on top of decimal scaling
    #[serde(with = "decimal_string", default = "ONE")]
    pub rate: BigUint,
}

impl PoolToken {
    pub fn new(token: Token, balance: BigUint) -> Self {
        Self {
            token,
            balance,
            rate: ONE(),
        }
    }

    pub fn with_rate(mut self, rate: BigUint) -> Self {
        self.rate = rate;
        self
    }
}

/// Invariant family of a pool together with its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PoolType {
    #[serde(rename_all = "camelCase")]
    Weighted {
        #[serde(with = "decimal_string_vec")]
        weights: Vec<BigUint>,
    },
    #[serde(rename_all = "camelCase")]
    Stable {
        // Amplification parameter without AMP_PRECISION applied
        #[serde(with = "decimal_string")]
        amp: BigUint,
    },
    /// ERC4626 buffer: tokens are `[wrapped, underlying]`, the wrapped token
    /// rate converts shares into assets.
    Buffer,
    #[serde(rename_all = "camelCase")]
    Gyro2Clp {
        #[serde(with = "decimal_string")]
        sqrt_alpha: BigUint,
        #[serde(with = "decimal_string")]
        sqrt_beta: BigUint,
    },
    #[serde(rename_all = "camelCase")]
    GyroEclp {
        #[serde(with = "decimal_string")]
        alpha: BigUint,
        #[serde(with = "decimal_string")]
        beta: BigUint,
        #[serde(with = "decimal_string")]
        c: BigUint,
        #[serde(with = "decimal_string")]
        s: BigUint,
        #[serde(with = "decimal_string")]
        lambda: BigUint,
    },
    #[serde(rename_all = "camelCase")]
    QuantAmm {
        #[serde(with = "decimal_string_vec")]
        weights: Vec<BigUint>,
        // Signed per-second weight drift, 18 decimals
        multipliers: Vec<i128>,
        last_update_time: u64,
        last_interpolation_time: u64,
        // Block time the snapshot was taken at
        timestamp: u64,
    },
}

impl PoolType {
    pub fn name(&self) -> &'static str {
        match self {
            PoolType::Weighted { .. } => "weighted",
            PoolType::Stable { .. } => "stable",
            PoolType::Buffer => "buffer",
            PoolType::Gyro2Clp { .. } => "gyro2Clp",
            PoolType::GyroEclp { .. } => "gyroEclp",
            PoolType::QuantAmm { .. } => "quantAmm",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub address: String,
    pub protocol_version: ProtocolVersion,
    pub pool_type: PoolType,
    pub tokens: Vec<PoolToken>,
    // 18 decimal fraction
    #[serde(with = "decimal_string")]
    pub swap_fee: BigUint,
}

/// One swap through a single pool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hop {
    pub pool_id: String,
    pub token_in: String,
    pub token_out: String,
    pub boosted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TradePath {
    pub hops: Vec<Hop>, // [A->B, B->C] for path A->B->C
}

/// A path priced for one amount. `hop_amounts` holds the (in, out) pair of
/// every hop in path order.
#[derive(Clone, Debug, PartialEq)]
pub struct PathWithAmount {
    pub path: TradePath,
    pub hop_amounts: Vec<(TokenAmount, TokenAmount)>,
    pub input_amount: TokenAmount,
    pub output_amount: TokenAmount,
}

impl PathWithAmount {
    /// The side of the trade the caller fixed.
    pub fn given_amount(&self, kind: SwapKind) -> &TokenAmount {
        match kind {
            SwapKind::GivenIn => &self.input_amount,
            SwapKind::GivenOut => &self.output_amount,
        }
    }

    /// The side of the trade the router computed.
    pub fn return_amount(&self, kind: SwapKind) -> &TokenAmount {
        match kind {
            SwapKind::GivenIn => &self.output_amount,
            SwapKind::GivenOut => &self.input_amount,
        }
    }
}

/// Best route found inside one universe.
#[derive(Clone, Debug, PartialEq)]
pub struct SwapRoute {
    pub swap_kind: SwapKind,
    pub paths: Vec<PathWithAmount>,
    pub swap_amount: BigUint,
    pub return_amount: BigUint,
    // 18 decimal fraction, zero when the route beats its own spot rate
    pub price_impact: BigUint,
}

impl SwapRoute {
    /// GivenIn prefers more output, GivenOut prefers less input. A zero
    /// return never wins.
    pub fn is_better_than(&self, other: &SwapRoute) -> bool {
        if self.return_amount.is_zero() {
            return false;
        }
        if other.return_amount.is_zero() {
            return true;
        }
        match self.swap_kind {
            SwapKind::GivenIn => self.return_amount > other.return_amount,
            SwapKind::GivenOut => self.return_amount < other.return_amount,
        }
    }
}

/// Router input: a request against an explicit pool snapshot.
#[derive(Clone, Debug)]
pub struct RouteRequest {
    pub token_in: String,
    pub token_out: String,
    pub swap_kind: SwapKind,
    // Raw amount of token in (GivenIn) or token out (GivenOut)
    pub amount: BigUint,
    // None searches every supported universe
    pub universe: Option<ProtocolVersion>,
    pub pools: Vec<Pool>,
    pub traversal: GraphTraversalConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePath {
    pub pools: Vec<String>,
    pub tokens: Vec<String>,
    #[serde(with = "decimal_string_pairs")]
    pub hop_amounts: Vec<(BigUint, BigUint)>,
    #[serde(with = "decimal_string")]
    pub input_amount: BigUint,
    #[serde(with = "decimal_string")]
    pub output_amount: BigUint,
    // Fraction of the swap amount routed through this path
    pub share: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub chosen_universe: Option<ProtocolVersion>,
    pub swap_kind: SwapKind,
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "decimal_string")]
    pub swap_amount: BigUint,
    #[serde(with = "decimal_string")]
    pub return_amount: BigUint,
    pub paths: Vec<RoutePath>,
    pub price_impact: f64,
}

#[derive(Debug)]
pub struct Graph {
    pub edges: HashMap<String, Vec<Hop>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphTraversalConfig {
    // Hops through ordinary pools
    pub max_depth: usize,
    // Hops through buffer (boosted) pools
    pub max_boosted_depth: usize,
    // Paths a trade may be split across
    pub max_paths: usize,
}

impl Default for GraphTraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_boosted_depth: 2,
            max_paths: 4,
        }
    }
}

pub mod decimal_string {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let value = String::deserialize(deserializer)?;
        BigUint::from_str(value.trim()).map_err(de::Error::custom)
    }
}

pub mod decimal_string_pairs {
    use num_bigint::BigUint;
    use serde::{ser::SerializeSeq, Serializer};

    pub fn serialize<S: Serializer>(
        values: &[(BigUint, BigUint)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for (amount_in, amount_out) in values {
            seq.serialize_element(&(amount_in.to_string(), amount_out.to_string()))?;
        }
        seq.end()
    }
}

pub mod decimal_string_vec {
    use num_bigint::BigUint;
    use serde::{de, ser::SerializeSeq, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<BigUint>, D::Error> {
        let values = Vec::<String>::deserialize(deserializer)?;
        values
            .iter()
            .map(|v| BigUint::from_str(v.trim()).map_err(de::Error::custom))
            .collect()
    }
}

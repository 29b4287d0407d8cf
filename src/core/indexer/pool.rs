use super::types::{Pool, ProtocolVersion};
use super::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Read-only source of pool snapshots. Implementations decide where the data
/// comes from; the router only ever sees the returned pools.
pub trait SnapshotProvider: Send + Sync {
    /// Pools of one universe, restricted to `pool_ids` when given.
    fn pools(&self, version: ProtocolVersion, pool_ids: Option<&[String]>) -> Result<Vec<Pool>>;
}

/// Serves the pool list written by `write_pool_snapshot_on_disk`. The file is
/// read on every call so a refreshed snapshot is picked up without restart.
#[derive(Clone, Debug)]
pub struct FileSnapshotProvider {
    path: PathBuf,
}

impl FileSnapshotProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotProvider for FileSnapshotProvider {
    fn pools(&self, version: ProtocolVersion, pool_ids: Option<&[String]>) -> Result<Vec<Pool>> {
        let pools = read_pool_snapshot_from_disk(&self.path)?;
        Ok(pools
            .into_iter()
            .filter(|p| p.protocol_version == version)
            .filter(|p| pool_ids.map_or(true, |ids| ids.iter().any(|id| id.eq_ignore_ascii_case(&p.id))))
            .collect())
    }
}

pub fn write_pool_snapshot_on_disk<P: AsRef<Path>>(snapshot_file_path: P, pools: &[Pool]) -> Result<()> {
    let pool_list = PoolList {
        pools: pools.to_vec(),
    };
    let json = serde_json::to_string_pretty(&pool_list)?;

    fs::write(snapshot_file_path.as_ref(), json).with_context(|| {
        format!(
            "Error writing pool snapshot to {}",
            snapshot_file_path.as_ref().display()
        )
    })?;
    Ok(())
}

pub fn read_pool_snapshot_from_disk<P: AsRef<Path>>(snapshot_file_path: P) -> Result<Vec<Pool>> {
    let pool_list_json = fs::read_to_string(snapshot_file_path.as_ref()).with_context(|| {
        format!(
            "Error reading pool snapshot from {}",
            snapshot_file_path.as_ref().display()
        )
    })?;
    let pool_list: PoolList =
        serde_json::from_str(&pool_list_json).context("Malformed pool snapshot")?;
    Ok(pool_list.pools)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct PoolList {
    pools: Vec<Pool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::ONE;
    use crate::core::types::{PoolToken, PoolType, Token};
    use num_bigint::BigUint;

    fn pool(id: &str, version: ProtocolVersion) -> Pool {
        Pool {
            id: id.to_string(),
            address: format!("0x{id}"),
            protocol_version: version,
            pool_type: PoolType::Stable {
                amp: BigUint::from(200u32),
            },
            tokens: vec![
                PoolToken::new(Token::new("0xdai", 18).with_symbol("DAI"), ONE() * 1_000u32),
                PoolToken::new(Token::new("0xusdc", 6), BigUint::from(1_000_000_000u64))
                    .with_rate(ONE() * 101u32 / 100u32),
            ],
            swap_fee: ONE() / 10_000u32,
        }
    }

    #[test]
    fn snapshot_survives_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pools.json");
        let pools = vec![pool("a", ProtocolVersion::V2), pool("b", ProtocolVersion::V3)];

        write_pool_snapshot_on_disk(&file, &pools).unwrap();
        assert_eq!(read_pool_snapshot_from_disk(&file).unwrap(), pools);
    }

    #[test]
    fn provider_filters_by_universe_and_ids() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pools.json");
        let pools = vec![
            pool("a", ProtocolVersion::V3),
            pool("b", ProtocolVersion::V3),
            pool("c", ProtocolVersion::V2),
        ];
        write_pool_snapshot_on_disk(&file, &pools).unwrap();
        let provider = FileSnapshotProvider::new(&file);

        let v3 = provider.pools(ProtocolVersion::V3, None).unwrap();
        assert_eq!(v3.len(), 2);

        let only_b = provider
            .pools(ProtocolVersion::V3, Some(&["B".to_string()]))
            .unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].id, "b");
    }

    #[test]
    fn missing_file_is_an_error() {
        let provider = FileSnapshotProvider::new("/nonexistent/pools.json");
        let err = provider.pools(ProtocolVersion::V3, None).unwrap_err();
        assert!(err.to_string().contains("Error reading pool snapshot"));
    }

    #[test]
    fn snapshot_json_uses_string_amounts() {
        let json = serde_json::to_value(pool("a", ProtocolVersion::V3)).unwrap();
        assert_eq!(json["protocolVersion"], 3);
        assert_eq!(json["poolType"]["type"], "stable");
        assert_eq!(json["poolType"]["amp"], "200");
        assert_eq!(json["tokens"][1]["decimals"], 6);
        assert_eq!(json["tokens"][1]["balance"], "1000000000");
    }
}

use super::core::constants::DEFAULT_SPLIT_STEPS;
use super::core::types::{GraphTraversalConfig, ProtocolVersion};
use super::types::RouterConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            working_dir: "working_dir".to_string(),
            snapshot_file: "pools.json".to_string(),
            listen_addr: "127.0.0.1:3000".to_string(),
            supported_universes: vec![ProtocolVersion::V2, ProtocolVersion::V3],
            split_steps: DEFAULT_SPLIT_STEPS,
            request_timeout_ms: 2_000,
            log_level: "info".to_string(),
            log_json: false,
            traversal: GraphTraversalConfig::default(),
        }
    }
}

impl RouterConfig {
    // Helper method to load from a specific path, writing defaults if missing
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let config: Self = confy::load_path(&path)
            .with_context(|| format!("Error loading router config from {}", path.display()))?;
        Ok(config)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        Path::new(self.working_dir.as_str()).join(&self.snapshot_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router_config.toml");

        let config = RouterConfig::load_from(path.clone()).unwrap();
        assert!(path.exists());
        assert_eq!(config.split_steps, DEFAULT_SPLIT_STEPS);
        assert_eq!(config.traversal, GraphTraversalConfig::default());
        assert_eq!(
            config.supported_universes,
            vec![ProtocolVersion::V2, ProtocolVersion::V3]
        );
    }

    #[test]
    fn snapshot_lives_in_working_dir() {
        let config = RouterConfig::default();
        assert_eq!(config.snapshot_path(), Path::new("working_dir").join("pools.json"));
    }
}

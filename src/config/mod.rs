pub mod types;

use crate::error::{ConfigError, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub use types::Config;

const CONFIG_FILE_NAME: &str = ".gateway-setup.toml";

/// Get the global config file path (~/.gateway-setup.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (./.gateway-setup.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load configuration.
///
/// An explicit file must exist and parse. Otherwise the local file is tried,
/// then the global one; unreadable or invalid files there are skipped.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Ok(read_config(path)?);
    }

    let candidates = std::env::current_dir()
        .ok()
        .map(|dir| local_config_path(&dir))
        .into_iter()
        .chain(global_config_path());

    for path in candidates {
        if !path.exists() {
            continue;
        }
        match read_config(&path) {
            Ok(config) => {
                debug!("Loaded configuration from {}", path.display());
                return Ok(config);
            }
            Err(e) => warn!("Skipping {}", e),
        }
    }

    Ok(Config::default())
}

/// Read and parse one configuration file
pub fn read_config(path: &Path) -> std::result::Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::ParsingFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_region, "us-east-1");
        assert_eq!(config.state_file, "gateway_config.json");
        assert_eq!(config.names.gateway, "TestGWforPolicyEngine");
        assert_eq!(config.names.target, "RefundToolTarget");
        assert_eq!(config.names.function, "RefundLambda");
        assert_eq!(config.compute.runtime, "nodejs20.x");
        assert_eq!(config.compute.timeout_secs, 30);
        assert_eq!(config.compute.memory_mb, 128);
        assert!(config.gateway.semantic_search);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("setup.toml");
        fs::write(
            &path,
            r#"
default_region = "eu-west-1"

[names]
gateway = "OrdersGateway"

[compute]
role_settle_secs = 0
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.default_region, "eu-west-1");
        assert_eq!(config.names.gateway, "OrdersGateway");
        assert_eq!(config.names.target, "RefundToolTarget");
        assert_eq!(config.compute.role_settle_secs, 0);
        assert_eq!(config.compute.memory_mb, 128);
    }

    #[test]
    fn test_explicit_file_must_parse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "default_region = [").unwrap();

        assert!(load_config(Some(&path)).is_err());
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }
}

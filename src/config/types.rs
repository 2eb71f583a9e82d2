use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Region used when neither `--region` nor the AWS environment names one
    pub default_region: String,
    /// Where the snapshot of provisioned identifiers is kept
    pub state_file: String,
    pub names: NamesConfig,
    pub compute: ComputeConfig,
    pub gateway: GatewayConfig,
}

/// Names of the managed resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamesConfig {
    pub gateway: String,
    pub target: String,
    pub function: String,
    /// Name given to a newly created OAuth authorizer
    pub authorizer: String,
}

/// Refund function settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    pub runtime: String,
    pub handler: String,
    pub timeout_secs: i32,
    pub memory_mb: i32,
    pub description: String,
    /// Pause after creating an execution role so IAM can propagate it
    pub role_settle_secs: u64,
    /// Upper bound for the function state waiters
    pub max_wait_secs: u64,
}

/// Gateway settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub semantic_search: bool,
    pub description: Option<String>,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_region: "us-east-1".to_string(),
            state_file: crate::state::DEFAULT_STATE_FILE.to_string(),
            names: NamesConfig::default(),
            compute: ComputeConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            gateway: "TestGWforPolicyEngine".to_string(),
            target: "RefundToolTarget".to_string(),
            function: "RefundLambda".to_string(),
            authorizer: "TestGateway".to_string(),
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            runtime: "nodejs20.x".to_string(),
            handler: "index.handler".to_string(),
            timeout_secs: 30,
            memory_mb: 128,
            description: "Sample refund processing Lambda for AgentCore Policy tutorial".to_string(),
            role_settle_secs: 10,
            max_wait_secs: 300,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            semantic_search: true,
            description: None,
            poll_interval_secs: 5,
            max_wait_secs: 300,
        }
    }
}

impl ComputeConfig {
    pub fn role_settle_delay(&self) -> Duration {
        Duration::from_secs(self.role_settle_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl GatewayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

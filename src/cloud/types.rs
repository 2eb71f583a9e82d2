//! Descriptors and request types exchanged with the control plane
//!
//! Descriptors are what we observe remotely; we never own the resources they
//! describe, only their identifiers.

use crate::schema::ToolSchema;
use crate::state::is_usable_id;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status reported for a gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    Creating,
    Updating,
    Ready,
    Failed,
    Deleting,
    /// Any status this tool does not know about
    Other(String),
}

impl GatewayStatus {
    /// Parse a status string as reported by the service
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "CREATING" => Self::Creating,
            "UPDATING" => Self::Updating,
            // Older API revisions reported ACTIVE for a usable gateway
            "READY" | "ACTIVE" => Self::Ready,
            "FAILED" | "UPDATE_UNSUCCESSFUL" => Self::Failed,
            "DELETING" => Self::Deleting,
            _ => Self::Other(status.to_string()),
        }
    }

    /// Whether targets can be attached and invoked
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "CREATING",
            Self::Updating => "UPDATING",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
            Self::Deleting => "DELETING",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full gateway details as returned by `get_gateway` / `create_gateway`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayDescriptor {
    pub id: String,
    pub arn: String,
    pub url: Option<String>,
    pub name: String,
    pub status: GatewayStatus,
}

/// Gateway entry from a listing; may omit details, so re-fetch by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySummary {
    pub id: String,
    pub name: String,
    pub status: GatewayStatus,
}

/// A target attached to a gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub id: String,
    pub name: String,
    pub gateway_id: String,
}

/// Result of a successful `create_gateway_target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTarget {
    pub target: TargetDescriptor,
    pub gateway_arn: String,
}

/// A deployed serverless function. The name is the identity, the ARN is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeDescriptor {
    pub name: String,
    pub arn: String,
}

/// Everything needed to create a function from scratch
#[derive(Debug, Clone)]
pub struct CreateFunctionRequest {
    pub name: String,
    pub runtime: String,
    pub handler: String,
    pub role_arn: String,
    /// Zipped deployment package
    pub package: Vec<u8>,
    pub description: String,
    pub timeout_secs: i32,
    pub memory_mb: i32,
}

#[derive(Debug, Clone)]
pub struct CreateRoleRequest {
    pub name: String,
    /// JSON trust (assume-role) policy document
    pub trust_policy: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreateGatewayRequest {
    pub name: String,
    pub role_arn: String,
    pub authorizer: AuthorizerConfig,
    /// Enable semantic tool search on the gateway
    pub semantic_search: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateTargetRequest {
    pub gateway_id: String,
    pub name: String,
    pub function_arn: String,
    pub tool_schema: ToolSchema,
}

/// OAuth client credentials for calling the gateway.
///
/// The secret is only returned when the client is created, so this record
/// is the sole copy once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_secret: String,
    pub user_pool_id: String,
    pub token_endpoint: String,
    pub scope: String,
    pub domain_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_url: Option<String>,
}

impl ClientInfo {
    /// A client is only reusable when both credentials are real values
    pub fn is_usable(&self) -> bool {
        is_usable_id(&self.client_id) && is_usable_id(&self.client_secret)
    }

    /// OIDC discovery document for the issuing user pool.
    ///
    /// Records written before the URL was persisted are rebuilt from the
    /// Cognito pool id.
    pub fn discovery_url(&self, region: &str) -> String {
        match &self.discovery_url {
            Some(url) if is_usable_id(url) => url.clone(),
            _ => format!(
                "https://cognito-idp.{}.amazonaws.com/{}/.well-known/openid-configuration",
                region, self.user_pool_id
            ),
        }
    }
}

/// Custom JWT authorizer block attached to a gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerConfig {
    pub discovery_url: String,
    pub allowed_clients: Vec<String>,
}

impl AuthorizerConfig {
    /// Authorizer block that admits the given client
    pub fn for_client(client: &ClientInfo, region: &str) -> Self {
        Self {
            discovery_url: client.discovery_url(region),
            allowed_clients: vec![client.client_id.clone()],
        }
    }
}

/// What `create_oauth_authorizer` hands back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerGrant {
    pub client_info: ClientInfo,
    pub config: AuthorizerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_status_parse() {
        assert_eq!(GatewayStatus::parse("READY"), GatewayStatus::Ready);
        assert_eq!(GatewayStatus::parse("ACTIVE"), GatewayStatus::Ready);
        assert_eq!(GatewayStatus::parse("creating"), GatewayStatus::Creating);
        assert_eq!(
            GatewayStatus::parse("UPDATE_UNSUCCESSFUL"),
            GatewayStatus::Failed
        );
        assert_eq!(
            GatewayStatus::parse("PAUSED"),
            GatewayStatus::Other("PAUSED".to_string())
        );
        assert!(GatewayStatus::Ready.is_ready());
        assert!(!GatewayStatus::Creating.is_ready());
    }

    #[test]
    fn test_client_info_usable() {
        let mut client = ClientInfo {
            client_id: "abc123".to_string(),
            client_secret: "s3cret".to_string(),
            ..Default::default()
        };
        assert!(client.is_usable());

        client.client_secret = "<CLIENT_SECRET>".to_string();
        assert!(!client.is_usable());

        assert!(!ClientInfo::default().is_usable());
    }

    #[test]
    fn test_discovery_url_falls_back_to_pool() {
        let client = ClientInfo {
            client_id: "abc".to_string(),
            user_pool_id: "us-west-2_Pool".to_string(),
            ..Default::default()
        };
        assert_eq!(
            client.discovery_url("us-west-2"),
            "https://cognito-idp.us-west-2.amazonaws.com/us-west-2_Pool/.well-known/openid-configuration"
        );

        let config = AuthorizerConfig::for_client(&client, "us-west-2");
        assert_eq!(config.allowed_clients, vec!["abc".to_string()]);
    }

    #[test]
    fn test_discovery_url_prefers_recorded_value() {
        let client = ClientInfo {
            discovery_url: Some("https://issuer.example/.well-known/openid-configuration".to_string()),
            user_pool_id: "pool".to_string(),
            ..Default::default()
        };
        assert_eq!(
            client.discovery_url("eu-west-1"),
            "https://issuer.example/.well-known/openid-configuration"
        );
    }
}

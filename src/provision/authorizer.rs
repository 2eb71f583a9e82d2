//! OAuth authorizer for the gateway
//!
//! Client secrets are only returned at creation time. Recorded credentials
//! are therefore trusted as-is, and without them a new authorizer is made.

use std::sync::Arc;

use log::info;

use super::report::Disposition;
use crate::cloud::{AuthorizerApi, AuthorizerConfig, AuthorizerGrant, ClientInfo};
use crate::error::Result;

pub struct AuthorizerProvisioner {
    authorizer: Arc<dyn AuthorizerApi>,
    region: String,
}

impl AuthorizerProvisioner {
    pub fn new(authorizer: Arc<dyn AuthorizerApi>, region: impl Into<String>) -> Self {
        Self {
            authorizer,
            region: region.into(),
        }
    }

    pub async fn ensure(&self, name: &str, existing: Option<&ClientInfo>) -> Result<(AuthorizerGrant, Disposition)> {
        if let Some(client_info) = existing.filter(|c| c.is_usable()) {
            info!("Reusing recorded OAuth client {}", client_info.client_id);
            let grant = AuthorizerGrant {
                config: AuthorizerConfig::for_client(client_info, &self.region),
                client_info: client_info.clone(),
            };
            return Ok((grant, Disposition::Reused));
        }

        let grant = self.authorizer.create_oauth_authorizer(name).await?;
        info!("Created OAuth client {}", grant.client_info.client_id);
        Ok((grant, Disposition::Created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::memory::MemoryCloud;

    #[tokio::test]
    async fn test_recorded_client_is_reused_without_calls() {
        let cloud = MemoryCloud::new();
        let provisioner = AuthorizerProvisioner::new(Arc::new(cloud.clone()), "us-east-1");
        let recorded = ClientInfo {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            user_pool_id: "us-east-1_abc".to_string(),
            ..Default::default()
        };

        let (grant, disposition) = provisioner.ensure("TestGateway", Some(&recorded)).await.unwrap();
        assert_eq!(disposition, Disposition::Reused);
        assert_eq!(grant.client_info, recorded);
        assert_eq!(grant.config.allowed_clients, vec!["client".to_string()]);
        assert!(cloud.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_client_triggers_creation() {
        let cloud = MemoryCloud::new();
        let provisioner = AuthorizerProvisioner::new(Arc::new(cloud.clone()), "us-east-1");
        let partial = ClientInfo {
            client_id: "client".to_string(),
            ..Default::default()
        };

        let (grant, disposition) = provisioner.ensure("TestGateway", Some(&partial)).await.unwrap();
        assert_eq!(disposition, Disposition::Created);
        assert_ne!(grant.client_info.client_id, "client");
        assert_eq!(grant.client_info.scope, "TestGateway/invoke");
        assert_eq!(cloud.authorizers().await.len(), 1);
    }
}

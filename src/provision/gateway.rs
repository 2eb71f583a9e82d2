//! Gateway creation and readiness

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use tokio::time::sleep;

use super::report::Disposition;
use super::role::{RoleProvisioner, RoleSpec};
use crate::cloud::{
    AuthorizerConfig, CloudError, CreateGatewayRequest, GatewayApi, GatewayDescriptor,
    GatewayStatus,
};
use crate::config::types::GatewayConfig;
use crate::error::{Result, SetupError};

pub struct GatewayProvisioner {
    gateways: Arc<dyn GatewayApi>,
    roles: RoleProvisioner,
    settings: GatewayConfig,
}

impl GatewayProvisioner {
    pub fn new(gateways: Arc<dyn GatewayApi>, roles: RoleProvisioner, settings: GatewayConfig) -> Self {
        Self {
            gateways,
            roles,
            settings,
        }
    }

    /// Return the confirmed gateway, or create one.
    ///
    /// An existing gateway is returned untouched; its configuration is not
    /// compared against the requested one.
    pub async fn ensure(
        &self,
        existing: Option<GatewayDescriptor>,
        name: &str,
        role_arn: Option<&str>,
        authorizer: &AuthorizerConfig,
    ) -> Result<(GatewayDescriptor, Disposition)> {
        if let Some(gateway) = existing {
            return Ok((gateway, Disposition::Reused));
        }

        let role_arn = match role_arn {
            Some(arn) => arn.to_string(),
            None => self.roles.ensure(&RoleSpec::gateway_execution(name)).await?.arn,
        };
        let request = CreateGatewayRequest {
            name: name.to_string(),
            role_arn,
            authorizer: authorizer.clone(),
            semantic_search: self.settings.semantic_search,
            description: self.settings.description.clone(),
        };

        match self.gateways.create_gateway(&request).await {
            Ok(created) => {
                info!("Created gateway {} ({})", created.id, created.status);
                let gateway = self.wait_until_ready(&created.id).await?;
                Ok((gateway, Disposition::Created))
            }
            Err(e) if e.is_conflict() => {
                let Some(id) = self.id_for_name(name).await? else {
                    return Err(e.into());
                };
                info!("Gateway {} was created concurrently as {}", name, id);
                let gateway = self.wait_until_ready(&id).await?;
                Ok((gateway, Disposition::Reused))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn id_for_name(&self, name: &str) -> Result<Option<String>> {
        let gateways = self.gateways.list_gateways().await?;
        Ok(gateways.into_iter().find(|g| g.name == name).map(|g| g.id))
    }

    /// Poll until the gateway is READY. FAILED ends the wait with an error.
    pub async fn wait_until_ready(&self, gateway_id: &str) -> Result<GatewayDescriptor> {
        let started = Instant::now();
        loop {
            let gateway = self.gateways.get_gateway(gateway_id).await?;
            match &gateway.status {
                GatewayStatus::Ready => return Ok(gateway),
                GatewayStatus::Failed => {
                    return Err(SetupError::GatewayFailed {
                        gateway_id: gateway_id.to_string(),
                        status: gateway.status.to_string(),
                    });
                }
                status => debug!("Gateway {} is {}", gateway_id, status),
            }

            if started.elapsed() >= self.settings.max_wait() {
                return Err(CloudError::WaitTimeout {
                    resource: format!("gateway {}", gateway_id),
                    state: "READY",
                    waited: self.settings.max_wait(),
                }
                .into());
            }
            sleep(self.settings.poll_interval()).await;
        }
    }
}

//! Attaching the function to the gateway

use std::sync::Arc;

use log::info;

use super::report::Disposition;
use crate::cloud::{CreateTargetRequest, GatewayApi, GatewayDescriptor, TargetDescriptor};
use crate::error::Result;
use crate::schema::ToolSchema;

/// Outcome of [`TargetProvisioner::ensure`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredTarget {
    pub gateway_arn: String,
    /// Unknown when a concurrent creation won the race
    pub target: Option<TargetDescriptor>,
    pub disposition: Disposition,
}

pub struct TargetProvisioner {
    gateways: Arc<dyn GatewayApi>,
}

impl TargetProvisioner {
    pub fn new(gateways: Arc<dyn GatewayApi>) -> Self {
        Self { gateways }
    }

    /// Attach `function_arn` to the gateway under `name`.
    ///
    /// A conflict on creation means the target exists already and counts as
    /// success; the gateway ARN then comes from `gateway` itself.
    pub async fn ensure(
        &self,
        gateway: &GatewayDescriptor,
        name: &str,
        function_arn: &str,
        schema: &ToolSchema,
        existing: Option<TargetDescriptor>,
    ) -> Result<EnsuredTarget> {
        if let Some(target) = existing {
            return Ok(EnsuredTarget {
                gateway_arn: gateway.arn.clone(),
                target: Some(target),
                disposition: Disposition::Reused,
            });
        }

        let request = CreateTargetRequest {
            gateway_id: gateway.id.clone(),
            name: name.to_string(),
            function_arn: function_arn.to_string(),
            tool_schema: schema.clone(),
        };
        match self.gateways.create_gateway_target(&request).await {
            Ok(created) => {
                info!("Created target {} ({})", name, created.target.id);
                Ok(EnsuredTarget {
                    gateway_arn: created.gateway_arn,
                    target: Some(created.target),
                    disposition: Disposition::Created,
                })
            }
            Err(e) if e.is_conflict() => {
                info!("Target {} already exists, reusing it: {}", name, e);
                Ok(EnsuredTarget {
                    gateway_arn: gateway.arn.clone(),
                    target: None,
                    disposition: Disposition::Reused,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::GatewayStatus;
    use crate::cloud::memory::MemoryCloud;

    #[tokio::test]
    async fn test_conflict_counts_as_reuse() {
        let cloud = MemoryCloud::new();
        let gateway = cloud.seed_gateway("Gw", GatewayStatus::Ready).await;
        cloud.conflict_on_target_create().await;

        let ensured = TargetProvisioner::new(Arc::new(cloud.clone()))
            .ensure(
                &gateway,
                "RefundToolTarget",
                &MemoryCloud::function_arn("RefundLambda"),
                &ToolSchema::refund(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(ensured.disposition, Disposition::Reused);
        assert_eq!(ensured.gateway_arn, gateway.arn);
        assert!(ensured.target.is_none());
    }

    #[tokio::test]
    async fn test_existing_target_skips_creation() {
        let cloud = MemoryCloud::new();
        let gateway = cloud.seed_gateway("Gw", GatewayStatus::Ready).await;
        let target = cloud.seed_target(&gateway.id, "RefundToolTarget").await;

        let ensured = TargetProvisioner::new(Arc::new(cloud.clone()))
            .ensure(&gateway, "RefundToolTarget", "arn", &ToolSchema::refund(), Some(target.clone()))
            .await
            .unwrap();

        assert_eq!(ensured.target, Some(target));
        assert_eq!(cloud.calls_to("CreateGatewayTarget").await, 0);
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let cloud = MemoryCloud::new();
        let gateway = cloud.seed_gateway("Gw", GatewayStatus::Ready).await;
        cloud.fail_operation("CreateGatewayTarget").await;

        let result = TargetProvisioner::new(Arc::new(cloud))
            .ensure(&gateway, "T", "arn", &ToolSchema::refund(), None)
            .await;
        assert!(result.is_err());
    }
}

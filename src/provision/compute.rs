//! Refund function deployment

use std::sync::Arc;

use log::{debug, info};

use super::report::Disposition;
use super::role::{RoleProvisioner, RoleSpec};
use crate::cloud::{ComputeApi, ComputeDescriptor, CreateFunctionRequest};
use crate::config::types::ComputeConfig;
use crate::error::Result;

pub struct ComputeProvisioner {
    compute: Arc<dyn ComputeApi>,
    roles: RoleProvisioner,
    settings: ComputeConfig,
}

impl ComputeProvisioner {
    pub fn new(compute: Arc<dyn ComputeApi>, roles: RoleProvisioner, settings: ComputeConfig) -> Self {
        Self {
            compute,
            roles,
            settings,
        }
    }

    /// Deploy `package` as `function_name`, creating the function if needed.
    ///
    /// Returns once the function is stable, so the ARN can be attached to a
    /// target straight away.
    pub async fn ensure(&self, function_name: &str, package: &[u8]) -> Result<(ComputeDescriptor, Disposition)> {
        match self.compute.update_function_code(function_name, package).await {
            Ok(()) => {
                info!("Updated code of function {}", function_name);
                let function = self.settle_update(function_name).await?;
                Ok((function, Disposition::Updated))
            }
            Err(e) if e.is_not_found() => {
                debug!("Function {} does not exist yet", function_name);
                self.create(function_name, package).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, function_name: &str, package: &[u8]) -> Result<(ComputeDescriptor, Disposition)> {
        let role = self
            .roles
            .ensure(&RoleSpec::function_execution(function_name))
            .await?;

        let request = CreateFunctionRequest {
            name: function_name.to_string(),
            runtime: self.settings.runtime.clone(),
            handler: self.settings.handler.clone(),
            role_arn: role.arn,
            package: package.to_vec(),
            description: self.settings.description.clone(),
            timeout_secs: self.settings.timeout_secs,
            memory_mb: self.settings.memory_mb,
        };

        match self.compute.create_function(&request).await {
            Ok(function) => {
                info!("Created function {}", function.arn);
                self.compute.wait_for_function_active(function_name).await?;
                Ok((function, Disposition::Created))
            }
            // another run created it since our update attempt
            Err(e) if e.is_conflict() => {
                info!("Function {} appeared concurrently, reusing it", function_name);
                let function = self.settle_update(function_name).await?;
                Ok((function, Disposition::Reused))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn settle_update(&self, function_name: &str) -> Result<ComputeDescriptor> {
        self.compute.wait_for_function_updated(function_name).await?;
        Ok(self.compute.get_function(function_name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::memory::MemoryCloud;
    use std::time::Duration;

    fn provisioner(cloud: &MemoryCloud) -> ComputeProvisioner {
        ComputeProvisioner::new(
            Arc::new(cloud.clone()),
            RoleProvisioner::new(Arc::new(cloud.clone()), Duration::ZERO),
            ComputeConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_missing_function_is_created_with_role() {
        let cloud = MemoryCloud::new();
        let (function, disposition) = provisioner(&cloud)
            .ensure("RefundLambda", b"package")
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Created);
        assert_eq!(function.arn, MemoryCloud::function_arn("RefundLambda"));
        assert_eq!(
            cloud.creation_calls().await,
            vec![
                "CreateRole RefundLambda-execution-role".to_string(),
                "CreateFunction RefundLambda".to_string(),
            ]
        );
        assert_eq!(cloud.calls_to("WaitFunctionActive").await, 1);

        let stored = cloud.function("RefundLambda").await.unwrap();
        assert_eq!(stored.role_arn, MemoryCloud::role_arn("RefundLambda-execution-role"));
        assert_eq!(stored.runtime, "nodejs20.x");
    }

    #[tokio::test]
    async fn test_existing_function_is_updated_in_place() {
        let cloud = MemoryCloud::new();
        cloud.seed_function("RefundLambda").await;

        let (function, disposition) = provisioner(&cloud)
            .ensure("RefundLambda", b"new code")
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Updated);
        assert_eq!(function.name, "RefundLambda");
        assert!(cloud.creation_calls().await.is_empty());
        assert_eq!(cloud.calls_to("WaitFunctionUpdated").await, 1);
        assert_eq!(cloud.function("RefundLambda").await.unwrap().package, b"new code");
    }

    #[tokio::test]
    async fn test_function_created_concurrently_is_reused() {
        let cloud = MemoryCloud::new();
        cloud.conflict_on_function_create().await;

        let (function, disposition) = provisioner(&cloud)
            .ensure("RefundLambda", b"package")
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Reused);
        assert_eq!(function.arn, MemoryCloud::function_arn("RefundLambda"));
        assert_eq!(cloud.calls_to("UpdateFunctionCode").await, 1);
        assert_eq!(cloud.calls_to("CreateFunction").await, 1);
        assert_eq!(cloud.calls_to("WaitFunctionUpdated").await, 1);
        assert_eq!(cloud.calls_to("WaitFunctionActive").await, 0);
    }

    #[tokio::test]
    async fn test_update_failure_is_fatal() {
        let cloud = MemoryCloud::new();
        cloud.seed_function("RefundLambda").await;
        cloud.fail_operation("UpdateFunctionCode").await;

        assert!(provisioner(&cloud).ensure("RefundLambda", b"x").await.is_err());
        assert!(cloud.creation_calls().await.is_empty());
    }
}

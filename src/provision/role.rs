//! Execution roles for the function and the gateway

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde_json::json;

use crate::cloud::{CreateRoleRequest, IdentityApi};
use crate::error::Result;

/// Managed policy letting a function write its logs
pub const LAMBDA_BASIC_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Managed policy letting the gateway invoke functions
pub const LAMBDA_INVOKE_POLICY: &str = "arn:aws:iam::aws:policy/service-role/AWSLambdaRole";

const LAMBDA_SERVICE: &str = "lambda.amazonaws.com";
const AGENTCORE_SERVICE: &str = "bedrock-agentcore.amazonaws.com";

/// A role to ensure: who may assume it, and what it may do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: String,
    pub service: String,
    pub description: String,
    pub policies: Vec<String>,
}

impl RoleSpec {
    pub fn function_execution(function_name: &str) -> Self {
        Self {
            name: format!("{}-execution-role", function_name),
            service: LAMBDA_SERVICE.to_string(),
            description: format!("Execution role for {} function", function_name),
            policies: vec![LAMBDA_BASIC_EXECUTION_POLICY.to_string()],
        }
    }

    pub fn gateway_execution(gateway_name: &str) -> Self {
        Self {
            name: format!("{}-gateway-role", gateway_name),
            service: AGENTCORE_SERVICE.to_string(),
            description: format!("Execution role for gateway {}", gateway_name),
            policies: vec![LAMBDA_INVOKE_POLICY.to_string()],
        }
    }

    /// Assume-role policy trusting the service principal
    pub fn trust_policy(&self) -> String {
        json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": self.service },
                "Action": "sts:AssumeRole"
            }]
        })
        .to_string()
    }
}

/// Outcome of [`RoleProvisioner::ensure`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredRole {
    pub arn: String,
    pub created: bool,
}

pub struct RoleProvisioner {
    identity: Arc<dyn IdentityApi>,
    settle_delay: Duration,
}

impl RoleProvisioner {
    pub fn new(identity: Arc<dyn IdentityApi>, settle_delay: Duration) -> Self {
        Self {
            identity,
            settle_delay,
        }
    }

    /// Create the role, or reuse it when it already exists.
    ///
    /// Policies are attached either way. A new role is only returned after
    /// the settle delay, since IAM may reject it until it has propagated.
    pub async fn ensure(&self, spec: &RoleSpec) -> Result<EnsuredRole> {
        let request = CreateRoleRequest {
            name: spec.name.clone(),
            trust_policy: spec.trust_policy(),
            description: spec.description.clone(),
        };

        let ensured = match self.identity.create_role(&request).await {
            Ok(arn) => {
                info!("Created IAM role {}", spec.name);
                EnsuredRole { arn, created: true }
            }
            Err(e) if e.is_conflict() => {
                info!("IAM role {} already exists, reusing it", spec.name);
                let account = self.identity.get_caller_identity().await?;
                EnsuredRole {
                    arn: format!("arn:aws:iam::{}:role/{}", account, spec.name),
                    created: false,
                }
            }
            Err(e) => return Err(e.into()),
        };

        for policy in &spec.policies {
            debug!("Attaching {} to {}", policy, spec.name);
            self.identity.attach_role_policy(&spec.name, policy).await?;
        }

        if ensured.created && !self.settle_delay.is_zero() {
            info!(
                "Waiting {}s for IAM role propagation",
                self.settle_delay.as_secs()
            );
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(ensured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::memory::MemoryCloud;

    #[test]
    fn test_trust_policy_names_service() {
        let spec = RoleSpec::function_execution("RefundLambda");
        assert_eq!(spec.name, "RefundLambda-execution-role");

        let policy: serde_json::Value = serde_json::from_str(&spec.trust_policy()).unwrap();
        assert_eq!(
            policy["Statement"][0]["Principal"]["Service"],
            "lambda.amazonaws.com"
        );
        assert_eq!(policy["Statement"][0]["Action"], "sts:AssumeRole");
    }

    #[tokio::test]
    async fn test_existing_role_is_reused() {
        let cloud = MemoryCloud::new();
        let roles = RoleProvisioner::new(Arc::new(cloud.clone()), Duration::ZERO);
        let spec = RoleSpec::gateway_execution("Gw");

        let first = roles.ensure(&spec).await.unwrap();
        assert!(first.created);

        let second = roles.ensure(&spec).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.arn, first.arn);
        assert_eq!(
            cloud.attached_policies("Gw-gateway-role").await,
            vec![LAMBDA_INVOKE_POLICY.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_only_after_creation() {
        let cloud = MemoryCloud::new();
        let roles = RoleProvisioner::new(Arc::new(cloud.clone()), Duration::from_secs(10));
        let spec = RoleSpec::function_execution("RefundLambda");

        let started = tokio::time::Instant::now();
        let created = roles.ensure(&spec).await.unwrap();
        assert!(created.created);
        assert!(started.elapsed() >= Duration::from_secs(10));

        let started = tokio::time::Instant::now();
        let reused = roles.ensure(&spec).await.unwrap();
        assert!(!reused.created);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_other_failures_propagate() {
        let cloud = MemoryCloud::new();
        cloud.fail_operation("CreateRole").await;
        let roles = RoleProvisioner::new(Arc::new(cloud), Duration::ZERO);

        let err = roles
            .ensure(&RoleSpec::function_execution("F"))
            .await
            .unwrap_err();
        assert!(err.cloud_error().is_some());
    }
}

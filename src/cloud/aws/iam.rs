use async_trait::async_trait;

use super::classify;
use crate::cloud::{CloudError, CloudResult, CreateRoleRequest, IdentityApi};

/// [`IdentityApi`] over IAM and STS
#[derive(Clone, Debug)]
pub struct IamIdentity {
    iam: aws_sdk_iam::Client,
    sts: aws_sdk_sts::Client,
}

impl IamIdentity {
    pub fn new(iam: aws_sdk_iam::Client, sts: aws_sdk_sts::Client) -> Self {
        Self { iam, sts }
    }
}

#[async_trait]
impl IdentityApi for IamIdentity {
    async fn create_role(&self, request: &CreateRoleRequest) -> CloudResult<String> {
        const OP: &str = "CreateRole";
        let output = self
            .iam
            .create_role()
            .role_name(&request.name)
            .assume_role_policy_document(&request.trust_policy)
            .description(&request.description)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;

        let role = output.role().ok_or_else(|| CloudError::incomplete(OP, "Role"))?;
        Ok(role.arn().to_string())
    }

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> CloudResult<()> {
        self.iam
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| classify("AttachRolePolicy", e))?;
        Ok(())
    }

    async fn get_caller_identity(&self) -> CloudResult<String> {
        const OP: &str = "GetCallerIdentity";
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| CloudError::incomplete(OP, "Account"))
    }
}

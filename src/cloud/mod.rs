//! Cloud control-plane boundary
//!
//! The provisioners talk to the remote system only through the traits in this
//! module. One trait per remote service:
//!
//! - [`ComputeApi`]: serverless functions
//! - [`IdentityApi`]: roles, policies and the caller's account
//! - [`GatewayApi`]: gateways and their targets
//! - [`AuthorizerApi`]: OAuth authorization server / client pairs
//!
//! [`aws`] implements them with the AWS SDK; [`memory`] keeps everything in
//! process for tests.

pub mod aws;
pub mod error;
pub mod memory;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

pub use error::{CloudError, CloudResult};
pub use types::{
    AuthorizerConfig, AuthorizerGrant, ClientInfo, ComputeDescriptor, CreateFunctionRequest,
    CreateGatewayRequest, CreateRoleRequest, CreateTargetRequest, CreatedTarget,
    GatewayDescriptor, GatewayStatus, GatewaySummary, TargetDescriptor,
};

#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn create_function(&self, request: &CreateFunctionRequest) -> CloudResult<ComputeDescriptor>;

    /// Replace the code of an existing function.
    ///
    /// Fails with [`CloudError::NotFound`] when the function does not exist.
    async fn update_function_code(&self, function_name: &str, package: &[u8]) -> CloudResult<()>;

    async fn get_function(&self, function_name: &str) -> CloudResult<ComputeDescriptor>;

    /// Block until a freshly created function is Active
    async fn wait_for_function_active(&self, function_name: &str) -> CloudResult<()>;

    /// Block until the last code update has been applied
    async fn wait_for_function_updated(&self, function_name: &str) -> CloudResult<()>;
}

#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Create a role and return its ARN
    async fn create_role(&self, request: &CreateRoleRequest) -> CloudResult<String>;

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> CloudResult<()>;

    /// Account id of the credentials in use
    async fn get_caller_identity(&self) -> CloudResult<String>;
}

#[async_trait]
pub trait GatewayApi: Send + Sync {
    async fn create_gateway(&self, request: &CreateGatewayRequest) -> CloudResult<GatewayDescriptor>;

    async fn get_gateway(&self, gateway_id: &str) -> CloudResult<GatewayDescriptor>;

    /// Every gateway in the account and region, across all result pages
    async fn list_gateways(&self) -> CloudResult<Vec<GatewaySummary>>;

    async fn create_gateway_target(&self, request: &CreateTargetRequest) -> CloudResult<CreatedTarget>;

    /// Every target on the gateway, across all result pages
    async fn list_gateway_targets(&self, gateway_id: &str) -> CloudResult<Vec<TargetDescriptor>>;
}

#[async_trait]
pub trait AuthorizerApi: Send + Sync {
    /// Create a new authorization server and client credentials pair
    async fn create_oauth_authorizer(&self, name: &str) -> CloudResult<AuthorizerGrant>;
}

/// Client handles for one run, shared by every provisioner
#[derive(Clone)]
pub struct CloudClients {
    pub compute: Arc<dyn ComputeApi>,
    pub identity: Arc<dyn IdentityApi>,
    pub gateway: Arc<dyn GatewayApi>,
    pub authorizer: Arc<dyn AuthorizerApi>,
}

impl CloudClients {
    pub fn new(
        compute: Arc<dyn ComputeApi>,
        identity: Arc<dyn IdentityApi>,
        gateway: Arc<dyn GatewayApi>,
        authorizer: Arc<dyn AuthorizerApi>,
    ) -> Self {
        Self {
            compute,
            identity,
            gateway,
            authorizer,
        }
    }
}

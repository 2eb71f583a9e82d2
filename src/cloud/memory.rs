//! In-process control plane
//!
//! Implements every cloud trait over plain collections. Each call is written
//! to a journal, so tests can assert which remote operations a run issued.
//! Faults can be injected per operation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    AuthorizerApi, AuthorizerConfig, AuthorizerGrant, ClientInfo, CloudClients, CloudError,
    CloudResult, ComputeApi, ComputeDescriptor, CreateFunctionRequest, CreateGatewayRequest,
    CreateRoleRequest, CreateTargetRequest, CreatedTarget, GatewayApi, GatewayDescriptor,
    GatewayStatus, GatewaySummary, IdentityApi, TargetDescriptor,
};

pub const ACCOUNT_ID: &str = "123456789012";
pub const REGION: &str = "us-east-1";

/// Operations that create a remote resource
const CREATE_OPERATIONS: &[&str] = &[
    "CreateFunction",
    "CreateRole",
    "CreateGateway",
    "CreateGatewayTarget",
    "CreateOAuthAuthorizer",
];

#[derive(Debug, Clone)]
pub struct StoredFunction {
    pub descriptor: ComputeDescriptor,
    pub role_arn: String,
    pub package: Vec<u8>,
    pub runtime: String,
}

#[derive(Debug, Clone)]
pub struct StoredGateway {
    pub descriptor: GatewayDescriptor,
    pub role_arn: String,
    pub authorizer: Option<AuthorizerConfig>,
    /// Remaining `get_gateway` calls before the status settles
    settle: Option<(u32, GatewayStatus)>,
}

#[derive(Debug, Default)]
struct State {
    functions: BTreeMap<String, StoredFunction>,
    roles: BTreeMap<String, String>,
    attached_policies: Vec<(String, String)>,
    gateways: Vec<StoredGateway>,
    targets: Vec<TargetDescriptor>,
    authorizers: Vec<ClientInfo>,
    journal: Vec<String>,
    next_id: u32,
    failing: BTreeSet<String>,
    fail_lookups: bool,
    conflict_on_target_create: bool,
    conflict_on_function_create: bool,
    gateway_polls_until_ready: u32,
    gateway_creation_fails: bool,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Journal the call and apply any injected failure
    fn record(&mut self, operation: &'static str, subject: &str) -> CloudResult<()> {
        self.journal.push(format!("{} {}", operation, subject).trim_end().to_string());
        if self.failing.contains(operation) {
            return Err(CloudError::from_code(
                operation,
                Some("AccessDeniedException"),
                format!("injected failure for {}", operation),
            ));
        }
        Ok(())
    }

    fn lookup(&mut self, operation: &'static str, subject: &str) -> CloudResult<()> {
        self.record(operation, subject)?;
        if self.fail_lookups {
            return Err(CloudError::Transport {
                operation,
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }

    fn gateway_mut(&mut self, operation: &'static str, id: &str) -> CloudResult<&mut StoredGateway> {
        self.gateways
            .iter_mut()
            .find(|g| g.descriptor.id == id)
            .ok_or_else(|| CloudError::NotFound {
                operation,
                message: format!("gateway {} not found", id),
            })
    }
}

/// Cloud control plane held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCloud {
    state: Arc<Mutex<State>>,
}

impl MemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle this control plane behind every client trait
    pub fn clients(&self) -> CloudClients {
        CloudClients::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
        )
    }

    pub fn function_arn(name: &str) -> String {
        format!("arn:aws:lambda:{}:{}:function:{}", REGION, ACCOUNT_ID, name)
    }

    pub fn role_arn(name: &str) -> String {
        format!("arn:aws:iam::{}:role/{}", ACCOUNT_ID, name)
    }

    pub fn gateway_arn(id: &str) -> String {
        format!("arn:aws:bedrock-agentcore:{}:{}:gateway/{}", REGION, ACCOUNT_ID, id)
    }

    // Seeding

    /// Pre-create a function, as if deployed by an earlier run
    pub async fn seed_function(&self, name: &str) -> ComputeDescriptor {
        let descriptor = ComputeDescriptor {
            name: name.to_string(),
            arn: Self::function_arn(name),
        };
        let mut state = self.state.lock().await;
        state.functions.insert(
            name.to_string(),
            StoredFunction {
                descriptor: descriptor.clone(),
                role_arn: Self::role_arn(&format!("{}-execution-role", name)),
                package: Vec::new(),
                runtime: "nodejs20.x".to_string(),
            },
        );
        descriptor
    }

    /// Pre-create a gateway with a fixed status
    pub async fn seed_gateway(&self, name: &str, status: GatewayStatus) -> GatewayDescriptor {
        let mut state = self.state.lock().await;
        let id = format!("{}-seed{}", name.to_ascii_lowercase(), state.next_id());
        let descriptor = gateway_descriptor(&id, name, status);
        state.gateways.push(StoredGateway {
            descriptor: descriptor.clone(),
            role_arn: Self::role_arn("seeded-gateway-role"),
            authorizer: None,
            settle: None,
        });
        descriptor
    }

    /// Pre-attach a target to a gateway
    pub async fn seed_target(&self, gateway_id: &str, name: &str) -> TargetDescriptor {
        let mut state = self.state.lock().await;
        let target = TargetDescriptor {
            id: format!("TGT{:04}", state.next_id()),
            name: name.to_string(),
            gateway_id: gateway_id.to_string(),
        };
        state.targets.push(target.clone());
        target
    }

    // Fault injection

    /// Make every call to `operation` fail with an access-denied error
    pub async fn fail_operation(&self, operation: &str) {
        self.state.lock().await.failing.insert(operation.to_string());
    }

    /// Make lookups (get/list calls) fail with a transport error
    pub async fn fail_lookups(&self, fail: bool) {
        self.state.lock().await.fail_lookups = fail;
    }

    /// The next target creation loses a race: the target appears, but the
    /// call reports a conflict
    pub async fn conflict_on_target_create(&self) {
        self.state.lock().await.conflict_on_target_create = true;
    }

    /// The next function creation loses a race: the function appears, but
    /// the call reports a conflict
    pub async fn conflict_on_function_create(&self) {
        self.state.lock().await.conflict_on_function_create = true;
    }

    /// Newly created gateways report CREATING for this many polls
    pub async fn gateway_ready_after(&self, polls: u32) {
        self.state.lock().await.gateway_polls_until_ready = polls;
    }

    /// Newly created gateways settle to FAILED instead of READY
    pub async fn gateway_creation_fails(&self) {
        self.state.lock().await.gateway_creation_fails = true;
    }

    /// Remove every injected fault
    pub async fn clear_faults(&self) {
        let mut state = self.state.lock().await;
        state.failing.clear();
        state.fail_lookups = false;
        state.conflict_on_target_create = false;
        state.conflict_on_function_create = false;
        state.gateway_creation_fails = false;
    }

    // Inspection

    /// Every call issued so far, as `"<Operation> <subject>"`
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.journal.clone()
    }

    /// Calls to one operation
    pub async fn calls_to(&self, operation: &str) -> usize {
        let state = self.state.lock().await;
        state
            .journal
            .iter()
            .filter(|c| c.split(' ').next() == Some(operation))
            .count()
    }

    /// Creation calls issued so far, in order
    pub async fn creation_calls(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .journal
            .iter()
            .filter(|c| {
                c.split(' ')
                    .next()
                    .is_some_and(|op| CREATE_OPERATIONS.contains(&op))
            })
            .cloned()
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.journal.clear();
    }

    pub async fn function(&self, name: &str) -> Option<StoredFunction> {
        self.state.lock().await.functions.get(name).cloned()
    }

    pub async fn gateways(&self) -> Vec<StoredGateway> {
        self.state.lock().await.gateways.clone()
    }

    pub async fn targets(&self) -> Vec<TargetDescriptor> {
        self.state.lock().await.targets.clone()
    }

    pub async fn authorizers(&self) -> Vec<ClientInfo> {
        self.state.lock().await.authorizers.clone()
    }

    pub async fn attached_policies(&self, role_name: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .attached_policies
            .iter()
            .filter(|(role, _)| role == role_name)
            .map(|(_, policy)| policy.clone())
            .collect()
    }
}

fn gateway_descriptor(id: &str, name: &str, status: GatewayStatus) -> GatewayDescriptor {
    GatewayDescriptor {
        id: id.to_string(),
        arn: MemoryCloud::gateway_arn(id),
        url: Some(format!(
            "https://{}.gateway.bedrock-agentcore.{}.amazonaws.com/mcp",
            id, REGION
        )),
        name: name.to_string(),
        status,
    }
}

fn function_not_found(operation: &'static str, name: &str) -> CloudError {
    CloudError::NotFound {
        operation,
        message: format!("Function not found: {}", MemoryCloud::function_arn(name)),
    }
}

#[async_trait]
impl ComputeApi for MemoryCloud {
    async fn create_function(&self, request: &CreateFunctionRequest) -> CloudResult<ComputeDescriptor> {
        let mut state = self.state.lock().await;
        state.record("CreateFunction", &request.name)?;

        let raced = std::mem::take(&mut state.conflict_on_function_create);
        if raced && !state.functions.contains_key(&request.name) {
            state.functions.insert(
                request.name.clone(),
                StoredFunction {
                    descriptor: ComputeDescriptor {
                        name: request.name.clone(),
                        arn: Self::function_arn(&request.name),
                    },
                    role_arn: request.role_arn.clone(),
                    package: Vec::new(),
                    runtime: request.runtime.clone(),
                },
            );
        }
        if state.functions.contains_key(&request.name) {
            return Err(CloudError::Conflict {
                operation: "CreateFunction",
                message: format!("Function already exist: {}", request.name),
            });
        }
        if !state.roles.values().any(|arn| arn == &request.role_arn) {
            return Err(CloudError::from_code(
                "CreateFunction",
                Some("InvalidParameterValueException"),
                "The role defined for the function cannot be assumed by Lambda.",
            ));
        }

        let descriptor = ComputeDescriptor {
            name: request.name.clone(),
            arn: Self::function_arn(&request.name),
        };
        state.functions.insert(
            request.name.clone(),
            StoredFunction {
                descriptor: descriptor.clone(),
                role_arn: request.role_arn.clone(),
                package: request.package.clone(),
                runtime: request.runtime.clone(),
            },
        );
        Ok(descriptor)
    }

    async fn update_function_code(&self, function_name: &str, package: &[u8]) -> CloudResult<()> {
        let mut state = self.state.lock().await;
        state.record("UpdateFunctionCode", function_name)?;
        match state.functions.get_mut(function_name) {
            Some(function) => {
                function.package = package.to_vec();
                Ok(())
            }
            None => Err(function_not_found("UpdateFunctionCode", function_name)),
        }
    }

    async fn get_function(&self, function_name: &str) -> CloudResult<ComputeDescriptor> {
        let mut state = self.state.lock().await;
        state.lookup("GetFunction", function_name)?;
        state
            .functions
            .get(function_name)
            .map(|f| f.descriptor.clone())
            .ok_or_else(|| function_not_found("GetFunction", function_name))
    }

    async fn wait_for_function_active(&self, function_name: &str) -> CloudResult<()> {
        let mut state = self.state.lock().await;
        state.record("WaitFunctionActive", function_name)?;
        if state.functions.contains_key(function_name) {
            Ok(())
        } else {
            Err(function_not_found("WaitFunctionActive", function_name))
        }
    }

    async fn wait_for_function_updated(&self, function_name: &str) -> CloudResult<()> {
        let mut state = self.state.lock().await;
        state.record("WaitFunctionUpdated", function_name)?;
        if state.functions.contains_key(function_name) {
            Ok(())
        } else {
            Err(function_not_found("WaitFunctionUpdated", function_name))
        }
    }
}

#[async_trait]
impl IdentityApi for MemoryCloud {
    async fn create_role(&self, request: &CreateRoleRequest) -> CloudResult<String> {
        let mut state = self.state.lock().await;
        state.record("CreateRole", &request.name)?;
        if state.roles.contains_key(&request.name) {
            return Err(CloudError::from_code(
                "CreateRole",
                Some("EntityAlreadyExists"),
                format!("Role with name {} already exists.", request.name),
            ));
        }
        let arn = Self::role_arn(&request.name);
        state.roles.insert(request.name.clone(), arn.clone());
        Ok(arn)
    }

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> CloudResult<()> {
        let mut state = self.state.lock().await;
        state.record("AttachRolePolicy", role_name)?;
        if !state.roles.contains_key(role_name) {
            return Err(CloudError::from_code(
                "AttachRolePolicy",
                Some("NoSuchEntity"),
                format!("The role with name {} cannot be found.", role_name),
            ));
        }
        let entry = (role_name.to_string(), policy_arn.to_string());
        if !state.attached_policies.contains(&entry) {
            state.attached_policies.push(entry);
        }
        Ok(())
    }

    async fn get_caller_identity(&self) -> CloudResult<String> {
        let mut state = self.state.lock().await;
        state.record("GetCallerIdentity", "")?;
        Ok(ACCOUNT_ID.to_string())
    }
}

#[async_trait]
impl GatewayApi for MemoryCloud {
    async fn create_gateway(&self, request: &CreateGatewayRequest) -> CloudResult<GatewayDescriptor> {
        let mut state = self.state.lock().await;
        state.record("CreateGateway", &request.name)?;
        if state.gateways.iter().any(|g| g.descriptor.name == request.name) {
            return Err(CloudError::Conflict {
                operation: "CreateGateway",
                message: format!("Gateway with name {} already exists", request.name),
            });
        }

        let id = format!("{}-{:04}", request.name.to_ascii_lowercase(), state.next_id());
        let descriptor = gateway_descriptor(&id, &request.name, GatewayStatus::Creating);
        let settled = if state.gateway_creation_fails {
            GatewayStatus::Failed
        } else {
            GatewayStatus::Ready
        };
        let polls = state.gateway_polls_until_ready;
        state.gateways.push(StoredGateway {
            descriptor: descriptor.clone(),
            role_arn: request.role_arn.clone(),
            authorizer: Some(request.authorizer.clone()),
            settle: Some((polls, settled)),
        });
        Ok(descriptor)
    }

    async fn get_gateway(&self, gateway_id: &str) -> CloudResult<GatewayDescriptor> {
        let mut state = self.state.lock().await;
        state.lookup("GetGateway", gateway_id)?;
        let gateway = state.gateway_mut("GetGateway", gateway_id)?;
        gateway.settle = match gateway.settle.take() {
            Some((0, status)) => {
                gateway.descriptor.status = status;
                None
            }
            Some((n, status)) => Some((n - 1, status)),
            None => None,
        };
        Ok(gateway.descriptor.clone())
    }

    async fn list_gateways(&self) -> CloudResult<Vec<GatewaySummary>> {
        let mut state = self.state.lock().await;
        state.lookup("ListGateways", "")?;
        Ok(state
            .gateways
            .iter()
            .map(|g| GatewaySummary {
                id: g.descriptor.id.clone(),
                name: g.descriptor.name.clone(),
                status: g.descriptor.status.clone(),
            })
            .collect())
    }

    async fn create_gateway_target(&self, request: &CreateTargetRequest) -> CloudResult<CreatedTarget> {
        let mut state = self.state.lock().await;
        state.record("CreateGatewayTarget", &request.name)?;
        let gateway_arn = state
            .gateway_mut("CreateGatewayTarget", &request.gateway_id)?
            .descriptor
            .arn
            .clone();

        let exists = state
            .targets
            .iter()
            .any(|t| t.gateway_id == request.gateway_id && t.name == request.name);
        let raced = std::mem::take(&mut state.conflict_on_target_create);
        if raced && !exists {
            let id = format!("TGT{:04}", state.next_id());
            state.targets.push(TargetDescriptor {
                id,
                name: request.name.clone(),
                gateway_id: request.gateway_id.clone(),
            });
        }
        if raced || exists {
            return Err(CloudError::Conflict {
                operation: "CreateGatewayTarget",
                message: format!("Target {} already exists", request.name),
            });
        }

        let target = TargetDescriptor {
            id: format!("TGT{:04}", state.next_id()),
            name: request.name.clone(),
            gateway_id: request.gateway_id.clone(),
        };
        state.targets.push(target.clone());
        Ok(CreatedTarget {
            target,
            gateway_arn,
        })
    }

    async fn list_gateway_targets(&self, gateway_id: &str) -> CloudResult<Vec<TargetDescriptor>> {
        let mut state = self.state.lock().await;
        state.lookup("ListGatewayTargets", gateway_id)?;
        state.gateway_mut("ListGatewayTargets", gateway_id)?;
        Ok(state
            .targets
            .iter()
            .filter(|t| t.gateway_id == gateway_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuthorizerApi for MemoryCloud {
    async fn create_oauth_authorizer(&self, name: &str) -> CloudResult<AuthorizerGrant> {
        let mut state = self.state.lock().await;
        state.record("CreateOAuthAuthorizer", name)?;
        let n = state.next_id();
        let pool_id = format!("{}_pool{:04}", REGION, n);
        let domain_prefix = format!("agentcore-{:04}", n);
        let client_info = ClientInfo {
            client_id: format!("client-{:04}", n),
            client_secret: format!("secret-{:04}", n),
            user_pool_id: pool_id.clone(),
            token_endpoint: format!(
                "https://{}.auth.{}.amazoncognito.com/oauth2/token",
                domain_prefix, REGION
            ),
            scope: format!("{}/invoke", name),
            domain_prefix,
            discovery_url: Some(format!(
                "https://cognito-idp.{}.amazonaws.com/{}/.well-known/openid-configuration",
                REGION, pool_id
            )),
        };
        state.authorizers.push(client_info.clone());
        Ok(AuthorizerGrant {
            config: AuthorizerConfig::for_client(&client_info, REGION),
            client_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_created_gateway_settles_after_polls() {
        let cloud = MemoryCloud::new();
        cloud.gateway_ready_after(1).await;

        let created = cloud
            .create_gateway(&CreateGatewayRequest {
                name: "Gw".to_string(),
                role_arn: MemoryCloud::role_arn("r"),
                authorizer: AuthorizerConfig {
                    discovery_url: "https://issuer".to_string(),
                    allowed_clients: vec!["c".to_string()],
                },
                semantic_search: true,
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(created.status, GatewayStatus::Creating);

        let first = cloud.get_gateway(&created.id).await.unwrap();
        assert_eq!(first.status, GatewayStatus::Creating);
        let second = cloud.get_gateway(&created.id).await.unwrap();
        assert_eq!(second.status, GatewayStatus::Ready);
    }

    #[tokio::test]
    async fn test_update_missing_function_is_not_found() {
        let cloud = MemoryCloud::new();
        let err = cloud.update_function_code("Nope", b"zip").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(cloud.calls().await, vec!["UpdateFunctionCode Nope".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_role_is_conflict() {
        let cloud = MemoryCloud::new();
        let request = CreateRoleRequest {
            name: "role".to_string(),
            trust_policy: "{}".to_string(),
            description: String::new(),
        };
        cloud.create_role(&request).await.unwrap();
        let err = cloud.create_role(&request).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(cloud.creation_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_target_race_creates_and_conflicts() {
        let cloud = MemoryCloud::new();
        let gateway = cloud.seed_gateway("Gw", GatewayStatus::Ready).await;
        cloud.conflict_on_target_create().await;

        let err = cloud
            .create_gateway_target(&CreateTargetRequest {
                gateway_id: gateway.id.clone(),
                name: "T".to_string(),
                function_arn: MemoryCloud::function_arn("F"),
                tool_schema: crate::schema::ToolSchema::refund(),
            })
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let targets = cloud.list_gateway_targets(&gateway.id).await.unwrap();
        assert_eq!(targets.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_lookup_failure() {
        let cloud = MemoryCloud::new();
        cloud.seed_gateway("Gw", GatewayStatus::Ready).await;
        cloud.fail_lookups(true).await;
        let err = cloud.list_gateways().await.unwrap_err();
        assert!(matches!(err, CloudError::Transport { .. }));
    }
}

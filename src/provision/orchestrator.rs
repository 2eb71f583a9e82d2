//! One convergent setup run
//!
//! Steps run in a fixed order, each reusing what an earlier run left behind
//! and creating only what is missing:
//!
//! ```text
//! LOAD_SNAPSHOT → DISCOVER_GATEWAY → ENSURE_COMPUTE → ENSURE_AUTHORIZER
//!   → ENSURE_GATEWAY → DISCOVER_TARGET → ENSURE_TARGET → PERSIST → DONE
//! ```
//!
//! A failing step aborts the run. Resources created by earlier steps stay in
//! place and are picked up by the next run.

use std::fmt;

use log::{debug, warn};

use super::authorizer::AuthorizerProvisioner;
use super::compute::ComputeProvisioner;
use super::gateway::GatewayProvisioner;
use super::probe::ResourceProbe;
use super::render;
use super::report::{Disposition, ResourceAction, ResourceKind, SetupReport};
use super::role::RoleProvisioner;
use super::target::{EnsuredTarget, TargetProvisioner};
use crate::cloud::{
    AuthorizerGrant, ClientInfo, CloudClients, ComputeDescriptor, GatewayDescriptor, TargetDescriptor,
};
use crate::config::Config;
use crate::config::types::{ComputeConfig, GatewayConfig, NamesConfig};
use crate::error::Result;
use crate::payload::build_deployment_package;
use crate::schema::ToolSchema;
use crate::state::{Snapshot, StateStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    LoadSnapshot,
    DiscoverGateway,
    EnsureCompute,
    EnsureAuthorizer,
    EnsureGateway,
    DiscoverTarget,
    EnsureTarget,
    Persist,
    Done,
}

impl SetupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadSnapshot => "LOAD_SNAPSHOT",
            Self::DiscoverGateway => "DISCOVER_GATEWAY",
            Self::EnsureCompute => "ENSURE_COMPUTE",
            Self::EnsureAuthorizer => "ENSURE_AUTHORIZER",
            Self::EnsureGateway => "ENSURE_GATEWAY",
            Self::DiscoverTarget => "DISCOVER_TARGET",
            Self::EnsureTarget => "ENSURE_TARGET",
            Self::Persist => "PERSIST",
            Self::Done => "DONE",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::LoadSnapshot => "Loading saved configuration",
            Self::DiscoverGateway => "Looking for an existing gateway",
            Self::EnsureCompute => "Setting up the refund Lambda function",
            Self::EnsureAuthorizer => "Setting up the OAuth authorizer",
            Self::EnsureGateway => "Setting up the gateway",
            Self::DiscoverTarget => "Looking for an existing target",
            Self::EnsureTarget => "Attaching the Lambda target",
            Self::Persist => "Saving configuration",
            Self::Done => "Done",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Self::LoadSnapshot => 1,
            Self::DiscoverGateway => 2,
            Self::EnsureCompute => 3,
            Self::EnsureAuthorizer => 4,
            Self::EnsureGateway => 5,
            Self::DiscoverTarget => 6,
            Self::EnsureTarget => 7,
            Self::Persist => 8,
            Self::Done => 9,
        }
    }
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one run
#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub region: String,
    /// Gateway execution role; one is created when absent
    pub role_arn: Option<String>,
    pub names: NamesConfig,
    pub compute: ComputeConfig,
    pub gateway: GatewayConfig,
    pub tool_schema: ToolSchema,
}

impl SetupOptions {
    pub fn from_config(config: &Config, region: impl Into<String>, role_arn: Option<String>) -> Self {
        Self {
            region: region.into(),
            role_arn,
            names: config.names.clone(),
            compute: config.compute.clone(),
            gateway: config.gateway.clone(),
            tool_schema: ToolSchema::refund(),
        }
    }
}

/// Where the gateway came from during discovery
#[derive(Debug, Clone)]
enum Discovered {
    /// Confirmed by the id recorded in the snapshot
    ById(GatewayDescriptor),
    /// Found by name after the snapshot could not be used
    ByName(GatewayDescriptor),
    Missing,
}

impl Discovered {
    fn into_gateway(self) -> Option<GatewayDescriptor> {
        match self {
            Self::ById(gateway) | Self::ByName(gateway) => Some(gateway),
            Self::Missing => None,
        }
    }
}

/// Describe a mismatch between the OAuth client in use and the gateway
/// being reused, if there can be one.
///
/// A gateway confirmed by its recorded id was created for the recorded
/// client. A gateway found by name may admit a different client.
fn authorizer_drift(has_recorded_client: bool, discovered: &Discovered) -> Option<String> {
    match (discovered, has_recorded_client) {
        (Discovered::ById(_), true) | (Discovered::Missing, _) => None,
        (Discovered::ById(gateway) | Discovered::ByName(gateway), false) => Some(format!(
            "No recorded OAuth client; gateway {} still admits only its original client",
            gateway.id
        )),
        (Discovered::ByName(gateway), true) => Some(format!(
            "Gateway {} was found by name; it may not admit the recorded OAuth client",
            gateway.id
        )),
    }
}

pub struct Orchestrator {
    store: StateStore,
    options: SetupOptions,
    probe: ResourceProbe,
    compute: ComputeProvisioner,
    authorizer: AuthorizerProvisioner,
    gateway: GatewayProvisioner,
    target: TargetProvisioner,
}

impl Orchestrator {
    pub fn new(clients: CloudClients, store: StateStore, options: SetupOptions) -> Self {
        let settle = options.compute.role_settle_delay();
        Self {
            probe: ResourceProbe::new(clients.compute.clone(), clients.gateway.clone()),
            compute: ComputeProvisioner::new(
                clients.compute.clone(),
                RoleProvisioner::new(clients.identity.clone(), settle),
                options.compute.clone(),
            ),
            authorizer: AuthorizerProvisioner::new(clients.authorizer.clone(), &options.region),
            gateway: GatewayProvisioner::new(
                clients.gateway.clone(),
                RoleProvisioner::new(clients.identity.clone(), settle),
                options.gateway.clone(),
            ),
            target: TargetProvisioner::new(clients.gateway.clone()),
            store,
            options,
        }
    }

    fn enter(&self, step: SetupStep) {
        debug!("Entering {}", step);
        render::step_header(step);
    }

    /// Converge the remote resources and persist their identifiers
    pub async fn run(&self) -> Result<SetupReport> {
        render::banner("AgentCore Gateway setup", &self.options.region);
        let mut actions = Vec::new();
        let mut warnings = Vec::new();

        self.enter(SetupStep::LoadSnapshot);
        let snapshot = self.load_snapshot();

        self.enter(SetupStep::DiscoverGateway);
        let discovered = self.discover_gateway(snapshot.as_ref()).await;

        self.enter(SetupStep::EnsureCompute);
        let (compute, disposition) = self
            .ensure_compute(snapshot.as_ref())
            .await
            .map_err(|e| e.at(SetupStep::EnsureCompute))?;
        actions.push(ResourceAction {
            kind: ResourceKind::Compute,
            disposition,
            identifier: compute.arn.clone(),
        });

        self.enter(SetupStep::EnsureAuthorizer);
        let recorded = snapshot.as_ref().and_then(|s| s.client_info());
        if let Some(drift) = authorizer_drift(recorded.is_some(), &discovered) {
            warn!("{}", drift);
            render::warning(&drift);
            warnings.push(drift);
        }
        let (grant, disposition) = self
            .ensure_authorizer(recorded)
            .await
            .map_err(|e| e.at(SetupStep::EnsureAuthorizer))?;
        actions.push(ResourceAction {
            kind: ResourceKind::Authorizer,
            disposition,
            identifier: grant.client_info.client_id.clone(),
        });

        self.enter(SetupStep::EnsureGateway);
        let (gateway, disposition) = self
            .ensure_gateway(discovered, &grant)
            .await
            .map_err(|e| e.at(SetupStep::EnsureGateway))?;
        actions.push(ResourceAction {
            kind: ResourceKind::Gateway,
            disposition,
            identifier: gateway.id.clone(),
        });

        self.enter(SetupStep::DiscoverTarget);
        let existing_target = self.discover_target(&gateway).await;

        self.enter(SetupStep::EnsureTarget);
        let ensured = self
            .ensure_target(&gateway, &compute, existing_target)
            .await
            .map_err(|e| e.at(SetupStep::EnsureTarget))?;
        actions.push(ResourceAction {
            kind: ResourceKind::Target,
            disposition: ensured.disposition,
            identifier: ensured
                .target
                .as_ref()
                .map(|t| t.id.clone())
                .unwrap_or_else(|| self.options.names.target.clone()),
        });

        self.enter(SetupStep::Persist);
        let snapshot = Snapshot {
            gateway_url: gateway.url.clone(),
            gateway_id: Some(gateway.id.clone()),
            gateway_arn: Some(ensured.gateway_arn),
            region: Some(self.options.region.clone()),
            client_info: Some(grant.client_info),
            compute_arn: Some(compute.arn),
        };
        self.store
            .save(&snapshot)
            .map_err(|e| e.at(SetupStep::Persist))?;
        render::done(&format!("Saved {}", self.store.path().display()));
        debug!("Reached {}", SetupStep::Done);

        Ok(SetupReport {
            snapshot,
            actions,
            warnings,
            state_file: self.store.path().to_path_buf(),
        })
    }

    fn load_snapshot(&self) -> Option<Snapshot> {
        let snapshot = self.store.load();
        match &snapshot {
            Some(_) => render::reused(&format!("Found {}", self.store.path().display())),
            None => render::pending("No usable saved configuration, discovering resources"),
        }
        snapshot
    }

    async fn discover_gateway(&self, snapshot: Option<&Snapshot>) -> Discovered {
        if let Some(id) = snapshot.and_then(|s| s.gateway_id()) {
            render::pending(&format!("Checking recorded gateway {}", id));
            if let Some(gateway) = self.probe.find_gateway_by_id(id).await {
                render::reused(&format!("Gateway {} exists and is ready", gateway.id));
                return Discovered::ById(gateway);
            }
            render::pending(&format!("Gateway {} not found or not ready", id));
        }

        let name = &self.options.names.gateway;
        render::pending(&format!("Checking for a gateway named {}", name));
        match self.probe.find_gateway_by_name(name).await {
            Some(gateway) => {
                render::reused(&format!("Found gateway {}", gateway.id));
                Discovered::ByName(gateway)
            }
            None => {
                render::pending("No existing gateway");
                Discovered::Missing
            }
        }
    }

    async fn ensure_compute(&self, snapshot: Option<&Snapshot>) -> Result<(ComputeDescriptor, Disposition)> {
        let name = &self.options.names.function;

        if let Some(recorded) = snapshot.and_then(|s| s.compute_arn()) {
            match self.probe.find_function(name).await {
                Some(function) if function.arn == recorded => {
                    render::reused(&format!("Using existing Lambda {}", function.arn));
                    return Ok((function, Disposition::Reused));
                }
                Some(function) => debug!(
                    "Recorded ARN {} does not match live function {}",
                    recorded, function.arn
                ),
                None => debug!("Recorded function {} is gone", recorded),
            }
        }

        let package = build_deployment_package()?;
        let (function, disposition) = self.compute.ensure(name, &package).await?;
        render::done(&format!("Lambda {}: {}", disposition, function.arn));
        Ok((function, disposition))
    }

    async fn ensure_authorizer(&self, recorded: Option<&ClientInfo>) -> Result<(AuthorizerGrant, Disposition)> {
        let (grant, disposition) = self
            .authorizer
            .ensure(&self.options.names.authorizer, recorded)
            .await?;
        match disposition {
            Disposition::Reused => render::reused(&format!(
                "Using recorded OAuth client {}",
                grant.client_info.client_id
            )),
            _ => render::done(&format!(
                "Authorization server created, client {}",
                grant.client_info.client_id
            )),
        }
        Ok((grant, disposition))
    }

    async fn ensure_gateway(
        &self,
        discovered: Discovered,
        grant: &AuthorizerGrant,
    ) -> Result<(GatewayDescriptor, Disposition)> {
        let (gateway, disposition) = self
            .gateway
            .ensure(
                discovered.into_gateway(),
                &self.options.names.gateway,
                self.options.role_arn.as_deref(),
                &grant.config,
            )
            .await?;
        match disposition {
            Disposition::Reused => render::reused("Skipping gateway creation, reusing existing"),
            _ => render::done(&format!("Gateway {} created", gateway.id)),
        }
        if let Some(url) = &gateway.url {
            render::detail("URL", url);
        }
        Ok((gateway, disposition))
    }

    async fn discover_target(&self, gateway: &GatewayDescriptor) -> Option<TargetDescriptor> {
        let name = &self.options.names.target;
        let target = self.probe.find_target_by_name(&gateway.id, name).await;
        match &target {
            Some(t) => render::reused(&format!("Target {} already exists ({})", name, t.id)),
            None => render::pending(&format!("Target {} not found", name)),
        }
        target
    }

    async fn ensure_target(
        &self,
        gateway: &GatewayDescriptor,
        compute: &ComputeDescriptor,
        existing: Option<TargetDescriptor>,
    ) -> Result<EnsuredTarget> {
        render::detail("Gateway ID", &gateway.id);
        render::detail("Lambda ARN", &compute.arn);
        let ensured = self
            .target
            .ensure(
                gateway,
                &self.options.names.target,
                &compute.arn,
                &self.options.tool_schema,
                existing,
            )
            .await?;
        match ensured.disposition {
            Disposition::Reused => render::reused(&format!(
                "Target {} already attached, reusing",
                self.options.names.target
            )),
            _ => render::done(&format!(
                "Target {} created and attached",
                self.options.names.target
            )),
        }
        Ok(ensured)
    }
}

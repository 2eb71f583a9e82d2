//! Reconciliation of the gateway stack
//!
//! Each provisioner owns one resource and receives its cloud clients at
//! construction. [`Orchestrator`] sequences them into a single run.

pub mod authorizer;
pub mod compute;
pub mod gateway;
pub mod orchestrator;
pub mod probe;
pub mod render;
pub mod report;
pub mod role;
pub mod target;

pub use authorizer::AuthorizerProvisioner;
pub use compute::ComputeProvisioner;
pub use gateway::GatewayProvisioner;
pub use orchestrator::{Orchestrator, SetupOptions, SetupStep};
pub use probe::ResourceProbe;
pub use report::{Disposition, ResourceAction, ResourceKind, SetupReport};
pub use role::{RoleProvisioner, RoleSpec};
pub use target::{EnsuredTarget, TargetProvisioner};

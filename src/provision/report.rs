//! What a setup run did to each resource

use std::fmt;
use std::path::PathBuf;

use crate::state::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Compute,
    Authorizer,
    Gateway,
    Target,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Compute => "Lambda function",
            Self::Authorizer => "OAuth authorizer",
            Self::Gateway => "Gateway",
            Self::Target => "Gateway target",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Created,
    Updated,
    Reused,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Reused => "reused",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAction {
    pub kind: ResourceKind,
    pub disposition: Disposition,
    /// ARN, id or client id of the resource
    pub identifier: String,
}

/// Result of a successful setup run
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub snapshot: Snapshot,
    pub actions: Vec<ResourceAction>,
    /// Drift the run noticed but did not repair
    pub warnings: Vec<String>,
    pub state_file: PathBuf,
}

impl SetupReport {
    pub fn action(&self, kind: ResourceKind) -> Option<&ResourceAction> {
        self.actions.iter().find(|a| a.kind == kind)
    }

    /// Resources this run created, in creation order
    pub fn created(&self) -> Vec<ResourceKind> {
        self.actions
            .iter()
            .filter(|a| a.disposition == Disposition::Created)
            .map(|a| a.kind)
            .collect()
    }
}

use std::path::PathBuf;

use colored::Colorize;

use crate::cloud::aws::{AwsClients, resolve_region};
use crate::cloud::{ComputeDescriptor, GatewayDescriptor, TargetDescriptor};
use crate::config::Config;
use crate::config::types::NamesConfig;
use crate::error::Result;
use crate::provision::{ResourceProbe, render};
use crate::state::{Snapshot, StateStore};

/// What a live probe found for a saved snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveStatus {
    pub gateway: Option<GatewayDescriptor>,
    pub target: Option<TargetDescriptor>,
    pub function: Option<ComputeDescriptor>,
}

impl LiveStatus {
    /// Gateway ready, target attached and function matching the saved ARN
    pub fn is_healthy(&self, snapshot: &Snapshot) -> bool {
        self.gateway.is_some()
            && self.target.is_some()
            && self
                .function
                .as_ref()
                .is_some_and(|f| Some(f.arn.as_str()) == snapshot.compute_arn())
    }
}

/// Probe the resources a snapshot refers to
pub async fn check_live_status(probe: &ResourceProbe, snapshot: &Snapshot, names: &NamesConfig) -> LiveStatus {
    let mut status = LiveStatus::default();
    if let Some(id) = snapshot.gateway_id() {
        status.gateway = probe.find_gateway_by_id(id).await;
    }
    if let Some(gateway) = &status.gateway {
        status.target = probe.find_target_by_name(&gateway.id, &names.target).await;
    }
    status.function = probe.find_function(&names.function).await;
    status
}

fn live_line(label: &str, found: Option<String>) {
    match found {
        Some(value) => println!("  {} {} {}", "✓".green(), label, value.dimmed()),
        None => println!("  {} {}", "✗".red(), label),
    }
}

/// Handle the `status` command
pub async fn handle_status(config: &Config, region: Option<String>, state_file: PathBuf, offline: bool) -> Result<()> {
    let store = StateStore::new(state_file);
    let Some(snapshot) = store.read() else {
        println!(
            "No saved configuration at {}. Run {} first.",
            store.path().display(),
            "gateway-setup setup".cyan()
        );
        return Ok(());
    };

    println!("{}", format!("Saved configuration ({})", store.path().display()).bold());
    render::snapshot_fields(&snapshot);

    if !snapshot.is_trusted() {
        render::warning("The saved gateway id is missing or a placeholder; setup will rediscover resources");
        return Ok(());
    }
    if offline {
        return Ok(());
    }

    let region = region.or_else(|| snapshot.region.clone());
    let region = resolve_region(region.as_deref(), &config.default_region).await;
    let clients = AwsClients::load(region)
        .await
        .into_cloud_clients(config.compute.max_wait());
    let probe = ResourceProbe::new(clients.compute, clients.gateway);

    let live = check_live_status(&probe, &snapshot, &config.names).await;
    println!();
    println!("{}", "Live resources".bold());
    live_line(
        "Gateway ready",
        live.gateway.as_ref().map(|g| g.status.to_string()),
    );
    live_line(
        &format!("Target {}", config.names.target),
        live.target.as_ref().map(|t| t.id.clone()),
    );
    live_line(
        &format!("Lambda {}", config.names.function),
        live.function.as_ref().map(|f| f.arn.clone()),
    );

    if live.is_healthy(&snapshot) {
        render::done("Everything is in place");
    } else {
        render::warning("Some resources are missing; run setup to repair them");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::GatewayStatus;
    use crate::cloud::memory::MemoryCloud;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_live_status_of_complete_stack() {
        let cloud = MemoryCloud::new();
        let names = NamesConfig::default();
        let function = cloud.seed_function(&names.function).await;
        let gateway = cloud.seed_gateway(&names.gateway, GatewayStatus::Ready).await;
        cloud.seed_target(&gateway.id, &names.target).await;

        let snapshot = Snapshot {
            gateway_id: Some(gateway.id.clone()),
            compute_arn: Some(function.arn.clone()),
            ..Default::default()
        };
        let probe = ResourceProbe::new(Arc::new(cloud.clone()), Arc::new(cloud.clone()));
        let live = check_live_status(&probe, &snapshot, &names).await;

        assert_eq!(live.gateway, Some(gateway));
        assert!(live.is_healthy(&snapshot));
        assert!(cloud.creation_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_live_status_with_missing_gateway() {
        let cloud = MemoryCloud::new();
        let names = NamesConfig::default();
        let snapshot = Snapshot {
            gateway_id: Some("gone-0001".to_string()),
            ..Default::default()
        };
        let probe = ResourceProbe::new(Arc::new(cloud.clone()), Arc::new(cloud.clone()));
        let live = check_live_status(&probe, &snapshot, &names).await;

        assert!(live.gateway.is_none());
        assert!(live.target.is_none());
        assert!(!live.is_healthy(&snapshot));
    }
}

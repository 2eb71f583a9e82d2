use std::path::PathBuf;

use log::info;

use crate::cloud::aws::{AwsClients, resolve_region};
use crate::config::Config;
use crate::error::Result;
use crate::provision::{Orchestrator, SetupOptions, SetupReport, render};
use crate::state::StateStore;

/// Handle the `setup` command
pub async fn handle_setup(
    config: &Config,
    region: Option<String>,
    role_arn: Option<String>,
    state_file: PathBuf,
) -> Result<SetupReport> {
    let region = resolve_region(region.as_deref(), &config.default_region).await;
    info!("Using region {}", region);

    let clients = AwsClients::load(region.clone())
        .await
        .into_cloud_clients(config.compute.max_wait());
    let options = SetupOptions::from_config(config, region.to_string(), role_arn);

    let report = Orchestrator::new(clients, StateStore::new(state_file), options)
        .run()
        .await?;
    render::summary(&report);
    Ok(report)
}

//! Discovery of resources that already exist
//!
//! Every lookup here answers "present" or "treat as absent". Lookup errors
//! are logged and read as absent; the provisioners then tolerate the
//! conflicts a redundant create may run into.

use std::sync::Arc;

use log::{debug, warn};

use crate::cloud::{ComputeApi, ComputeDescriptor, GatewayApi, GatewayDescriptor, TargetDescriptor};

pub struct ResourceProbe {
    compute: Arc<dyn ComputeApi>,
    gateways: Arc<dyn GatewayApi>,
}

impl ResourceProbe {
    pub fn new(compute: Arc<dyn ComputeApi>, gateways: Arc<dyn GatewayApi>) -> Self {
        Self { compute, gateways }
    }

    pub async fn find_function(&self, name: &str) -> Option<ComputeDescriptor> {
        match self.compute.get_function(name).await {
            Ok(function) => Some(function),
            Err(e) if e.is_not_found() => {
                debug!("Function {} does not exist", name);
                None
            }
            Err(e) => {
                warn!("Could not look up function {}: {}", name, e);
                None
            }
        }
    }

    /// The gateway with this id, if it exists and is ready
    pub async fn find_gateway_by_id(&self, id: &str) -> Option<GatewayDescriptor> {
        match self.gateways.get_gateway(id).await {
            Ok(gateway) if gateway.status.is_ready() => Some(gateway),
            Ok(gateway) => {
                warn!("Gateway {} is {}, not ready", id, gateway.status);
                None
            }
            Err(e) if e.is_not_found() => {
                debug!("Gateway {} does not exist", id);
                None
            }
            Err(e) => {
                warn!("Could not look up gateway {}: {}", id, e);
                None
            }
        }
    }

    /// A ready gateway with exactly this name.
    ///
    /// Listings only carry summaries, so the match is fetched again by id.
    pub async fn find_gateway_by_name(&self, name: &str) -> Option<GatewayDescriptor> {
        let gateways = match self.gateways.list_gateways().await {
            Ok(gateways) => gateways,
            Err(e) => {
                warn!("Could not list gateways: {}", e);
                return None;
            }
        };

        let summary = gateways
            .into_iter()
            .find(|g| g.name == name && g.status.is_ready())?;
        self.find_gateway_by_id(&summary.id).await
    }

    pub async fn find_target_by_name(&self, gateway_id: &str, name: &str) -> Option<TargetDescriptor> {
        match self.gateways.list_gateway_targets(gateway_id).await {
            Ok(targets) => targets.into_iter().find(|t| t.name == name),
            Err(e) => {
                warn!("Could not list targets of gateway {}: {}", gateway_id, e);
                None
            }
        }
    }
}

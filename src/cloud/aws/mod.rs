//! AWS SDK adapters for the cloud traits
//!
//! One shared [`SdkConfig`] is loaded per run and every service client is
//! built from it.

mod agentcore;
mod cognito;
mod iam;
mod lambda;

pub use agentcore::AgentCoreGateways;
pub use cognito::CognitoAuthorizer;
pub use iam::IamIdentity;
pub use lambda::LambdaCompute;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use log::debug;

use super::{CloudClients, CloudError};

/// Map an SDK failure onto [`CloudError`] using its error code
pub(crate) fn classify<E>(operation: &'static str, err: E) -> CloudError
where
    E: ProvideErrorMetadata + Error + 'static,
{
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    CloudError::from_code(operation, err.code(), message)
}

/// Resolve the region: explicit value, then the AWS default chain, then `fallback`
pub async fn resolve_region(explicit: Option<&str>, fallback: &str) -> Region {
    let chain = RegionProviderChain::first_try(explicit.map(|r| Region::new(r.to_string())))
        .or_default_provider()
        .or_else(Region::new(fallback.to_string()));
    match chain.region().await {
        Some(region) => region,
        None => Region::new(fallback.to_string()),
    }
}

/// Service clients sharing one SDK configuration
#[derive(Clone, Debug)]
pub struct AwsClients {
    pub config: SdkConfig,
    pub lambda: aws_sdk_lambda::Client,
    pub iam: aws_sdk_iam::Client,
    pub sts: aws_sdk_sts::Client,
    pub agentcore: aws_sdk_bedrockagentcorecontrol::Client,
    pub cognito: aws_sdk_cognitoidentityprovider::Client,
}

impl AwsClients {
    /// Load credentials and build every client for `region`
    pub async fn load(region: Region) -> Self {
        debug!("Loading AWS configuration for {}", region);
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        Self {
            lambda: aws_sdk_lambda::Client::new(&config),
            iam: aws_sdk_iam::Client::new(&config),
            sts: aws_sdk_sts::Client::new(&config),
            agentcore: aws_sdk_bedrockagentcorecontrol::Client::new(&config),
            cognito: aws_sdk_cognitoidentityprovider::Client::new(&config),
            config,
        }
    }

    pub fn region(&self) -> Option<&str> {
        self.config.region().map(|r| r.as_ref())
    }

    /// Wrap the clients behind the cloud traits.
    ///
    /// `max_wait` bounds every SDK waiter.
    pub fn into_cloud_clients(self, max_wait: Duration) -> CloudClients {
        let region = self.region().unwrap_or_default().to_string();
        CloudClients::new(
            Arc::new(LambdaCompute::new(self.lambda, max_wait)),
            Arc::new(IamIdentity::new(self.iam, self.sts)),
            Arc::new(AgentCoreGateways::new(self.agentcore)),
            Arc::new(CognitoAuthorizer::new(self.cognito, region, max_wait)),
        )
    }
}

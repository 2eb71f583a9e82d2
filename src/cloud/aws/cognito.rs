use std::time::{Duration, Instant};

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::types::{DomainStatusType, OAuthFlowType, ResourceServerScopeType};
use log::{debug, info};
use uuid::Uuid;

use super::classify;
use crate::cloud::{AuthorizerApi, AuthorizerConfig, AuthorizerGrant, ClientInfo, CloudError, CloudResult};

const DOMAIN_POLL_INTERVAL: Duration = Duration::from_secs(5);
const INVOKE_SCOPE: &str = "invoke";

/// [`AuthorizerApi`] backed by a Cognito user pool issuing client-credentials tokens
#[derive(Clone, Debug)]
pub struct CognitoAuthorizer {
    client: aws_sdk_cognitoidentityprovider::Client,
    region: String,
    max_wait: Duration,
}

impl CognitoAuthorizer {
    pub fn new(client: aws_sdk_cognitoidentityprovider::Client, region: String, max_wait: Duration) -> Self {
        Self {
            client,
            region,
            max_wait,
        }
    }

    async fn create_pool(&self, pool_name: &str) -> CloudResult<String> {
        const OP: &str = "CreateUserPool";
        let output = self
            .client
            .create_user_pool()
            .pool_name(pool_name)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        output
            .user_pool()
            .and_then(|pool| pool.id())
            .map(str::to_string)
            .ok_or_else(|| CloudError::incomplete(OP, "UserPool.Id"))
    }

    /// Create the hosted domain and wait until it serves tokens
    async fn create_domain(&self, pool_id: &str, prefix: &str) -> CloudResult<()> {
        self.client
            .create_user_pool_domain()
            .domain(prefix)
            .user_pool_id(pool_id)
            .send()
            .await
            .map_err(|e| classify("CreateUserPoolDomain", e))?;

        let started = Instant::now();
        loop {
            let output = self
                .client
                .describe_user_pool_domain()
                .domain(prefix)
                .send()
                .await
                .map_err(|e| classify("DescribeUserPoolDomain", e))?;
            let status = output.domain_description().and_then(|d| d.status());
            if status == Some(&DomainStatusType::Active) {
                return Ok(());
            }
            if started.elapsed() >= self.max_wait {
                return Err(CloudError::WaitTimeout {
                    resource: format!("user pool domain {}", prefix),
                    state: "ACTIVE",
                    waited: self.max_wait,
                });
            }
            debug!("Domain {} is {:?}, polling again", prefix, status);
            tokio::time::sleep(DOMAIN_POLL_INTERVAL).await;
        }
    }

    async fn create_resource_server(&self, pool_id: &str, identifier: &str) -> CloudResult<()> {
        const OP: &str = "CreateResourceServer";
        let scope = ResourceServerScopeType::builder()
            .scope_name(INVOKE_SCOPE)
            .scope_description("Invoke tools through the gateway")
            .build()
            .map_err(|e| CloudError::invalid(OP, e.to_string()))?;
        self.client
            .create_resource_server()
            .user_pool_id(pool_id)
            .identifier(identifier)
            .name(identifier)
            .scopes(scope)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;
        Ok(())
    }

    async fn create_client(&self, pool_id: &str, name: &str, scope: &str) -> CloudResult<(String, String)> {
        const OP: &str = "CreateUserPoolClient";
        let output = self
            .client
            .create_user_pool_client()
            .user_pool_id(pool_id)
            .client_name(format!("{}-client", name))
            .generate_secret(true)
            .allowed_o_auth_flows(OAuthFlowType::ClientCredentials)
            .allowed_o_auth_scopes(scope)
            .allowed_o_auth_flows_user_pool_client(true)
            .supported_identity_providers("COGNITO")
            .send()
            .await
            .map_err(|e| classify(OP, e))?;

        let client = output
            .user_pool_client()
            .ok_or_else(|| CloudError::incomplete(OP, "UserPoolClient"))?;
        let id = client
            .client_id()
            .ok_or_else(|| CloudError::incomplete(OP, "ClientId"))?;
        let secret = client
            .client_secret()
            .ok_or_else(|| CloudError::incomplete(OP, "ClientSecret"))?;
        Ok((id.to_string(), secret.to_string()))
    }
}

#[async_trait]
impl AuthorizerApi for CognitoAuthorizer {
    async fn create_oauth_authorizer(&self, name: &str) -> CloudResult<AuthorizerGrant> {
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_string();
        let domain_prefix = format!("agentcore-{}", suffix);

        let pool_id = self.create_pool(&format!("agentcore-gateway-{}", suffix)).await?;
        info!("Created user pool {}", pool_id);
        self.create_domain(&pool_id, &domain_prefix).await?;
        self.create_resource_server(&pool_id, name).await?;

        let scope = format!("{}/{}", name, INVOKE_SCOPE);
        let (client_id, client_secret) = self.create_client(&pool_id, name, &scope).await?;
        info!("Created app client {}", client_id);

        let client_info = ClientInfo {
            client_id,
            client_secret,
            token_endpoint: format!(
                "https://{}.auth.{}.amazoncognito.com/oauth2/token",
                domain_prefix, self.region
            ),
            scope,
            discovery_url: Some(format!(
                "https://cognito-idp.{}.amazonaws.com/{}/.well-known/openid-configuration",
                self.region, pool_id
            )),
            user_pool_id: pool_id,
            domain_prefix,
        };
        Ok(AuthorizerGrant {
            config: AuthorizerConfig::for_client(&client_info, &self.region),
            client_info,
        })
    }
}

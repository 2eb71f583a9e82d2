use async_trait::async_trait;
use aws_sdk_bedrockagentcorecontrol::types::{
    AuthorizerConfiguration, AuthorizerType, CredentialProviderConfiguration,
    CredentialProviderType, CustomJwtAuthorizerConfiguration, GatewayProtocolConfiguration,
    GatewayProtocolType, McpGatewayConfiguration, McpLambdaTargetConfiguration,
    McpTargetConfiguration, SchemaDefinition, SchemaType, SearchType, TargetConfiguration,
    ToolDefinition, ToolSchema as SdkToolSchema,
};
use aws_smithy_types::error::operation::BuildError;

use super::classify;
use crate::cloud::{
    CloudError, CloudResult, CreateGatewayRequest, CreateTargetRequest, CreatedTarget,
    GatewayApi, GatewayDescriptor, GatewayStatus, GatewaySummary, TargetDescriptor,
};
use crate::schema::{SchemaKind, SchemaNode, ToolSchema};

/// [`GatewayApi`] over the Bedrock AgentCore control plane
#[derive(Clone, Debug)]
pub struct AgentCoreGateways {
    client: aws_sdk_bedrockagentcorecontrol::Client,
}

impl AgentCoreGateways {
    pub fn new(client: aws_sdk_bedrockagentcorecontrol::Client) -> Self {
        Self { client }
    }
}

fn invalid(operation: &'static str) -> impl Fn(BuildError) -> CloudError {
    move |e| CloudError::invalid(operation, e.to_string())
}

fn schema_type(kind: SchemaKind) -> SchemaType {
    match kind {
        SchemaKind::Object => SchemaType::Object,
        SchemaKind::String => SchemaType::String,
        SchemaKind::Integer => SchemaType::Integer,
        SchemaKind::Array => SchemaType::Array,
    }
}

fn schema_definition(node: &SchemaNode) -> Result<SchemaDefinition, BuildError> {
    let mut builder = SchemaDefinition::builder().r#type(schema_type(node.kind));
    if let Some(description) = &node.description {
        builder = builder.description(description);
    }
    for (name, property) in &node.properties {
        builder = builder.properties(name, schema_definition(property)?);
    }
    for name in &node.required {
        builder = builder.required(name);
    }
    if let Some(items) = &node.items {
        builder = builder.items(Box::new(schema_definition(items)?));
    }
    builder.build()
}

fn tool_definitions(schema: &ToolSchema) -> Result<Vec<ToolDefinition>, BuildError> {
    schema
        .tools
        .iter()
        .map(|tool| {
            ToolDefinition::builder()
                .name(&tool.name)
                .description(&tool.description)
                .input_schema(schema_definition(&tool.input_schema)?)
                .build()
        })
        .collect()
}

#[async_trait]
impl GatewayApi for AgentCoreGateways {
    async fn create_gateway(&self, request: &CreateGatewayRequest) -> CloudResult<GatewayDescriptor> {
        const OP: &str = "CreateGateway";
        let jwt = CustomJwtAuthorizerConfiguration::builder()
            .discovery_url(&request.authorizer.discovery_url)
            .set_allowed_clients(Some(request.authorizer.allowed_clients.clone()))
            .build()
            .map_err(invalid(OP))?;

        let mut call = self
            .client
            .create_gateway()
            .name(&request.name)
            .role_arn(&request.role_arn)
            .protocol_type(GatewayProtocolType::Mcp)
            .authorizer_type(AuthorizerType::CustomJwt)
            .authorizer_configuration(AuthorizerConfiguration::CustomJwtAuthorizer(jwt))
            .set_description(request.description.clone());
        if request.semantic_search {
            let mcp = McpGatewayConfiguration::builder()
                .search_type(SearchType::Semantic)
                .build();
            call = call.protocol_configuration(GatewayProtocolConfiguration::Mcp(mcp));
        }

        let output = call.send().await.map_err(|e| classify(OP, e))?;
        Ok(GatewayDescriptor {
            id: output.gateway_id().to_string(),
            arn: output.gateway_arn().to_string(),
            url: output.gateway_url().map(str::to_string),
            name: output.name().to_string(),
            status: GatewayStatus::parse(output.status().as_str()),
        })
    }

    async fn get_gateway(&self, gateway_id: &str) -> CloudResult<GatewayDescriptor> {
        let output = self
            .client
            .get_gateway()
            .gateway_identifier(gateway_id)
            .send()
            .await
            .map_err(|e| classify("GetGateway", e))?;
        Ok(GatewayDescriptor {
            id: output.gateway_id().to_string(),
            arn: output.gateway_arn().to_string(),
            url: output.gateway_url().map(str::to_string),
            name: output.name().to_string(),
            status: GatewayStatus::parse(output.status().as_str()),
        })
    }

    async fn list_gateways(&self) -> CloudResult<Vec<GatewaySummary>> {
        let items = self
            .client
            .list_gateways()
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| classify("ListGateways", e))?;

        Ok(items
            .iter()
            .map(|g| GatewaySummary {
                id: g.gateway_id().to_string(),
                name: g.name().to_string(),
                status: GatewayStatus::parse(g.status().as_str()),
            })
            .collect())
    }

    async fn create_gateway_target(&self, request: &CreateTargetRequest) -> CloudResult<CreatedTarget> {
        const OP: &str = "CreateGatewayTarget";
        let tools = tool_definitions(&request.tool_schema).map_err(invalid(OP))?;
        let lambda = McpLambdaTargetConfiguration::builder()
            .lambda_arn(&request.function_arn)
            .tool_schema(SdkToolSchema::InlinePayload(tools))
            .build()
            .map_err(invalid(OP))?;
        let credentials = CredentialProviderConfiguration::builder()
            .credential_provider_type(CredentialProviderType::GatewayIamRole)
            .build()
            .map_err(invalid(OP))?;

        let output = self
            .client
            .create_gateway_target()
            .gateway_identifier(&request.gateway_id)
            .name(&request.name)
            .target_configuration(TargetConfiguration::Mcp(McpTargetConfiguration::Lambda(lambda)))
            .credential_provider_configurations(credentials)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;

        Ok(CreatedTarget {
            target: TargetDescriptor {
                id: output.target_id().to_string(),
                name: output.name().to_string(),
                gateway_id: request.gateway_id.clone(),
            },
            gateway_arn: output.gateway_arn().to_string(),
        })
    }

    async fn list_gateway_targets(&self, gateway_id: &str) -> CloudResult<Vec<TargetDescriptor>> {
        let items = self
            .client
            .list_gateway_targets()
            .gateway_identifier(gateway_id)
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| classify("ListGatewayTargets", e))?;

        Ok(items
            .iter()
            .map(|t| TargetDescriptor {
                id: t.target_id().to_string(),
                name: t.name().to_string(),
                gateway_id: gateway_id.to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refund_schema_converts() {
        let tools = tool_definitions(&ToolSchema::refund()).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name(), "refund");

        let input = tools[0].input_schema().unwrap();
        assert_eq!(input.r#type(), &SchemaType::Object);
        assert_eq!(input.required(), &["amount".to_string(), "orderId".to_string()]);
        let properties = input.properties().unwrap();
        assert_eq!(properties["amount"].r#type(), &SchemaType::Integer);
        assert_eq!(properties["orderId"].r#type(), &SchemaType::String);
    }

    #[test]
    fn test_array_items_convert() {
        let node = SchemaNode::array("ids", SchemaNode::string("id"));
        let definition = schema_definition(&node).unwrap();
        assert_eq!(definition.items().unwrap().r#type(), &SchemaType::String);
    }
}

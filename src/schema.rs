//! Tool schema declared on a gateway target
//!
//! A target advertises the tools its backend implements. The schema is fixed
//! when the target is created; there is no update path.

use serde::Serialize;
use std::collections::BTreeMap;

/// JSON-schema primitive types accepted by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Object,
    String,
    Integer,
    Array,
}

/// One node of a tool's input schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaNode {
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    fn new(kind: SchemaKind, description: Option<&str>) -> Self {
        Self {
            kind,
            description: description.map(str::to_string),
            properties: BTreeMap::new(),
            required: Vec::new(),
            items: None,
        }
    }

    pub fn object(description: &str) -> Self {
        Self::new(SchemaKind::Object, Some(description))
    }

    pub fn string(description: &str) -> Self {
        Self::new(SchemaKind::String, Some(description))
    }

    pub fn integer(description: &str) -> Self {
        Self::new(SchemaKind::Integer, Some(description))
    }

    pub fn array(description: &str, items: SchemaNode) -> Self {
        let mut node = Self::new(SchemaKind::Array, Some(description));
        node.items = Some(Box::new(items));
        node
    }

    /// Add a property that callers must supply
    pub fn required_property(mut self, name: &str, node: SchemaNode) -> Self {
        self.properties.insert(name.to_string(), node);
        self.required.push(name.to_string());
        self
    }

    /// Add a property that callers may omit
    pub fn optional_property(mut self, name: &str, node: SchemaNode) -> Self {
        self.properties.insert(name.to_string(), node);
        self
    }
}

/// A single tool exposed through the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: SchemaNode,
}

/// Inline tool schema payload for a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolSchema {
    pub tools: Vec<ToolDefinition>,
}

impl ToolSchema {
    pub fn new(tools: Vec<ToolDefinition>) -> Self {
        Self { tools }
    }

    /// The refund processor's single `refund` tool
    pub fn refund() -> Self {
        let input = SchemaNode::object("Input parameters for processing a customer refund")
            .required_property(
                "amount",
                SchemaNode::integer("The refund amount in USD (must be positive)"),
            )
            .required_property(
                "orderId",
                SchemaNode::string("Unique identifier for the customer requesting the refund"),
            );

        Self::new(vec![ToolDefinition {
            name: "refund".to_string(),
            description: "Processes customer refunds by validating the refund amount, customer ID, \
                          and reason. Returns a refund ID and confirmation details upon successful \
                          processing."
                .to_string(),
            input_schema: input,
        }])
    }
}

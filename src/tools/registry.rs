//! Tool registration and dispatch.
//!
//! Each tool carries a typed input schema; the registry validates arguments
//! against it and checks the caller's rate budget before the handler runs, so
//! handlers only ever see well-formed input.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::warn;

use crate::schema::{validate, SchemaNode};
use crate::service::CatalogDataService;

use super::protocol::{ResponseMetadata, ToolError, ToolRequest, ToolResponse};

pub type ToolContext = Arc<CatalogDataService>;

/// What a handler produces: the payload plus whether it was served from
/// cache, which the envelope metadata reports.
pub struct ToolOutput {
    pub data: Value,
    pub cached: bool,
}

impl ToolOutput {
    pub fn fresh(data: Value) -> Self {
        Self { data, cached: false }
    }

    pub fn new(data: Value, cached: bool) -> Self {
        Self { data, cached }
    }
}

pub type ToolResult = Result<ToolOutput, ToolError>;

pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

pub type ToolHandler = Arc<dyn Fn(ToolContext, Value) -> ToolFuture + Send + Sync>;

pub struct RegisteredTool {
    pub name: String,
    pub description: String,
    pub input_schema: SchemaNode,
    pub handler: ToolHandler,
}

/// Listed tool definition, schema in JSON-schema shape.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: RegisteredTool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.input_schema.to_json_schema(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Full dispatch: lookup, rate limit, schema validation, handler. Always
    /// produces an envelope; failures never reach the caller as transport
    /// errors.
    pub async fn dispatch(&self, service: ToolContext, request: ToolRequest) -> ToolResponse {
        let started = Instant::now();
        let caller = request.caller.as_deref().unwrap_or("anonymous");

        let result = self.call(service, &request, caller).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(output) => ToolResponse::success(
                output.data,
                ResponseMetadata::new(elapsed_ms, output.cached),
            ),
            Err(err) => ToolResponse::error(err, ResponseMetadata::new(elapsed_ms, false)),
        }
    }

    async fn call(
        &self,
        service: ToolContext,
        request: &ToolRequest,
        caller: &str,
    ) -> ToolResult {
        let tool = self
            .tools
            .get(&request.name)
            .ok_or_else(|| ToolError::UnknownTool(request.name.clone()))?;

        service.check_rate_limit(caller).map_err(ToolError::from)?;

        let arguments = request.arguments.clone().unwrap_or(Value::Object(Default::default()));
        let report = validate(&arguments, &tool.input_schema);
        for warning in &report.warnings {
            warn!(tool = %tool.name, "argument warning at {}: {}", warning.path, warning.message);
        }
        if !report.valid() {
            let detail = report
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.path, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ToolError::InvalidParams(detail));
        }

        (tool.handler)(service, arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ToolBuilder {
    name: String,
    description: String,
    input_schema: SchemaNode,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: SchemaNode::object(),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn input_schema(mut self, schema: SchemaNode) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredTool
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        RegisteredTool {
            name: self.name,
            description: self.description,
            input_schema: self.input_schema,
            handler: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        }
    }
}

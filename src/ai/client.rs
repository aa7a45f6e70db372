use super::schema::{self, SchemaSpec};
use super::schema_utils;
use crate::core::conversation::{Role, Turn};
use crate::error::GenerationError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
    /// Opaque signature some models attach to a call; it must be echoed
    /// back unchanged with the call on the next request.
    pub thought_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    ToolCall(ToolCall),
    ToolResult { name: String, response: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, parts: vec![Part::Text(text.into())] }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, parts: vec![Part::Text(text.into())] }
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Self { role: turn.role, parts: vec![Part::Text(turn.text.clone())] }
    }
}

/// A function the model may call, as advertised on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model_id: String,
    pub system_instruction: Option<String>,
    pub contents: Vec<Message>,
    pub output_schema: Option<SchemaSpec>,
    pub tools: Vec<ToolDeclaration>,
}

impl GenerationRequest {
    /// Single-prompt request whose answer must conform to `schema`.
    pub fn structured(model_id: &str, prompt: String, schema: SchemaSpec) -> Self {
        Self {
            model_id: model_id.to_string(),
            system_instruction: None,
            contents: vec![Message::user(prompt)],
            output_schema: Some(schema),
            tools: Vec::new(),
        }
    }

    pub fn chat(model_id: &str, system: &str, contents: Vec<Message>, tools: Vec<ToolDeclaration>) -> Self {
        Self {
            model_id: model_id.to_string(),
            system_instruction: Some(system.to_string()),
            contents,
            output_schema: None,
            tools,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    pub text: Option<String>,
    pub structured: Option<Value>,
    pub tool_calls: Vec<ToolCall>,
}

impl GenerationResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    pub fn structured(value: Value) -> Self {
        Self { structured: Some(value), ..Default::default() }
    }

    pub fn tool_call(name: &str, args: Value) -> Self {
        Self { tool_calls: vec![ToolCall { name: name.to_string(), args, thought_signature: None }], ..Default::default() }
    }
}

/// The external language-model endpoint.
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn invoke(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError>;
}

/// Single choke point for model calls: applies the per-call deadline and,
/// for structured requests, turns the raw answer into a schema-valid value.
/// Retrying is left to callers.
#[derive(Clone)]
pub struct GenerationClient {
    service: Arc<dyn ModelService>,
    request_timeout: Duration,
}

impl GenerationClient {
    pub fn new(service: Arc<dyn ModelService>, request_timeout: Duration) -> Self {
        Self { service, request_timeout }
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult, GenerationError> {
        let label = request.output_schema.as_ref().map(|s| s.name.as_str()).unwrap_or("chat");
        log::debug!("➡️  Generation request [{}] on {}", label, request.model_id);

        let mut result = match timeout(self.request_timeout, self.service.invoke(&request)).await {
            Ok(outcome) => outcome?,
            Err(_) => {
                return Err(GenerationError::timeout(format!(
                    "no response within {}s",
                    self.request_timeout.as_secs_f32()
                )));
            }
        };

        if let Some(schema) = &request.output_schema {
            let value = conform(&result, schema)?;
            result.structured = Some(value);
        }
        Ok(result)
    }
}

fn conform(result: &GenerationResult, schema: &SchemaSpec) -> Result<Value, GenerationError> {
    let raw = match (&result.structured, &result.text) {
        (Some(v), _) => v.clone(),
        (None, Some(text)) => serde_json::from_str(schema_utils::strip_code_fence(text)).map_err(|e| {
            GenerationError::schema_mismatch(format!("{} output is not JSON: {e}", schema.name))
        })?,
        (None, None) => {
            return Err(GenerationError::schema_mismatch(format!("{} output was empty", schema.name)));
        }
    };

    let coerced = schema_utils::coerce(raw, schema);
    schema::validate(&coerced, schema).map_err(|v| {
        log::warn!("⚠️  {} output rejected: {}", schema.name, v);
        GenerationError::from_violation(v)
    })?;
    Ok(coerced)
}

use super::client::{GenerationRequest, GenerationResult, Message, ModelService, Part, ToolCall};
use crate::config::Config;
use crate::core::conversation::Role;
use crate::error::{CivisError, GenerationError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

const REFUSAL_REASONS: [&str; 5] = ["SAFETY", "RECITATION", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// `generateContent` over the Gemini REST API.
#[derive(Clone)]
pub struct GeminiService {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl GeminiService {
    pub fn new(config: &Config) -> Result<Self, CivisError> {
        let api_key = config.require_api_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CivisError::Config(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(http, api_key, &config.api_base))
    }

    pub fn with_client(http: reqwest::Client, api_key: String, api_base: &str) -> Self {
        Self { http, api_key, api_base: api_base.trim_end_matches('/').to_string() }
    }

    /// Posts a raw `generateContent` payload and returns the response body.
    pub(crate) async fn post(&self, model_id: &str, payload: &Value) -> Result<Value, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.api_base, model_id);

        let res = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            log::error!("API Error {status}: {err_text}");
            return Err(status_error(status, &err_text));
        }

        Ok(res.json().await?)
    }
}

/// Gateway and request timeouts count as `Timeout`; every other non-success
/// status is a `NetworkFailure`.
pub(crate) fn status_error(status: StatusCode, body: &str) -> GenerationError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GenerationError::timeout(format!("API Error {status}")),
        _ => GenerationError::network(format!("API Error {status}: {body}")),
    }
}

#[async_trait]
impl ModelService for GeminiService {
    async fn invoke(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        let payload = build_payload(request);
        let body = self.post(&request.model_id, &payload).await?;
        parse_response(&body)
    }
}

pub(crate) fn build_payload(request: &GenerationRequest) -> Value {
    let contents: Vec<Value> = request.contents.iter().map(encode_message).collect();
    let mut payload = json!({ "contents": contents });

    if let Some(system) = &request.system_instruction {
        payload["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }

    if !request.tools.is_empty() {
        let declarations: Vec<Value> = request
            .tools
            .iter()
            .map(|t| json!({ "name": t.name, "description": t.description, "parameters": t.parameters }))
            .collect();
        payload["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    if let Some(schema) = &request.output_schema {
        payload["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema.to_api_schema(),
        });
    }

    payload
}

fn encode_message(message: &Message) -> Value {
    let role = match message.role {
        Role::User => "user",
        Role::Model => "model",
    };
    let parts: Vec<Value> = message
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::ToolCall(call) => {
                let mut part = json!({ "functionCall": { "name": call.name, "args": call.args } });
                if let Some(signature) = &call.thought_signature {
                    part["thoughtSignature"] = json!(signature);
                }
                part
            }
            Part::ToolResult { name, response } => {
                json!({ "functionResponse": { "name": name, "response": response } })
            }
        })
        .collect();
    json!({ "role": role, "parts": parts })
}

pub(crate) fn parse_response(body: &Value) -> Result<GenerationResult, GenerationError> {
    if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
        return Err(GenerationError::refusal(format!("prompt blocked: {reason}")));
    }

    let candidate = &body["candidates"][0];
    if candidate.is_null() {
        return Err(GenerationError::schema_mismatch("no candidates returned"));
    }

    if let Some(reason) = candidate["finishReason"].as_str() {
        if REFUSAL_REASONS.contains(&reason) {
            return Err(GenerationError::refusal(format!("generation stopped: {reason}")));
        }
    }

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in candidate["content"]["parts"].as_array().into_iter().flatten() {
        if let Some(t) = part["text"].as_str() {
            text.push_str(t);
        }
        if let Some(name) = part["functionCall"]["name"].as_str() {
            tool_calls.push(ToolCall {
                name: name.to_string(),
                args: part["functionCall"].get("args").cloned().unwrap_or_else(|| json!({})),
                thought_signature: part["thoughtSignature"].as_str().map(String::from),
            });
        }
    }

    if text.trim().is_empty() && tool_calls.is_empty() {
        return Err(GenerationError::schema_mismatch("No text content returned"));
    }

    Ok(GenerationResult {
        text: (!text.trim().is_empty()).then_some(text),
        structured: None,
        tool_calls,
    })
}

//! Gemini API client

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::provider::LanguageModel;
use crate::agent::types::*;
use crate::config::GeminiConfig;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Wire types (generateContent)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, parts: Vec<Part>) -> Self {
        Content {
            role: Some(role.to_string()),
            parts,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    /// Sent by thinking models on function-call parts; must be echoed back
    #[serde(skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Part {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    /// Only some models issue call IDs; we never send them back.
    #[serde(default, skip_serializing)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<ToolDefinition>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: u32,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config(
                "API key is required. Provide it explicitly or set GOOGLE_API_KEY.".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        let mut key = header::HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(GeminiClient { client, config })
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<GenerateContentRequest> {
        let mut system_parts = Vec::new();
        let mut contents = Vec::with_capacity(messages.len());

        for message in messages {
            match message.role {
                Role::System => system_parts.push(Part::text(message.content.clone())),
                Role::User => contents.push(Content::new("user", vec![Part::text(message.content.clone())])),
                Role::Assistant => {
                    let mut parts = Vec::new();
                    if !message.content.is_empty() {
                        parts.push(Part::text(message.content.clone()));
                    }
                    if let Some(ref invocation) = message.tool_invocation {
                        parts.push(Part {
                            function_call: Some(FunctionCall {
                                id: None,
                                name: invocation.name.clone(),
                                args: invocation.arguments.clone(),
                            }),
                            thought_signature: invocation.thought_signature.clone(),
                            ..Default::default()
                        });
                    }
                    contents.push(Content::new("model", parts));
                }
                Role::Tool => {
                    let name = message.name.clone().ok_or_else(|| {
                        Error::Internal("tool result message without a tool name".to_string())
                    })?;
                    contents.push(Content::new(
                        "user",
                        vec![Part {
                            function_response: Some(FunctionResponse {
                                name,
                                response: json!({ "content": message.content }),
                            }),
                            ..Default::default()
                        }],
                    ));
                }
            }
        }

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: system_parts,
            })
        };

        let tools = if tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTool {
                function_declarations: tools.to_vec(),
            }]
        };

        Ok(GenerateContentRequest {
            system_instruction,
            contents,
            tools,
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        })
    }

    /// Send a request to the Gemini API
    async fn send_request(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        debug!(
            "Sending request to Gemini: model={}, contents={}, tools={}",
            self.config.model,
            request.contents.len(),
            !request.tools.is_empty()
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();

        if status.is_success() {
            let body = response
                .json::<GenerateContentResponse>()
                .await
                .map_err(|e| Error::Provider(format!("Failed to parse Gemini response: {}", e)))?;

            if let Some(ref usage) = body.usage_metadata {
                info!(
                    "Gemini response: model={}, tokens={}",
                    self.config.model, usage.total_token_count
                );
            }

            Ok(body)
        } else {
            let error_text = response.text().await.unwrap_or_default();

            match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    warn!("Gemini rate limit exceeded: {}", error_text);
                    Err(Error::Provider(format!("Rate limit exceeded: {}", error_text)))
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Err(Error::Provider("Invalid Gemini API key".to_string()))
                }
                _ => Err(Error::Provider(format!(
                    "Gemini API error ({}): {}",
                    status, error_text
                ))),
            }
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ModelReply> {
        let request = self.build_request(messages, tools)?;
        let response = self.send_request(&request).await?;
        parse_reply(response)
    }
}

/// Turn a generateContent response into a reply. A function call wins over
/// text, but text parts from the same candidate travel with it.
fn parse_reply(response: GenerateContentResponse) -> Result<ModelReply> {
    let candidate = match response.candidates.into_iter().next() {
        Some(c) => c,
        None => {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(Error::Provider(format!("Gemini returned no answer: {}", reason)));
        }
    };

    debug!("Gemini finish_reason: {:?}", candidate.finish_reason);

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let mut text = String::new();
    let mut invocation = None;

    for part in parts {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            if invocation.is_some() {
                warn!("Ignoring extra function call '{}'", call.name);
                continue;
            }
            let id = call
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()));
            invocation = Some(
                ToolInvocation::new(id, call.name, call.args)
                    .with_thought_signature(part.thought_signature),
            );
        }
    }

    Ok(match invocation {
        Some(invocation) => ModelReply::ToolCall { text, invocation },
        None => ModelReply::Text(text),
    })
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("Gemini request timed out: {}", err))
    } else {
        Error::Http(err)
    }
}

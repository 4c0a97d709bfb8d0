use crate::{
    error::TransformError,
    transform::{
        RowTransform, TransformOutcome,
        prompt::{SYSTEM_PROMPT, TOOL_NAME, tool_definition, user_message},
    },
};
use async_trait::async_trait;
use engine_core::retry::{RetryDisposition, RetryPolicy};
use model::{core::column::ColumnSpec, records::row::Row};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::{collections::HashMap, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection and sampling settings of the chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        LlmConfig {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 500,
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// Row transform backed by an OpenAI-compatible chat-completions API.
///
/// Every call forces the `extract_data` tool so the answer arrives as JSON
/// arguments keyed by target column. Transient failures are retried here;
/// the pipeline itself never retries a row.
pub struct ChatCompletionTransform {
    client: reqwest::Client,
    config: LlmConfig,
    retry: RetryPolicy,
}

impl ChatCompletionTransform {
    pub fn new(config: LlmConfig) -> Result<Self, TransformError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransformError::Transport(e.to_string()))?;

        Ok(ChatCompletionTransform {
            client,
            config,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request_body(&self, row: &Row, columns: &[ColumnSpec], instruction: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_message(row, instruction) },
            ],
            "tools": [tool_definition(columns)],
            "tool_choice": { "type": "function", "function": { "name": TOOL_NAME } },
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }

    async fn send(&self, body: &Value) -> Result<ChatResponse, TransformError> {
        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| TransformError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransformError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TransformError::Transport(e.to_string()))?;
        parse_response(&text)
    }
}

#[async_trait]
impl RowTransform for ChatCompletionTransform {
    async fn transform(
        &self,
        row: &Row,
        columns: &[ColumnSpec],
        instruction: &str,
        cancel: &CancellationToken,
    ) -> TransformOutcome {
        if cancel.is_cancelled() {
            return TransformOutcome::failure(TransformError::Cancelled, 0);
        }
        let body = self.request_body(row, columns, instruction);

        // A request already on the wire runs to completion; only the backoff
        // between attempts gives way to cancellation.
        let response = self
            .retry
            .run(
                cancel,
                || self.send(&body),
                |e| {
                    if e.is_transient() {
                        warn!(error = %e, "transient API error");
                        RetryDisposition::Retry
                    } else {
                        RetryDisposition::Stop
                    }
                },
            )
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => return TransformOutcome::failure(err.into_inner(), 0),
        };

        let cost = response.usage.as_ref().map_or(0, |u| u.total_tokens);
        debug!(tokens = cost, "completion received");

        match extract_values(response, columns) {
            Ok(values) => TransformOutcome::success(values, cost),
            Err(err) => TransformOutcome::failure(err, cost),
        }
    }
}

/// A 200 body that does not decode is the server's fault, not the network's.
fn parse_response(body: &str) -> Result<ChatResponse, TransformError> {
    serde_json::from_str(body).map_err(TransformError::MalformedResponse)
}

fn extract_values(
    response: ChatResponse,
    columns: &[ColumnSpec],
) -> Result<HashMap<String, String>, TransformError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(TransformError::EmptyChoices)?;

    let call = choice
        .message
        .tool_calls
        .into_iter()
        .find(|c| c.function.name == TOOL_NAME)
        .ok_or(TransformError::NoToolCall)?;

    let arguments: Map<String, Value> = serde_json::from_str(&call.function.arguments)?;

    columns
        .iter()
        .map(|column| {
            let value = arguments
                .get(&column.name)
                .ok_or_else(|| TransformError::MissingField(column.name.clone()))?;
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            Ok((column.name.clone(), text))
        })
        .collect()
}

use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use serde_json::Value;

use super::{ ChatClient, CompletionResponse };
use crate::error::NodeError;
use crate::llm::LlmConfig;
use crate::models::chat::ChatMessage;

const CHAT_COMPLETIONS_ROUTE: &str = "/chat/completions";

/// Client for the OpenAI-compatible API of a llama.cpp server (`llama-server`).
pub struct LlamaServerClient {
    http: HttpClient,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl LlamaServerClient {
    pub fn new(base_url: impl Into<String>, config: &LlmConfig) -> Result<Self, NodeError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
                    NodeError::validation(format!("Invalid API key format: {}", e))
                )?
            );
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| NodeError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), CHAT_COMPLETIONS_ROUTE)
    }

    fn payload<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        }
    }
}

#[async_trait]
impl ChatClient for LlamaServerClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<CompletionResponse, NodeError> {
        let url = self.url();
        debug!("POST {} with {} messages", url, messages.len());

        let resp = self.http
            .post(&url)
            .json(&self.payload(messages))
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| NodeError::server(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            warn!("{} returned {}", url, status);
            return Err(NodeError::server(format!("HTTP {}: {}", status, error_message(&body))));
        }

        parse_completion(&body)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}

// Connection errors are transport failures only.
fn request_error(url: &str, err: reqwest::Error) -> NodeError {
    if err.is_timeout() {
        NodeError::connection(format!("request to {} timed out: {}", url, err))
    } else if err.is_connect() {
        NodeError::connection(format!("could not connect to {}: {}", url, err))
    } else if err.is_builder() || err.is_body() {
        NodeError::internal(format!("could not build request to {}: {}", url, err))
    } else if err.is_redirect() || err.is_status() || err.is_decode() {
        NodeError::server(format!("bad response from {}: {}", url, err))
    } else {
        NodeError::connection(format!("request to {} failed: {}", url, err))
    }
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.trim().to_string())
}

pub(crate) fn parse_completion(body: &str) -> Result<CompletionResponse, NodeError> {
    let value: Value = serde_json::from_str(body).map_err(|e|
        NodeError::server(format!("Failed to parse response JSON: {}", e))
    )?;

    if let Some(err) = value.get("error") {
        let msg = err["message"].as_str().unwrap_or("Unknown error");
        return Err(NodeError::server(format!("API error: {}", msg)));
    }

    let parsed: ChatCompletionResponse = serde_json::from_value(value).map_err(|e|
        NodeError::server(format!("Unexpected response shape: {}", e))
    )?;

    let choice = parsed.choices
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::server("Invalid response from server: no choices found"))?;

    let response = choice.message
        .and_then(|m| m.content)
        .ok_or_else(|| NodeError::server("Invalid response from server: no message content found"))?;

    Ok(CompletionResponse {
        response,
        finish_reason: choice.finish_reason,
    })
}

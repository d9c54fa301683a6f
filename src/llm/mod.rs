pub mod chat;

use std::time::Duration;

use crate::cli::Args;

pub const DEFAULT_MODEL: &str = "llama.cpp";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings shared by every client the cache builds, whatever its endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: None,
            max_tokens: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl LlmConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            model: args.model.clone(),
            api_key: args.api_key.clone().filter(|k| !k.trim().is_empty()),
            temperature: args.temperature,
            max_tokens: args.max_tokens,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
        }
    }
}

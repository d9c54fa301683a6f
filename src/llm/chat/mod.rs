pub mod llama;

use async_trait::async_trait;
use std::sync::Arc;

use self::llama::LlamaServerClient;
use super::LlmConfig;
use crate::error::NodeError;
use crate::models::chat::ChatMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub response: String,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the whole message sequence as one chat-completion request.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<CompletionResponse, NodeError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> String;
}

pub fn new_client(
    base_url: &str,
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, NodeError> {
    let client = LlamaServerClient::new(base_url, config)?;
    Ok(Arc::new(client))
}

use log::{ error, info };
use url::Url;

use crate::cache::ClientCache;
use crate::config::node::MAX_IMAGES;
use crate::error::NodeError;
use crate::history::{ format_history, parse_history };
use crate::llm::LlmConfig;
use crate::models::chat::ChatMessage;
use crate::models::image::ImageInput;
use crate::models::node::{ NodeInputs, NodeOutputs };

/// Prefix of every `response_message` produced by a failed invocation.
pub const ERROR_MARKER: &str = "Error:";

/// Result of a successful turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub response: String,
    /// Input history followed by the new user message and the assistant reply.
    pub history: Vec<ChatMessage>,
}

impl ChatTurn {
    pub fn history_json(&self) -> Result<String, NodeError> {
        format_history(&self.history)
    }
}

/// Sends one prompt, with its conversation so far, to a llama.cpp server.
#[derive(Clone)]
pub struct LlamaChatNode {
    cache: ClientCache,
}

impl LlamaChatNode {
    pub fn new(cache: ClientCache) -> Self {
        info!("LlamaChatNode initialized");
        Self { cache }
    }

    pub fn from_config(config: LlmConfig) -> Self {
        Self::new(ClientCache::from_config(config))
    }

    pub fn cache(&self) -> &ClientCache {
        &self.cache
    }

    /// Host-facing entry point. Never fails: errors come back as an
    /// `"Error: ..."` reply alongside the caller's history, untouched.
    pub async fn execute(&self, inputs: NodeInputs) -> NodeOutputs {
        info!("Executing llama chat with server: {}", inputs.server_url.trim());

        let result = match self.chat(&inputs).await {
            Ok(turn) => turn.history_json().map(|history| (turn.response, history)),
            Err(e) => Err(e),
        };

        match result {
            Ok((response_message, chat_history)) => {
                info!("Llama chat execution completed successfully");
                NodeOutputs {
                    response_message,
                    chat_history,
                }
            }
            Err(e) => {
                error!("Error in llama chat execution: {}", e);
                NodeOutputs {
                    response_message: format!("{} {}", ERROR_MARKER, e),
                    chat_history: inputs.original_history(),
                }
            }
        }
    }

    /// Runs one turn and reports failures as typed errors.
    ///
    /// All input validation, history parsing included, happens before the
    /// client is looked up, so a rejected call never touches the network.
    pub async fn chat(&self, inputs: &NodeInputs) -> Result<ChatTurn, NodeError> {
        let endpoint = validate_server_url(&inputs.server_url)?;
        let prompt = inputs.prompt.trim();
        if prompt.is_empty() {
            return Err(NodeError::validation("prompt cannot be empty"));
        }
        if inputs.images.len() > MAX_IMAGES {
            return Err(
                NodeError::validation(
                    format!("at most {} images are supported, got {}", MAX_IMAGES, inputs.images.len())
                )
            );
        }
        let images = load_images(inputs)?;
        info!("Prompt length: {} characters", prompt.len());

        let mut history = parse_history(inputs.chat_history.as_deref().unwrap_or(""))?;
        let messages = build_messages(&inputs.system_prompt, &history, outbound_user_message(prompt, &images));

        let client = self.cache.get_or_create(endpoint).await?;
        info!(
            "Sending {} messages to {} (model: {})",
            messages.len(),
            client.get_base_url(),
            client.get_model()
        );
        let completion = client.complete(&messages).await?;
        info!("Received response with {} characters", completion.response.len());

        history.push(ChatMessage::user(prompt));
        history.push(ChatMessage::assistant(completion.response.clone()));

        Ok(ChatTurn {
            response: completion.response,
            history,
        })
    }
}

/// System message (only when the prompt is non-blank), then history, then the new user turn.
pub fn build_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    user_message: ChatMessage
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    let system_prompt = system_prompt.trim();
    if !system_prompt.is_empty() {
        messages.push(ChatMessage::system(system_prompt));
    }
    messages.extend(history.iter().cloned());
    messages.push(user_message);
    messages
}

fn load_images(inputs: &NodeInputs) -> Result<Vec<ImageInput>, NodeError> {
    inputs.images
        .iter()
        .enumerate()
        .map(|(index, source)| {
            source
                .load()
                .map_err(|e| NodeError::validation(format!("image {} is invalid: {}", index + 1, e)))
        })
        .collect()
}

fn outbound_user_message(prompt: &str, images: &[ImageInput]) -> ChatMessage {
    if !images.is_empty() {
        info!("Attaching {} images to the prompt", images.len());
    }
    let urls = images
        .iter()
        .map(|image| image.to_data_url())
        .collect();
    ChatMessage::user_with_images(prompt, urls)
}

fn validate_server_url(raw: &str) -> Result<&str, NodeError> {
    let endpoint = raw.trim();
    if endpoint.is_empty() {
        return Err(NodeError::validation("server_url cannot be empty"));
    }
    let url = Url::parse(endpoint).map_err(|e|
        NodeError::validation(format!("server_url is not a valid URL ({}): {}", endpoint, e))
    )?;
    match url.scheme() {
        "http" | "https" => Ok(endpoint),
        other => Err(NodeError::validation(format!("unsupported server_url scheme: {}", other))),
    }
}

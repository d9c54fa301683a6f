use serde::{ Deserialize, Serialize };

use crate::config::node::{ DEFAULT_CHAT_HISTORY, DEFAULT_SYSTEM_PROMPT };
use crate::models::image::ImageSource;

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

/// Inputs of one node invocation, as the host hands them over.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeInputs {
    pub server_url: String,
    pub prompt: String,
    /// An empty string sends no system message at all.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub chat_history: Option<String>,
    /// Decoded inside the node, so a bad image fails the invocation like any other input.
    #[serde(default)]
    pub images: Vec<ImageSource>,
}

impl NodeInputs {
    pub fn new(server_url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            prompt: prompt.into(),
            system_prompt: default_system_prompt(),
            chat_history: None,
            images: Vec::new(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_chat_history(mut self, chat_history: impl Into<String>) -> Self {
        self.chat_history = Some(chat_history.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<ImageSource>) -> Self {
        self.images.push(image.into());
        self
    }

    /// The history string to hand back when the invocation fails.
    pub fn original_history(&self) -> String {
        match &self.chat_history {
            Some(history) if !history.trim().is_empty() => history.clone(),
            _ => DEFAULT_CHAT_HISTORY.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOutputs {
    pub response_message: String,
    pub chat_history: String,
}

use serde::Serialize;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/v1";
pub const DEFAULT_PROMPT: &str = "Hello! How are you today?";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";
pub const DEFAULT_CHAT_HISTORY: &str = "[]";
pub const MAX_IMAGES: usize = 5;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputKind {
    String,
    Image,
}

#[derive(Serialize, Debug, Clone)]
pub struct InputSpec {
    pub name: String,
    pub kind: InputKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub multiline: bool,
    pub tooltip: String,
}

impl InputSpec {
    fn text(name: &str, default: &str, multiline: bool, tooltip: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: InputKind::String,
            default: Some(default.to_string()),
            multiline,
            tooltip: tooltip.to_string(),
        }
    }

    fn image(index: usize) -> Self {
        Self {
            name: format!("image{}", index),
            kind: InputKind::Image,
            default: None,
            multiline: false,
            tooltip: format!("Optional image input {}", index),
        }
    }
}

/// What a workflow host needs to render and wire the node.
#[derive(Serialize, Debug, Clone)]
pub struct NodeDescriptor {
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub required: Vec<InputSpec>,
    pub optional: Vec<InputSpec>,
    pub return_types: Vec<InputKind>,
    pub return_names: Vec<String>,
    pub output_node: bool,
}

impl NodeDescriptor {
    pub fn llama_chat() -> Self {
        let mut optional = vec![
            InputSpec::text(
                "system_prompt",
                DEFAULT_SYSTEM_PROMPT,
                true,
                "System message that defines the model's behavior and role"
            ),
            InputSpec::text(
                "chat_history",
                DEFAULT_CHAT_HISTORY,
                true,
                "JSON array of previous conversation messages"
            )
        ];
        optional.extend((1..=MAX_IMAGES).map(InputSpec::image));

        Self {
            name: "LlamaChatNode".to_string(),
            display_name: "Llama Chat".to_string(),
            category: "llama.cpp".to_string(),
            required: vec![
                InputSpec::text(
                    "server_url",
                    DEFAULT_SERVER_URL,
                    false,
                    "Base URL of the llama.cpp server's OpenAI-compatible API"
                ),
                InputSpec::text(
                    "prompt",
                    DEFAULT_PROMPT,
                    true,
                    "The text prompt to send to the language model"
                )
            ],
            optional,
            return_types: vec![InputKind::String, InputKind::String],
            return_names: vec!["response_message".to_string(), "chat_history".to_string()],
            output_node: true,
        }
    }
}

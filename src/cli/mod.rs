use clap::{ Parser, Subcommand };
use std::path::PathBuf;

use crate::config::node::{ DEFAULT_PROMPT, DEFAULT_SERVER_URL, DEFAULT_SYSTEM_PROMPT };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    // --- Chat Client Args ---
    /// Model name sent with each request. llama.cpp serves whatever model it loaded and ignores it.
    #[arg(long, env = "LLAMA_MODEL", default_value = "llama.cpp", global = true)]
    pub model: String,

    /// Bearer token for servers started with --api-key.
    #[arg(long, env = "LLAMA_API_KEY", global = true)]
    pub api_key: Option<String>,

    /// Sampling temperature. Server default when unset.
    #[arg(long, env = "LLAMA_TEMPERATURE", global = true)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate. Server default when unset.
    #[arg(long, env = "LLAMA_MAX_TOKENS", global = true)]
    pub max_tokens: Option<u32>,

    /// Upper bound in seconds on a whole chat-completion request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60", global = true)]
    pub request_timeout_secs: u64,

    /// Upper bound in seconds on establishing the connection.
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "10", global = true)]
    pub connect_timeout_secs: u64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the node once and print both outputs.
    Chat {
        /// Base URL of the llama.cpp server's OpenAI-compatible API.
        #[arg(long, env = "LLAMA_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
        server_url: String,

        /// The text prompt to send to the model.
        #[arg(long, default_value = DEFAULT_PROMPT)]
        prompt: String,

        /// System message; pass an empty string to send none.
        #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
        system_prompt: String,

        /// Previous conversation as a JSON array of {role, content} objects.
        #[arg(long, conflicts_with = "history_file")]
        chat_history: Option<String>,

        /// File holding the conversation; read before the call and rewritten after it.
        #[arg(long)]
        history_file: Option<PathBuf>,

        /// Image to attach for vision models (repeatable, up to 5).
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },

    /// Serve the node over HTTP for a workflow host.
    Serve {
        /// Host address and port for the server to listen on.
        #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
        server_addr: String,
    },
}

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod node;
pub mod server;

pub use cache::{ ClientCache, ClientFactory, LlamaClientFactory };
pub use error::NodeError;
pub use models::chat::{ ChatMessage, ContentPart, MessageContent, Role };
pub use models::image::{ ImageInput, ImageSource };
pub use models::node::{ NodeInputs, NodeOutputs };
pub use node::{ ChatTurn, LlamaChatNode, ERROR_MARKER };

use cli::{ Args, Command };
use config::node::DEFAULT_CHAT_HISTORY;
use llm::LlmConfig;
use log::info;
use server::Server;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = LlmConfig::from_args(&args);
    info!("--- Core Configuration ---");
    info!("Model: {}", config.model);
    info!("API Key: {}", if config.api_key.is_some() { "set" } else { "not set" });
    info!("Temperature: {:?}", config.temperature);
    info!("Max Tokens: {:?}", config.max_tokens);
    info!("Request Timeout: {:?}", config.request_timeout);
    info!("Connect Timeout: {:?}", config.connect_timeout);
    info!("-------------------------");

    let node = LlamaChatNode::from_config(config);

    match args.command {
        Command::Serve { server_addr } => {
            let server = Server::new(server_addr, Arc::new(node));
            server.run().await?;
        }
        Command::Chat { server_url, prompt, system_prompt, chat_history, history_file, images } => {
            let mut inputs = NodeInputs::new(server_url, prompt).with_system_prompt(system_prompt);
            if let Some(history) = chat_history {
                inputs = inputs.with_chat_history(history);
            }
            for path in images {
                inputs = inputs.with_image(path);
            }

            let outputs = run_chat(&node, inputs, history_file.as_deref()).await?;
            println!("{}", outputs.response_message);
            if history_file.is_none() {
                println!("{}", outputs.chat_history);
            }
        }
    }

    Ok(())
}

/// One turn of the `chat` command.
///
/// With a history file, the conversation is read from it before the call and the
/// returned history is written back after, on failure too, where it is unchanged.
pub async fn run_chat(
    node: &LlamaChatNode,
    mut inputs: NodeInputs,
    history_file: Option<&Path>
) -> Result<NodeOutputs, Box<dyn Error + Send + Sync>> {
    if let Some(path) = history_file {
        inputs = inputs.with_chat_history(read_history_file(path)?);
    }
    let outputs = node.execute(inputs).await;
    if let Some(path) = history_file {
        write_history_file(path, &outputs.chat_history)?;
    }
    Ok(outputs)
}

fn read_history_file(path: &Path) -> Result<String, Box<dyn Error + Send + Sync>> {
    if !path.exists() {
        return Ok(DEFAULT_CHAT_HISTORY.to_string());
    }
    fs::read_to_string(path).map_err(|e|
        format!("Failed to read history file {}: {}", path.display(), e).into()
    )
}

fn write_history_file(path: &Path, history: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    fs::write(path, history).map_err(|e| format!("Failed to write history file {}: {}", path.display(), e))?;
    info!("Chat history written to {}", path.display());
    Ok(())
}

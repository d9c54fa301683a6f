use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::NodeError;
use crate::llm::chat::{ new_client, ChatClient };
use crate::llm::LlmConfig;

/// Builds the client handle for one endpoint.
pub trait ClientFactory: Send + Sync {
    fn create(&self, endpoint: &str) -> Result<Arc<dyn ChatClient>, NodeError>;
}

/// Builds llama.cpp server clients that all share one [`LlmConfig`].
#[derive(Debug, Clone, Default)]
pub struct LlamaClientFactory {
    config: LlmConfig,
}

impl LlamaClientFactory {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for LlamaClientFactory {
    fn create(&self, endpoint: &str) -> Result<Arc<dyn ChatClient>, NodeError> {
        new_client(endpoint, &self.config)
    }
}

/// Endpoint-keyed client handles, kept for the life of the cache.
///
/// Keys are compared as exact strings: `http://host:8080/v1` and
/// `http://host:8080/v1/` get separate clients.
#[derive(Clone)]
pub struct ClientCache {
    factory: Arc<dyn ClientFactory>,
    clients: Arc<Mutex<HashMap<String, Arc<dyn ChatClient>>>>,
}

impl ClientCache {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: LlmConfig) -> Self {
        Self::new(Arc::new(LlamaClientFactory::new(config)))
    }

    /// Returns the handle for `endpoint`, constructing and storing it on first use.
    ///
    /// The lock is held across construction so two concurrent callers never
    /// both build a client for the same endpoint.
    pub async fn get_or_create(&self, endpoint: &str) -> Result<Arc<dyn ChatClient>, NodeError> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(endpoint) {
            return Ok(client.clone());
        }
        info!("Creating new chat client for server: {}", endpoint);
        let client = self.factory.create(endpoint)?;
        clients.insert(endpoint.to_string(), client.clone());
        Ok(client)
    }

    pub async fn contains(&self, endpoint: &str) -> bool {
        self.clients.lock().await.contains_key(endpoint)
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}

pub mod api;

use crate::node::LlamaChatNode;
use log::info;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct Server {
    addr: String,
    node: Arc<LlamaChatNode>,
}

impl Server {
    pub fn new(addr: String, node: Arc<LlamaChatNode>) -> Self {
        Self { addr, node }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e|
            format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e)
        )?;
        info!("Serving llama chat node on: http://{}", addr);

        let app = api::routes(self.node.clone());
        axum::serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

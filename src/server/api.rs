use axum::{
    routing::{ get, post },
    Router,
    extract::State,
    response::IntoResponse,
    Json,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };

use crate::config::node::NodeDescriptor;
use crate::models::node::NodeInputs;
use crate::node::LlamaChatNode;

#[derive(Clone)]
struct AppState {
    node: Arc<LlamaChatNode>,
}

pub fn routes(node: Arc<LlamaChatNode>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/node", get(descriptor_handler))
        .route("/api/node/execute", post(execute_handler))
        .layer(cors)
        .with_state(AppState { node })
}

async fn descriptor_handler() -> impl IntoResponse {
    Json(NodeDescriptor::llama_chat())
}

// Node failures are still a 200: the host shows `response_message` either way.
async fn execute_handler(
    State(state): State<AppState>,
    Json(inputs): Json<NodeInputs>,
) -> impl IntoResponse {
    info!("Execute request for server: {}", inputs.server_url.trim());
    Json(state.node.execute(inputs).await)
}

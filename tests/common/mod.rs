#![allow(dead_code)]

use axum::{
    extract::State,
    http::{ header::AUTHORIZATION, HeaderMap, StatusCode },
    response::IntoResponse,
    routing::post,
    Json,
    Router,
};
use llama_chat_node::cache::{ ClientFactory, LlamaClientFactory };
use llama_chat_node::llm::chat::ChatClient;
use llama_chat_node::llm::LlmConfig;
use llama_chat_node::NodeError;
use serde_json::{ json, Value };
use std::net::SocketAddr;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tokio::net::TcpListener;

/// How the fake llama-server answers `POST /v1/chat/completions`.
#[derive(Clone)]
pub enum Reply {
    Text(&'static str),
    Status(StatusCode, &'static str),
    Raw(&'static str),
    Slow(Duration),
}

#[derive(Clone)]
struct MockState {
    reply: Reply,
    requests: Arc<Mutex<Vec<Value>>>,
    authorizations: Arc<Mutex<Vec<Option<String>>>>,
}

pub struct MockLlamaServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
    authorizations: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockLlamaServer {
    pub async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener, reply)
    }

    pub async fn start_on(addr: SocketAddr, reply: Reply) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        Self::serve(listener, reply)
    }

    fn serve(listener: TcpListener, reply: Reply) -> Self {
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let authorizations = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            reply,
            requests: requests.clone(),
            authorizations: authorizations.clone(),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, requests, authorizations }
    }

    pub fn url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// `Authorization` header of each request, in arrival order.
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.authorizations.lock().unwrap().clone()
    }
}

async fn chat_completions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    state.authorizations.lock().unwrap().push(auth);
    state.requests.lock().unwrap().push(body);
    match state.reply {
        Reply::Text(text) => Json(completion(text)).into_response(),
        Reply::Status(status, message) =>
            (status, Json(json!({"error": {"code": status.as_u16(), "message": message}}))).into_response(),
        Reply::Raw(body) => (StatusCode::OK, body).into_response(),
        Reply::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(completion("too late")).into_response()
        }
    }
}

fn completion(text: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "llama.cpp",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
    })
}

/// Address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Real llama clients, with a count of how many were built.
#[derive(Default)]
pub struct CountingFactory {
    inner: LlamaClientFactory,
    pub created: AtomicUsize,
}

impl CountingFactory {
    pub fn with_config(config: LlmConfig) -> Self {
        Self {
            inner: LlamaClientFactory::new(config),
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ClientFactory for CountingFactory {
    fn create(&self, endpoint: &str) -> Result<Arc<dyn ChatClient>, NodeError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.inner.create(endpoint)
    }
}

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use shelfgate_client::Client;
use shelfgate_store::SessionStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// How the mock backend answers one endpoint
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(StatusCode),
    /// Answers with the json, but only after the delay
    Slow(Duration, Value),
}

impl Reply {
    async fn respond(self) -> Response {
        match self {
            Reply::Json(value) => Json(value).into_response(),
            Reply::Status(status) => status.into_response(),
            Reply::Slow(delay, value) => {
                tokio::time::sleep(delay).await;
                Json(value).into_response()
            }
        }
    }
}

/// A request the mock backend has seen
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug)]
pub struct Backend {
    pub login: Reply,
    pub active: Reply,
    pub history: Reply,
}

#[derive(Debug)]
struct ServerState {
    backend: Backend,
    requests: Mutex<Vec<Recorded>>,
}

impl ServerState {
    fn record(&self, path: String, headers: &HeaderMap, body: Option<Value>) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        self.requests.lock().expect("Locking failed").push(Recorded {
            path,
            authorization,
            body,
        });
    }
}

/// Subscription backend on a random local port
pub struct MockServer {
    url: Url,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(backend: Backend) -> Self {
        let state = Arc::new(ServerState {
            backend,
            requests: Mutex::new(vec![]),
        });

        let router = Router::new()
            .route("/api/v1/user/login", post(login))
            .route("/subscription/{id}", get(active_subscription))
            .route("/subscription/all/{id}", get(subscription_history))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let url = Url::parse(&format!(
            "http://{}",
            listener.local_addr().expect("Can't fail")
        ))
        .expect("Can't fail");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Mock server failed");
        });

        Self { url, state, handle }
    }

    pub fn url(&self) -> Url {
        self.url.clone()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().expect("Locking failed").clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|req| req.path.starts_with(prefix))
            .collect()
    }

    /// A client talking to this server, with a fresh in-memory store
    pub fn client(&self, timeout: Duration) -> Client {
        Client::builder()
            .store(SessionStore::in_memory())
            .api_url(self.url())
            .timeout(timeout)
            .build()
            .expect("Failed to build client")
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn login(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/api/v1/user/login".to_owned(), &headers, Some(body));
    state.backend.login.clone().respond().await
}

async fn active_subscription(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.record(format!("/subscription/{id}"), &headers, None);
    state.backend.active.clone().respond().await
}

async fn subscription_history(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.record(format!("/subscription/all/{id}"), &headers, None);
    state.backend.history.clone().respond().await
}

//! Mock counter API for testing the remote client and remote-backed stores.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::routing::any;
use axum::Router;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A captured request for assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// A canned response that overrides the in-memory counter behaviour.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub delay_ms: u64,
}

impl MockResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            body: body.as_bytes().to_vec(),
            delay_ms: 0,
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: format!(r#"{{"error": "{}"}}"#, message).into_bytes(),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

#[derive(Clone)]
struct MockState {
    counters: Arc<Mutex<HashMap<String, i64>>>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
}

/// In-memory implementation of `GET/PUT /count/{id}`.
///
/// Unknown ids answer 404 on GET. PUT creates the counter. Enqueued
/// responses take precedence over the in-memory behaviour, one per request.
pub struct MockCounterApi {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockCounterApi {
    pub async fn start() -> Self {
        let state = MockState {
            counters: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
        };

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/{*path}", any(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn seed(&self, id: &str, value: i64) {
        self.state.counters.lock().await.insert(id.to_string(), value);
    }

    pub async fn value(&self, id: &str) -> Option<i64> {
        self.state.counters.lock().await.get(id).copied()
    }

    pub async fn enqueue_response(&self, resp: MockResponse) {
        self.state.responses.lock().await.push_back(resp);
    }

    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().await.clone()
    }
}

impl Drop for MockCounterApi {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_request(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let body = axum::body::to_bytes(req.into_body(), 1024 * 1024)
        .await
        .unwrap_or_default()
        .to_vec();

    state.requests.lock().await.push(CapturedRequest {
        method: method.clone(),
        path: path.clone(),
        body: body.clone(),
    });

    let canned = state.responses.lock().await.pop_front();
    if let Some(mock) = canned {
        if mock.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(mock.delay_ms)).await;
        }
        return respond(mock.status, mock.body);
    }

    let Some(id) = path.strip_prefix("/count/") else {
        return respond(404, br#"{"error": "no such route"}"#.to_vec());
    };

    match method.as_str() {
        "GET" => match state.counters.lock().await.get(id) {
            Some(value) => respond(200, format!(r#"{{"value": {}}}"#, value).into_bytes()),
            None => respond(404, br#"{"error": "not found"}"#.to_vec()),
        },
        "PUT" => {
            let parsed: Option<i64> = serde_json::from_slice::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("value").and_then(|n| n.as_i64()));
            match parsed {
                Some(value) => {
                    state.counters.lock().await.insert(id.to_string(), value);
                    respond(200, format!(r#"{{"value": {}}}"#, value).into_bytes())
                }
                None => respond(400, br#"{"error": "expected {\"value\": n}"}"#.to_vec()),
            }
        }
        _ => respond(405, br#"{"error": "method not allowed"}"#.to_vec()),
    }
}

fn respond(status: u16, body: Vec<u8>) -> Response<Body> {
    Response::builder()
        .status(StatusCode::from_u16(status).unwrap())
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

//! Test utilities for ticketzen-core
//!
//! This module provides a mock Azure Document Intelligence server with
//! per-route scripted replies, for integration tests and offline development.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::models::Route;
use crate::ocr::KEY_HEADER;

/// How the mock answers requests on a route
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with this JSON body
    Json(Value),
    /// Bare status code with an error body
    Status(u16),
    /// 200 with a body that is not JSON
    Garbage,
}

/// A request received by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub route: Option<Route>,
    pub path_and_query: String,
    pub key: Option<String>,
    pub content_type: Option<String>,
    pub body_len: usize,
}

#[derive(Default)]
struct MockState {
    replies: HashMap<Route, MockReply>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock Azure server for testing
///
/// Routes without a scripted reply answer 404.
pub struct MockAzureServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAzureServer {
    /// Start the mock server on an available port
    pub async fn start(replies: HashMap<Route, MockReply>) -> Self {
        let state = Arc::new(MockState {
            replies,
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .fallback(handle_analyze)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Start a server where every route answers with the same reply
    pub async fn start_uniform(reply: MockReply) -> Self {
        let replies = Route::all().iter().map(|r| (*r, reply.clone())).collect();
        Self::start(replies).await
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Routes hit so far, in arrival order
    pub fn routes_hit(&self) -> Vec<Route> {
        self.requests().into_iter().filter_map(|r| r.route).collect()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAzureServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Identify the API route from the request path
fn route_for_path(path: &str) -> Option<Route> {
    if path.starts_with("/documentintelligence/") {
        Some(Route::DocumentIntelligence)
    } else if path.contains("/prebuilt/receipt/analyze") {
        Some(Route::FormRecognizerV21)
    } else if path.starts_with("/formrecognizer/documentModels/") {
        Some(Route::FormRecognizer)
    } else {
        None
    }
}

async fn handle_analyze(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let route = route_for_path(uri.path());
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        route,
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        key: header(KEY_HEADER),
        content_type: header("content-type"),
        body_len: body.len(),
    });

    match route.and_then(|r| state.replies.get(&r)) {
        Some(MockReply::Json(value)) => Json(value.clone()).into_response(),
        Some(MockReply::Status(code)) => {
            let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(json!({"error": {"code": code.to_string(), "message": "mock failure"}})),
            )
                .into_response()
        }
        Some(MockReply::Garbage) => (StatusCode::OK, "<html>gateway</html>").into_response(),
        None => (StatusCode::NOT_FOUND, "no such route").into_response(),
    }
}

/// Current-schema receipt payload for "Netto" (2 lines, 1 item)
pub fn current_receipt_payload() -> Value {
    json!({
        "apiVersion": "2024-07-31",
        "content": "NETTO\n5 rue des Lilas\n01/05/2024\nTOTAL 9,42",
        "pages": [{
            "pageNumber": 1,
            "height": 11.0,
            "lines": [
                {"content": "5 rue des Lilas", "boundingPolygon": [{"x": 1.0, "y": 0.3}]},
                {"content": "NETTO", "boundingPolygon": [{"x": 1.0, "y": 0.55}]}
            ]
        }],
        "documents": [{
            "fields": {
                "MerchantName": {"content": "NETTO"},
                "TransactionDate": {"content": "01/05/2024"},
                "Total": {"content": "9,42"},
                "Items": {"valueArray": [{"valueObject": {
                    "Name": {"content": "Pain"},
                    "TotalPrice": {"content": "1,00"}
                }}]}
            }
        }]
    })
}

/// Legacy (v2.1) receipt payload for "Intermarché"
pub fn legacy_receipt_payload() -> Value {
    json!({
        "status": "succeeded",
        "analyzeResult": {
            "readResults": [{
                "page": 1,
                "height": 1000,
                "lines": [
                    {"text": "INTERMARCHE SUPER", "boundingBox": [0, 40, 0, 0, 0, 0, 0, 0]},
                    {"text": "Total 23,15", "boundingBox": [0, 800, 0, 0, 0, 0, 0, 0]}
                ]
            }],
            "documentResults": [{
                "fields": {
                    "MerchantName": {"text": "INTERMARCHE SUPER"},
                    "TransactionDate": {"text": "02.06.2024"},
                    "Total": {"text": "23,15", "valueNumber": 23.15}
                }
            }]
        }
    })
}

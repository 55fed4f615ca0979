//! In-process stand-in for the statement backend.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, RawQuery, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use statements_client::{ClientConfig, Credentials, StatementsClient};

/// What one upload request carried.
#[derive(Debug, Clone)]
pub struct ReceivedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
}

/// Canned reply for an endpoint
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
pub struct Backend {
    pub listing_hits: Arc<AtomicUsize>,
    pub upload_hits: Arc<AtomicUsize>,
    pub queries: Arc<Mutex<Vec<String>>>,
    pub auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    pub files: Arc<Mutex<Vec<ReceivedFile>>>,
    /// `None` echoes the `keyword` parameter back as a one-row page
    pub listing_reply: Option<Reply>,
    pub upload_reply: Reply,
    /// Listing requests whose keyword matches are delayed
    pub slow_keyword: Option<(String, Duration)>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            listing_hits: Arc::default(),
            upload_hits: Arc::default(),
            queries: Arc::default(),
            auth_headers: Arc::default(),
            files: Arc::default(),
            listing_reply: None,
            upload_reply: Reply::ok("Imported 42 rows"),
            slow_keyword: None,
        }
    }
}

impl Backend {
    pub fn listing_hits(&self) -> usize {
        self.listing_hits.load(Ordering::SeqCst)
    }

    pub fn upload_hits(&self) -> usize {
        self.upload_hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub fn last_auth(&self) -> Option<String> {
        self.auth_headers.lock().unwrap().last().cloned().flatten()
    }
}

/// Page JSON with a single transaction whose description is `description`.
pub fn one_row_page(description: &str, number: u32, total_pages: u32) -> Value {
    json!({
        "content": [{
            "id": 1,
            "date": "2024-03-05",
            "description": description,
            "debit": 12.5,
            "credit": null,
            "balance": 987.65,
            "txnHash": format!("hash-{description}")
        }],
        "pageable": {
            "pageNumber": number,
            "pageSize": 40,
            "sort": { "sorted": true, "unsorted": false, "empty": false },
            "offset": number * 40,
            "paged": true,
            "unpaged": false
        },
        "totalPages": total_pages,
        "totalElements": total_pages * 40,
        "last": number + 1 >= total_pages,
        "size": 40,
        "number": number,
        "numberOfElements": 1,
        "first": number == 0,
        "empty": false
    })
}

fn keyword_of(query: &str) -> String {
    query
        .split('&')
        .find_map(|kv| kv.strip_prefix("keyword="))
        .unwrap_or("")
        .to_string()
}

fn record_auth(backend: &Backend, headers: &HeaderMap) {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.auth_headers.lock().unwrap().push(auth);
}

async fn list_transactions(
    State(backend): State<Backend>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    backend.listing_hits.fetch_add(1, Ordering::SeqCst);
    record_auth(&backend, &headers);
    let query = query.unwrap_or_default();
    backend.queries.lock().unwrap().push(query.clone());

    let keyword = keyword_of(&query);
    if let Some((slow, delay)) = &backend.slow_keyword {
        if *slow == keyword {
            tokio::time::sleep(*delay).await;
        }
    }

    match &backend.listing_reply {
        Some(reply) => {
            tokio::time::sleep(reply.delay).await;
            (reply.status, reply.body.clone()).into_response()
        }
        None => (StatusCode::OK, one_row_page(&keyword, 0, 1).to_string()).into_response(),
    }
}

async fn upload(
    State(backend): State<Backend>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    backend.upload_hits.fetch_add(1, Ordering::SeqCst);
    record_auth(&backend, &headers);

    while let Ok(Some(field)) = multipart.next_field().await {
        let received = ReceivedFile {
            field: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            len: 0,
        };
        let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        backend.files.lock().unwrap().push(ReceivedFile { len, ..received });
    }

    let reply = backend.upload_reply.clone();
    tokio::time::sleep(reply.delay).await;
    (reply.status, reply.body).into_response()
}

/// Serve `backend` on an ephemeral port and return its base URL.
pub async fn serve(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/statements/transactions", get(list_transactions))
        .route("/api/statements/upload", post(upload))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn client(base_url: &str) -> StatementsClient {
    StatementsClient::new(ClientConfig {
        base_url: base_url.to_string(),
        ..ClientConfig::default()
    })
    .unwrap()
}

pub fn client_with_auth(base_url: &str, username: &str, password: &str) -> StatementsClient {
    StatementsClient::new(ClientConfig {
        base_url: base_url.to_string(),
        credentials: Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }),
        ..ClientConfig::default()
    })
    .unwrap()
}

/// A base URL nothing is listening on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

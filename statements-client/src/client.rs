use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, RequestBuilder};
use serde::Deserialize;
use statements_core::{
    is_pdf_media_type, PageResponse, ProgressTracker, TransactionFilters, NOT_A_PDF_MESSAGE,
};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::file::StatementFile;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const TRANSACTIONS_PATH: &str = "/api/statements/transactions";
pub const UPLOAD_PATH: &str = "/api/statements/upload";

/// Bytes handed to the transport per progress step
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// HTTP Basic credentials supplied at runtime.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: None,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    message: String,
}

/// Client for the statement backend's listing and upload endpoints.
#[derive(Debug, Clone)]
pub struct StatementsClient {
    http: HttpClient,
    base_url: String,
    credentials: Option<Credentials>,
}

impl StatementsClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(c) => req.basic_auth(&c.username, Some(&c.password)),
            None => req,
        }
    }

    /// GET /api/statements/transactions
    ///
    /// Every set filter is sent under its own name; the JSON body is parsed as
    /// a page envelope.
    pub async fn get_transactions(
        &self,
        filters: &TransactionFilters,
    ) -> Result<PageResponse, ClientError> {
        let url = self.endpoint(TRANSACTIONS_PATH);
        let pairs = filters.query_pairs();
        debug!(%url, ?pairs, "fetching transactions");

        let response = self
            .authorized(self.http.get(&url))
            .query(&pairs)
            .send()
            .await
            .map_err(ClientError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(ClientError::Network)?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "listing request failed");
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// POST /api/statements/upload
    ///
    /// `on_progress` receives non-decreasing percentages while the body is
    /// sent. Nothing is reported for an empty file.
    pub async fn upload_statement<F>(
        &self,
        file: &StatementFile,
        on_progress: F,
    ) -> Result<String, ClientError>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.upload_statement_until(file, on_progress, std::future::pending())
            .await
    }

    /// Like [`upload_statement`](Self::upload_statement), aborted with
    /// [`ClientError::Cancelled`] when `cancel` resolves first.
    pub async fn upload_statement_until<F, C>(
        &self,
        file: &StatementFile,
        on_progress: F,
        cancel: C,
    ) -> Result<String, ClientError>
    where
        F: Fn(u8) + Send + Sync + 'static,
        C: Future<Output = ()>,
    {
        if !is_pdf_media_type(&file.media_type) {
            return Err(ClientError::Validation(NOT_A_PDF_MESSAGE.to_string()));
        }

        let total = file.len();
        let mime = if file.media_type.contains('/') {
            file.media_type.as_str()
        } else {
            "application/pdf"
        };
        let part = Part::stream_with_length(progress_body(file.bytes.clone(), on_progress), total)
            .file_name(file.file_name.clone())
            .mime_str(mime)
            .map_err(|e| {
                ClientError::Validation(format!("invalid media type '{}': {}", file.media_type, e))
            })?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(UPLOAD_PATH);
        info!(file = %file.file_name, bytes = total, "uploading statement");

        let exchange = async {
            let response = self
                .authorized(self.http.post(&url))
                .multipart(form)
                .send()
                .await
                .map_err(ClientError::Network)?;
            let status = response.status();
            let body = response.text().await.map_err(ClientError::Network)?;
            Ok::<_, ClientError>((status, body))
        };

        let (status, body) = tokio::select! {
            res = exchange => res?,
            _ = cancel => {
                info!(file = %file.file_name, "upload cancelled");
                return Err(ClientError::Cancelled);
            }
        };

        if !status.is_success() {
            warn!(status = status.as_u16(), "upload rejected");
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        info!(file = %file.file_name, "upload finished");
        Ok(upload_message(body))
    }
}

/// The human-readable message of an upload response: the `message` field of
/// a JSON body, or the body text itself.
fn upload_message(body: String) -> String {
    match serde_json::from_str::<UploadResponse>(&body) {
        Ok(r) => r.message,
        Err(_) => body,
    }
}

fn progress_body<F>(bytes: Vec<u8>, on_progress: F) -> reqwest::Body
where
    F: Fn(u8) + Send + Sync + 'static,
{
    let total = bytes.len() as u64;
    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let mut tracker = ProgressTracker::default();
    let mut sent = 0u64;

    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(pct) = tracker.observe(sent, total) {
            on_progress(pct);
        }
        Ok::<_, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_message() {
        assert_eq!(upload_message("Imported 42 rows".into()), "Imported 42 rows");
        assert_eq!(upload_message(r#"{"message":"Imported 3 rows"}"#.into()), "Imported 3 rows");
        assert_eq!(upload_message(r#"{"count":3}"#.into()), r#"{"count":3}"#);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let c = StatementsClient::new(ClientConfig {
            base_url: "http://example.test/".into(),
            ..ClientConfig::default()
        })
        .unwrap();
        assert_eq!(c.endpoint(UPLOAD_PATH), "http://example.test/api/statements/upload");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let c = Credentials {
            username: "viewer".into(),
            password: "hunter2".into(),
        };
        let s = format!("{:?}", c);
        assert!(s.contains("viewer"));
        assert!(!s.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_non_pdf_rejected_without_network() {
        // Unroutable base URL: a request attempt would surface as Network.
        let c = StatementsClient::new(ClientConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..ClientConfig::default()
        })
        .unwrap();
        let file = StatementFile::new("export.csv", "text/csv", b"a,b".to_vec());
        let err = c.upload_statement(&file, |_| {}).await.unwrap_err();
        match err {
            ClientError::Validation(msg) => assert_eq!(msg, NOT_A_PDF_MESSAGE),
            other => panic!("unexpected error: {other}"),
        }
    }
}

use std::path::PathBuf;

use statements_client::{StatementFile, StatementsClient};
use statements_core::{FetchTicket, PageResponse};
use tokio::sync::mpsc;
use tracing::debug;

use crate::upload_cmd::failure_message;

#[derive(Debug, Clone)]
pub enum WorkerRequest {
    Fetch(FetchTicket),
    Upload { path: PathBuf },
}

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Fetched {
        seq: u64,
        result: Result<PageResponse, String>,
    },
    UploadProgress(u8),
    Uploaded(Result<String, String>),
}

/// Serve requests from the UI thread until its sender is dropped.
///
/// Fetches are never aborted: each one reports back with its sequence number
/// and the viewer decides whether the result is still wanted.
pub async fn run_worker(
    client: StatementsClient,
    mut rx: mpsc::UnboundedReceiver<WorkerRequest>,
    tx: std::sync::mpsc::Sender<WorkerEvent>,
) {
    while let Some(req) = rx.recv().await {
        let client = client.clone();
        let tx2 = tx.clone();
        match req {
            WorkerRequest::Fetch(ticket) => {
                debug!(seq = ticket.seq, "fetch requested");
                tokio::spawn(async move {
                    let result = client
                        .get_transactions(&ticket.filters)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx2.send(WorkerEvent::Fetched {
                        seq: ticket.seq,
                        result,
                    });
                });
            }
            WorkerRequest::Upload { path } => {
                debug!(path = %path.display(), "upload requested");
                tokio::spawn(async move {
                    let outcome = upload(&client, &path, tx2.clone()).await;
                    let _ = tx2.send(WorkerEvent::Uploaded(outcome));
                });
            }
        }
    }
}

async fn upload(
    client: &StatementsClient,
    path: &std::path::Path,
    tx: std::sync::mpsc::Sender<WorkerEvent>,
) -> Result<String, String> {
    let file = StatementFile::from_path(path, None)
        .await
        .map_err(|e| failure_message(&e))?;
    client
        .upload_statement(&file, move |pct| {
            let _ = tx.send(WorkerEvent::UploadProgress(pct));
        })
        .await
        .map_err(|e| failure_message(&e))
}

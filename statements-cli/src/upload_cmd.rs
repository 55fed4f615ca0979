use anyhow::{bail, Result};
use statements_client::{ClientError, StatementFile, StatementsClient};
use statements_core::UploadState;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// The `\rUploading... 42%` line. It is only terminated if something was
/// drawn.
#[derive(Debug, Default)]
pub struct ProgressLine {
    started: AtomicBool,
}

impl ProgressLine {
    pub fn draw(&self, pct: u8, out: &mut impl Write) {
        let _ = write!(out, "\rUploading... {pct:>3}%");
        let _ = out.flush();
        self.started.store(true, Ordering::Relaxed);
    }

    pub fn finish(&self, out: &mut impl Write) {
        if self.started.load(Ordering::Relaxed) {
            let _ = writeln!(out);
        }
    }
}

pub async fn run_upload(
    client: &StatementsClient,
    path: &Path,
    media_type: Option<&str>,
) -> Result<()> {
    let mut state = UploadState::Idle;

    let file = match StatementFile::from_path(path, media_type).await {
        Ok(f) => f,
        Err(e) => bail!("{e}"),
    };
    info!(file = %file.file_name, media_type = %file.media_type, "selected statement");

    state.begin()?;
    let line = Arc::new(ProgressLine::default());
    let drawer = line.clone();
    let outcome = client
        .upload_statement(&file, move |pct| drawer.draw(pct, &mut std::io::stderr()))
        .await;
    line.finish(&mut std::io::stderr());

    match outcome {
        Ok(message) => {
            state.succeed(message)?;
        }
        Err(e) => {
            state.fail(failure_message(&e))?;
        }
    }

    match &state {
        UploadState::Succeeded { message } => {
            println!("{message}");
            Ok(())
        }
        UploadState::Failed { message } => bail!("{message}"),
        _ => bail!("upload ended in an unexpected state"),
    }
}

/// Text shown for a failed upload: validation messages verbatim, everything
/// else prefixed.
pub fn failure_message(e: &ClientError) -> String {
    match e {
        ClientError::Validation(msg) => msg.clone(),
        other => format!("Upload failed: {other}"),
    }
}

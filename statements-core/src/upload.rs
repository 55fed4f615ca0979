//! Upload attempt state machine and progress bookkeeping.
//!
//! Idle -> Uploading -> {Succeeded | Failed} -> Idle

use thiserror::Error;

/// Message shown when a non-PDF file is picked
pub const NOT_A_PDF_MESSAGE: &str = "Please select a PDF file";

/// Whether a declared media type names a PDF. The file's bytes are not inspected.
pub fn is_pdf_media_type(media_type: &str) -> bool {
    media_type.to_ascii_lowercase().contains("pdf")
}

/// Integer percentage of `sent` over `total`, or `None` when the size is unknown.
pub fn progress_percent(sent: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let pct = (u128::from(sent) * 100 / u128::from(total)).min(100);
    Some(pct as u8)
}

/// Emits a percentage only when it moves forward.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn observe(&mut self, sent: u64, total: u64) -> Option<u8> {
        let pct = progress_percent(sent, total)?;
        if self.last.is_some_and(|last| pct <= last) {
            return None;
        }
        self.last = Some(pct);
        Some(pct)
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadStateError {
    #[error("an upload is already in progress")]
    InProgress,
    #[error("the previous upload result must be dismissed first")]
    NotReset,
    #[error("no upload is in progress")]
    NotUploading,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading {
        progress: Option<u8>,
    },
    Succeeded {
        message: String,
    },
    Failed {
        message: String,
    },
}

impl UploadState {
    pub fn begin(&mut self) -> Result<(), UploadStateError> {
        match self {
            UploadState::Idle => {
                *self = UploadState::Uploading { progress: None };
                Ok(())
            }
            UploadState::Uploading { .. } => Err(UploadStateError::InProgress),
            _ => Err(UploadStateError::NotReset),
        }
    }

    /// Record a progress value. Ignored outside `Uploading` and when it would
    /// move backwards. Returns whether the value was taken.
    pub fn record_progress(&mut self, pct: u8) -> bool {
        match self {
            UploadState::Uploading { progress } => {
                let pct = pct.min(100);
                if progress.is_some_and(|p| pct < p) {
                    return false;
                }
                *progress = Some(pct);
                true
            }
            _ => false,
        }
    }

    pub fn succeed(&mut self, message: impl Into<String>) -> Result<(), UploadStateError> {
        match self {
            UploadState::Uploading { .. } => {
                *self = UploadState::Succeeded {
                    message: message.into(),
                };
                Ok(())
            }
            _ => Err(UploadStateError::NotUploading),
        }
    }

    /// Fail the attempt. Allowed from `Idle` too: client-side validation
    /// rejects a file before any transfer starts.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), UploadStateError> {
        match self {
            UploadState::Idle | UploadState::Uploading { .. } => {
                *self = UploadState::Failed {
                    message: message.into(),
                };
                Ok(())
            }
            _ => Err(UploadStateError::NotReset),
        }
    }

    pub fn reset(&mut self) {
        *self = UploadState::Idle;
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadState::Uploading { .. })
    }

    pub fn progress(&self) -> Option<u8> {
        match self {
            UploadState::Uploading { progress } => *progress,
            _ => None,
        }
    }

    pub fn success_message(&self) -> Option<&str> {
        match self {
            UploadState::Succeeded { message } => Some(message),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            UploadState::Failed { message } => Some(message),
            _ => None,
        }
    }
}

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong talking to the statement backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any request was made
    #[error("{0}")]
    Validation(String),

    /// No response was received
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// A response arrived with a status outside 2xx
    #[error("request failed with status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("upload cancelled")]
    Cancelled,

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

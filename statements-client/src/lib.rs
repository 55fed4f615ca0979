//! statements-client: async HTTP client for the statement backend
//! (transaction listing and PDF upload).

pub mod client;
pub mod error;
pub mod file;

pub use client::{ClientConfig, Credentials, StatementsClient, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use file::{media_type_for, StatementFile};

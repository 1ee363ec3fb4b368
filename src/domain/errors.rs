//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Export parse error: {0}")]
    Parse(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("{0}")]
    UnsupportedFile(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("AI request failed: {0}")]
    Ai(String),

    /// Backend no longer knows the session (HTTP 404). Caller must re-upload.
    #[error("Session expired. Please upload your chat file again.")]
    SessionExpired,

    #[error("No active session. Please upload a chat file first.")]
    NoSession,

    #[error("UI error: {0}")]
    Ui(String),

    #[error("I/O error: {0}")]
    Io(String),
}

//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Answer, ChatEntry, DomainError, ExportFile, LoadedChat};

/// Turns an export file into parsed chat entries (locally or via the backend upload).
#[async_trait::async_trait]
pub trait ChatSourcePort: Send + Sync {
    async fn load(&self, export: &ExportFile) -> Result<LoadedChat, DomainError>;
}

/// Remote assistant. Answers a question about the chat bound to `session_id`.
#[async_trait::async_trait]
pub trait AiPort: Send + Sync {
    /// Returns `Ok(None)` when the backend replied without usable text.
    ///
    /// # Errors
    /// `DomainError::SessionExpired` when the backend no longer knows the session;
    /// `DomainError::Ai` for transport, status, or backend-reported failures.
    async fn ask(&self, question: &str, session_id: &str) -> Result<Option<String>, DomainError>;
}

/// Output surface for chats and answers.
pub trait RenderPort: Send + Sync {
    fn render_chat(&self, chat: &[ChatEntry]) -> Result<(), DomainError>;

    fn render_answer(&self, answer: &Answer) -> Result<(), DomainError>;

    /// Short status or error line.
    fn render_notice(&self, text: &str) -> Result<(), DomainError>;
}

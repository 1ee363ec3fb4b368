//! Session use case: load an export, keep the current chat snapshot, answer questions.
//!
//! - The loaded chat is an immutable `ChatSession` swapped as a whole
//! - Questions go to the remote assistant when one is configured
//! - The local `ChatAnalyzer` answers when the assistant fails or returns nothing

use crate::domain::{Answer, AnswerSource, ChatAnalyzer, ChatEntry, DomainError, ExportFile};
use crate::ports::{AiPort, ChatSourcePort};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// A loaded chat. Never mutated; replaced on upload, reset, or session expiry.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub filename: String,
    pub entries: Arc<[ChatEntry]>,
    /// Backend handle for assistant queries. `None` offline or after expiry.
    pub session_id: Option<String>,
}

impl ChatSession {
    pub fn message_count(&self) -> usize {
        self.entries.iter().map(|e| e.messages().count()).sum()
    }

    /// Plain-text transcript: a `Date:` line per day followed by `sender: message` lines.
    pub fn context_text(&self) -> String {
        let mut text = String::new();
        for entry in self.entries.iter() {
            text.push_str(&format!("Date: {}\n", entry.date));
            for m in entry.messages() {
                text.push_str(&format!("{}: {}\n", m.sender, m.message));
            }
        }
        text
    }

    fn without_session_id(&self) -> Self {
        Self {
            session_id: None,
            ..self.clone()
        }
    }
}

/// Session service. Owns the current chat and the answer fallback policy.
pub struct SessionService {
    source: Arc<dyn ChatSourcePort>,
    /// `None` in offline mode.
    ai: Option<Arc<dyn AiPort>>,
    analyzer: ChatAnalyzer,
    current: RwLock<Option<Arc<ChatSession>>>,
}

impl SessionService {
    pub fn new(source: Arc<dyn ChatSourcePort>, ai: Option<Arc<dyn AiPort>>) -> Self {
        Self {
            source,
            ai,
            analyzer: ChatAnalyzer::new(),
            current: RwLock::new(None),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.ai.is_none()
    }

    /// Load an export and make it the current session.
    ///
    /// # Errors
    /// `UnsupportedFile` for anything but `.zip`/`.txt`; source errors otherwise.
    /// The previous session stays current when loading fails.
    pub async fn load_export(&self, path: &Path) -> Result<Arc<ChatSession>, DomainError> {
        let export = ExportFile::new(path)?;
        let loaded = self.source.load(&export).await?;

        if self.ai.is_some() && loaded.session_id.is_none() {
            warn!(
                file = %export.file_name(),
                "session id missing from backend response; AI features may not work"
            );
        }

        let session = Arc::new(ChatSession {
            filename: export.file_name(),
            entries: loaded.entries.into(),
            session_id: loaded.session_id,
        });

        info!(
            file = %session.filename,
            days = session.entries.len(),
            messages = session.message_count(),
            has_session = session.session_id.is_some(),
            "chat loaded"
        );

        *self.current.write().await = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Current snapshot, if a chat is loaded.
    pub async fn current(&self) -> Option<Arc<ChatSession>> {
        self.current.read().await.clone()
    }

    /// Forget the loaded chat.
    pub async fn reset(&self) {
        *self.current.write().await = None;
        info!("session cleared");
    }

    /// Answer a question about the current chat.
    ///
    /// Returns `Ok(None)` for a blank question.
    ///
    /// # Errors
    /// `NoSession` when nothing is loaded (or the backend session is gone);
    /// the assistant's error when it fails and there is no chat data to fall back on.
    pub async fn ask(&self, question: &str) -> Result<Option<Answer>, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }

        let session = self.current().await.ok_or(DomainError::NoSession)?;

        let Some(ai) = &self.ai else {
            return Ok(Some(self.local_answer(&session, question, AnswerSource::Local)));
        };

        let session_id = session
            .session_id
            .as_deref()
            .ok_or(DomainError::NoSession)?;

        match ai.ask(question, session_id).await {
            Ok(Some(text)) => Ok(Some(Answer {
                text,
                source: AnswerSource::Remote,
            })),
            Ok(None) => {
                info!("assistant returned no text; using local analysis");
                Ok(Some(self.local_answer(&session, question, AnswerSource::Fallback)))
            }
            Err(e) => {
                if matches!(e, DomainError::SessionExpired) {
                    self.expire(&session).await;
                }
                if session.entries.is_empty() {
                    return Err(e);
                }
                warn!(error = %e, "assistant request failed; using local analysis");
                Ok(Some(self.local_answer(&session, question, AnswerSource::Fallback)))
            }
        }
    }

    fn local_answer(&self, session: &ChatSession, question: &str, source: AnswerSource) -> Answer {
        Answer {
            text: self.analyzer.analyze(&session.entries, question),
            source,
        }
    }

    /// Drop the session id, but only if `session` is still the current snapshot.
    async fn expire(&self, session: &Arc<ChatSession>) {
        let mut current = self.current.write().await;
        if let Some(active) = current.as_ref() {
            if Arc::ptr_eq(active, session) {
                *current = Some(Arc::new(session.without_session_id()));
                warn!(file = %session.filename, "backend session expired");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAiAdapter, MockReply};
    use crate::domain::{ChatItem, LoadedChat, Message};

    /// Source returning a fixed chat, optionally with a session id.
    struct FixedSource {
        entries: Vec<ChatEntry>,
        session_id: Option<String>,
    }

    #[async_trait::async_trait]
    impl ChatSourcePort for FixedSource {
        async fn load(&self, _export: &ExportFile) -> Result<LoadedChat, DomainError> {
            Ok(LoadedChat {
                entries: self.entries.clone(),
                session_id: self.session_id.clone(),
            })
        }
    }

    fn chat() -> Vec<ChatEntry> {
        let msg = |sender: &str, text: &str| {
            ChatItem::Message(Message {
                sender: sender.into(),
                message: text.into(),
                timestamp: "10:00".into(),
                is_current_user: false,
            })
        };
        vec![
            ChatEntry::new("2024-01-01", vec![msg("A", "hello there"), msg("A", "again")]),
            ChatEntry::new("2024-01-02", vec![msg("A", "third"), msg("B", "reply")]),
        ]
    }

    fn service(
        entries: Vec<ChatEntry>,
        session_id: Option<&str>,
        ai: Option<Arc<MockAiAdapter>>,
    ) -> SessionService {
        let source = Arc::new(FixedSource {
            entries,
            session_id: session_id.map(String::from),
        });
        SessionService::new(source, ai.map(|a| a as Arc<dyn AiPort>))
    }

    #[tokio::test]
    async fn test_ask_without_upload() {
        let svc = service(chat(), None, None);
        assert!(matches!(svc.ask("stats").await, Err(DomainError::NoSession)));
    }

    #[tokio::test]
    async fn test_blank_question_ignored() {
        let svc = service(chat(), None, None);
        svc.load_export(Path::new("chat.txt")).await.unwrap();
        assert_eq!(svc.ask("   ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_unsupported_file() {
        let svc = service(chat(), None, None);
        let err = svc.load_export(Path::new("chat.pdf")).await.unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedFile(_)));
        assert!(svc.current().await.is_none());
    }

    #[tokio::test]
    async fn test_offline_uses_local_analyzer() {
        let svc = service(chat(), None, None);
        let session = svc.load_export(Path::new("chat.txt")).await.unwrap();
        assert_eq!(session.message_count(), 4);
        assert_eq!(session.filename, "chat.txt");

        let answer = svc.ask("Show conversation statistics").await.unwrap().unwrap();
        assert_eq!(answer.source, AnswerSource::Local);
        assert!(answer.text.contains("Total Messages: 4"));
    }

    #[tokio::test]
    async fn test_remote_answer() {
        let ai = Arc::new(MockAiAdapter::new("A planned a trip.").with_delay(1));
        let svc = service(chat(), Some("sid-1"), Some(Arc::clone(&ai)));
        svc.load_export(Path::new("chat.zip")).await.unwrap();

        let answer = svc.ask("  Summarize this chat ").await.unwrap().unwrap();
        assert_eq!(answer.source, AnswerSource::Remote);
        assert_eq!(answer.text, "A planned a trip.");
        assert_eq!(
            ai.asked(),
            vec![("Summarize this chat".to_string(), "sid-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let ai = Arc::new(MockAiAdapter::scripted([MockReply::Empty]).with_delay(1));
        let svc = service(chat(), Some("sid-1"), Some(ai));
        svc.load_export(Path::new("chat.zip")).await.unwrap();

        let answer = svc.ask("summarize").await.unwrap().unwrap();
        assert_eq!(answer.source, AnswerSource::Fallback);
        assert!(answer.text.contains("Chat Summary"));
    }

    #[tokio::test]
    async fn test_error_falls_back_when_chat_present() {
        let ai = Arc::new(MockAiAdapter::scripted([MockReply::Error("boom".into())]).with_delay(1));
        let svc = service(chat(), Some("sid-1"), Some(ai));
        svc.load_export(Path::new("chat.zip")).await.unwrap();

        let answer = svc.ask("who is most active").await.unwrap().unwrap();
        assert_eq!(answer.source, AnswerSource::Fallback);
        assert!(answer.text.contains("1. A"));
        // session id survives ordinary failures
        assert!(svc.current().await.unwrap().session_id.is_some());
    }

    #[tokio::test]
    async fn test_error_propagates_without_chat_data() {
        let ai = Arc::new(MockAiAdapter::scripted([MockReply::Error("boom".into())]).with_delay(1));
        let svc = service(Vec::new(), Some("sid-1"), Some(ai));
        svc.load_export(Path::new("chat.zip")).await.unwrap();

        assert!(matches!(svc.ask("summary").await, Err(DomainError::Ai(ref m)) if m == "boom"));
    }

    #[tokio::test]
    async fn test_expired_session_clears_id_then_requires_upload() {
        let ai = Arc::new(MockAiAdapter::scripted([MockReply::Expired]).with_delay(1));
        let svc = service(chat(), Some("sid-1"), Some(Arc::clone(&ai)));
        let loaded = svc.load_export(Path::new("chat.zip")).await.unwrap();

        let answer = svc.ask("stats").await.unwrap().unwrap();
        assert_eq!(answer.source, AnswerSource::Fallback);

        let current = svc.current().await.unwrap();
        assert!(current.session_id.is_none());
        assert!(!Arc::ptr_eq(&current, &loaded));
        assert_eq!(current.entries.len(), loaded.entries.len());

        assert!(matches!(svc.ask("stats").await, Err(DomainError::NoSession)));
        assert_eq!(ai.asked().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_without_session_id_requires_upload() {
        let ai = Arc::new(MockAiAdapter::new("unused").with_delay(1));
        let svc = service(chat(), None, Some(Arc::clone(&ai)));
        svc.load_export(Path::new("chat.zip")).await.unwrap();
        assert!(matches!(svc.ask("stats").await, Err(DomainError::NoSession)));
        assert!(ai.asked().is_empty());
    }

    #[tokio::test]
    async fn test_reset_drops_session() {
        let svc = service(chat(), None, None);
        svc.load_export(Path::new("chat.txt")).await.unwrap();
        svc.reset().await;
        assert!(svc.current().await.is_none());
        assert!(matches!(svc.ask("stats").await, Err(DomainError::NoSession)));
    }

    #[tokio::test]
    async fn test_context_text() {
        let svc = service(chat(), None, None);
        let session = svc.load_export(Path::new("chat.txt")).await.unwrap();
        assert_eq!(
            session.context_text(),
            "Date: 2024-01-01\nA: hello there\nA: again\nDate: 2024-01-02\nA: third\nB: reply\n"
        );
    }
}

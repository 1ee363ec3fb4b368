//! Mock AI adapter for testing without a backend.
//!
//! Replays a scripted sequence of replies and records the questions it was asked.

use crate::domain::DomainError;
use crate::ports::AiPort;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// One scripted backend behaviour.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// `{"generated_text": ...}`
    Text(String),
    /// 200 OK without usable text.
    Empty,
    /// Transport or backend-reported failure.
    Error(String),
    /// HTTP 404: the backend dropped the session.
    Expired,
}

/// Mock AI adapter.
///
/// Pops replies in order; once the script is exhausted the last reply repeats.
/// Simulates network latency with configurable delay.
pub struct MockAiAdapter {
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
    script: Mutex<VecDeque<MockReply>>,
    last: Mutex<MockReply>,
    asked: Mutex<Vec<(String, String)>>,
}

impl MockAiAdapter {
    /// Create a mock that always answers with `text`, with default delay (100ms).
    pub fn new(text: impl Into<String>) -> Self {
        Self::scripted([MockReply::Text(text.into())])
    }

    /// Create a mock that replays `replies` in order.
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let script: VecDeque<MockReply> = replies.into_iter().collect();
        let last = script.back().cloned().unwrap_or(MockReply::Empty);
        Self {
            delay_ms: 100,
            script: Mutex::new(script),
            last: Mutex::new(last),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Override the simulated delay.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// `(question, session_id)` pairs received so far.
    pub fn asked(&self) -> Vec<(String, String)> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn next_reply(&self) -> MockReply {
        let popped = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match popped {
            Some(reply) => {
                if let Ok(mut last) = self.last.lock() {
                    *last = reply.clone();
                }
                reply
            }
            None => self
                .last
                .lock()
                .map(|l| l.clone())
                .unwrap_or(MockReply::Empty),
        }
    }
}

#[async_trait::async_trait]
impl AiPort for MockAiAdapter {
    async fn ask(&self, question: &str, session_id: &str) -> Result<Option<String>, DomainError> {
        info!(
            question_len = question.len(),
            session_id, "[MOCK] Simulating assistant reply"
        );

        // Simulate network delay
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        if let Ok(mut asked) = self.asked.lock() {
            asked.push((question.to_string(), session_id.to_string()));
        }

        match self.next_reply() {
            MockReply::Text(text) => Ok(Some(text)),
            MockReply::Empty => Ok(None),
            MockReply::Error(msg) => Err(DomainError::Ai(msg)),
            MockReply::Expired => Err(DomainError::SessionExpired),
        }
    }
}

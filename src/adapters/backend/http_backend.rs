//! Client for the chat analysis backend.
//!
//! - `POST /upload`: multipart export upload, returns parsed chat + session id
//! - `POST /ai`: question about the uploaded chat, answered by the backend's LLM

use crate::domain::{ChatEntry, DomainError, ExportFile, LoadedChat};
use crate::ports::{AiPort, ChatSourcePort};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend HTTP client. Implements both the upload source and the AI port.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    username: String,
}

impl HttpBackend {
    /// Create a client.
    ///
    /// # Arguments
    /// * `base_url` - Backend root (e.g., "http://127.0.0.1:6969"); trailing slashes are ignored
    /// * `username` - Sent with uploads in the `username` form field
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Io(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            username: username.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `/upload` response body.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    /// Only `"error"` is a failure; a missing status counts as success.
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    parsed_data: Option<Vec<ChatEntry>>,
    #[serde(default)]
    session_id: Option<String>,
}

/// `/ai` request body.
#[derive(Debug, Serialize)]
struct AiRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// `/ai` response body: either text or an error.
#[derive(Debug, Default, Deserialize)]
struct AiResponse {
    #[serde(default)]
    generated_text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn upload_outcome(body: UploadResponse) -> Result<LoadedChat, DomainError> {
    if body.status.as_deref() == Some("error") {
        return Err(DomainError::Upload(
            body.message.unwrap_or_else(|| "Upload failed".to_string()),
        ));
    }
    Ok(LoadedChat {
        entries: body.parsed_data.unwrap_or_default(),
        session_id: body.session_id.filter(|id| !id.is_empty()),
    })
}

fn ai_reply(status: StatusCode, body: AiResponse) -> Result<Option<String>, DomainError> {
    if status == StatusCode::NOT_FOUND {
        return Err(DomainError::SessionExpired);
    }
    if !status.is_success() {
        return Err(DomainError::Ai(format!("Server error: {}", status.as_u16())));
    }
    if let Some(error) = body.error {
        return Err(DomainError::Ai(error));
    }
    Ok(body.generated_text.filter(|t| !t.trim().is_empty()))
}

#[async_trait::async_trait]
impl ChatSourcePort for HttpBackend {
    async fn load(&self, export: &ExportFile) -> Result<LoadedChat, DomainError> {
        let file_name = export.file_name();
        let bytes = tokio::fs::read(&export.path)
            .await
            .map_err(|e| DomainError::Io(format!("read {}: {}", export.path.display(), e)))?;

        info!(
            file = %file_name,
            size = bytes.len(),
            "uploading export to backend"
        );

        let form = Form::new()
            .part("myFile", Part::bytes(bytes).file_name(file_name))
            .text("username", self.username.clone());

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DomainError::Upload(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "upload rejected");
            return Err(DomainError::Upload(format!(
                "Server returned {}",
                status.as_u16()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Upload(format!("Failed to parse upload response: {}", e)))?;

        debug!(
            filename = ?body.filename,
            has_session = body.session_id.is_some(),
            "upload response received"
        );

        upload_outcome(body)
    }
}

#[async_trait::async_trait]
impl AiPort for HttpBackend {
    async fn ask(&self, question: &str, session_id: &str) -> Result<Option<String>, DomainError> {
        info!(
            question_len = question.len(),
            "sending question to backend assistant"
        );

        let response = self
            .client
            .post(self.endpoint("ai"))
            .json(&AiRequest {
                message: question,
                session_id,
            })
            .send()
            .await
            .map_err(|e| DomainError::Ai(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text.chars().take(200).collect::<String>(), "AI endpoint returned error");
            return ai_reply(status, AiResponse::default());
        }

        let body: AiResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Ai(format!("Failed to parse AI response: {}", e)))?;

        let reply = ai_reply(status, body)?;
        debug!(
            reply_len = reply.as_ref().map(|t| t.len()).unwrap_or(0),
            "AI response received"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://127.0.0.1:6969/", "upload"),
            "http://127.0.0.1:6969/upload"
        );
        assert_eq!(join_url("http://host//", "/ai"), "http://host/ai");
        assert_eq!(join_url("http://host", "ai"), "http://host/ai");
    }

    #[test]
    fn test_upload_outcome_success() {
        let body: UploadResponse = serde_json::from_str(
            r#"{
                "status": "success",
                "filename": "chat.zip",
                "user": "User",
                "session_id": "abc123",
                "parsed_data": [
                    {"date": "2024-01-01", "content": [
                        {"type": "message", "sender": "A", "message": "hi", "timestamp": "10:00", "isCurrentUser": false},
                        {"type": "added", "message": "A added B"}
                    ]}
                ]
            }"#,
        )
        .unwrap();
        let loaded = upload_outcome(body).unwrap();
        assert_eq!(loaded.session_id.as_deref(), Some("abc123"));
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].content.len(), 2);
    }

    #[test]
    fn test_upload_outcome_without_session() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"status": "success", "parsed_data": [], "session_id": ""}"#)
                .unwrap();
        let loaded = upload_outcome(body).unwrap();
        assert!(loaded.session_id.is_none());
        assert!(loaded.entries.is_empty());
    }

    #[test]
    fn test_upload_outcome_without_status() {
        let body: UploadResponse = serde_json::from_str(
            r#"{"parsed_data": [{"date": "2024-01-01", "content": []}], "session_id": "s1"}"#,
        )
        .unwrap();
        let loaded = upload_outcome(body).unwrap();
        assert_eq!(loaded.session_id.as_deref(), Some("s1"));
        assert_eq!(loaded.entries.len(), 1);
    }

    #[test]
    fn test_upload_outcome_error() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"status": "error", "message": "No .txt file found in ZIP"}"#)
                .unwrap();
        let err = upload_outcome(body).unwrap_err();
        assert!(matches!(err, DomainError::Upload(ref m) if m == "No .txt file found in ZIP"));

        let body: UploadResponse = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert!(matches!(upload_outcome(body), Err(DomainError::Upload(ref m)) if m == "Upload failed"));
    }

    #[test]
    fn test_ai_reply_variants() {
        let text = AiResponse {
            generated_text: Some("It was a trip plan.".into()),
            error: None,
        };
        assert_eq!(
            ai_reply(StatusCode::OK, text).unwrap().as_deref(),
            Some("It was a trip plan.")
        );

        let blank = AiResponse {
            generated_text: Some("  ".into()),
            error: None,
        };
        assert_eq!(ai_reply(StatusCode::OK, blank).unwrap(), None);
        assert_eq!(ai_reply(StatusCode::OK, AiResponse::default()).unwrap(), None);

        let failed = AiResponse {
            generated_text: None,
            error: Some("quota exceeded".into()),
        };
        assert!(matches!(
            ai_reply(StatusCode::OK, failed),
            Err(DomainError::Ai(ref m)) if m == "quota exceeded"
        ));

        assert!(matches!(
            ai_reply(StatusCode::NOT_FOUND, AiResponse::default()),
            Err(DomainError::SessionExpired)
        ));
        assert!(matches!(
            ai_reply(StatusCode::INTERNAL_SERVER_ERROR, AiResponse::default()),
            Err(DomainError::Ai(ref m)) if m == "Server error: 500"
        ));
    }

    #[test]
    fn test_ai_request_shape() {
        let body = serde_json::to_value(AiRequest {
            message: "Summarize this chat",
            session_id: "s-1",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"message": "Summarize this chat", "session_id": "s-1"})
        );
    }
}

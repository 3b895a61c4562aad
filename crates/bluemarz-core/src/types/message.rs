//! Session messages, files and the receipts of session operations.

use serde::{Deserialize, Serialize};

use crate::error::{BluemarzError, BluemarzResult};

/// Author of a session message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Agent,
    System,
    User,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::Agent => write!(f, "agent"),
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
        }
    }
}

/// A file attached to a session, either already uploaded (`id`) or fetchable (`url`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SessionFile {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn from_url(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            file_name: Some(file_name.into()),
            ..Self::default()
        }
    }

    /// Whether the backend already holds this file.
    pub fn is_uploaded(&self) -> bool {
        self.id.is_some()
    }
}

/// A message in a conversation.
///
/// At least one of `text` (non-empty) or `files` (non-empty) must be present;
/// [`SessionMessage::new`], [`SessionMessage::validate`] and deserialization
/// enforce this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionMessageWire")]
pub struct SessionMessage {
    pub role: MessageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<SessionFile>>,
}

impl SessionMessage {
    /// Create a validated message.
    pub fn new(
        role: MessageRole,
        text: Option<String>,
        files: Option<Vec<SessionFile>>,
    ) -> BluemarzResult<Self> {
        let message = Self { role, text, files };
        message.validate()?;
        Ok(message)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text_message(MessageRole::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::text_message(MessageRole::Agent, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::text_message(MessageRole::System, text)
    }

    fn text_message(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: Some(text.into()),
            files: None,
        }
    }

    pub fn with_files(mut self, files: Vec<SessionFile>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn has_files(&self) -> bool {
        self.files.as_ref().is_some_and(|f| !f.is_empty())
    }

    pub fn validate(&self) -> BluemarzResult<()> {
        if self.text.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(BluemarzError::Validation(
                "Message text cannot be empty when present".to_string(),
            ));
        }
        if self.text.is_none() && !self.has_files() {
            return Err(BluemarzError::Validation(format!(
                "A {} message needs text or files",
                self.role
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionMessageWire {
    role: MessageRole,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    files: Option<Vec<SessionFile>>,
}

impl TryFrom<SessionMessageWire> for SessionMessage {
    type Error = BluemarzError;

    fn try_from(wire: SessionMessageWire) -> Result<Self, Self::Error> {
        SessionMessage::new(wire.role, wire.text, wire.files)
    }
}

/// Receipt of [`Session::add_message`](crate::Session::add_message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMessageResult {
    pub ok: bool,
}

impl AddMessageResult {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Receipt of [`Session::add_file`](crate::Session::add_file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFileResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

impl AddFileResult {
    pub fn uploaded(file_id: impl Into<String>) -> Self {
        Self {
            ok: true,
            file_id: Some(file_id.into()),
        }
    }
}

/// Receipt of [`Session::delete_session`](crate::Session::delete_session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSessionResult {
    pub ok: bool,
}

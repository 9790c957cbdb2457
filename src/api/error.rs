use serde_json::Value;
use thiserror::Error;

use crate::models::ValidationError;

/// Failures from calls to the portal API or the backend behind it
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Maps a failed HTTP status to the matching variant
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => ClientError::Unauthorized(message),
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            _ => ClientError::Status { status, message },
        }
    }

    /// HTTP status behind the error, when there was a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Conflict(_) => Some(409),
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// The one line shown to a person; raw detail goes to the log instead
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(err) => {
                format!("{}: {}", err.message, err.fields().join(", "))
            }
            ClientError::Unauthorized(_) => "Your session has expired. Please log in again.".to_string(),
            ClientError::Forbidden(_) => "Access denied: your role does not allow this action.".to_string(),
            ClientError::NotFound(msg) | ClientError::Conflict(msg) => msg.clone(),
            ClientError::Status { .. } => "Something went wrong. Please try again.".to_string(),
            ClientError::Transport(_) => "Unable to reach the server. Please try again.".to_string(),
            ClientError::Decode(_) | ClientError::InvalidUrl(_) => {
                "Unexpected response from the server.".to_string()
            }
        }
    }
}

/// Pulls a message out of an error body: `{error}`, `{message}` or `{error: {message}}`
pub fn extract_error_message(body: &Value) -> Option<String> {
    if let Some(msg) = body.get("error").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    if let Some(msg) = body.get("message").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

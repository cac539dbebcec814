use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use super::refresh::RefreshFailure;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Session expired: {0}")]
    SessionExpired(RefreshFailure),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, String>,
    },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Status {status}: {message}")]
    Other { status: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub errors: Option<BTreeMap<String, String>>,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::NetworkError(err)
        }
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Fallback text for a status when the server sent no message.
    pub fn default_message(status: u16) -> &'static str {
        match status {
            400 => "Bad request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not found",
            409 => "Conflict",
            422 => "Validation error",
            500 => "Internal server error",
            _ => "An error occurred",
        }
    }

    pub fn storage(err: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", err))
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let code = status.as_u16();
        let message = match parsed.as_ref().and_then(|b| b.message.clone()) {
            Some(message) if !message.is_empty() => message,
            _ if !body.trim().is_empty() && parsed.is_none() => Self::truncate_body(body),
            _ => Self::default_message(code).to_string(),
        };

        match code {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            422 => ApiError::Validation {
                message,
                errors: parsed.and_then(|b| b.errors).unwrap_or_default(),
            },
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError {
                status: code,
                message,
            },
            _ => ApiError::Other {
                status: code,
                message,
            },
        }
    }

    /// HTTP status of the failure; 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NetworkError(_)
            | ApiError::Timeout
            | ApiError::InvalidRequest(_)
            | ApiError::InvalidResponse(_)
            | ApiError::Storage(_) => 0,
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized | ApiError::SessionExpired(_) => 401,
            ApiError::AccessDenied(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Validation { .. } => 422,
            ApiError::RateLimited => 429,
            ApiError::ServerError { status, .. } | ApiError::Other { status, .. } => *status,
        }
    }

    /// True when no HTTP response was received at all.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::NetworkError(_) | ApiError::Timeout)
    }

    /// Per-field validation messages, present only for 422 responses.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ApiError::Validation { errors, .. } if !errors.is_empty() => Some(errors),
            _ => None,
        }
    }

    /// User-facing notification lines for this error.
    ///
    /// Exactly one line, except validation failures with field errors,
    /// which produce one line per invalid field.
    pub fn notifications(&self) -> Vec<String> {
        if let Some(errors) = self.field_errors() {
            return errors.values().cloned().collect();
        }
        let line = match self {
            ApiError::NetworkError(_) | ApiError::Timeout => {
                "Network error. Please check your connection.".to_string()
            }
            ApiError::Unauthorized | ApiError::SessionExpired(_) => {
                "Please login to continue".to_string()
            }
            ApiError::AccessDenied(_) => {
                "You do not have permission to perform this action".to_string()
            }
            ApiError::ServerError { .. } => "Server error. Please try again later.".to_string(),
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::Other { message, .. }
            | ApiError::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        };
        vec![line]
    }
}

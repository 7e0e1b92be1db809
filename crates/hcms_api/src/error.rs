//! Error model used by portal API client operations.

use std::io;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortalError>;

/// Represents the failures a portal request can end in: backend rejections carrying the `detail` message, authentication failures, timeouts, network problems, serialization issues and anything else unexpected.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("http {status}: {message}")]
    Http {
        status: StatusCode,
        detail: Option<String>,
        message: String,
    },
    #[error("authentication error: {0}")]
    Authentication(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl PortalError {
    /// Constructs an HTTP error variant, pulling the backend `detail` out of the body when present.
    pub fn http(status: StatusCode, body: impl Into<String>) -> Self {
        let message = body.into();
        let detail = extract_detail(&message);
        PortalError::Http {
            status,
            detail,
            message,
        }
    }

    /// Builds the error for a 401/403 response, keeping the backend detail as the message when present.
    pub fn access_denied(status: StatusCode, body: &str) -> Self {
        match extract_detail(body) {
            Some(detail) => PortalError::Authentication(detail),
            None => PortalError::Authentication(format!("Access denied ({})", status)),
        }
    }

    /// Backend-provided explanation, if the server sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            PortalError::Http { detail, .. } => detail.as_deref(),
            PortalError::Authentication(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, PortalError::Authentication(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PortalError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for a toast: the backend detail or the caller's fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// FastAPI sends `{"detail": "..."}`; validation errors send a list of `{msg}` objects instead.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    match value.get("detail")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join(", "))
            }
        }
        _ => None,
    }
}

impl From<reqwest::Error> for PortalError {
    /// Converts reqwest errors into semantic PortalError variants.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PortalError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            PortalError::Http {
                status,
                detail: None,
                message: err.to_string(),
            }
        } else if err.is_connect() {
            PortalError::Network(err.to_string())
        } else if err.is_decode() {
            PortalError::Serialization(err.to_string())
        } else {
            PortalError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::PortalError;
    use reqwest::StatusCode;

    #[test]
    fn http_error_extracts_string_detail() {
        let err = PortalError::http(StatusCode::BAD_REQUEST, r#"{"detail":"이미 승인된 견적서입니다."}"#);
        assert_eq!(err.detail(), Some("이미 승인된 견적서입니다."));
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn http_error_joins_validation_messages() {
        let body = r#"{"detail":[{"loc":["body","title"],"msg":"field required"},{"msg":"too short"}]}"#;
        let err = PortalError::http(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(err.detail(), Some("field required, too short"));
    }

    #[test]
    fn user_message_falls_back_without_detail() {
        let err = PortalError::http(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.detail(), None);
        assert_eq!(err.user_message("등록에 실패했습니다."), "등록에 실패했습니다.");

        let other = PortalError::Network("connection refused".into());
        assert_eq!(other.user_message("fallback"), "fallback");
    }

    #[test]
    fn access_denied_prefers_backend_detail() {
        let err = PortalError::access_denied(StatusCode::UNAUTHORIZED, r#"{"detail":"유효하지 않은 링크입니다."}"#);
        assert!(err.is_authentication());
        assert_eq!(err.user_message("fallback"), "유효하지 않은 링크입니다.");

        let bare = PortalError::access_denied(StatusCode::FORBIDDEN, "");
        assert_eq!(bare.detail(), Some("Access denied (403 Forbidden)"));
    }
}

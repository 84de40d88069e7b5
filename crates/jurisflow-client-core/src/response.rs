use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized outcome of one HTTP exchange with the backend.
///
/// A response is built once per request and never modified afterwards,
/// except for attaching the display-only friendly message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub method: HttpMethod,
    pub path: String,
    pub ok: bool,
    pub status: u16,
    pub data: Value,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_message: Option<String>,
}

impl ApiResponse {
    #[must_use]
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        status: u16,
        data: Value,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            ok: (200..300).contains(&status),
            status,
            data,
            elapsed_ms,
            friendly_message: None,
        }
    }

    #[must_use]
    pub fn with_friendly_message(mut self, message: impl Into<String>) -> Self {
        self.friendly_message = Some(message.into());
        self
    }

    /// One-line request/response trace: `METHOD path → status (Nms)`.
    #[must_use]
    pub fn trace_line(&self) -> String {
        format!(
            "{} {} → {} ({}ms)",
            self.method, self.path, self.status, self.elapsed_ms
        )
    }

    /// `Some` only for status >= 400. A 1xx/3xx answer is not `ok` but is
    /// not an API error either.
    #[must_use]
    pub fn api_error(&self) -> Option<ApiError> {
        if self.status < 400 {
            return None;
        }
        Some(ApiError {
            status: self.status,
            message: server_message(&self.data),
        })
    }
}

/// Transport-level failure: no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("api_invalid_path")]
    InvalidPath,
    #[error("api_request_failed:{message}")]
    Request { message: String },
    #[error("api_read_failed:{message}")]
    Read { message: String },
}

/// HTTP response with status >= 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("api_http_{status}:{}", .message.as_deref().unwrap_or("<empty>"))]
pub struct ApiError {
    pub status: u16,
    pub message: Option<String>,
}

#[async_trait]
pub trait ApiTransport {
    async fn request(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<ApiResponse, NetworkError>;
}

/// Pulls a human-readable error out of common backend error payload shapes.
#[must_use]
pub fn server_message(data: &Value) -> Option<String> {
    let from_error = match data.get("error") {
        Some(Value::String(message)) => non_empty(message),
        Some(Value::Object(error)) => error
            .get("message")
            .and_then(Value::as_str)
            .and_then(non_empty),
        _ => None,
    };
    from_error
        .or_else(|| data.get("message").and_then(Value::as_str).and_then(non_empty))
        .or_else(|| data.get("detail").and_then(Value::as_str).and_then(non_empty))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jurisflow_client_core::auth::normalize_base_url;
use jurisflow_client_core::listing::Resource;
use jurisflow_client_core::process::summary_path;
use jurisflow_client_core::response::{ApiResponse, ApiTransport, HttpMethod, NetworkError};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_USER_AGENT: &str = concat!("jurisflow/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    /// `None` leaves the transport default in place.
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl ApiClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("api_client_base_url_missing")]
    BaseUrlMissing,
    #[error("api_client_base_url_invalid:{0}")]
    BaseUrlInvalid(String),
    #[error("api_client_build_failed:{message}")]
    Build { message: String },
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// HTTP transport for the JurisFlow backend.
///
/// 4xx/5xx answers come back as `Ok` responses with `ok == false`; only
/// transport failures are errors. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Option<Duration>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiClientError> {
        if config.base_url.trim().is_empty() {
            return Err(ApiClientError::BaseUrlMissing);
        }
        let base_url = normalize_base_url(&config.base_url)
            .map_err(|_| ApiClientError::BaseUrlInvalid(config.base_url.trim().to_string()))?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .build()
            .map_err(|error| ApiClientError::Build {
                message: error.to_string(),
            })?;
        Ok(Self {
            base_url,
            timeout: config.timeout_ms.map(Duration::from_millis),
            http,
        })
    }

    pub fn from_base_url(
        base_url: Option<&str>,
        timeout_ms: Option<u64>,
    ) -> Result<Self, ApiClientError> {
        let mut config = ApiClientConfig::new(base_url.unwrap_or_default());
        config.timeout_ms = timeout_ms;
        Self::new(config)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    /// One request/response exchange. Elapsed time covers sending and
    /// reading the body, not body encoding or JSON parsing.
    pub async fn send(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<ApiResponse, NetworkError> {
        let url = self.endpoint(path).ok_or(NetworkError::InvalidPath)?;
        let encoded = body.map(Value::to_string);

        let mut request = self
            .http
            .request(reqwest_method(method), url.as_str())
            .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(encoded) = encoded {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(encoded);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|error| NetworkError::Request {
            message: error.to_string(),
        })?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|error| NetworkError::Read {
            message: error.to_string(),
        })?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let data = decode_body(&text);
        tracing::debug!(%method, path = path.trim(), status, elapsed_ms, "api exchange");
        Ok(ApiResponse::new(method, path.trim(), status, data, elapsed_ms))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<ApiResponse, NetworkError> {
        self.send(path, HttpMethod::Get, None, token).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Result<ApiResponse, NetworkError> {
        self.send(path, HttpMethod::Post, Some(body), token).await
    }

    pub async fn delete(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<ApiResponse, NetworkError> {
        self.send(path, HttpMethod::Delete, None, token).await
    }

    pub async fn health(&self) -> Result<ApiResponse, NetworkError> {
        self.get("/health", None).await
    }

    pub async fn delete_item(
        &self,
        resource: Resource,
        item_id: &str,
        token: Option<&str>,
    ) -> Result<ApiResponse, NetworkError> {
        if item_id.trim().is_empty() {
            return Err(NetworkError::InvalidPath);
        }
        self.delete(&resource.item_path(item_id), token).await
    }

    pub async fn process_summary(
        &self,
        process_id: &str,
        token: Option<&str>,
    ) -> Result<ApiResponse, NetworkError> {
        let path = summary_path(process_id).map_err(|_| NetworkError::InvalidPath)?;
        self.get(&path, token).await
    }
}

#[async_trait]
impl ApiTransport for ApiClient {
    async fn request(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<ApiResponse, NetworkError> {
        self.send(path, method, body, token).await
    }
}

/// JSON when the body parses, otherwise the raw text (an empty body stays
/// an empty string).
#[must_use]
pub fn decode_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_builder_normalizes_paths() {
        let client = ApiClient::new(ApiClientConfig::new("https://jurisflow.example/"))
            .expect("api client");

        assert_eq!(
            client.endpoint("/api/documents"),
            Some("https://jurisflow.example/api/documents".to_string())
        );
        assert_eq!(
            client.endpoint("api/documents"),
            Some("https://jurisflow.example/api/documents".to_string())
        );
        assert_eq!(client.endpoint("  "), None);
    }

    #[test]
    fn base_url_is_validated() {
        assert!(matches!(
            ApiClient::new(ApiClientConfig::new("   ")),
            Err(ApiClientError::BaseUrlMissing)
        ));
        assert!(matches!(
            ApiClient::from_base_url(Some("ftp://jurisflow.example"), None),
            Err(ApiClientError::BaseUrlInvalid(_))
        ));
        let client = ApiClient::from_base_url(Some(" http://127.0.0.1:8000/ "), Some(500))
            .expect("api client");
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn body_decoding_falls_back_to_text() {
        assert_eq!(decode_body(r#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(decode_body("[1,2]"), json!([1, 2]));
        assert_eq!(decode_body("Bad Gateway"), json!("Bad Gateway"));
        assert_eq!(decode_body(""), json!(""));
    }

    #[tokio::test]
    async fn empty_path_is_rejected_before_sending() {
        let client = ApiClient::new(ApiClientConfig::new("http://127.0.0.1:9")).expect("client");
        let error = client
            .send(" ", HttpMethod::Get, None, None)
            .await
            .expect_err("invalid path");
        assert_eq!(error, NetworkError::InvalidPath);
    }
}

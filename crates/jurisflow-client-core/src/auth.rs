use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::permissions::PermissionSet;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const ENV_API_BASE_URL: &str = "JURISFLOW_API_BASE_URL";
pub const ENV_API_BASE_URL_LEGACY: &str = "JURISFLOW_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthInputError {
    #[error("base url must not be empty")]
    EmptyBaseUrl,
    #[error("base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
    #[error("Por favor, preencha usuário e senha.")]
    MissingCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Profile returned by `GET /api/auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl UserProfile {
    /// Accepts `{user: {...}}` or the bare user object. Returns `None` when
    /// no username is present; permissions that are not a string array are
    /// dropped rather than rejected.
    #[must_use]
    pub fn from_me_payload(payload: &Value) -> Option<Self> {
        let user = payload.get("user").filter(|user| user.is_object()).unwrap_or(payload);
        let username = user.get("username")?.as_str()?.trim();
        if username.is_empty() {
            return None;
        }
        let office_id = user
            .get("office_id")
            .or_else(|| user.get("office"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            username: username.to_string(),
            office_id,
            roles: string_list(user.get("roles")),
            permissions: PermissionSet::from_claims(user.get("permissions")),
        })
    }

    #[must_use]
    pub fn summary_line(&self) -> String {
        let permissions = self.permissions.iter().collect::<Vec<_>>();
        format!(
            "👤 Usuário: {} | 🏷️ Roles: {} | 🔑 Permissions: {}",
            self.username,
            self.roles.join(", "),
            permissions.join(", ")
        )
    }
}

/// Claims read from the bearer token payload. Display only: these never
/// grant anything, the profile endpoint is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub username: Option<String>,
    pub roles: Vec<String>,
    pub permissions: PermissionSet,
    pub expires_at: Option<i64>,
}

#[must_use]
pub fn decode_token_claims(token: &str) -> Option<TokenClaims> {
    let mut segments = token.trim().split('.');
    let (_header, payload) = (segments.next()?, segments.next()?);
    segments.next()?;

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    if !claims.is_object() {
        return None;
    }
    Some(TokenClaims {
        username: claims
            .get("username")
            .or_else(|| claims.get("sub"))
            .and_then(Value::as_str)
            .map(str::to_string),
        roles: string_list(claims.get("roles")),
        permissions: PermissionSet::from_claims(claims.get("permissions")),
        expires_at: claims.get("exp").and_then(Value::as_i64),
    })
}

pub fn resolve_api_base_url() -> Result<(String, &'static str), AuthInputError> {
    if let Some(base_url) = env_non_empty(ENV_API_BASE_URL) {
        return normalize_base_url(&base_url).map(|normalized| (normalized, ENV_API_BASE_URL));
    }
    if let Some(base_url) = env_non_empty(ENV_API_BASE_URL_LEGACY) {
        return normalize_base_url(&base_url)
            .map(|normalized| (normalized, ENV_API_BASE_URL_LEGACY));
    }
    normalize_base_url(DEFAULT_API_BASE_URL).map(|normalized| (normalized, "default_local"))
}

pub fn normalize_base_url(raw: &str) -> Result<String, AuthInputError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthInputError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AuthInputError::InvalidBaseUrl);
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(AuthInputError::InvalidBaseUrl);
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(AuthInputError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
}

/// Only the username is trimmed. The password is sent exactly as typed,
/// matching what registration stores.
pub fn normalize_login(username: &str, password: &str) -> Result<LoginRequest, AuthInputError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AuthInputError::MissingCredentials);
    }
    Ok(LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Token from a login/register payload, if any.
#[must_use]
pub fn token_from_payload(payload: &Value) -> Option<String> {
    payload
        .get("token")
        .or_else(|| payload.get("access_token"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

//! Client session: auth state, the last-response slot and the page-level
//! flows built on top of an [`ApiTransport`].

use std::convert::Infallible;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{
    AuthInputError, TokenClaims, UserProfile, decode_token_claims, normalize_login,
    token_from_payload,
};
use crate::listing::{Listing, Resource, render_listing};
use crate::messages::friendly_message;
use crate::permissions::{Action, ControlState, PermissionGate, PermissionSet};
use crate::process::{
    ProcessEntry, ProcessSummary, aggregate_processes, parse_process_summary,
    processes_from_listing, summary_path,
};
use crate::records::{FileCaseRequest, NewRecord, RecordInputError};
use crate::registration::{RegistrationError, RegistrationForm};
use crate::render::RenderOptions;
use crate::response::{ApiError, ApiResponse, ApiTransport, HttpMethod, NetworkError};
use crate::view::{ResponseDisplay, ViewMode, ViewState};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const ME_PATH: &str = "/api/auth/me";
pub const HEALTH_PATH: &str = "/health";
pub const ORCHESTRATE_PATH: &str = "/api/orchestrate/file-case";

/// Everything that survives between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(rename = "jwtToken", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub view: ViewState,
}

pub trait SessionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load_session(&self) -> Result<Option<StoredSession>, Self::Error>;
    fn persist_session(&self, session: &StoredSession) -> Result<(), Self::Error>;
    fn clear_session(&self) -> Result<(), Self::Error>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<StoredSession> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<StoredSession>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    type Error = Infallible;

    fn load_session(&self) -> Result<Option<StoredSession>, Self::Error> {
        Ok(self.slot().clone())
    }

    fn persist_session(&self, session: &StoredSession) -> Result<(), Self::Error> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> Result<(), Self::Error> {
        *self.slot() = None;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("{}", .0.message.as_deref().unwrap_or("erro desconhecido"))]
    Api(#[from] ApiError),
    #[error(transparent)]
    AuthInput(#[from] AuthInputError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    RecordInput(#[from] RecordInputError),
    #[error("login response did not include a token")]
    MissingToken,
    /// Non-2xx answer below 400, such as a redirect the transport did not follow.
    #[error("resposta inesperada do servidor ({status})")]
    UnexpectedStatus { status: u16 },
    #[error("Você não tem permissão para esta operação ({permission}).")]
    PermissionDenied {
        action: &'static str,
        permission: &'static str,
    },
    #[error("{resource} não suportam filtro por data")]
    NoDateFilter { resource: &'static str },
    #[error("Por favor, informe o ID do item.")]
    EmptyItemId,
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("session store failed: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub username: String,
    /// True when the backend answered with a token and the session adopted it.
    pub logged_in: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSource {
    Endpoint,
    Aggregated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessList {
    pub entries: Vec<ProcessEntry>,
    pub source: ProcessSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSummaryOutcome {
    pub process_id: String,
    pub response: ApiResponse,
    pub summary: ProcessSummary,
}

pub struct ClientSession<T, S> {
    transport: T,
    store: S,
    token: Option<String>,
    profile: Option<UserProfile>,
    view: ViewState,
    gate: PermissionGate,
    render_options: RenderOptions,
}

impl<T, S> ClientSession<T, S>
where
    T: ApiTransport,
    S: SessionStore,
{
    pub fn new(transport: T, store: S) -> Self {
        Self {
            transport,
            store,
            token: None,
            profile: None,
            view: ViewState::default(),
            gate: PermissionGate::builtin(),
            render_options: RenderOptions::inline(),
        }
    }

    #[must_use]
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Loads the persisted session. A missing session is not an error: the
    /// client simply starts logged out.
    pub fn restore(&mut self) -> Result<bool, SessionError> {
        let stored = self.store.load_session().map_err(store_error)?;
        let Some(stored) = stored else {
            tracing::debug!("no persisted session");
            return Ok(false);
        };
        self.token = stored.token.filter(|token| !token.trim().is_empty());
        self.profile = if self.token.is_some() { stored.user } else { None };
        self.view = stored.view;
        Ok(self.token.is_some())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Permissions from the last successful profile fetch; empty otherwise.
    #[must_use]
    pub fn permissions(&self) -> PermissionSet {
        self.profile
            .as_ref()
            .map(|profile| profile.permissions.clone())
            .unwrap_or_default()
    }

    /// Claims decoded from the held token. Never used for gating.
    #[must_use]
    pub fn token_claims(&self) -> Option<TokenClaims> {
        self.token.as_deref().and_then(decode_token_claims)
    }

    #[must_use]
    pub fn controls(&self) -> Vec<ControlState> {
        self.gate.evaluate(&self.permissions())
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn last_response(&self) -> Option<&ApiResponse> {
        self.view.last_response()
    }

    pub fn display(&mut self) -> Option<ResponseDisplay> {
        let options = self.render_options;
        self.view.display(&options)
    }

    pub fn toggle_view(&mut self) -> Result<ViewMode, SessionError> {
        let mode = self.view.toggle();
        self.persist()?;
        Ok(mode)
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> Result<ViewMode, SessionError> {
        let mode = self.view.set_mode(mode);
        self.persist()?;
        Ok(mode)
    }

    #[must_use]
    pub fn render_listing(&self, resource: Resource, data: &Value) -> Listing {
        render_listing(resource, data, &RenderOptions::modal(), &self.permissions())
    }

    /// Issues one request, attaches the friendly message and stores the
    /// response in the last-response slot. HTTP errors are returned as
    /// responses; only transport failures are errors.
    pub async fn hit(
        &mut self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, SessionError> {
        let response = self
            .transport
            .request(path, method, body, self.token.as_deref())
            .await?;
        let message = friendly_message(method, path, response.status, &response.data);
        let response = response.with_friendly_message(message);
        tracing::debug!(trace = %response.trace_line(), "recorded response");

        if response.status == 401 && self.token.is_some() && !path.contains(LOGIN_PATH) {
            tracing::warn!(path, "token rejected; clearing session");
            self.token = None;
            self.profile = None;
        }

        self.view.record(response.clone());
        self.persist()?;
        Ok(response)
    }

    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, SessionError> {
        let request = normalize_login(username, password)?;
        let body = serde_json::to_value(&request)?;
        let response = self.hit(HttpMethod::Post, LOGIN_PATH, Some(&body)).await?;
        if !response.ok {
            return Err(failure(&response));
        }
        let token = token_from_payload(&response.data).ok_or(SessionError::MissingToken)?;
        self.token = Some(token);
        self.persist()?;

        let profile = self.refresh_profile().await?;
        if let Err(error) = self.hit(HttpMethod::Get, HEALTH_PATH, None).await {
            tracing::warn!(%error, "post-login health check failed");
        }
        Ok(profile)
    }

    pub async fn register(
        &mut self,
        form: &RegistrationForm,
    ) -> Result<RegistrationOutcome, SessionError> {
        let request = form.validate()?;
        let body = serde_json::to_value(&request)?;
        let response = self.hit(HttpMethod::Post, REGISTER_PATH, Some(&body)).await?;
        if !response.ok {
            return Err(failure(&response));
        }

        let logged_in = match token_from_payload(&response.data) {
            Some(token) => {
                self.token = Some(token);
                self.persist()?;
                self.refresh_profile().await?;
                true
            }
            None => false,
        };
        Ok(RegistrationOutcome {
            username: request.username,
            logged_in,
        })
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.token = None;
        self.profile = None;
        self.view.clear();
        self.store.clear_session().map_err(store_error)
    }

    /// Re-reads the profile. Any failure leaves the session without a
    /// profile, so every gated control is hidden until the next success.
    pub async fn refresh_profile(&mut self) -> Result<Option<UserProfile>, SessionError> {
        self.profile = match self.token.as_deref() {
            None => None,
            Some(token) => {
                match self
                    .transport
                    .request(ME_PATH, HttpMethod::Get, None, Some(token))
                    .await
                {
                    Ok(response) if response.ok => {
                        let profile = UserProfile::from_me_payload(&response.data);
                        if profile.is_none() {
                            tracing::warn!("profile payload malformed; permissions cleared");
                        }
                        profile
                    }
                    Ok(response) => {
                        tracing::warn!(status = response.status, "profile fetch rejected");
                        None
                    }
                    Err(error) => {
                        tracing::warn!(%error, "profile fetch failed");
                        None
                    }
                }
            }
        };
        self.persist()?;
        Ok(self.profile.clone())
    }

    pub async fn health(&mut self) -> Result<ApiResponse, SessionError> {
        self.hit(HttpMethod::Get, HEALTH_PATH, None).await
    }

    pub async fn list(&mut self, resource: Resource) -> Result<ApiResponse, SessionError> {
        self.require(resource.list_action())?;
        self.hit(HttpMethod::Get, resource.path(), None).await
    }

    pub async fn list_on(
        &mut self,
        resource: Resource,
        date: NaiveDate,
    ) -> Result<ApiResponse, SessionError> {
        self.require(resource.list_action())?;
        let path = resource
            .dated_path(date)
            .ok_or(SessionError::NoDateFilter {
                resource: resource.title(),
            })?;
        self.hit(HttpMethod::Get, &path, None).await
    }

    pub async fn create(&mut self, record: &NewRecord) -> Result<ApiResponse, SessionError> {
        let action = match record {
            NewRecord::Document(_) => Action::CreateDocument,
            NewRecord::Deadline(_) => Action::CreateDeadline,
            NewRecord::Hearing(_) => Action::CreateHearing,
        };
        self.require(action)?;
        let body = record.to_json()?;
        self.hit(HttpMethod::Post, record.path(), Some(&body)).await
    }

    pub async fn delete(
        &mut self,
        resource: Resource,
        item_id: &str,
    ) -> Result<ApiResponse, SessionError> {
        let Some(action) = resource.delete_action() else {
            return Err(SessionError::PermissionDenied {
                action: "delete",
                permission: crate::permissions::DELETE,
            });
        };
        self.require(action)?;
        if item_id.trim().is_empty() {
            return Err(SessionError::EmptyItemId);
        }
        self.hit(HttpMethod::Delete, &resource.item_path(item_id), None)
            .await
    }

    pub async fn process_summary(
        &mut self,
        process_id: &str,
    ) -> Result<ProcessSummaryOutcome, SessionError> {
        self.require(Action::ProcessSummary)?;
        let path = summary_path(process_id)?;
        let response = self.hit(HttpMethod::Get, &path, None).await?;
        let summary = if response.ok {
            parse_process_summary(&response.data)
        } else {
            ProcessSummary::default()
        };
        Ok(ProcessSummaryOutcome {
            process_id: process_id.trim().to_string(),
            response,
            summary,
        })
    }

    /// `/api/processes` when it answers with entries; otherwise the distinct
    /// process ids referenced by documents, deadlines and hearings.
    pub async fn list_processes(&mut self) -> Result<ProcessList, SessionError> {
        self.require(Action::ListProcesses)?;
        let response = self
            .hit(HttpMethod::Get, Resource::Processes.path(), None)
            .await?;
        if response.ok {
            let entries = processes_from_listing(&response.data);
            if !entries.is_empty() {
                return Ok(ProcessList {
                    entries,
                    source: ProcessSource::Endpoint,
                });
            }
        }

        tracing::debug!(status = response.status, "aggregating processes from records");
        let documents = self.fetch_quietly(Resource::Documents).await;
        let deadlines = self.fetch_quietly(Resource::Deadlines).await;
        let hearings = self.fetch_quietly(Resource::Hearings).await;
        Ok(ProcessList {
            entries: aggregate_processes(&documents, &deadlines, &hearings),
            source: ProcessSource::Aggregated,
        })
    }

    pub async fn orchestrate(&mut self, today: NaiveDate) -> Result<ApiResponse, SessionError> {
        self.require(Action::OrchestrateCase)?;
        let body = serde_json::to_value(FileCaseRequest::for_today(today)?)?;
        self.hit(HttpMethod::Post, ORCHESTRATE_PATH, Some(&body)).await
    }

    fn require(&self, action: Action) -> Result<(), SessionError> {
        if self.gate.allows(action, &self.permissions()) {
            return Ok(());
        }
        Err(SessionError::PermissionDenied {
            action: action.as_str(),
            permission: action.required_permission(),
        })
    }

    /// Listing payload for aggregation; failures contribute nothing.
    async fn fetch_quietly(&self, resource: Resource) -> Value {
        match self
            .transport
            .request(resource.path(), HttpMethod::Get, None, self.token.as_deref())
            .await
        {
            Ok(response) if response.ok => response.data,
            Ok(response) => {
                tracing::warn!(
                    path = resource.path(),
                    status = response.status,
                    "listing unavailable"
                );
                Value::Null
            }
            Err(error) => {
                tracing::warn!(path = resource.path(), %error, "listing unavailable");
                Value::Null
            }
        }
    }

    fn persist(&self) -> Result<(), SessionError> {
        let session = StoredSession {
            token: self.token.clone(),
            user: self.profile.clone(),
            view: self.view.clone(),
        };
        self.store.persist_session(&session).map_err(store_error)
    }
}

/// Error for a non-ok response. Statuses below 400 carry no [`ApiError`].
fn failure(response: &ApiResponse) -> SessionError {
    match response.api_error() {
        Some(ApiError { status, message }) => SessionError::Api(ApiError {
            status,
            message: message.or_else(|| response.friendly_message.clone()),
        }),
        None => SessionError::UnexpectedStatus {
            status: response.status,
        },
    }
}

fn store_error<E: std::error::Error + Send + Sync + 'static>(error: E) -> SessionError {
    SessionError::Store(Box::new(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NewDocument;
    use crate::registration::UserType;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Recorded {
        method: HttpMethod,
        path: String,
        body: Option<Value>,
        token: Option<String>,
    }

    #[derive(Default)]
    struct FakeTransport {
        routes: HashMap<(HttpMethod, String), (u16, Value)>,
        offline: bool,
        requests: Mutex<Vec<Recorded>>,
    }

    impl FakeTransport {
        fn route(mut self, method: HttpMethod, path: &str, status: u16, data: Value) -> Self {
            self.routes.insert((method, path.to_string()), (status, data));
            self
        }

        fn requests(&self) -> Vec<Recorded> {
            self.requests
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }
    }

    #[async_trait]
    impl ApiTransport for FakeTransport {
        async fn request(
            &self,
            path: &str,
            method: HttpMethod,
            body: Option<&Value>,
            token: Option<&str>,
        ) -> Result<ApiResponse, NetworkError> {
            self.requests
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(Recorded {
                    method,
                    path: path.to_string(),
                    body: body.cloned(),
                    token: token.map(str::to_string),
                });
            if self.offline {
                return Err(NetworkError::Request {
                    message: "connection refused".to_string(),
                });
            }
            let (status, data) = self
                .routes
                .get(&(method, path.to_string()))
                .cloned()
                .unwrap_or((404, json!({"error": "not found"})));
            Ok(ApiResponse::new(method, path, status, data, 3))
        }
    }

    fn lawyer_profile() -> Value {
        json!({"user": {
            "username": "ana",
            "roles": ["lawyer"],
            "permissions": ["read", "write", "orchestrate"]
        }})
    }

    fn logged_in_backend() -> FakeTransport {
        FakeTransport::default()
            .route(HttpMethod::Post, LOGIN_PATH, 200, json!({"token": "tok-1"}))
            .route(HttpMethod::Get, ME_PATH, 200, lawyer_profile())
            .route(HttpMethod::Get, HEALTH_PATH, 200, json!({"status": "ok"}))
    }

    async fn logged_in_session(
        transport: FakeTransport,
    ) -> ClientSession<FakeTransport, MemorySessionStore> {
        let mut session = ClientSession::new(transport, MemorySessionStore::default());
        session.login("ana", "segredo123").await.expect("login");
        session
    }

    #[tokio::test]
    async fn login_persists_token_and_loads_permissions() {
        let session = logged_in_session(logged_in_backend()).await;
        assert_eq!(session.token(), Some("tok-1"));
        assert!(session.permissions().contains("orchestrate"));
        assert_eq!(
            session.last_response().map(|response| response.path.as_str()),
            Some(HEALTH_PATH)
        );

        let stored = session.store.snapshot().expect("stored session");
        assert_eq!(stored.token.as_deref(), Some("tok-1"));
        let json = serde_json::to_value(&stored).expect("serialize");
        assert_eq!(json["jwtToken"], "tok-1");

        let requests = session.transport.requests();
        assert_eq!(requests[0].body, Some(json!({"username": "ana", "password": "segredo123"})));
        assert_eq!(requests[1].token.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn failed_login_reports_server_message() {
        let transport = FakeTransport::default().route(
            HttpMethod::Post,
            LOGIN_PATH,
            401,
            json!({"error": "Invalid credentials"}),
        );
        let mut session = ClientSession::new(transport, MemorySessionStore::default());
        let error = session.login("ana", "errada123").await.expect_err("login fails");
        assert_eq!(error.to_string(), "Invalid credentials");
        assert!(!session.is_authenticated());
        let recorded = session.last_response().expect("recorded");
        assert!(recorded.friendly_message.as_deref().is_some_and(|m| m.contains("Credenciais")));
    }

    #[tokio::test]
    async fn login_sends_password_untrimmed() {
        let mut session = ClientSession::new(logged_in_backend(), MemorySessionStore::default());
        session.login(" ana ", " segredo123 ").await.expect("login");
        let requests = session.transport.requests();
        assert_eq!(
            requests[0].body,
            Some(json!({"username": "ana", "password": " segredo123 "}))
        );
    }

    #[tokio::test]
    async fn redirect_on_login_is_not_an_api_error() {
        let transport =
            FakeTransport::default().route(HttpMethod::Post, LOGIN_PATH, 302, json!(""));
        let mut session = ClientSession::new(transport, MemorySessionStore::default());
        let error = session
            .login("ana", "segredo123")
            .await
            .expect_err("redirect");
        assert!(matches!(error, SessionError::UnexpectedStatus { status: 302 }));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn blank_credentials_never_reach_the_network() {
        let mut session =
            ClientSession::new(FakeTransport::default(), MemorySessionStore::default());
        let error = session.login("  ", "x").await.expect_err("rejected");
        assert!(matches!(error, SessionError::AuthInput(AuthInputError::MissingCredentials)));
        assert!(session.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn profile_failure_fails_closed() {
        let transport = logged_in_backend().route(HttpMethod::Get, ME_PATH, 500, json!({}));
        let session = logged_in_session(transport).await;
        assert!(session.is_authenticated());
        assert!(session.permissions().is_empty());
        assert!(session.controls().iter().all(|control| !control.visible));
    }

    #[tokio::test]
    async fn token_claims_do_not_grant_permissions() {
        let transport =
            logged_in_backend().route(HttpMethod::Get, ME_PATH, 200, json!({"user": {}}));
        let mut session = logged_in_session(transport).await;
        assert!(session.permissions().is_empty());
        let error = session.list(Resource::Documents).await.expect_err("gated");
        assert!(matches!(error, SessionError::PermissionDenied { permission: "read", .. }));
    }

    #[tokio::test]
    async fn restore_reads_persisted_state() {
        let store = MemorySessionStore::with_session(StoredSession {
            token: Some("tok-9".to_string()),
            user: UserProfile::from_me_payload(&lawyer_profile()),
            view: ViewState::default(),
        });
        let mut session = ClientSession::new(FakeTransport::default(), store);
        assert!(session.restore().expect("restore"));
        assert!(session.permissions().contains("write"));

        let mut empty = ClientSession::new(FakeTransport::default(), MemorySessionStore::default());
        assert!(!empty.restore().expect("restore"));
        assert!(empty.permissions().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let mut session = logged_in_session(logged_in_backend()).await;
        session.logout().expect("logout");
        assert!(!session.is_authenticated());
        assert!(session.permissions().is_empty());
        assert!(session.last_response().is_none());
        assert!(session.store.snapshot().is_none());
    }

    #[tokio::test]
    async fn deletes_require_delete_permission() {
        let mut session = logged_in_session(logged_in_backend()).await;
        let error = session
            .delete(Resource::Documents, "7")
            .await
            .expect_err("lawyers cannot delete");
        assert!(matches!(error, SessionError::PermissionDenied { permission: "delete", .. }));
        assert!(
            !session
                .transport
                .requests()
                .iter()
                .any(|request| request.method == HttpMethod::Delete)
        );
    }

    #[tokio::test]
    async fn admin_can_delete_and_listing_offers_actions() {
        let transport = logged_in_backend()
            .route(
                HttpMethod::Get,
                ME_PATH,
                200,
                json!({"user": {"username": "root", "permissions": ["read", "write", "delete"]}}),
            )
            .route(HttpMethod::Delete, "/api/documents/7", 204, Value::Null)
            .route(
                HttpMethod::Get,
                "/api/documents",
                200,
                json!([{"id": 7, "title": "Petição"}]),
            );
        let mut session = logged_in_session(transport).await;

        let response = session.list(Resource::Documents).await.expect("list");
        let listing = session.render_listing(Resource::Documents, &response.data);
        assert!(matches!(
            listing.body,
            crate::listing::ListingBody::Rows { actions: Some(_), .. }
        ));

        let deleted = session.delete(Resource::Documents, " 7 ").await.expect("delete");
        assert_eq!(deleted.status, 204);
        assert_eq!(deleted.path, "/api/documents/7");
    }

    #[tokio::test]
    async fn create_posts_validated_payload() {
        let transport =
            logged_in_backend().route(HttpMethod::Post, "/api/documents", 201, json!({"id": 1}));
        let mut session = logged_in_session(transport).await;
        let record = NewRecord::Document(
            NewDocument::new("PROC-1", "Petição", "Texto", "Ana").expect("document"),
        );
        let response = session.create(&record).await.expect("create");
        assert_eq!(response.friendly_message.as_deref(), Some("✅ Documento criado com sucesso!"));
        let last = session.transport.requests().pop().expect("request");
        assert_eq!(last.body.expect("body")["process_id"], "PROC-1");
    }

    #[tokio::test]
    async fn today_filters_use_query_parameters() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).expect("date");
        let transport = logged_in_backend().route(
            HttpMethod::Get,
            "/api/hearings?date=2026-10-16",
            200,
            json!({"items": []}),
        );
        let mut session = logged_in_session(transport).await;
        let response = session.list_on(Resource::Hearings, day).await.expect("today");
        assert!(response.ok);
        let error = session.list_on(Resource::Documents, day).await.expect_err("unsupported");
        assert!(matches!(error, SessionError::NoDateFilter { .. }));
    }

    #[tokio::test]
    async fn unauthorized_response_expires_the_session() {
        let transport =
            logged_in_backend().route(HttpMethod::Get, "/api/documents", 401, json!({}));
        let mut session = logged_in_session(transport).await;
        let response = session.list(Resource::Documents).await.expect("response");
        assert_eq!(response.status, 401);
        assert!(!session.is_authenticated());
        assert!(session.permissions().is_empty());
    }

    #[tokio::test]
    async fn process_list_falls_back_to_aggregation() {
        let transport = logged_in_backend()
            .route(HttpMethod::Get, "/api/processes", 200, json!([]))
            .route(HttpMethod::Get, "/api/documents", 200, json!([{"process_id": "P-1"}]))
            .route(HttpMethod::Get, "/api/deadlines", 500, json!({}))
            .route(
                HttpMethod::Get,
                "/api/hearings",
                200,
                json!({"items": [{"process_id": "P-2"}, {"process_id": "P-1"}]}),
            );
        let mut session = logged_in_session(transport).await;
        let list = session.list_processes().await.expect("processes");
        assert_eq!(list.source, ProcessSource::Aggregated);
        let ids = list.entries.iter().map(|entry| entry.process_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["P-1", "P-2"]);
    }

    #[tokio::test]
    async fn process_list_prefers_endpoint() {
        let transport = logged_in_backend().route(
            HttpMethod::Get,
            "/api/processes",
            200,
            json!([{"number": "PROC-1", "title": "Cobrança"}]),
        );
        let mut session = logged_in_session(transport).await;
        let list = session.list_processes().await.expect("processes");
        assert_eq!(list.source, ProcessSource::Endpoint);
        assert_eq!(list.entries[0].process_id, "PROC-1");
    }

    #[tokio::test]
    async fn process_summary_validates_and_parses() {
        let transport = logged_in_backend().route(
            HttpMethod::Get,
            "/api/process/P-1/summary",
            200,
            json!({"summary": {"documents": [{"id": 1}], "hearings": {"items": []}}}),
        );
        let mut session = logged_in_session(transport).await;
        let outcome = session.process_summary(" P-1 ").await.expect("summary");
        assert_eq!(outcome.process_id, "P-1");
        assert_eq!(outcome.summary.documents.len(), 1);

        let error = session.process_summary(" ").await.expect_err("blank id");
        assert!(matches!(error, SessionError::RecordInput(RecordInputError::EmptyProcessId)));
    }

    #[tokio::test]
    async fn orchestrate_posts_file_case() {
        let transport = logged_in_backend().route(
            HttpMethod::Post,
            ORCHESTRATE_PATH,
            201,
            json!({"ok": true}),
        );
        let mut session = logged_in_session(transport).await;
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("date");
        session.orchestrate(today).await.expect("orchestrate");
        let request = session.transport.requests().pop().expect("request");
        let body = request.body.expect("body");
        assert_eq!(body["deadline"]["due_date"], "2026-11-15");
        assert_eq!(body["hearing"]["date"], "2026-10-31");
    }

    #[tokio::test]
    async fn register_validates_before_sending() {
        let transport = FakeTransport::default().route(
            HttpMethod::Post,
            REGISTER_PATH,
            201,
            json!({"user": {"username": "ana"}}),
        );
        let mut session = ClientSession::new(transport, MemorySessionStore::default());
        let mut form = RegistrationForm {
            office_name: "Silva".to_string(),
            cnpj: "12".to_string(),
            responsible_name: "Ana".to_string(),
            oab_number: String::new(),
            user_type: Some(UserType::Advogado),
            email: "ana@silva.adv.br".to_string(),
            phone: "1199".to_string(),
            username: "ana".to_string(),
            password: "segredo123".to_string(),
            confirm_password: "segredo123".to_string(),
            accept_terms: true,
        };
        let error = session.register(&form).await.expect_err("missing OAB");
        assert!(matches!(error, SessionError::Registration(RegistrationError::MissingOabNumber)));
        assert!(session.transport.requests().is_empty());

        form.oab_number = "SP1".to_string();
        let outcome = session.register(&form).await.expect("registered");
        assert_eq!(outcome.username, "ana");
        assert!(!outcome.logged_in);
        let body = session.transport.requests()[0].body.clone().expect("body");
        assert!(body.get("permissions").is_none());
    }

    #[tokio::test]
    async fn transport_failures_do_not_touch_the_slot() {
        let transport = FakeTransport {
            offline: true,
            ..FakeTransport::default()
        };
        let mut session = ClientSession::new(transport, MemorySessionStore::default());
        let error = session.health().await.expect_err("offline");
        assert!(matches!(error, SessionError::Network(_)));
        assert!(session.last_response().is_none());
    }

    #[tokio::test]
    async fn view_toggle_is_persisted() {
        let transport = logged_in_backend().route(
            HttpMethod::Get,
            "/api/documents",
            200,
            json!([{"id": 1}]),
        );
        let mut session = logged_in_session(transport).await;
        session.list(Resource::Documents).await.expect("list");
        assert_eq!(session.toggle_view().expect("toggle"), ViewMode::Table);
        let stored = session.store.snapshot().expect("stored");
        assert_eq!(stored.view.mode(), ViewMode::Table);
    }
}

// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use http::{HeaderMap, StatusCode};
use reqwest::Client;
use serde_json::Value;

use crate::cache::token_cache::TokenCache;
use crate::config::cache::CacheConfig;
use crate::config::identity::IdentityConfig;
use crate::errors::{StoreError, TokenError};
use crate::helpers::time::ManualClock;
use crate::management::client::ManagementClient;
use crate::service::admin::AdminService;
use crate::sources::issuer::{ClientCredentialsIssuer, TokenIssuer};
use crate::store::memory::InMemoryParameterStore;
use crate::store::ParameterStore;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// 24h lifetime, 60s margin.
pub fn default_cache_config() -> CacheConfig {
    CacheConfig {
        lifetime_seconds: 86_400,
        safety_margin_seconds: 60,
    }
}

/// Issuer that mints `issued-1`, `issued-2`, ... and counts calls.
#[derive(Default)]
pub struct StubIssuer {
    calls: AtomicUsize,
    fail: bool,
}

impl StubIssuer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenIssuer for StubIssuer {
    async fn issue(&self) -> Result<String, TokenError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(TokenError::CredentialUnavailable("stub issuer is down".into()));
        }
        Ok(format!("issued-{}", n))
    }
}

/// In-memory store that counts I/O and can be told to fail reads or writes.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryParameterStore,
    gets: AtomicUsize,
    puts: AtomicUsize,
    fail_get: bool,
    fail_put: bool,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_reads() -> Arc<Self> {
        Arc::new(Self {
            fail_get: true,
            ..Self::default()
        })
    }

    pub fn failing_writes() -> Arc<Self> {
        Arc::new(Self {
            fail_put: true,
            ..Self::default()
        })
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Write behind the counters.
    pub async fn seed(&self, key: &str, value: &str) {
        self.inner.put(key, value, true, true).await.unwrap();
    }

    /// Read behind the counters.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.unwrap()
    }
}

#[async_trait]
impl ParameterStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(StoreError::Unavailable {
                key: key.to_owned(),
                reason: "throttled".into(),
            });
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str, encrypted: bool, overwrite: bool) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put {
            return Err(StoreError::Unavailable {
                key: key.to_owned(),
                reason: "access denied".into(),
            });
        }
        self.inner.put(key, value, encrypted, overwrite).await
    }

    fn kind(&self) -> &'static str {
        "counting"
    }
}

pub fn cache_with(store: Arc<CountingStore>, issuer: Arc<StubIssuer>, clock: &ManualClock) -> TokenCache {
    TokenCache::with_clock(store, issuer, default_cache_config(), Arc::new(clock.clone()))
}

// -------------------------------
// Mock identity provider
// -------------------------------

pub const MOCK_M2M_TOKEN: &str = "m2m-token-1";

#[derive(Default)]
pub struct IdpState {
    pub users: Vec<Value>,
    pub token_requests: usize,
    pub token_bodies: Vec<Value>,
    pub reset_emails: Vec<Value>,
    pub created: Vec<Value>,
    pub deleted: Vec<String>,
    pub next_id: usize,
}

#[derive(Clone, Default)]
pub struct MockIdp {
    pub state: Arc<Mutex<IdpState>>,
}

impl MockIdp {
    pub fn with_users(emails: &[&str]) -> Self {
        let idp = Self::default();
        {
            let mut state = idp.state.lock().unwrap();
            for email in emails {
                state.next_id += 1;
                let id = format!("auth0|seed{}", state.next_id);
                state.users.push(json!({"user_id": id, "email": email}));
            }
        }
        idp
    }

    pub fn token_requests(&self) -> usize {
        self.state.lock().unwrap().token_requests
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .map(|u| u["user_id"].as_str().unwrap_or_default().to_owned())
            .collect()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/oauth/token", post(issue_token))
            .route("/api/v2/users", get(search_users).post(create_user))
            .route("/api/v2/users/{id}", axum::routing::delete(delete_user).patch(patch_user))
            .route("/dbconnections/change_password", post(change_password))
            .with_state(self.clone())
    }

    /// Serve on an ephemeral port; returns the identity config pointing at it.
    pub async fn spawn(&self) -> (JoinHandle<()>, IdentityConfig) {
        let (handle, addr) = spawn_axum(self.router()).await;
        (handle, identity_for(addr))
    }
}

pub fn identity_for(addr: SocketAddr) -> IdentityConfig {
    IdentityConfig {
        domain: "tenant.example.com".into(),
        client_id: "m2m-client".into(),
        client_secret: "m2m-secret".into(),
        web_client_id: Some("web-client".into()),
        redirect_uri: Some("https://app.example.com/welcome".into()),
        base_url: Some(format!("http://{}", addr)),
        ..Default::default()
    }
}

/// Admin service wired against the given identity config, memory store, real issuer.
pub fn admin_for(identity: &IdentityConfig) -> (AdminService, Arc<TokenCache>) {
    let client = build_reqwest_client();
    let issuer = Arc::new(ClientCredentialsIssuer::new(client.clone(), identity));
    let tokens = Arc::new(TokenCache::new(
        Arc::new(InMemoryParameterStore::new()),
        issuer,
        default_cache_config(),
    ));
    let management = ManagementClient::new(client, tokens.clone(), identity);
    (AdminService::new(management), tokens)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", MOCK_M2M_TOKEN))
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})))
}

async fn issue_token(State(idp): State<MockIdp>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut state = idp.state.lock().unwrap();
    state.token_requests += 1;
    state.token_bodies.push(body.clone());
    if body["client_secret"] != json!("m2m-secret") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "access_denied"})));
    }
    (
        StatusCode::OK,
        Json(json!({"access_token": MOCK_M2M_TOKEN, "token_type": "Bearer", "expires_in": 86400})),
    )
}

async fn search_users(
    State(idp): State<MockIdp>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = idp.state.lock().unwrap();
    if let Some(q) = query.get("q") {
        let matches: Vec<Value> = state.users.iter().filter(|u| u["email"] == json!(q)).cloned().collect();
        return (StatusCode::OK, Json(json!(matches)));
    }
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let per_page: usize = query.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(50);
    let batch: Vec<Value> = state.users.iter().skip(page * per_page).take(per_page).cloned().collect();
    (StatusCode::OK, Json(json!(batch)))
}

async fn create_user(State(idp): State<MockIdp>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = idp.state.lock().unwrap();
    state.next_id += 1;
    let user = json!({
        "user_id": format!("auth0|new{}", state.next_id),
        "email": body["email"],
        "given_name": body["given_name"],
        "family_name": body["family_name"],
    });
    state.created.push(body);
    state.users.push(user.clone());
    (StatusCode::CREATED, Json(user))
}

async fn delete_user(State(idp): State<MockIdp>, headers: HeaderMap, Path(id): Path<String>) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let mut state = idp.state.lock().unwrap();
    let before = state.users.len();
    state.users.retain(|u| u["user_id"] != json!(id));
    if state.users.len() == before {
        return StatusCode::NOT_FOUND;
    }
    state.deleted.push(id);
    StatusCode::NO_CONTENT
}

async fn patch_user(
    State(idp): State<MockIdp>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = idp.state.lock().unwrap();
    match state.users.iter_mut().find(|u| u["user_id"] == json!(id)) {
        Some(user) => {
            user["app_metadata"] = body["app_metadata"].clone();
            (StatusCode::OK, Json(user.clone()))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Not Found"}))),
    }
}

async fn change_password(State(idp): State<MockIdp>, Json(body): Json<Value>) -> (StatusCode, String) {
    idp.state.lock().unwrap().reset_emails.push(body);
    (StatusCode::OK, "We've just sent you an email to reset your password.".into())
}

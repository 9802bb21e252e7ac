use std::future::Future;

use anyhow::{Context, Result};
use axum::middleware;
use axum::routing::{get, patch};
use axum::Router;
use http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::settings::{CorsConfig, SettingsConfig};
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::handlers;
use crate::server::shutdown::{shutdown_signal, track_activity, ActivityTracker};
use crate::service::admin::AdminService;

#[derive(Clone)]
pub struct AppState {
    pub admin: AdminService,
    pub metrics_state: MetricsState,
    pub activity: ActivityTracker,
}

impl AppState {
    pub fn new(admin: AdminService, metrics: &Metrics) -> Self {
        Self {
            admin,
            metrics_state: MetricsState::new(metrics.registry.clone()),
            activity: ActivityTracker::new(),
        }
    }
}

/// Admin API routes, metrics route when enabled, CORS and activity tracking.
pub fn router(state: AppState, settings: &SettingsConfig) -> Router {
    let admin_routes = Router::new()
        .route(
            "/admin-api/users",
            get(handlers::list_users)
                .post(handlers::invite_user)
                .delete(handlers::delete_user),
        )
        .route("/admin-api/user/favorites", patch(handlers::update_favorites))
        .route("/healthz", get(handlers::healthz))
        .merge(state.metrics_state.router(&settings.metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_activity));

    admin_routes.layer(cors_layer(&settings.cors)).with_state(state)
}

pub fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    if cfg.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Bind `settings.server` and serve until a signal or the idle timeout.
pub async fn start(settings: &SettingsConfig, admin: AdminService) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState::new(admin, metrics);
    let tracker = state.activity.clone();
    let app = router(state, settings);

    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    info!("admin api listening on {}", bind_addr);

    serve(listener, app, shutdown_signal(tracker, settings.idle_shutdown.clone())).await
}

pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics = get_metrics().await;
    metrics.up.set(1);
    let result = axum::serve(listener, app).with_graceful_shutdown(shutdown).await;
    metrics.up.set(0);
    info!("admin api stopped");
    result.context("http server failed")
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info};

use crate::config::settings::IdleShutdownConfig;
use crate::helpers::time::{Clock, SystemClock};
use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;

/// Last time (UNIX seconds) a request was served.
#[derive(Clone)]
pub struct ActivityTracker {
    last_request_at: Arc<AtomicU64>,
    clock: Arc<dyn Clock>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            last_request_at: Arc::new(AtomicU64::new(now)),
            clock,
        }
    }

    pub fn touch(&self) {
        self.last_request_at.store(self.clock.now(), Ordering::SeqCst);
    }

    pub fn idle_seconds(&self) -> u64 {
        self.clock
            .now()
            .saturating_sub(self.last_request_at.load(Ordering::SeqCst))
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Stamps activity and counts requests per route.
pub async fn track_activity(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.activity.touch();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    get_metrics()
        .await
        .http_requests
        .with_label_values(&[route.as_str(), response.status().as_str()])
        .inc();
    response
}

/// Resolves once nothing was served for `idle_minutes`. Never resolves when disabled.
pub async fn wait_for_idle(tracker: ActivityTracker, cfg: IdleShutdownConfig) {
    if !cfg.enabled {
        std::future::pending::<()>().await;
    }
    let limit = cfg.idle_minutes * 60;
    let interval = Duration::from_secs(cfg.check_interval_seconds.max(1));
    loop {
        tokio::time::sleep(interval).await;
        let idle = tracker.idle_seconds();
        debug!("idle for {} seconds (limit {})", idle, limit);
        if idle > limit {
            info!("idle timeout reached ({} min), shutting down", cfg.idle_minutes);
            return;
        }
    }
}

/// Ctrl-C, SIGTERM or the idle timeout, whichever comes first.
pub async fn shutdown_signal(tracker: ActivityTracker, cfg: IdleShutdownConfig) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("ctrl-c received, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("SIGTERM received, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = wait_for_idle(tracker, cfg) => {},
    }
}

use std::sync::Arc;

use crate::config::settings::MetricsConfig;
use crate::server::server::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::{header::CONTENT_TYPE, StatusCode};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::error;

#[derive(Clone)]
pub struct MetricsState {
    pub registry: Arc<Registry>,
}

impl MetricsState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Scrape route at `metrics.path`; absent when metrics are disabled.
    pub fn router(&self, metrics_config: &MetricsConfig) -> Router<AppState> {
        if !metrics_config.is_enabled {
            return Router::new();
        }
        Router::new().route(metrics_config.path.as_str(), get(scrape))
    }

    fn render(&self) -> Result<(String, Vec<u8>), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut body = Vec::new();
        encoder.encode(&self.registry.gather(), &mut body)?;
        Ok((encoder.format_type().to_owned(), body))
    }
}

async fn scrape(State(state): State<AppState>) -> Response {
    match state.metrics_state.render() {
        Ok((content_type, body)) => (StatusCode::OK, [(CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            error!("failed to encode idp-admin metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

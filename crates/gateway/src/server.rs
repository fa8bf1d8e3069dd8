use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        extract::State,
        response::IntoResponse,
        routing::get,
    },
    phoso_metrics::MetricsHandle,
    phoso_pipeline::Pipeline,
    tower_http::trace::TraceLayer,
    tracing::{info, warn},
};

use crate::webhook::{webhook_get, webhook_post};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Present when a metrics recorder was installed at startup.
    pub metrics: Option<MetricsHandle>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Build the router: the webhook at `webhook_path`, `/health` and, with the
/// `prometheus` feature, `/metrics`.
pub fn build_app(state: AppState, webhook_path: &str) -> Router {
    let router = Router::new()
        .route(webhook_path, get(webhook_get).post(webhook_post))
        .route("/health", get(health_handler));

    #[cfg(feature = "prometheus")]
    let router = router.route("/metrics", get(prometheus_metrics_handler));

    #[cfg(feature = "metrics")]
    let router = router.route_layer(axum::middleware::from_fn(
        crate::metrics_middleware::http_metrics_middleware,
    ));

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind `bind:port` and serve until Ctrl-C.
pub async fn start(
    bind: &str,
    port: u16,
    state: AppState,
    webhook_path: &str,
) -> anyhow::Result<()> {
    let app = build_app(state, webhook_path);
    let listener = tokio::net::TcpListener::bind((bind, port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, webhook = webhook_path, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "metrics": state.metrics.is_some(),
    }))
}

/// Prometheus text exposition, unauthenticated for scrapers.
#[cfg(feature = "prometheus")]
async fn prometheus_metrics_handler(State(state): State<AppState>) -> axum::response::Response {
    use axum::http::{StatusCode, header};

    match state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not enabled",
        )
            .into_response(),
    }
}

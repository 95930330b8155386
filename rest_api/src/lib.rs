// rest_api/src/lib.rs

//! HTTP and WebSocket surface of the vital-sign monitor.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use lib::config::GatewayConfig;
use lib::stats::summarize;
use models::{PatientRecord, SnapshotStats};

pub mod gateway;
pub mod protocol;
pub mod ws;

pub use crate::gateway::BroadcastGateway;
pub use crate::protocol::{handle_client_frame, ClientEvent, ServerEvent};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Patient not found: {0}")]
    PatientNotFound(String),
    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
    #[error("JSON serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self {
            GatewayError::PatientNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

fn cors_layer(origin: &str) -> Result<CorsLayer, GatewayError> {
    let cors = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    if origin.trim() == "*" {
        return Ok(cors.allow_origin(Any));
    }
    let value = HeaderValue::from_str(origin.trim()).map_err(|_| GatewayError::InvalidOrigin(origin.to_string()))?;
    Ok(cors.allow_origin(AllowOrigin::exact(value)))
}

/// Builds the application router over `gateway`.
///
/// `cors_origin` is either a single origin or `*` to accept any.
pub fn router(gateway: BroadcastGateway, cors_origin: &str) -> Result<Router, GatewayError> {
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/patients", get(list_patients_handler))
        .route("/api/patients/:id", get(get_patient_handler))
        .route("/api/stats", get(stats_handler))
        .route("/ws", get(ws::ws_handler))
        .with_state(gateway)
        .layer(cors_layer(cors_origin)?)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

async fn health_handler() -> (StatusCode, Json<Value>) {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    (StatusCode::OK, Json(json!({ "status": "ok", "timestamp": timestamp })))
}

async fn list_patients_handler(State(gateway): State<BroadcastGateway>) -> Json<Vec<PatientRecord>> {
    Json(gateway.get_all())
}

async fn get_patient_handler(
    State(gateway): State<BroadcastGateway>,
    Path(id): Path<String>,
) -> Result<Json<PatientRecord>, GatewayError> {
    gateway
        .get_by_id(&id)
        .map(Json)
        .ok_or(GatewayError::PatientNotFound(id))
}

async fn stats_handler(State(gateway): State<BroadcastGateway>) -> Json<SnapshotStats> {
    Json(summarize(&gateway.get_all()))
}

/// Serves the router on the configured address until `shutdown_rx` fires.
pub async fn start_server(
    config: &GatewayConfig,
    gateway: BroadcastGateway,
    shutdown_rx: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr().context("Invalid gateway address")?;
    let app = router(gateway, &config.cors_origin).context("Failed to build gateway router")?;

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!("Vital-sign gateway listening on {}", addr);

    let shutdown_signal = async {
        if shutdown_rx.await.is_err() {
            warn!("Shutdown sender dropped, stopping gateway");
        }
        info!("Received shutdown signal");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Gateway server failed while running")?;

    info!("Vital-sign gateway stopped");
    Ok(())
}

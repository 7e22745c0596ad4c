//! HTTP surface.
//!
//! | Route | Body | Success |
//! |-------|------|---------|
//! | `GET /` | none | 200, fixed liveness text |
//! | `POST /procesar_pdf` | `{"url": "..."}` | 200, `{"partes": [...]}` |
//!
//! Failures answer `{"error": "..."}` with 400 for request and document
//! problems and 500 for everything else. A failed download that got an HTTP
//! status back also carries `"detalle"`, the start of the remote body.

use crate::error::PdfTextError;
use crate::model::DocumentRequest;
use crate::process::Pipeline;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Body of `GET /`.
pub const LIVENESS_MESSAGE: &str = "PDF text extraction server is running";

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub partes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalle: Option<String>,
}

/// A failed request, rendered as an [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: message.into(),
                detalle: None,
            },
        }
    }
}

impl From<PdfTextError> for ApiError {
    fn from(err: PdfTextError) -> Self {
        let status = if err.kind().is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                detalle: err.body_excerpt().map(str::to_string),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Liveness check.
pub async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

/// Extract a remote PDF's text as ordered chunks.
pub async fn procesar_pdf(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Json(body) = payload?;
    let request = DocumentRequest {
        source_url: body.url,
    };
    let output = state.pipeline.process(&request).await?;
    Ok(Json(ProcessResponse {
        partes: output.chunks,
    }))
}

/// Build the router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/procesar_pdf", post(procesar_pdf))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

//! HTTP API for the pilot service.
//!
//! Three routes: a health probe, plan-only, and full execution. Every
//! body is enveloped: `{ ok: true, data }` on success, `{ ok: false,
//! error: { code, message } }` on failure, with 400 reserved for
//! failures the caller can fix. Unknown paths get the same envelope
//! under 404, and request bodies are capped at 1 MB.

use axum::{
	extract::{DefaultBodyLimit, State},
	http::StatusCode,
	response::Json,
	routing::{get, post},
	Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::pipeline::{IntentRequest, Pipeline, PipelineError};

type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)>;

/// Binds and serves the API until the task is aborted.
pub async fn start_http_server(
	pipeline: Arc<Pipeline>,
	host: String,
	port: u16,
) -> anyhow::Result<()> {
	let app = router(pipeline);

	let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
	info!("API server listening on {}", listener.local_addr()?);

	axum::serve(listener, app).await?;

	Ok(())
}

fn router(pipeline: Arc<Pipeline>) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/plan", post(plan))
		.route("/api/execute", post(execute))
		.fallback(not_found)
		.with_state(pipeline)
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.layer(DefaultBodyLimit::max(1_000_000))
}

async fn health() -> Json<serde_json::Value> {
	ok_envelope(serde_json::json!({ "status": "healthy" }))
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
	(
		StatusCode::NOT_FOUND,
		Json(serde_json::json!({
			"ok": false,
			"error": { "code": "not_found", "message": "No such route" }
		})),
	)
}

async fn plan(
	State(pipeline): State<Arc<Pipeline>>,
	Json(request): Json<IntentRequest>,
) -> ApiResult {
	let outcome = pipeline.plan(&request).await.map_err(|error| {
		warn!("Plan request failed: {}", error);
		error_envelope(&error)
	})?;
	Ok(ok_envelope(outcome))
}

async fn execute(
	State(pipeline): State<Arc<Pipeline>>,
	Json(request): Json<IntentRequest>,
) -> ApiResult {
	let outcome = pipeline.execute(&request).await.map_err(|error| {
		warn!("Execute request failed: {}", error);
		error_envelope(&error)
	})?;
	Ok(ok_envelope(outcome))
}

fn ok_envelope(data: impl Serialize) -> Json<serde_json::Value> {
	Json(serde_json::json!({ "ok": true, "data": data }))
}

fn error_envelope(error: &PipelineError) -> (StatusCode, Json<serde_json::Value>) {
	let status = if error.is_client_error() {
		StatusCode::BAD_REQUEST
	} else {
		StatusCode::INTERNAL_SERVER_ERROR
	};
	(
		status,
		Json(serde_json::json!({
			"ok": false,
			"error": { "code": error.code(), "message": error.to_string() }
		})),
	)
}

//! HTTP surface for the A2A agent.
//!
//! One JSON-RPC endpoint plus two read-only helpers:
//! - `POST /a2a` — the protocol endpoint
//! - `GET /` — service description
//! - `GET /health` — liveness probe
//!
//! The endpoint owns envelope pre-validation so the caller always receives
//! a well-formed JSON-RPC body: parse errors, bad version tags, and missing
//! ids are answered here; everything else is the dispatcher's job.

use crate::handler::{check_envelope, AgentHandler};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::FutureExt as _;
use pkgpulse_proto::{codes, JsonRpcRequest, JsonRpcResponse, RpcError};
use serde_json::{json, Value};
use std::io;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Build the agent router.
#[must_use]
pub fn router(handler: Arc<AgentHandler>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/a2a", post(a2a_endpoint))
        .with_state(handler)
}

/// Bind and serve until the process is stopped.
pub async fn serve(handler: Arc<AgentHandler>, addr: SocketAddr) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "a2a agent listening");
    axum::serve(listener, router(handler)).await
}

fn rpc_body(response: &JsonRpcResponse) -> Json<Value> {
    Json(serde_json::to_value(response).unwrap_or_else(|_| {
        json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": {"code": codes::INTERNAL_ERROR, "message": "Internal error"}
        })
    }))
}

async fn a2a_endpoint(
    State(handler): State<Arc<AgentHandler>>,
    body: String,
) -> (StatusCode, Json<Value>) {
    // Stage 1: the body must be JSON at all.
    let body: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "a2a body is not valid JSON");
            let response = JsonRpcResponse::error(
                None,
                RpcError::with_details(
                    codes::PARSE_ERROR,
                    "Parse error",
                    "Invalid JSON in request body",
                ),
            );
            return (StatusCode::BAD_REQUEST, rpc_body(&response));
        }
    };

    // Probes sometimes POST an empty body; answer politely instead of
    // erroring.
    if body.is_null() || body.as_object().is_some_and(serde_json::Map::is_empty) {
        info!("empty a2a request body");
        return (
            StatusCode::OK,
            Json(json!({"status": "ok", "message": "Empty request received"})),
        );
    }

    // Stage 2: envelope invariants (version tag, id) before any decoding.
    if let Some(response) = check_envelope(&body) {
        warn!("a2a envelope rejected");
        return (StatusCode::BAD_REQUEST, rpc_body(&response));
    }

    let request_id = body.get("id").and_then(Value::as_str).map(String::from);

    // Stage 3: typed decode of the envelope.
    let request: JsonRpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "a2a envelope failed to decode");
            let response = JsonRpcResponse::error(
                request_id,
                RpcError::with_details(codes::INVALID_PARAMS, "Invalid params", e.to_string()),
            );
            return (StatusCode::BAD_REQUEST, rpc_body(&response));
        }
    };

    // Stage 4: dispatch. A panic must still produce an envelope, not a
    // dropped connection.
    match AssertUnwindSafe(handler.handle(request)).catch_unwind().await {
        Ok(response) => (StatusCode::OK, rpc_body(&response)),
        Err(_) => {
            error!("panic while handling a2a request");
            let response = JsonRpcResponse::error(
                request_id,
                RpcError::with_details(
                    codes::INTERNAL_ERROR,
                    "Internal error",
                    "unexpected failure while processing the request",
                ),
            );
            (StatusCode::INTERNAL_SERVER_ERROR, rpc_body(&response))
        }
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Package Health Monitor Agent (A2A Protocol)",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "A2A (Agent-to-Agent)",
        "endpoints": {
            "/a2a": "A2A protocol endpoint (POST)",
            "/health": "Liveness probe (GET)"
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

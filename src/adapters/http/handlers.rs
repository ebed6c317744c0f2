//! HTTP handlers for the turn and health endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::application::{ConversationOrchestrator, TurnError, TurnRequest};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConversationOrchestrator>,
}

#[derive(Serialize)]
struct ErrorBody {
    status: ErrorStatus,
}

#[derive(Serialize)]
struct ErrorStatus {
    code: u16,
    message: String,
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        status: ErrorStatus {
            code: code.as_u16(),
            message: message.into(),
        },
    };
    (code, Json(body)).into_response()
}

/// POST /api/turn - handle one conversation turn.
pub async fn handle_turn(
    State(state): State<AppState>,
    request: Result<Json<TurnRequest>, JsonRejection>,
) -> Response {
    // Malformed bodies are a client error, never a 5xx.
    let Json(request) = match request {
        Ok(json) => json,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.orchestrator.handle_turn(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => turn_error_response(e),
    }
}

fn turn_error_response(error: TurnError) -> Response {
    match &error {
        TurnError::InvalidRequest(message) => {
            error_response(StatusCode::BAD_REQUEST, message.clone())
        }
        TurnError::Store(e) => {
            error!(error = %e, "session store failure");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Session store is unavailable",
            )
        }
        TurnError::Extraction(e) => {
            error!(error = %e, "extraction failure");
            error_response(
                StatusCode::BAD_GATEWAY,
                "Document extraction is unavailable",
            )
        }
        TurnError::Domain(e) => {
            error!(error = %e, "domain failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.message.clone())
        }
    }
}

/// GET /health - liveness probe.
pub async fn health() -> Response {
    (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
}

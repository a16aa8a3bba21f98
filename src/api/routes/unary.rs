//! Unary Route
//!
//! - POST /api/v1/unary - One request, one response

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::demo::{UnaryRequest, UnaryResponse};

/// POST /api/v1/unary
pub async fn unary_call(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UnaryRequest>,
) -> ApiResult<Json<UnaryResponse>> {
    if req.message.trim().is_empty() {
        return Err(ApiError::Validation("message cannot be empty".to_string()));
    }

    Ok(Json(state.demo.unary(req).await))
}

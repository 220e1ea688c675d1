//! Admin API endpoints
//!
//! Routes require an authenticated session.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::AuthenticatedIdentity;
use crate::error::AppError;

/// Create admin router
///
/// Routes:
/// - POST /admin - Store a value for the signed-in user
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/admin", post(set_value))
}

/// Set value request
#[derive(Debug, Deserialize)]
pub struct SetValueRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// POST /admin
///
/// Stores `value` under the caller's GitHub login.
async fn set_value(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    payload: Result<Json<SetValueRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let user = identity.user().ok_or(AppError::Forbidden)?;
    let Json(request) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    if request.value.is_empty() {
        return Err(AppError::Validation("value is required".to_string()));
    }

    state.values.set(user, request.value).await;
    tracing::info!(user = %user, "Stored user value");

    Ok(Json(StatusResponse { status: "ok" }))
}

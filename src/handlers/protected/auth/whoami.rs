// handlers/protected/auth/whoami.rs - GET /api/auth/whoami

use axum::{extract::State, Extension};
use serde_json::Value;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Token identity (`user_id`, `role`, `login`) plus the stored profile.
pub async fn whoami_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let me = state.accounts().whoami(&user).await?;
    Ok(ApiResponse::success(me))
}

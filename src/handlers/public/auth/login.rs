// handlers/public/auth/login.rs - POST /auth/login/{professional,patient}

use axum::extract::State;

use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::account_service::{LoginRequest, TokenResponse};
use crate::state::AppState;

/// POST /auth/login/professional - `{login, password}` where login is an
/// email, CPF or cellphone. Returns `{token, token_type, expires_in, user}`.
pub async fn login_professional_post(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let token = state.accounts().login_professional(req).await?;
    Ok(ApiResponse::success(token))
}

/// POST /auth/login/patient - same shape, against patient accounts.
pub async fn login_patient_post(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let token = state.accounts().login_patient(req).await?;
    Ok(ApiResponse::success(token))
}

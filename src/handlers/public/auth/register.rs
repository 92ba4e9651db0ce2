// handlers/public/auth/register.rs - POST /auth/register

use axum::extract::State;
use serde_json::Value;

use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::account_service::RegisterProfessionalRequest;
use crate::state::AppState;

/// POST /auth/register - Create a professional account
///
/// Expected Input:
/// ```json
/// {
///   "name": "Ana Souza",
///   "email": "ana@moveat.app",
///   "password": "...",
///   "cpf": "12345678901",
///   "cellphone": "11987654321",
///   "crn": "CRN-3 12345",
///   "professional_type": "nutritionist"
/// }
/// ```
///
/// 201 with the stored profile, 400 with `field_errors`, 409 when an
/// identifier is already registered.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterProfessionalRequest>,
) -> ApiResult<Value> {
    let professional = state.accounts().register_professional(req).await?;
    Ok(ApiResponse::created(professional))
}

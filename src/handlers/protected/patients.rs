// handlers/protected/patients.rs - /api/patients

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use crate::database::models::{MealPlan, Patient};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::patient_service::{RegisterPatientRequest, UpdatePatientRequest};
use crate::state::AppState;

/// GET /api/patients - patients of the calling professional
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Patient>> {
    Ok(ApiResponse::success(state.patients().list(&user).await?))
}

/// POST /api/patients - register a patient; a generated password is returned
/// once as `temporary_password` when none is supplied
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<RegisterPatientRequest>,
) -> ApiResult<Value> {
    Ok(ApiResponse::created(state.patients().register(&user, req).await?))
}

/// GET /api/patients/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Patient> {
    Ok(ApiResponse::success(state.patients().get(&user, id).await?))
}

/// PUT /api/patients/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdatePatientRequest>,
) -> ApiResult<Patient> {
    Ok(ApiResponse::success(state.patients().update(&user, id, req).await?))
}

/// DELETE /api/patients/:id - removes the patient and their meal plans
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.patients().delete(&user, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/patients/:id/meal-plans - plan summaries, newest first
pub async fn meal_plans(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<MealPlan>> {
    Ok(ApiResponse::success(state.meal_plans().list_for_patient(&user, id).await?))
}

// handlers/protected/foods.rs - /api/foods catalog

use axum::{
    extract::{Path, Query, State},
    Extension,
};

use crate::database::models::Food;
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::food_service::{CreateFoodRequest, FoodSearchParams};
use crate::state::AppState;

/// GET /api/foods?search=&group=&limit=
pub async fn search(State(state): State<AppState>, Query(params): Query<FoodSearchParams>) -> ApiResult<Vec<Food>> {
    Ok(ApiResponse::success(state.foods().search(params).await?))
}

/// POST /api/foods - professionals only; nutrient values are per 100 g
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateFoodRequest>,
) -> ApiResult<Food> {
    Ok(ApiResponse::created(state.foods().create(&user, req).await?))
}

/// GET /api/foods/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Food> {
    Ok(ApiResponse::success(state.foods().get(id).await?))
}

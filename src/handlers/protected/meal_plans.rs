// handlers/protected/meal_plans.rs - /api/meal-plans and nested entries/foods
//
// Reads are open to the owning professional and to the patient the plan
// belongs to. Every write requires the owning professional.

use axum::{
    extract::{Path, Query, State},
    Extension,
};

use crate::database::models::MealPlan;
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::meal_plan_service::{
    CreateMealPlanRequest, EntryDetail, EntryRequest, FoodLineDetail, FoodLineRequest, MealPlanDetail,
    MealPlanQuery, UpdateMealPlanRequest,
};
use crate::state::AppState;

/// POST /api/meal-plans - plan, entries and foods in one request
///
/// Expected Input:
/// ```json
/// {
///   "patient_id": 12,
///   "title": "Cutting - week 1",
///   "start_date": "2025-03-01",
///   "end_date": "2025-03-31",
///   "goals": "Lose 2 kg",
///   "entries": [
///     {
///       "meal_type": "breakfast",
///       "day": "every_day",
///       "time": "07:30:00",
///       "foods": [
///         { "food_name": "Oats", "quantity": 3, "unit": "tablespoons" },
///         { "food_id": 4, "quantity": 200 }
///       ]
///     }
///   ]
/// }
/// ```
///
/// 201 with the assembled plan. 400 missing fields, 403 foreign patient or
/// non-professional caller, 404 unknown patient or food, 409 repeated
/// (meal_type, day), 422 when a quantity cannot be converted to grams.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateMealPlanRequest>,
) -> ApiResult<MealPlanDetail> {
    Ok(ApiResponse::created(state.meal_plans().create(&user, req).await?))
}

/// GET /api/meal-plans/:id[?day=monday|every_day|today]
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Query(query): Query<MealPlanQuery>,
) -> ApiResult<MealPlanDetail> {
    Ok(ApiResponse::success(state.meal_plans().get(&user, id, query).await?))
}

/// PUT /api/meal-plans/:id - title, goals and dates
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateMealPlanRequest>,
) -> ApiResult<MealPlan> {
    Ok(ApiResponse::success(state.meal_plans().update(&user, id, req).await?))
}

/// DELETE /api/meal-plans/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.meal_plans().delete(&user, id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/meal-plans/:id/entries
pub async fn add_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<EntryRequest>,
) -> ApiResult<EntryDetail> {
    Ok(ApiResponse::created(state.meal_plans().add_entry(&user, id, req).await?))
}

/// DELETE /api/meal-plans/:id/entries/:entry_id
pub async fn remove_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((id, entry_id)): Path<(i64, i64)>,
) -> ApiResult<()> {
    state.meal_plans().remove_entry(&user, id, entry_id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/meal-plans/:id/entries/:entry_id/foods
pub async fn add_food(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((id, entry_id)): Path<(i64, i64)>,
    ApiJson(req): ApiJson<FoodLineRequest>,
) -> ApiResult<FoodLineDetail> {
    Ok(ApiResponse::created(state.meal_plans().add_food(&user, id, entry_id, req).await?))
}

/// DELETE /api/meal-plans/:id/entries/:entry_id/foods/:food_line_id
pub async fn remove_food(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((id, entry_id, line_id)): Path<(i64, i64, i64)>,
) -> ApiResult<()> {
    state.meal_plans().remove_food(&user, id, entry_id, line_id).await?;
    Ok(ApiResponse::no_content())
}

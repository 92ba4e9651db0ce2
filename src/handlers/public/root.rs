// handlers/public/root.rs - GET / and GET /health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "MovEat API",
            "version": version,
            "description": "Patients, meal plans and nutrient totals for nutrition professionals",
            "endpoints": {
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login/professional, /auth/login/patient (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
                "patients": "/api/patients[/:id[/meal-plans]] (protected)",
                "foods": "/api/foods[/:id] (protected)",
                "meal_plans": "/api/meal-plans[/:id[/entries[/:entry_id[/foods[/:food_line_id]]]]] (protected)",
            }
        }
    }))
}

/// Reports 503 while the database cannot be reached.
pub async fn health(State(state): State<AppState>) -> Response {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
                .into_response()
        }
    }
}

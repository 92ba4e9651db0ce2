pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod nutrition;
pub mod services;
pub mod state;

#[cfg(test)]
pub mod testing;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::middleware::jwt_auth_middleware;
pub use crate::state::AppState;

/// Full application router: public routes, the JWT-protected `/api` tree and global layers.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config);

    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .merge(auth_public_routes())
        // Protected API
        .merge(api_routes().route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware)))
        .fallback(not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login/professional", post(auth::login_professional_post))
        .route("/auth/login/patient", post(auth::login_patient_post))
}

fn api_routes() -> Router<AppState> {
    use handlers::protected::{auth, foods, meal_plans, patients};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        // Patients
        .route("/api/patients", get(patients::list).post(patients::create))
        .route(
            "/api/patients/:id",
            get(patients::get).put(patients::update).delete(patients::delete),
        )
        .route("/api/patients/:id/meal-plans", get(patients::meal_plans))
        // Food catalog
        .route("/api/foods", get(foods::search).post(foods::create))
        .route("/api/foods/:id", get(foods::get))
        // Meal plans
        .route("/api/meal-plans", post(meal_plans::create))
        .route(
            "/api/meal-plans/:id",
            get(meal_plans::get).put(meal_plans::update).delete(meal_plans::delete),
        )
        .route("/api/meal-plans/:id/entries", post(meal_plans::add_entry))
        .route(
            "/api/meal-plans/:id/entries/:entry_id",
            axum::routing::delete(meal_plans::remove_entry),
        )
        .route("/api/meal-plans/:id/entries/:entry_id/foods", post(meal_plans::add_food))
        .route(
            "/api/meal-plans/:id/entries/:entry_id/foods/:food_line_id",
            axum::routing::delete(meal_plans::remove_food),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

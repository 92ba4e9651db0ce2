// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware inserts the caller as Extension<AuthUser>.
// Ownership (own patients, own plans) is enforced by the services.

pub mod auth;
pub mod foods;
pub mod meal_plans;
pub mod patients;

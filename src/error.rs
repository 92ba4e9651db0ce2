// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::nutrition::ConversionError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity (well-formed, but cannot be applied)
    UnprocessableEntity(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::UnprocessableEntity(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }

        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        ApiError::UnprocessableEntity(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => {
                tracing::info!("Unique constraint rejected write: {}", msg);
                ApiError::conflict("Record already exists")
            }
            DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Invalid database URL");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Decode(msg) => {
                tracing::error!("Row decode error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) | DatabaseError::Sqlx(sqlx::Error::Io(_)) => {
                tracing::error!("Database unreachable");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(msg) => ApiError::unauthorized(format!("Invalid JWT token: {}", msg)),
            other => {
                tracing::error!("Authentication failure: {}", other);
                ApiError::internal_server_error("Authentication is temporarily unavailable")
            }
        }
    }
}

impl From<ConversionError> for ApiError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::InvalidQuantity(_) | ConversionError::UnknownUnit(_) => {
                ApiError::bad_request(err.to_string())
            }
            ConversionError::MissingDensity { .. } | ConversionError::MissingPortion(_) => {
                ApiError::unprocessable_entity(err.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

/// Collects per-field messages and turns them into a single validation error.
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Record `field` as missing when the value is absent or blank.
    pub fn require<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Some(v),
            None => {
                self.add(field, "This field is required");
                None
            }
        }
    }

    /// Like `require`, but the value is returned untrimmed. Blank values are still missing.
    pub fn require_secret<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => Some(v),
            None => {
                self.add(field, "This field is required");
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Missing or invalid fields", Some(self.0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_carries_field_errors() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.require("name", Some("  ")), None);
        assert_eq!(errors.require("email", Some(" a@b.co ")), Some("a@b.co"));
        errors.add("cpf", "Invalid CPF format");

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["name"], "This field is required");
        assert_eq!(body["field_errors"]["cpf"], "Invalid CPF format");
        assert!(body["field_errors"].get("email").is_none());
    }

    #[test]
    fn secrets_keep_surrounding_whitespace() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.require_secret("password", Some(" s3nha ")), Some(" s3nha "));
        assert!(errors.is_empty());
        assert_eq!(errors.require_secret("password", Some("   ")), None);
        assert!(!errors.is_empty());
    }

    #[test]
    fn database_conflict_maps_to_409() {
        let err: ApiError = DatabaseError::Conflict("Duplicate entry".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn sql_errors_are_not_echoed() {
        let err: ApiError = DatabaseError::Sqlx(sqlx::Error::RowNotFound).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Database error occurred");
    }

    #[test]
    fn conversion_errors_map_by_kind() {
        let missing: ApiError = ConversionError::MissingPortion("x".to_string()).into();
        assert_eq!(missing.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let invalid: ApiError = ConversionError::InvalidQuantity(-1.0).into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    }
}

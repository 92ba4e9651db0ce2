use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims, Role};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
    pub login: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            role: claims.role,
            login: claims.login,
        }
    }
}

impl AuthUser {
    /// Id of the calling professional, or 403 for any other role.
    pub fn professional_id(&self, action: &str) -> Result<i64, ApiError> {
        match self.role {
            Role::Professional => Ok(self.user_id),
            Role::Patient => Err(ApiError::forbidden(format!(
                "Access denied. Only professionals can {}.",
                action
            ))),
        }
    }

    pub fn is_professional(&self, id: i64) -> bool {
        self.role == Role::Professional && self.user_id == id
    }

    pub fn is_patient(&self, id: i64) -> bool {
        self.role == Role::Patient && self.user_id == id
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token, &state.config.security)?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
        assert!(extract_jwt_from_headers(&headers("Basic dXNlcg==")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer   ")).is_err());
    }

    #[test]
    fn patients_cannot_act_as_professionals() {
        let patient = AuthUser { user_id: 3, role: Role::Patient, login: "p".to_string() };
        assert!(patient.professional_id("create meal plans").is_err());
        assert!(patient.is_patient(3));
        assert!(!patient.is_professional(3));
    }
}

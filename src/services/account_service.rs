use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{generate_jwt, hash_password, verify_password, Claims, Role};
use crate::config::AppConfig;
use crate::database::models::{NewProfessional, ProfessionalType};
use crate::database::Store;
use crate::error::{ApiError, FieldErrors};
use crate::middleware::AuthUser;

use super::validation::{clean, is_digits, is_valid_email};

const INVALID_CREDENTIALS: &str = "Invalid login or password";

#[derive(Debug, Default, Deserialize)]
pub struct RegisterProfessionalRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub cpf: Option<String>,
    pub cellphone: Option<String>,
    pub crn: Option<String>,
    pub cref: Option<String>,
    pub professional_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Email, CPF or cellphone
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: Value,
}

/// Professional registration, login for both account kinds, and caller lookup.
pub struct AccountService {
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    pub async fn register_professional(&self, req: RegisterProfessionalRequest) -> Result<Value, ApiError> {
        let mut errors = FieldErrors::new();
        let name = errors.require("name", req.name.as_deref()).map(str::to_string);
        let email = errors.require("email", req.email.as_deref()).map(str::to_lowercase);
        let password = errors.require_secret("password", req.password.as_deref()).map(str::to_string);
        let cpf = errors.require("cpf", req.cpf.as_deref()).map(str::to_string);
        let cellphone = errors.require("cellphone", req.cellphone.as_deref()).map(str::to_string);
        let kind = errors.require("professional_type", req.professional_type.as_deref());

        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.add("email", "Invalid email format");
            }
        }
        if let Some(cpf) = &cpf {
            if !is_digits(cpf, 11) {
                errors.add("cpf", "CPF must have exactly 11 digits");
            }
        }
        if let Some(cellphone) = &cellphone {
            if !is_digits(cellphone, 11) {
                errors.add("cellphone", "Cellphone must have exactly 11 digits");
            }
        }
        let professional_type = match kind.map(str::parse::<ProfessionalType>) {
            Some(Ok(t)) => Some(t),
            Some(Err(_)) => {
                errors.add("professional_type", "Must be 'nutritionist' or 'personal_trainer'");
                None
            }
            None => None,
        };

        let crn = clean(req.crn);
        let cref = clean(req.cref);
        errors.into_result()?;

        // All present once validation passed.
        let (Some(name), Some(email), Some(password), Some(cpf), Some(cellphone), Some(professional_type)) =
            (name, email, password, cpf, cellphone, professional_type)
        else {
            return Err(ApiError::bad_request("Missing required fields"));
        };

        let mut new = NewProfessional {
            name,
            email,
            cpf,
            cellphone,
            crn,
            cref,
            professional_type,
            password_hash: String::new(),
        };

        if self.store.professional_exists(&new).await? {
            return Err(ApiError::conflict(
                "A professional with this email, CPF, cellphone, CRN or CREF already exists",
            ));
        }

        new.password_hash = hash_password(password, self.config.security.bcrypt_cost).await?;
        let professional = self.store.insert_professional(&new).await?;
        info!("Registered professional {} ({})", professional.id, professional.email);

        Ok(json!(professional))
    }

    pub async fn login_professional(&self, req: LoginRequest) -> Result<TokenResponse, ApiError> {
        let (login, password) = Self::credentials(req)?;

        let Some(professional) = self.store.find_professional_by_login(&login).await? else {
            warn!("Professional login rejected: unknown login");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        };
        if !verify_password(password, professional.password_hash.clone()).await? {
            warn!("Professional login rejected for id {}", professional.id);
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }

        info!("Professional {} logged in", professional.id);
        self.token_for(professional.id, Role::Professional, professional.email.clone(), json!(professional))
    }

    pub async fn login_patient(&self, req: LoginRequest) -> Result<TokenResponse, ApiError> {
        let (login, password) = Self::credentials(req)?;

        let Some(patient) = self.store.find_patient_by_login(&login).await? else {
            warn!("Patient login rejected: unknown login");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        };
        if !verify_password(password, patient.password_hash.clone()).await? {
            warn!("Patient login rejected for id {}", patient.id);
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }

        info!("Patient {} logged in", patient.id);
        self.token_for(patient.id, Role::Patient, patient.email.clone(), json!(patient))
    }

    /// Caller identity from the token plus the stored profile.
    pub async fn whoami(&self, user: &AuthUser) -> Result<Value, ApiError> {
        let profile = match user.role {
            Role::Professional => self.store.get_professional(user.user_id).await?.map(|p| json!(p)),
            Role::Patient => self.store.get_patient(user.user_id).await?.map(|p| json!(p)),
        };
        let profile = profile.ok_or_else(|| ApiError::not_found("Account no longer exists"))?;

        Ok(json!({
            "user_id": user.user_id,
            "role": user.role,
            "login": user.login,
            "profile": profile,
        }))
    }

    fn credentials(req: LoginRequest) -> Result<(String, String), ApiError> {
        let mut errors = FieldErrors::new();
        let login = errors.require("login", req.login.as_deref()).map(str::to_string);
        let password = errors.require_secret("password", req.password.as_deref()).map(str::to_string);
        errors.into_result()?;

        match (login, password) {
            (Some(login), Some(password)) => Ok((login, password)),
            _ => Err(ApiError::bad_request("Missing login or password")),
        }
    }

    fn token_for(&self, user_id: i64, role: Role, login: String, user: Value) -> Result<TokenResponse, ApiError> {
        let security = &self.config.security;
        let claims = Claims::new(user_id, role, login, security.jwt_expiry_hours);
        let token = generate_jwt(&claims, security)?;

        Ok(TokenResponse {
            token,
            token_type: "Bearer",
            expires_in: security.jwt_expiry_hours * 3600,
            user,
        })
    }
}

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::database::models::{NewPatient, Patient, PatientUpdate};
use crate::database::Store;
use crate::error::{ApiError, FieldErrors};
use crate::middleware::AuthUser;

use super::validation::{clean, is_digits, is_positive, is_valid_email};

#[derive(Debug, Default, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub cellphone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    /// Generated when absent and returned once in the response.
    pub password: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub cellphone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

pub struct PatientService {
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
}

impl PatientService {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    pub async fn register(&self, user: &AuthUser, req: RegisterPatientRequest) -> Result<Value, ApiError> {
        let professional_id = user.professional_id("register patients")?;

        let mut errors = FieldErrors::new();
        let name = errors.require("name", req.name.as_deref()).map(str::to_string);
        let email = errors.require("email", req.email.as_deref()).map(str::to_lowercase);
        let cpf = errors.require("cpf", req.cpf.as_deref()).map(str::to_string);
        let cellphone = errors.require("cellphone", req.cellphone.as_deref()).map(str::to_string);
        check_contact(&mut errors, email.as_deref(), cpf.as_deref(), cellphone.as_deref());
        check_measures(&mut errors, req.height_cm, req.weight_kg);
        errors.into_result()?;

        let (Some(name), Some(email), Some(cpf), Some(cellphone)) = (name, email, cpf, cellphone) else {
            return Err(ApiError::bad_request("Missing required fields"));
        };

        if self.store.patient_exists(&email, &cpf, &cellphone, None).await? {
            return Err(ApiError::conflict("A patient with this email, CPF or cellphone already exists"));
        }

        let (password, temporary_password) = match req.password.filter(|p| !p.trim().is_empty()) {
            Some(password) => (password, None),
            None => {
                let generated = Uuid::new_v4().simple().to_string()[..12].to_string();
                (generated.clone(), Some(generated))
            }
        };
        let password_hash = hash_password(password, self.config.security.bcrypt_cost).await?;

        let patient = self
            .store
            .insert_patient(&NewPatient {
                professional_id,
                name,
                email,
                cpf,
                cellphone,
                birth_date: req.birth_date,
                gender: clean(req.gender),
                height_cm: req.height_cm,
                weight_kg: req.weight_kg,
                password_hash,
            })
            .await?;
        info!("Professional {} registered patient {}", professional_id, patient.id);

        let mut body = json!(patient);
        if let Some(temporary_password) = temporary_password {
            body["temporary_password"] = json!(temporary_password);
        }
        Ok(body)
    }

    pub async fn list(&self, user: &AuthUser) -> Result<Vec<Patient>, ApiError> {
        let professional_id = user.professional_id("list patients")?;
        Ok(self.store.list_patients(professional_id).await?)
    }

    pub async fn get(&self, user: &AuthUser, id: i64) -> Result<Patient, ApiError> {
        self.readable(user, id).await
    }

    pub async fn update(&self, user: &AuthUser, id: i64, req: UpdatePatientRequest) -> Result<Patient, ApiError> {
        let current = self.owned(user, id, "update patients").await?;

        let mut errors = FieldErrors::new();
        let merged = PatientUpdate {
            name: merge_required(&mut errors, "name", req.name, current.name),
            email: merge_required(&mut errors, "email", req.email, current.email).to_lowercase(),
            cpf: merge_required(&mut errors, "cpf", req.cpf, current.cpf),
            cellphone: merge_required(&mut errors, "cellphone", req.cellphone, current.cellphone),
            birth_date: req.birth_date.or(current.birth_date),
            gender: clean(req.gender).or(current.gender),
            height_cm: req.height_cm.or(current.height_cm),
            weight_kg: req.weight_kg.or(current.weight_kg),
        };
        check_contact(
            &mut errors,
            Some(merged.email.as_str()),
            Some(merged.cpf.as_str()),
            Some(merged.cellphone.as_str()),
        );
        check_measures(&mut errors, merged.height_cm, merged.weight_kg);
        errors.into_result()?;

        if self
            .store
            .patient_exists(&merged.email, &merged.cpf, &merged.cellphone, Some(id))
            .await?
        {
            return Err(ApiError::conflict("A patient with this email, CPF or cellphone already exists"));
        }

        let patient = self
            .store
            .update_patient(id, &merged)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Patient {} not found", id)))?;
        info!("Updated patient {}", id);
        Ok(patient)
    }

    pub async fn delete(&self, user: &AuthUser, id: i64) -> Result<(), ApiError> {
        self.owned(user, id, "delete patients").await?;
        if !self.store.delete_patient(id).await? {
            return Err(ApiError::not_found(format!("Patient {} not found", id)));
        }
        info!("Deleted patient {} and their meal plans", id);
        Ok(())
    }

    /// The owning professional or the patient themselves.
    pub async fn readable(&self, user: &AuthUser, id: i64) -> Result<Patient, ApiError> {
        let patient = self.find(id).await?;
        if user.is_professional(patient.professional_id) || user.is_patient(patient.id) {
            Ok(patient)
        } else {
            Err(ApiError::forbidden("Access denied to this patient"))
        }
    }

    /// Only the owning professional.
    pub async fn owned(&self, user: &AuthUser, id: i64, action: &str) -> Result<Patient, ApiError> {
        let professional_id = user.professional_id(action)?;
        let patient = self.find(id).await?;
        if patient.professional_id != professional_id {
            return Err(ApiError::forbidden("Patient belongs to another professional"));
        }
        Ok(patient)
    }

    async fn find(&self, id: i64) -> Result<Patient, ApiError> {
        self.store
            .get_patient(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Patient {} not found", id)))
    }
}

fn merge_required(errors: &mut FieldErrors, field: &str, new: Option<String>, current: String) -> String {
    match new {
        None => current,
        Some(value) => match errors.require(field, Some(value.as_str())) {
            Some(trimmed) => trimmed.to_string(),
            None => current,
        },
    }
}

fn check_contact(errors: &mut FieldErrors, email: Option<&str>, cpf: Option<&str>, cellphone: Option<&str>) {
    if email.is_some_and(|e| !is_valid_email(e)) {
        errors.add("email", "Invalid email format");
    }
    if cpf.is_some_and(|c| !is_digits(c, 11)) {
        errors.add("cpf", "CPF must have exactly 11 digits");
    }
    if cellphone.is_some_and(|c| !is_digits(c, 11)) {
        errors.add("cellphone", "Cellphone must have exactly 11 digits");
    }
}

fn check_measures(errors: &mut FieldErrors, height_cm: Option<f64>, weight_kg: Option<f64>) {
    if height_cm.is_some_and(|h| !is_positive(h)) {
        errors.add("height_cm", "Must be a positive number");
    }
    if weight_kg.is_some_and(|w| !is_positive(w)) {
        errors.add("weight_kg", "Must be a positive number");
    }
}

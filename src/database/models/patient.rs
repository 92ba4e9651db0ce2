use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: i64,
    pub professional_id: i64,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub cellphone: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub professional_id: i64,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub cellphone: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub password_hash: String,
}

/// Full set of editable columns, already merged with the stored row.
#[derive(Debug, Clone)]
pub struct PatientUpdate {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub cellphone: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

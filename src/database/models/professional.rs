use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::nutrition::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfessionalType {
    Nutritionist,
    PersonalTrainer,
}

impl ProfessionalType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nutritionist => "nutritionist",
            Self::PersonalTrainer => "personal_trainer",
        }
    }
}

impl FromStr for ProfessionalType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nutritionist" => Ok(Self::Nutritionist),
            "personal_trainer" => Ok(Self::PersonalTrainer),
            other => Err(ParseEnumError { kind: "professional type", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub cellphone: String,
    pub crn: Option<String>,
    pub cref: Option<String>,
    pub professional_type: ProfessionalType,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProfessional {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub cellphone: String,
    pub crn: Option<String>,
    pub cref: Option<String>,
    pub professional_type: ProfessionalType,
    pub password_hash: String,
}

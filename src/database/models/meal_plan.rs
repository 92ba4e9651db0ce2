use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::nutrition::{MealType, NutrientProfile, PlanDay, QuantityUnit};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: i64,
    pub patient_id: i64,
    pub professional_id: i64,
    pub title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub goals: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanEntry {
    pub id: i64,
    pub meal_plan_id: i64,
    pub meal_type: MealType,
    pub day: PlanDay,
    pub time: Option<NaiveTime>,
    pub notes: Option<String>,
}

/// A food line of an entry, joined with the catalog row it references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescribedFood {
    pub id: i64,
    pub entry_id: i64,
    pub food_id: i64,
    pub food_name: String,
    pub food_group: String,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub grams: f64,
    pub notes: Option<String>,
    pub profile: NutrientProfile,
}

#[derive(Debug, Clone)]
pub struct NewMealPlan {
    pub patient_id: i64,
    pub professional_id: i64,
    pub title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub goals: Option<String>,
    pub entries: Vec<NewEntry>,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub meal_type: MealType,
    pub day: PlanDay,
    pub time: Option<NaiveTime>,
    pub notes: Option<String>,
    pub foods: Vec<NewPrescribedFood>,
}

/// A food line whose reference is resolved and whose grams are computed.
#[derive(Debug, Clone)]
pub struct NewPrescribedFood {
    pub food_id: i64,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub grams: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MealPlanUpdate {
    pub title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub goals: Option<String>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nutrition::{FoodMeasure, NutrientProfile};

/// Catalog food. Nutrient values are per 100 g.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    pub name: String,
    pub food_group: String,
    pub portion_description: Option<String>,
    pub portion_grams: f64,
    pub grams_per_ml: Option<f64>,
    #[serde(flatten)]
    pub nutrients: NutrientProfile,
    pub created_at: DateTime<Utc>,
}

impl Food {
    pub fn measure(&self) -> FoodMeasure<'_> {
        FoodMeasure {
            name: &self.name,
            portion_grams: self.portion_grams,
            grams_per_ml: self.grams_per_ml,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub food_group: String,
    pub portion_description: Option<String>,
    pub portion_grams: f64,
    pub grams_per_ml: Option<f64>,
    pub nutrients: NutrientProfile,
}

#[derive(Debug, Clone, Default)]
pub struct FoodQuery {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    pub food_group: Option<String>,
    pub limit: u32,
}

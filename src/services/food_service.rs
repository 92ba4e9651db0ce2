use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::config::AppConfig;
use crate::database::models::{Food, FoodQuery, NewFood};
use crate::database::Store;
use crate::error::{ApiError, FieldErrors};
use crate::middleware::AuthUser;
use crate::nutrition::NutrientProfile;

use super::validation::{clean, is_positive};

#[derive(Debug, Default, Deserialize)]
pub struct CreateFoodRequest {
    pub name: Option<String>,
    pub food_group: Option<String>,
    pub portion_description: Option<String>,
    pub portion_grams: Option<f64>,
    pub grams_per_ml: Option<f64>,
    pub energy_kcal: Option<f64>,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbohydrate_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct FoodSearchParams {
    pub search: Option<String>,
    pub group: Option<String>,
    pub limit: Option<u32>,
}

pub struct FoodService {
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
}

impl FoodService {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    pub async fn create(&self, user: &AuthUser, req: CreateFoodRequest) -> Result<Food, ApiError> {
        user.professional_id("add foods to the catalog")?;

        let mut errors = FieldErrors::new();
        let name = errors.require("name", req.name.as_deref()).map(str::to_string);
        let food_group = errors.require("food_group", req.food_group.as_deref()).map(str::to_lowercase);

        match req.portion_grams {
            None => errors.add("portion_grams", "This field is required"),
            Some(g) if !is_positive(g) => errors.add("portion_grams", "Must be a positive number"),
            Some(_) => {}
        }
        if req.grams_per_ml.is_some_and(|d| !is_positive(d)) {
            errors.add("grams_per_ml", "Must be a positive number");
        }
        let energy_kcal = match req.energy_kcal {
            Some(kcal) => kcal,
            None => {
                errors.add("energy_kcal", "This field is required");
                0.0
            }
        };
        let nutrients = NutrientProfile {
            energy_kcal,
            protein_g: req.protein_g,
            carbohydrate_g: req.carbohydrate_g,
            fat_g: req.fat_g,
            fiber_g: req.fiber_g,
        };
        if let Some(field) = nutrients.invalid_field() {
            errors.add(field, "Must be zero or a positive number");
        }
        errors.into_result()?;

        let (Some(name), Some(food_group), Some(portion_grams)) = (name, food_group, req.portion_grams) else {
            return Err(ApiError::bad_request("Missing required fields"));
        };

        if self.store.find_food_by_name(&name).await?.is_some() {
            return Err(ApiError::conflict(format!("Food '{}' already exists", name)));
        }

        let food = self
            .store
            .insert_food(&NewFood {
                name,
                food_group,
                portion_description: clean(req.portion_description),
                portion_grams,
                grams_per_ml: req.grams_per_ml,
                nutrients,
            })
            .await?;
        info!("Added food {} '{}' to the catalog", food.id, food.name);
        Ok(food)
    }

    pub async fn search(&self, params: FoodSearchParams) -> Result<Vec<Food>, ApiError> {
        let query = FoodQuery {
            search: clean(params.search),
            food_group: clean(params.group).map(|g| g.to_lowercase()),
            limit: self.config.search_limit(params.limit),
        };
        Ok(self.store.search_foods(&query).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Food, ApiError> {
        self.store
            .get_food(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Food {} not found", id)))
    }
}

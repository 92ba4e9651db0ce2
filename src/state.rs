use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::services::{AccountService, FoodService, MealPlanService, PatientService};

/// Shared handler state: the store behind a trait object plus configuration
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.store.clone(), self.config.clone())
    }

    pub fn patients(&self) -> PatientService {
        PatientService::new(self.store.clone(), self.config.clone())
    }

    pub fn foods(&self) -> FoodService {
        FoodService::new(self.store.clone(), self.config.clone())
    }

    pub fn meal_plans(&self) -> MealPlanService {
        MealPlanService::new(self.store.clone())
    }
}

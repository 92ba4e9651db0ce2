pub mod account_service;
pub mod food_service;
pub mod meal_plan_service;
pub mod patient_service;
pub mod validation;

pub use account_service::AccountService;
pub use food_service::FoodService;
pub use meal_plan_service::MealPlanService;
pub use patient_service::PatientService;

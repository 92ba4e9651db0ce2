pub mod food;
pub mod meal_plan;
pub mod patient;
pub mod professional;

pub use food::{Food, FoodQuery, NewFood};
pub use meal_plan::{
    MealPlan, MealPlanEntry, MealPlanUpdate, NewEntry, NewMealPlan, NewPrescribedFood, PrescribedFood,
};
pub use patient::{NewPatient, Patient, PatientUpdate};
pub use professional::{NewProfessional, Professional, ProfessionalType};

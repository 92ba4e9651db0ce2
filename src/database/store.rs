use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Food, FoodQuery, MealPlan, MealPlanEntry, MealPlanUpdate, NewEntry, NewFood, NewMealPlan,
    NewPatient, NewPrescribedFood, NewProfessional, Patient, PatientUpdate, PrescribedFood, Professional,
};
use crate::nutrition::{MealType, PlanDay};

/// Persistence operations used by the services.
///
/// Multi-row writes (`insert_meal_plan`, `insert_entry`, the deletes) are
/// atomic: either every row is written or none is.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Professionals
    async fn professional_exists(&self, new: &NewProfessional) -> Result<bool, DatabaseError>;
    async fn insert_professional(&self, new: &NewProfessional) -> Result<Professional, DatabaseError>;
    async fn get_professional(&self, id: i64) -> Result<Option<Professional>, DatabaseError>;
    /// Lookup by email, CPF or cellphone.
    async fn find_professional_by_login(&self, login: &str) -> Result<Option<Professional>, DatabaseError>;

    // Patients
    async fn patient_exists(
        &self,
        email: &str,
        cpf: &str,
        cellphone: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, DatabaseError>;
    async fn insert_patient(&self, new: &NewPatient) -> Result<Patient, DatabaseError>;
    async fn get_patient(&self, id: i64) -> Result<Option<Patient>, DatabaseError>;
    async fn find_patient_by_login(&self, login: &str) -> Result<Option<Patient>, DatabaseError>;
    async fn list_patients(&self, professional_id: i64) -> Result<Vec<Patient>, DatabaseError>;
    async fn update_patient(&self, id: i64, update: &PatientUpdate) -> Result<Option<Patient>, DatabaseError>;
    /// Removes the patient together with their meal plans.
    async fn delete_patient(&self, id: i64) -> Result<bool, DatabaseError>;

    // Food catalog
    async fn insert_food(&self, new: &NewFood) -> Result<Food, DatabaseError>;
    async fn get_food(&self, id: i64) -> Result<Option<Food>, DatabaseError>;
    /// Case-insensitive exact name match.
    async fn find_food_by_name(&self, name: &str) -> Result<Option<Food>, DatabaseError>;
    async fn search_foods(&self, query: &FoodQuery) -> Result<Vec<Food>, DatabaseError>;

    // Meal plans
    /// Inserts the plan, its entries and their foods; returns the plan id.
    async fn insert_meal_plan(&self, new: &NewMealPlan) -> Result<i64, DatabaseError>;
    async fn get_meal_plan(&self, id: i64) -> Result<Option<MealPlan>, DatabaseError>;
    async fn list_meal_plans(&self, patient_id: i64) -> Result<Vec<MealPlan>, DatabaseError>;
    async fn update_meal_plan(&self, id: i64, update: &MealPlanUpdate) -> Result<Option<MealPlan>, DatabaseError>;
    async fn delete_meal_plan(&self, id: i64) -> Result<bool, DatabaseError>;

    // Entries
    async fn list_entries(&self, meal_plan_id: i64) -> Result<Vec<MealPlanEntry>, DatabaseError>;
    async fn get_entry(&self, id: i64) -> Result<Option<MealPlanEntry>, DatabaseError>;
    async fn entry_exists(&self, meal_plan_id: i64, meal_type: MealType, day: PlanDay) -> Result<bool, DatabaseError>;
    /// Inserts the entry and its foods; returns the entry id.
    async fn insert_entry(&self, meal_plan_id: i64, new: &NewEntry) -> Result<i64, DatabaseError>;
    async fn delete_entry(&self, id: i64) -> Result<bool, DatabaseError>;

    // Prescribed foods
    async fn list_prescribed_foods(&self, entry_id: i64) -> Result<Vec<PrescribedFood>, DatabaseError>;
    async fn get_prescribed_food(&self, id: i64) -> Result<Option<PrescribedFood>, DatabaseError>;
    async fn insert_prescribed_food(&self, entry_id: i64, new: &NewPrescribedFood) -> Result<i64, DatabaseError>;
    async fn delete_prescribed_food(&self, id: i64) -> Result<bool, DatabaseError>;
}

//! In-memory `Store` and fixtures for router and service tests.
//!
//! The store mirrors the MySQL schema's constraints: unique identifiers
//! raise `DatabaseError::Conflict`, foreign keys must resolve, and deletes
//! cascade down the plan tree.


use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::auth::{generate_jwt, Claims, Role};
use crate::config::AppConfig;
use crate::database::models::{
    Food, FoodQuery, MealPlan, MealPlanEntry, MealPlanUpdate, NewEntry, NewFood, NewMealPlan, NewPatient,
    NewPrescribedFood, NewProfessional, Patient, PatientUpdate, PrescribedFood, Professional, ProfessionalType,
};
use crate::database::{DatabaseError, Store};
use crate::nutrition::{MealType, NutrientProfile, PlanDay};
use crate::state::AppState;

#[derive(Debug, Clone)]
struct StoredLine {
    id: i64,
    entry_id: i64,
    line: NewPrescribedFood,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    professionals: Vec<Professional>,
    patients: Vec<Patient>,
    foods: Vec<Food>,
    plans: Vec<MealPlan>,
    entries: Vec<MealPlanEntry>,
    lines: Vec<StoredLine>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_entry(&self, meal_plan_id: i64, new: &NewEntry) -> Result<(), DatabaseError> {
        if self
            .entries
            .iter()
            .any(|e| e.meal_plan_id == meal_plan_id && e.meal_type == new.meal_type && e.day == new.day)
        {
            return Err(DatabaseError::Conflict(format!(
                "Duplicate entry '{}-{}-{}' for key 'uq_entry_slot'",
                meal_plan_id, new.meal_type, new.day
            )));
        }
        new.foods.iter().try_for_each(|f| self.check_food(f.food_id))
    }

    fn check_food(&self, food_id: i64) -> Result<(), DatabaseError> {
        if self.foods.iter().any(|f| f.id == food_id) {
            Ok(())
        } else {
            Err(DatabaseError::NotFound(format!("food {}", food_id)))
        }
    }

    fn write_entry(&mut self, meal_plan_id: i64, new: &NewEntry) -> i64 {
        let id = self.next_id();
        self.entries.push(MealPlanEntry {
            id,
            meal_plan_id,
            meal_type: new.meal_type,
            day: new.day,
            time: new.time,
            notes: new.notes.clone(),
        });
        for line in &new.foods {
            self.write_line(id, line);
        }
        id
    }

    fn write_line(&mut self, entry_id: i64, line: &NewPrescribedFood) -> i64 {
        let id = self.next_id();
        self.lines.push(StoredLine {
            id,
            entry_id,
            line: line.clone(),
        });
        id
    }

    fn joined(&self, stored: &StoredLine) -> Option<PrescribedFood> {
        let food = self.foods.iter().find(|f| f.id == stored.line.food_id)?;
        Some(PrescribedFood {
            id: stored.id,
            entry_id: stored.entry_id,
            food_id: food.id,
            food_name: food.name.clone(),
            food_group: food.food_group.clone(),
            quantity: stored.line.quantity,
            unit: stored.line.unit,
            grams: stored.line.grams,
            notes: stored.line.notes.clone(),
            profile: food.nutrients,
        })
    }

    fn remove_entries(&mut self, entry_ids: &HashSet<i64>) {
        self.lines.retain(|l| !entry_ids.contains(&l.entry_id));
        self.entries.retain(|e| !entry_ids.contains(&e.id));
    }

    fn remove_plans(&mut self, plan_ids: &HashSet<i64>) {
        let entry_ids: HashSet<i64> = self
            .entries
            .iter()
            .filter(|e| plan_ids.contains(&e.meal_plan_id))
            .map(|e| e.id)
            .collect();
        self.remove_entries(&entry_ids);
        self.plans.retain(|p| !plan_ids.contains(&p.id));
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn professional_exists(&self, new: &NewProfessional) -> Result<bool, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.professionals.iter().any(|p| {
            p.email == new.email
                || p.cpf == new.cpf
                || p.cellphone == new.cellphone
                || same(&p.crn, &new.crn)
                || same(&p.cref, &new.cref)
        }))
    }

    async fn insert_professional(&self, new: &NewProfessional) -> Result<Professional, DatabaseError> {
        if self.professional_exists(new).await? {
            return Err(DatabaseError::Conflict("Duplicate professional".to_string()));
        }
        let mut t = self.tables.write().await;
        let professional = Professional {
            id: t.next_id(),
            name: new.name.clone(),
            email: new.email.clone(),
            cpf: new.cpf.clone(),
            cellphone: new.cellphone.clone(),
            crn: new.crn.clone(),
            cref: new.cref.clone(),
            professional_type: new.professional_type,
            password_hash: new.password_hash.clone(),
            created_at: Utc::now(),
        };
        t.professionals.push(professional.clone());
        Ok(professional)
    }

    async fn get_professional(&self, id: i64) -> Result<Option<Professional>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.professionals.iter().find(|p| p.id == id).cloned())
    }

    async fn find_professional_by_login(&self, login: &str) -> Result<Option<Professional>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t
            .professionals
            .iter()
            .find(|p| p.email == login || p.cpf == login || p.cellphone == login)
            .cloned())
    }

    async fn patient_exists(
        &self,
        email: &str,
        cpf: &str,
        cellphone: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.patients.iter().any(|p| {
            Some(p.id) != exclude_id && (p.email == email || p.cpf == cpf || p.cellphone == cellphone)
        }))
    }

    async fn insert_patient(&self, new: &NewPatient) -> Result<Patient, DatabaseError> {
        if self.patient_exists(&new.email, &new.cpf, &new.cellphone, None).await? {
            return Err(DatabaseError::Conflict("Duplicate patient".to_string()));
        }
        let mut t = self.tables.write().await;
        let patient = Patient {
            id: t.next_id(),
            professional_id: new.professional_id,
            name: new.name.clone(),
            email: new.email.clone(),
            cpf: new.cpf.clone(),
            cellphone: new.cellphone.clone(),
            birth_date: new.birth_date,
            gender: new.gender.clone(),
            height_cm: new.height_cm,
            weight_kg: new.weight_kg,
            password_hash: new.password_hash.clone(),
            created_at: Utc::now(),
        };
        t.patients.push(patient.clone());
        Ok(patient)
    }

    async fn get_patient(&self, id: i64) -> Result<Option<Patient>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.patients.iter().find(|p| p.id == id).cloned())
    }

    async fn find_patient_by_login(&self, login: &str) -> Result<Option<Patient>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t
            .patients
            .iter()
            .find(|p| p.email == login || p.cpf == login || p.cellphone == login)
            .cloned())
    }

    async fn list_patients(&self, professional_id: i64) -> Result<Vec<Patient>, DatabaseError> {
        let t = self.tables.read().await;
        let mut patients: Vec<Patient> =
            t.patients.iter().filter(|p| p.professional_id == professional_id).cloned().collect();
        patients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(patients)
    }

    async fn update_patient(&self, id: i64, update: &PatientUpdate) -> Result<Option<Patient>, DatabaseError> {
        let mut t = self.tables.write().await;
        let Some(patient) = t.patients.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        patient.name = update.name.clone();
        patient.email = update.email.clone();
        patient.cpf = update.cpf.clone();
        patient.cellphone = update.cellphone.clone();
        patient.birth_date = update.birth_date;
        patient.gender = update.gender.clone();
        patient.height_cm = update.height_cm;
        patient.weight_kg = update.weight_kg;
        Ok(Some(patient.clone()))
    }

    async fn delete_patient(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut t = self.tables.write().await;
        let before = t.patients.len();
        t.patients.retain(|p| p.id != id);
        let plan_ids: HashSet<i64> = t.plans.iter().filter(|p| p.patient_id == id).map(|p| p.id).collect();
        t.remove_plans(&plan_ids);
        Ok(t.patients.len() != before)
    }

    async fn insert_food(&self, new: &NewFood) -> Result<Food, DatabaseError> {
        let mut t = self.tables.write().await;
        if t.foods.iter().any(|f| f.name.to_lowercase() == new.name.to_lowercase()) {
            return Err(DatabaseError::Conflict(format!("Duplicate food '{}'", new.name)));
        }
        let food = Food {
            id: t.next_id(),
            name: new.name.clone(),
            food_group: new.food_group.clone(),
            portion_description: new.portion_description.clone(),
            portion_grams: new.portion_grams,
            grams_per_ml: new.grams_per_ml,
            nutrients: new.nutrients,
            created_at: Utc::now(),
        };
        t.foods.push(food.clone());
        Ok(food)
    }

    async fn get_food(&self, id: i64) -> Result<Option<Food>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.foods.iter().find(|f| f.id == id).cloned())
    }

    async fn find_food_by_name(&self, name: &str) -> Result<Option<Food>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.foods.iter().find(|f| f.name.to_lowercase() == name.trim().to_lowercase()).cloned())
    }

    async fn search_foods(&self, query: &FoodQuery) -> Result<Vec<Food>, DatabaseError> {
        let t = self.tables.read().await;
        let needle = query.search.as_deref().map(str::to_lowercase);
        let mut foods: Vec<Food> = t
            .foods
            .iter()
            .filter(|f| needle.as_deref().map_or(true, |n| f.name.to_lowercase().contains(n)))
            .filter(|f| query.food_group.as_deref().map_or(true, |g| f.food_group == g))
            .cloned()
            .collect();
        foods.sort_by(|a, b| a.name.cmp(&b.name));
        foods.truncate(query.limit as usize);
        Ok(foods)
    }

    async fn insert_meal_plan(&self, new: &NewMealPlan) -> Result<i64, DatabaseError> {
        let mut t = self.tables.write().await;
        if !t.patients.iter().any(|p| p.id == new.patient_id) {
            return Err(DatabaseError::NotFound(format!("patient {}", new.patient_id)));
        }
        let mut slots = HashSet::new();
        for entry in &new.entries {
            if !slots.insert((entry.meal_type, entry.day)) {
                return Err(DatabaseError::Conflict("Duplicate entry for key 'uq_entry_slot'".to_string()));
            }
            entry.foods.iter().try_for_each(|f| t.check_food(f.food_id))?;
        }

        let now = Utc::now();
        let id = t.next_id();
        t.plans.push(MealPlan {
            id,
            patient_id: new.patient_id,
            professional_id: new.professional_id,
            title: new.title.clone(),
            start_date: new.start_date,
            end_date: new.end_date,
            goals: new.goals.clone(),
            created_at: now,
            updated_at: now,
        });
        for entry in &new.entries {
            t.write_entry(id, entry);
        }
        Ok(id)
    }

    async fn get_meal_plan(&self, id: i64) -> Result<Option<MealPlan>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.plans.iter().find(|p| p.id == id).cloned())
    }

    async fn list_meal_plans(&self, patient_id: i64) -> Result<Vec<MealPlan>, DatabaseError> {
        let t = self.tables.read().await;
        let mut plans: Vec<MealPlan> = t.plans.iter().filter(|p| p.patient_id == patient_id).cloned().collect();
        plans.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(plans)
    }

    async fn update_meal_plan(&self, id: i64, update: &MealPlanUpdate) -> Result<Option<MealPlan>, DatabaseError> {
        let mut t = self.tables.write().await;
        let Some(plan) = t.plans.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        plan.title = update.title.clone();
        plan.start_date = update.start_date;
        plan.end_date = update.end_date;
        plan.goals = update.goals.clone();
        plan.updated_at = Utc::now();
        Ok(Some(plan.clone()))
    }

    async fn delete_meal_plan(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut t = self.tables.write().await;
        let existed = t.plans.iter().any(|p| p.id == id);
        t.remove_plans(&HashSet::from([id]));
        Ok(existed)
    }

    async fn list_entries(&self, meal_plan_id: i64) -> Result<Vec<MealPlanEntry>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.entries.iter().filter(|e| e.meal_plan_id == meal_plan_id).cloned().collect())
    }

    async fn get_entry(&self, id: i64) -> Result<Option<MealPlanEntry>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn entry_exists(&self, meal_plan_id: i64, meal_type: MealType, day: PlanDay) -> Result<bool, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t
            .entries
            .iter()
            .any(|e| e.meal_plan_id == meal_plan_id && e.meal_type == meal_type && e.day == day))
    }

    async fn insert_entry(&self, meal_plan_id: i64, new: &NewEntry) -> Result<i64, DatabaseError> {
        let mut t = self.tables.write().await;
        if !t.plans.iter().any(|p| p.id == meal_plan_id) {
            return Err(DatabaseError::NotFound(format!("meal plan {}", meal_plan_id)));
        }
        t.check_entry(meal_plan_id, new)?;
        Ok(t.write_entry(meal_plan_id, new))
    }

    async fn delete_entry(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut t = self.tables.write().await;
        let existed = t.entries.iter().any(|e| e.id == id);
        t.remove_entries(&HashSet::from([id]));
        Ok(existed)
    }

    async fn list_prescribed_foods(&self, entry_id: i64) -> Result<Vec<PrescribedFood>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t
            .lines
            .iter()
            .filter(|l| l.entry_id == entry_id)
            .filter_map(|l| t.joined(l))
            .collect())
    }

    async fn get_prescribed_food(&self, id: i64) -> Result<Option<PrescribedFood>, DatabaseError> {
        let t = self.tables.read().await;
        Ok(t.lines.iter().find(|l| l.id == id).and_then(|l| t.joined(l)))
    }

    async fn insert_prescribed_food(&self, entry_id: i64, new: &NewPrescribedFood) -> Result<i64, DatabaseError> {
        let mut t = self.tables.write().await;
        if !t.entries.iter().any(|e| e.id == entry_id) {
            return Err(DatabaseError::NotFound(format!("entry {}", entry_id)));
        }
        t.check_food(new.food_id)?;
        Ok(t.write_line(entry_id, new))
    }

    async fn delete_prescribed_food(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut t = self.tables.write().await;
        let before = t.lines.len();
        t.lines.retain(|l| l.id != id);
        Ok(t.lines.len() != before)
    }
}

/// Development config with a cheap bcrypt cost.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.bcrypt_cost = 4;
    config
}

/// App state over a fresh in-memory store, plus a handle to that store.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (AppState::new(store.clone(), test_config()), store)
}

pub fn bearer(user_id: i64, role: Role) -> String {
    let claims = Claims::new(user_id, role, format!("user-{}", user_id), 1);
    match generate_jwt(&claims, &test_config().security) {
        Ok(token) => format!("Bearer {}", token),
        Err(e) => panic!("test token: {}", e),
    }
}

/// Professional with identifiers derived from `n`, so several can coexist.
pub async fn seed_professional(store: &MemoryStore, n: u8) -> Professional {
    let new = NewProfessional {
        name: format!("Professional {}", n),
        email: format!("pro{}@moveat.app", n),
        cpf: format!("1000000000{}", n % 10),
        cellphone: format!("1190000000{}", n % 10),
        crn: Some(format!("CRN-{}", n)),
        cref: None,
        professional_type: ProfessionalType::Nutritionist,
        password_hash: String::new(),
    };
    match store.insert_professional(&new).await {
        Ok(p) => p,
        Err(e) => panic!("seed professional: {}", e),
    }
}

pub async fn seed_patient(store: &MemoryStore, professional_id: i64, n: u8) -> Patient {
    let new = NewPatient {
        professional_id,
        name: format!("Patient {}", n),
        email: format!("patient{}@moveat.app", n),
        cpf: format!("2000000000{}", n % 10),
        cellphone: format!("2190000000{}", n % 10),
        birth_date: None,
        gender: None,
        height_cm: Some(170.0),
        weight_kg: Some(70.0),
        password_hash: String::new(),
    };
    match store.insert_patient(&new).await {
        Ok(p) => p,
        Err(e) => panic!("seed patient: {}", e),
    }
}

pub async fn seed_food(
    store: &MemoryStore,
    name: &str,
    portion_grams: f64,
    grams_per_ml: Option<f64>,
    nutrients: NutrientProfile,
) -> Food {
    let new = NewFood {
        name: name.to_string(),
        food_group: "test".to_string(),
        portion_description: None,
        portion_grams,
        grams_per_ml,
        nutrients,
    };
    match store.insert_food(&new).await {
        Ok(f) => f,
        Err(e) => panic!("seed food: {}", e),
    }
}

pub fn profile(energy_kcal: f64, protein_g: f64, carbohydrate_g: f64, fat_g: f64) -> NutrientProfile {
    NutrientProfile {
        energy_kcal,
        protein_g,
        carbohydrate_g,
        fat_g,
        fiber_g: 0.0,
    }
}

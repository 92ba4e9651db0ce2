use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{FromRow, MySqlConnection, MySqlPool};

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Food, FoodQuery, MealPlan, MealPlanEntry, MealPlanUpdate, NewEntry, NewFood, NewMealPlan,
    NewPatient, NewPrescribedFood, NewProfessional, Patient, PatientUpdate, PrescribedFood, Professional,
};
use crate::database::store::Store;
use crate::nutrition::{MealType, NutrientProfile, PlanDay};

const PROFESSIONAL_COLUMNS: &str =
    "id, name, email, cpf, cellphone, crn, cref, professional_type, password_hash, created_at";

const PATIENT_COLUMNS: &str = "id, professional_id, name, email, cpf, cellphone, birth_date, gender, \
     height_cm, weight_kg, password_hash, created_at";

const FOOD_COLUMNS: &str = "id, name, food_group, portion_description, portion_grams, grams_per_ml, \
     energy_kcal, protein_g, carbohydrate_g, fat_g, fiber_g, created_at";

const MEAL_PLAN_COLUMNS: &str =
    "id, patient_id, professional_id, title, start_date, end_date, goals, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, meal_plan_id, meal_type, day, meal_time, notes";

const PRESCRIBED_FOOD_SELECT: &str = "SELECT mf.id, mf.entry_id, mf.food_id, f.name AS food_name, \
     f.food_group, mf.quantity, mf.unit, mf.grams, mf.notes, f.energy_kcal, f.protein_g, \
     f.carbohydrate_g, f.fat_g, f.fiber_g \
     FROM meal_plan_foods mf JOIN foods f ON f.id = mf.food_id";

#[derive(FromRow)]
struct ProfessionalRow {
    id: i64,
    name: String,
    email: String,
    cpf: String,
    cellphone: String,
    crn: Option<String>,
    cref: Option<String>,
    professional_type: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfessionalRow> for Professional {
    type Error = DatabaseError;

    fn try_from(row: ProfessionalRow) -> Result<Self, Self::Error> {
        Ok(Professional {
            professional_type: row.professional_type.parse().map_err(decode)?,
            id: row.id,
            name: row.name,
            email: row.email,
            cpf: row.cpf,
            cellphone: row.cellphone,
            crn: row.crn,
            cref: row.cref,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct FoodRow {
    id: i64,
    name: String,
    food_group: String,
    portion_description: Option<String>,
    portion_grams: f64,
    grams_per_ml: Option<f64>,
    energy_kcal: f64,
    protein_g: f64,
    carbohydrate_g: f64,
    fat_g: f64,
    fiber_g: f64,
    created_at: DateTime<Utc>,
}

impl From<FoodRow> for Food {
    fn from(row: FoodRow) -> Self {
        Food {
            id: row.id,
            name: row.name,
            food_group: row.food_group,
            portion_description: row.portion_description,
            portion_grams: row.portion_grams,
            grams_per_ml: row.grams_per_ml,
            nutrients: NutrientProfile {
                energy_kcal: row.energy_kcal,
                protein_g: row.protein_g,
                carbohydrate_g: row.carbohydrate_g,
                fat_g: row.fat_g,
                fiber_g: row.fiber_g,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct EntryRow {
    id: i64,
    meal_plan_id: i64,
    meal_type: String,
    day: String,
    meal_time: Option<NaiveTime>,
    notes: Option<String>,
}

impl TryFrom<EntryRow> for MealPlanEntry {
    type Error = DatabaseError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(MealPlanEntry {
            id: row.id,
            meal_plan_id: row.meal_plan_id,
            meal_type: row.meal_type.parse().map_err(decode)?,
            day: row.day.parse().map_err(decode)?,
            time: row.meal_time,
            notes: row.notes,
        })
    }
}

#[derive(FromRow)]
struct PrescribedFoodRow {
    id: i64,
    entry_id: i64,
    food_id: i64,
    food_name: String,
    food_group: String,
    quantity: f64,
    unit: String,
    grams: f64,
    notes: Option<String>,
    energy_kcal: f64,
    protein_g: f64,
    carbohydrate_g: f64,
    fat_g: f64,
    fiber_g: f64,
}

impl TryFrom<PrescribedFoodRow> for PrescribedFood {
    type Error = DatabaseError;

    fn try_from(row: PrescribedFoodRow) -> Result<Self, Self::Error> {
        Ok(PrescribedFood {
            id: row.id,
            entry_id: row.entry_id,
            food_id: row.food_id,
            food_name: row.food_name,
            food_group: row.food_group,
            quantity: row.quantity,
            unit: row.unit.parse().map_err(decode)?,
            grams: row.grams,
            notes: row.notes,
            profile: NutrientProfile {
                energy_kcal: row.energy_kcal,
                protein_g: row.protein_g,
                carbohydrate_g: row.carbohydrate_g,
                fat_g: row.fat_g,
                fiber_g: row.fiber_g,
            },
        })
    }
}

fn decode(err: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::Decode(err.to_string())
}

/// `Store` backed by a MySQL pool
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn insert_entry_rows(
        conn: &mut MySqlConnection,
        meal_plan_id: i64,
        entry: &NewEntry,
    ) -> Result<i64, DatabaseError> {
        let entry_id = sqlx::query(
            "INSERT INTO meal_plan_entries (meal_plan_id, meal_type, day, meal_time, notes)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(meal_plan_id)
        .bind(entry.meal_type.as_str())
        .bind(entry.day.as_str())
        .bind(entry.time)
        .bind(&entry.notes)
        .execute(&mut *conn)
        .await?
        .last_insert_id() as i64;

        for food in &entry.foods {
            Self::insert_food_row(&mut *conn, entry_id, food).await?;
        }

        Ok(entry_id)
    }

    async fn insert_food_row(
        conn: &mut MySqlConnection,
        entry_id: i64,
        food: &NewPrescribedFood,
    ) -> Result<i64, DatabaseError> {
        let id = sqlx::query(
            "INSERT INTO meal_plan_foods (entry_id, food_id, quantity, unit, grams, notes)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(entry_id)
        .bind(food.food_id)
        .bind(food.quantity)
        .bind(food.unit.as_str())
        .bind(food.grams)
        .bind(&food.notes)
        .execute(&mut *conn)
        .await?
        .last_insert_id() as i64;

        Ok(id)
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn professional_exists(&self, new: &NewProfessional) -> Result<bool, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM professionals
             WHERE email = ? OR cpf = ? OR cellphone = ? OR crn = ? OR cref = ?",
        )
        .bind(&new.email)
        .bind(&new.cpf)
        .bind(&new.cellphone)
        .bind(&new.crn)
        .bind(&new.cref)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn insert_professional(&self, new: &NewProfessional) -> Result<Professional, DatabaseError> {
        let id = sqlx::query(
            "INSERT INTO professionals
             (name, email, password_hash, cpf, cellphone, crn, cref, professional_type)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.cpf)
        .bind(&new.cellphone)
        .bind(&new.crn)
        .bind(&new.cref)
        .bind(new.professional_type.as_str())
        .execute(&self.pool)
        .await?
        .last_insert_id() as i64;

        self.get_professional(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("professional {} after insert", id)))
    }

    async fn get_professional(&self, id: i64) -> Result<Option<Professional>, DatabaseError> {
        let sql = format!("SELECT {} FROM professionals WHERE id = ?", PROFESSIONAL_COLUMNS);
        sqlx::query_as::<_, ProfessionalRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Professional::try_from)
            .transpose()
    }

    async fn find_professional_by_login(&self, login: &str) -> Result<Option<Professional>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM professionals WHERE email = ? OR cpf = ? OR cellphone = ? LIMIT 1",
            PROFESSIONAL_COLUMNS
        );
        sqlx::query_as::<_, ProfessionalRow>(&sql)
            .bind(login)
            .bind(login)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?
            .map(Professional::try_from)
            .transpose()
    }

    async fn patient_exists(
        &self,
        email: &str,
        cpf: &str,
        cellphone: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM patients
             WHERE (email = ? OR cpf = ? OR cellphone = ?) AND (? IS NULL OR id <> ?)",
        )
        .bind(email)
        .bind(cpf)
        .bind(cellphone)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn insert_patient(&self, new: &NewPatient) -> Result<Patient, DatabaseError> {
        let id = sqlx::query(
            "INSERT INTO patients
             (professional_id, name, email, password_hash, cpf, cellphone, birth_date, gender, height_cm, weight_kg)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.professional_id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.cpf)
        .bind(&new.cellphone)
        .bind(new.birth_date)
        .bind(&new.gender)
        .bind(new.height_cm)
        .bind(new.weight_kg)
        .execute(&self.pool)
        .await?
        .last_insert_id() as i64;

        self.get_patient(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("patient {} after insert", id)))
    }

    async fn get_patient(&self, id: i64) -> Result<Option<Patient>, DatabaseError> {
        let sql = format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS);
        Ok(sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_patient_by_login(&self, login: &str) -> Result<Option<Patient>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM patients WHERE email = ? OR cpf = ? OR cellphone = ? LIMIT 1",
            PATIENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Patient>(&sql)
            .bind(login)
            .bind(login)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_patients(&self, professional_id: i64) -> Result<Vec<Patient>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM patients WHERE professional_id = ? ORDER BY name, id",
            PATIENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Patient>(&sql)
            .bind(professional_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_patient(&self, id: i64, update: &PatientUpdate) -> Result<Option<Patient>, DatabaseError> {
        sqlx::query(
            "UPDATE patients
             SET name = ?, email = ?, cpf = ?, cellphone = ?, birth_date = ?, gender = ?,
                 height_cm = ?, weight_kg = ?
             WHERE id = ?",
        )
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.cpf)
        .bind(&update.cellphone)
        .bind(update.birth_date)
        .bind(&update.gender)
        .bind(update.height_cm)
        .bind(update.weight_kg)
        .bind(id)
        .execute(&self.pool)
        .await?;

        // MySQL reports zero affected rows when nothing changed, so re-read instead of counting
        self.get_patient(id).await
    }

    async fn delete_patient(&self, id: i64) -> Result<bool, DatabaseError> {
        // meal plans and their children go with the patient through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_food(&self, new: &NewFood) -> Result<Food, DatabaseError> {
        let id = sqlx::query(
            "INSERT INTO foods
             (name, food_group, portion_description, portion_grams, grams_per_ml,
              energy_kcal, protein_g, carbohydrate_g, fat_g, fiber_g)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.food_group)
        .bind(&new.portion_description)
        .bind(new.portion_grams)
        .bind(new.grams_per_ml)
        .bind(new.nutrients.energy_kcal)
        .bind(new.nutrients.protein_g)
        .bind(new.nutrients.carbohydrate_g)
        .bind(new.nutrients.fat_g)
        .bind(new.nutrients.fiber_g)
        .execute(&self.pool)
        .await?
        .last_insert_id() as i64;

        self.get_food(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("food {} after insert", id)))
    }

    async fn get_food(&self, id: i64) -> Result<Option<Food>, DatabaseError> {
        let sql = format!("SELECT {} FROM foods WHERE id = ?", FOOD_COLUMNS);
        Ok(sqlx::query_as::<_, FoodRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Food::from))
    }

    async fn find_food_by_name(&self, name: &str) -> Result<Option<Food>, DatabaseError> {
        let sql = format!("SELECT {} FROM foods WHERE LOWER(name) = LOWER(?) LIMIT 1", FOOD_COLUMNS);
        Ok(sqlx::query_as::<_, FoodRow>(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?
            .map(Food::from))
    }

    async fn search_foods(&self, query: &FoodQuery) -> Result<Vec<Food>, DatabaseError> {
        let pattern = query
            .search
            .as_deref()
            .map(|s| format!("%{}%", escape_like(&s.to_lowercase())));
        let sql = format!(
            "SELECT {} FROM foods
             WHERE (? IS NULL OR LOWER(name) LIKE ?) AND (? IS NULL OR food_group = ?)
             ORDER BY name LIMIT ?",
            FOOD_COLUMNS
        );
        let rows = sqlx::query_as::<_, FoodRow>(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&query.food_group)
            .bind(&query.food_group)
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Food::from).collect())
    }

    async fn insert_meal_plan(&self, new: &NewMealPlan) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let plan_id = sqlx::query(
            "INSERT INTO meal_plans (patient_id, professional_id, title, start_date, end_date, goals)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new.patient_id)
        .bind(new.professional_id)
        .bind(&new.title)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.goals)
        .execute(&mut *tx)
        .await?
        .last_insert_id() as i64;

        for entry in &new.entries {
            Self::insert_entry_rows(&mut *tx, plan_id, entry).await?;
        }

        tx.commit().await?;
        Ok(plan_id)
    }

    async fn get_meal_plan(&self, id: i64) -> Result<Option<MealPlan>, DatabaseError> {
        let sql = format!("SELECT {} FROM meal_plans WHERE id = ?", MEAL_PLAN_COLUMNS);
        Ok(sqlx::query_as::<_, MealPlan>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_meal_plans(&self, patient_id: i64) -> Result<Vec<MealPlan>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM meal_plans WHERE patient_id = ? ORDER BY start_date DESC, id DESC",
            MEAL_PLAN_COLUMNS
        );
        Ok(sqlx::query_as::<_, MealPlan>(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_meal_plan(&self, id: i64, update: &MealPlanUpdate) -> Result<Option<MealPlan>, DatabaseError> {
        sqlx::query(
            "UPDATE meal_plans SET title = ?, start_date = ?, end_date = ?, goals = ? WHERE id = ?",
        )
        .bind(&update.title)
        .bind(update.start_date)
        .bind(update.end_date)
        .bind(&update.goals)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_meal_plan(id).await
    }

    async fn delete_meal_plan(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM meal_plans WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_entries(&self, meal_plan_id: i64) -> Result<Vec<MealPlanEntry>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM meal_plan_entries WHERE meal_plan_id = ? ORDER BY id",
            ENTRY_COLUMNS
        );
        sqlx::query_as::<_, EntryRow>(&sql)
            .bind(meal_plan_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(MealPlanEntry::try_from)
            .collect()
    }

    async fn get_entry(&self, id: i64) -> Result<Option<MealPlanEntry>, DatabaseError> {
        let sql = format!("SELECT {} FROM meal_plan_entries WHERE id = ?", ENTRY_COLUMNS);
        sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(MealPlanEntry::try_from)
            .transpose()
    }

    async fn entry_exists(&self, meal_plan_id: i64, meal_type: MealType, day: PlanDay) -> Result<bool, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM meal_plan_entries WHERE meal_plan_id = ? AND meal_type = ? AND day = ?",
        )
        .bind(meal_plan_id)
        .bind(meal_type.as_str())
        .bind(day.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn insert_entry(&self, meal_plan_id: i64, new: &NewEntry) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let entry_id = Self::insert_entry_rows(&mut *tx, meal_plan_id, new).await?;
        tx.commit().await?;
        Ok(entry_id)
    }

    async fn delete_entry(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM meal_plan_entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_prescribed_foods(&self, entry_id: i64) -> Result<Vec<PrescribedFood>, DatabaseError> {
        let sql = format!("{} WHERE mf.entry_id = ? ORDER BY mf.id", PRESCRIBED_FOOD_SELECT);
        sqlx::query_as::<_, PrescribedFoodRow>(&sql)
            .bind(entry_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(PrescribedFood::try_from)
            .collect()
    }

    async fn get_prescribed_food(&self, id: i64) -> Result<Option<PrescribedFood>, DatabaseError> {
        let sql = format!("{} WHERE mf.id = ?", PRESCRIBED_FOOD_SELECT);
        sqlx::query_as::<_, PrescribedFoodRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(PrescribedFood::try_from)
            .transpose()
    }

    async fn insert_prescribed_food(&self, entry_id: i64, new: &NewPrescribedFood) -> Result<i64, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_food_row(&mut *conn, entry_id, new).await
    }

    async fn delete_prescribed_food(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM meal_plan_foods WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Escape LIKE wildcards in user input
fn escape_like(input: &str) -> String {
    input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

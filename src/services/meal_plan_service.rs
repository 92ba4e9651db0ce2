// Meal plan construction and retrieval.
//
// Writes validate the whole payload, check ownership, resolve every food
// reference and convert every quantity before the first row is stored.
// Reads re-query the entries of a plan and the foods of each entry, then
// aggregate nutrients per line, per entry, per weekday and per plan.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::models::{
    Food, MealPlan, MealPlanEntry, MealPlanUpdate, NewEntry, NewMealPlan, NewPrescribedFood, Patient,
    PrescribedFood,
};
use crate::database::Store;
use crate::error::{ApiError, FieldErrors};
use crate::middleware::AuthUser;
use crate::nutrition::{ConversionError, MealType, Nutrients, PlanDay, QuantityUnit};

use super::validation::{clean, is_positive};

#[derive(Debug, Default, Deserialize)]
pub struct CreateMealPlanRequest {
    pub patient_id: Option<i64>,
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub goals: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryRequest {
    pub meal_type: Option<MealType>,
    pub day: Option<PlanDay>,
    pub time: Option<NaiveTime>,
    pub notes: Option<String>,
    #[serde(default)]
    pub foods: Vec<FoodLineRequest>,
}

/// A food reference by catalog id or by name (id wins when both are given).
#[derive(Debug, Default, Deserialize)]
pub struct FoodLineRequest {
    pub food_id: Option<i64>,
    pub food_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<QuantityUnit>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMealPlanRequest {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub goals: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MealPlanQuery {
    /// A plan day, or `today` for the server's current weekday.
    pub day: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FoodLineDetail {
    pub id: i64,
    pub food_id: i64,
    pub food_name: String,
    pub food_group: String,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub grams: f64,
    pub notes: Option<String>,
    pub nutrients: Nutrients,
}

#[derive(Debug, Serialize)]
pub struct EntryDetail {
    #[serde(flatten)]
    pub entry: MealPlanEntry,
    pub foods: Vec<FoodLineDetail>,
    pub totals: Nutrients,
    #[serde(skip)]
    raw_totals: Nutrients,
}

#[derive(Debug, Serialize)]
pub struct DayTotals {
    pub day: PlanDay,
    pub meals: usize,
    pub totals: Nutrients,
}

#[derive(Debug, Serialize)]
pub struct MealPlanDetail {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub entries: Vec<EntryDetail>,
    /// Monday to Sunday, with `every_day` meals applied where no weekday entry replaces them.
    pub daily_totals: Vec<DayTotals>,
    pub average_daily: Nutrients,
    pub totals: Nutrients,
}

impl FoodLineDetail {
    fn from_line(line: PrescribedFood) -> (Self, Nutrients) {
        let raw = line.profile.scaled(line.grams);
        let detail = Self {
            id: line.id,
            food_id: line.food_id,
            food_name: line.food_name,
            food_group: line.food_group,
            quantity: line.quantity,
            unit: line.unit,
            grams: line.grams,
            notes: line.notes,
            nutrients: raw.rounded(),
        };
        (detail, raw)
    }
}

impl EntryDetail {
    fn new(entry: MealPlanEntry, lines: Vec<PrescribedFood>) -> Self {
        let (foods, raw): (Vec<_>, Vec<_>) = lines.into_iter().map(FoodLineDetail::from_line).unzip();
        let raw_totals: Nutrients = raw.into_iter().sum();
        Self {
            entry,
            foods,
            totals: raw_totals.rounded(),
            raw_totals,
        }
    }

    fn sort_key(&self) -> (PlanDay, MealType, Option<NaiveTime>, i64) {
        (self.entry.day, self.entry.meal_type, self.entry.time, self.entry.id)
    }
}

/// Entries eaten on `day`. A weekday entry replaces the `every_day`
/// entry of the same meal type.
fn applies_on(entries: &[EntryDetail], day: PlanDay) -> Vec<&EntryDetail> {
    if day == PlanDay::EveryDay {
        return entries.iter().filter(|e| e.entry.day == PlanDay::EveryDay).collect();
    }

    let replaced: HashSet<MealType> = entries
        .iter()
        .filter(|e| e.entry.day == day)
        .map(|e| e.entry.meal_type)
        .collect();

    entries
        .iter()
        .filter(|e| {
            e.entry.day == day || (e.entry.day == PlanDay::EveryDay && !replaced.contains(&e.entry.meal_type))
        })
        .collect()
}

/// Per-weekday totals and their average over the week.
fn weekly_totals(entries: &[EntryDetail]) -> (Vec<DayTotals>, Nutrients) {
    let mut week = Nutrients::default();
    let days: Vec<DayTotals> = PlanDay::ALL
        .into_iter()
        .filter(|d| *d != PlanDay::EveryDay)
        .map(|day| {
            let eaten = applies_on(entries, day);
            let raw: Nutrients = eaten.iter().map(|e| e.raw_totals).sum();
            week += raw;
            DayTotals {
                day,
                meals: eaten.len(),
                totals: raw.rounded(),
            }
        })
        .collect();

    let average = week / days.len() as f64;
    (days, average.rounded())
}

fn field(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn validate_food_line(errors: &mut FieldErrors, prefix: &str, line: &FoodLineRequest) {
    let named = line.food_name.as_deref().is_some_and(|n| !n.trim().is_empty());
    if line.food_id.is_none() && !named {
        errors.add(field(prefix, "food_id"), "Either food_id or food_name is required");
    }
    match line.quantity {
        None => errors.add(field(prefix, "quantity"), "This field is required"),
        Some(q) if !is_positive(q) => errors.add(field(prefix, "quantity"), "Must be a positive number"),
        Some(_) => {}
    }
}

fn validate_entry(errors: &mut FieldErrors, prefix: &str, entry: &EntryRequest) {
    if entry.meal_type.is_none() {
        errors.add(field(prefix, "meal_type"), "This field is required");
    }
    if entry.day.is_none() {
        errors.add(field(prefix, "day"), "This field is required");
    }
    for (i, line) in entry.foods.iter().enumerate() {
        validate_food_line(errors, &field(prefix, &format!("foods[{}]", i)), line);
    }
}

fn check_date_range(errors: &mut FieldErrors, start: NaiveDate, end: NaiveDate) {
    if end < start {
        errors.add("end_date", "Must be on or after start_date");
    }
}

/// Resolves food references against the catalog, caching repeated lookups.
struct FoodResolver<'a> {
    store: &'a dyn Store,
    by_id: HashMap<i64, Food>,
    by_name: HashMap<String, i64>,
}

impl<'a> FoodResolver<'a> {
    fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    async fn resolve(&mut self, line: &FoodLineRequest) -> Result<Food, ApiError> {
        let food = match (line.food_id, line.food_name.as_deref()) {
            (Some(id), _) => match self.by_id.get(&id) {
                Some(food) => return Ok(food.clone()),
                None => self
                    .store
                    .get_food(id)
                    .await?
                    .ok_or_else(|| ApiError::not_found(format!("Food {} not found", id)))?,
            },
            (None, Some(name)) => {
                let key = name.trim().to_lowercase();
                if let Some(food) = self.by_name.get(&key).and_then(|id| self.by_id.get(id)) {
                    return Ok(food.clone());
                }
                self.store
                    .find_food_by_name(&key)
                    .await?
                    .ok_or_else(|| ApiError::not_found(format!("Food '{}' not found", name.trim())))?
            }
            (None, None) => return Err(ApiError::bad_request("Either food_id or food_name is required")),
        };

        self.by_name.insert(food.name.to_lowercase(), food.id);
        self.by_id.insert(food.id, food.clone());
        Ok(food)
    }

    /// Resolve the reference and convert the quantity to grams.
    async fn prescribe(&mut self, line: FoodLineRequest) -> Result<NewPrescribedFood, ApiError> {
        let food = self.resolve(&line).await?;
        let unit = line.unit.unwrap_or_default();
        let quantity = line.quantity.unwrap_or_default();
        let grams = unit.to_grams(quantity, food.measure())?;
        if !food.nutrients.scaled(grams).is_finite() {
            return Err(ConversionError::InvalidQuantity(quantity).into());
        }

        Ok(NewPrescribedFood {
            food_id: food.id,
            quantity,
            unit,
            grams,
            notes: clean(line.notes),
        })
    }

    async fn entry(&mut self, req: EntryRequest) -> Result<NewEntry, ApiError> {
        let (Some(meal_type), Some(day)) = (req.meal_type, req.day) else {
            return Err(ApiError::bad_request("meal_type and day are required"));
        };

        let mut foods = Vec::with_capacity(req.foods.len());
        for line in req.foods {
            foods.push(self.prescribe(line).await?);
        }

        Ok(NewEntry {
            meal_type,
            day,
            time: req.time,
            notes: clean(req.notes),
            foods,
        })
    }
}

pub struct MealPlanService {
    store: Arc<dyn Store>,
}

impl MealPlanService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user: &AuthUser, req: CreateMealPlanRequest) -> Result<MealPlanDetail, ApiError> {
        let professional_id = user.professional_id("create meal plans")?;

        let mut errors = FieldErrors::new();
        if req.patient_id.is_none() {
            errors.add("patient_id", "This field is required");
        }
        if req.start_date.is_none() {
            errors.add("start_date", "This field is required");
        }
        if req.end_date.is_none() {
            errors.add("end_date", "This field is required");
        }
        if let (Some(start), Some(end)) = (req.start_date, req.end_date) {
            check_date_range(&mut errors, start, end);
        }
        for (i, entry) in req.entries.iter().enumerate() {
            validate_entry(&mut errors, &format!("entries[{}]", i), entry);
        }
        errors.into_result()?;

        let (Some(patient_id), Some(start_date), Some(end_date)) = (req.patient_id, req.start_date, req.end_date)
        else {
            return Err(ApiError::bad_request("Missing required fields"));
        };

        let patient = self.patient(patient_id).await?;
        if patient.professional_id != professional_id {
            return Err(ApiError::forbidden("Patient belongs to another professional"));
        }

        let mut slots = HashSet::new();
        for entry in &req.entries {
            if let (Some(meal_type), Some(day)) = (entry.meal_type, entry.day) {
                if !slots.insert((meal_type, day)) {
                    return Err(ApiError::conflict(format!(
                        "Duplicate entry for {} on {}",
                        meal_type, day
                    )));
                }
            }
        }

        let mut resolver = FoodResolver::new(self.store.as_ref());
        let mut entries = Vec::with_capacity(req.entries.len());
        for entry in req.entries {
            entries.push(resolver.entry(entry).await?);
        }

        let new = NewMealPlan {
            patient_id,
            professional_id,
            title: clean(req.title),
            start_date,
            end_date,
            goals: clean(req.goals),
            entries,
        };
        let id = self.store.insert_meal_plan(&new).await?;
        info!(
            "Professional {} created meal plan {} for patient {} with {} entries",
            professional_id,
            id,
            patient_id,
            new.entries.len()
        );

        let plan = self.plan(id).await?;
        self.assemble(plan, None).await
    }

    /// Plan summaries for a patient, newest first.
    pub async fn list_for_patient(&self, user: &AuthUser, patient_id: i64) -> Result<Vec<MealPlan>, ApiError> {
        let patient = self.patient(patient_id).await?;
        if !(user.is_professional(patient.professional_id) || user.is_patient(patient.id)) {
            return Err(ApiError::forbidden("Access denied to this patient"));
        }
        Ok(self.store.list_meal_plans(patient_id).await?)
    }

    pub async fn get(&self, user: &AuthUser, id: i64, query: MealPlanQuery) -> Result<MealPlanDetail, ApiError> {
        let day = match clean(query.day) {
            None => None,
            Some(d) if d.eq_ignore_ascii_case("today") => Some(PlanDay::from(Local::now().weekday())),
            Some(d) => Some(d.to_lowercase().parse::<PlanDay>().map_err(|e| ApiError::bad_request(e.to_string()))?),
        };

        let plan = self.plan(id).await?;
        if !(user.is_professional(plan.professional_id) || user.is_patient(plan.patient_id)) {
            return Err(ApiError::forbidden("Access denied to this meal plan"));
        }
        self.assemble(plan, day).await
    }

    pub async fn update(&self, user: &AuthUser, id: i64, req: UpdateMealPlanRequest) -> Result<MealPlan, ApiError> {
        let plan = self.owned(user, id, "update meal plans").await?;

        let merged = MealPlanUpdate {
            title: clean(req.title).or(plan.title),
            start_date: req.start_date.unwrap_or(plan.start_date),
            end_date: req.end_date.unwrap_or(plan.end_date),
            goals: clean(req.goals).or(plan.goals),
        };
        let mut errors = FieldErrors::new();
        check_date_range(&mut errors, merged.start_date, merged.end_date);
        errors.into_result()?;

        let updated = self
            .store
            .update_meal_plan(id, &merged)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Meal plan {} not found", id)))?;
        info!("Updated meal plan {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, user: &AuthUser, id: i64) -> Result<(), ApiError> {
        self.owned(user, id, "delete meal plans").await?;
        if !self.store.delete_meal_plan(id).await? {
            return Err(ApiError::not_found(format!("Meal plan {} not found", id)));
        }
        info!("Deleted meal plan {}", id);
        Ok(())
    }

    pub async fn add_entry(&self, user: &AuthUser, plan_id: i64, req: EntryRequest) -> Result<EntryDetail, ApiError> {
        self.owned(user, plan_id, "edit meal plans").await?;

        let mut errors = FieldErrors::new();
        validate_entry(&mut errors, "", &req);
        errors.into_result()?;

        if let (Some(meal_type), Some(day)) = (req.meal_type, req.day) {
            if self.store.entry_exists(plan_id, meal_type, day).await? {
                return Err(ApiError::conflict(format!(
                    "Meal plan already has an entry for {} on {}",
                    meal_type, day
                )));
            }
        }

        let new = FoodResolver::new(self.store.as_ref()).entry(req).await?;
        let entry_id = self.store.insert_entry(plan_id, &new).await?;
        info!("Added entry {} ({} on {}) to meal plan {}", entry_id, new.meal_type, new.day, plan_id);

        let entry = self.entry(plan_id, entry_id).await?;
        let lines = self.store.list_prescribed_foods(entry_id).await?;
        Ok(EntryDetail::new(entry, lines))
    }

    pub async fn remove_entry(&self, user: &AuthUser, plan_id: i64, entry_id: i64) -> Result<(), ApiError> {
        self.owned(user, plan_id, "edit meal plans").await?;
        self.entry(plan_id, entry_id).await?;

        if !self.store.delete_entry(entry_id).await? {
            return Err(ApiError::not_found(format!("Entry {} not found", entry_id)));
        }
        info!("Removed entry {} from meal plan {}", entry_id, plan_id);
        Ok(())
    }

    pub async fn add_food(
        &self,
        user: &AuthUser,
        plan_id: i64,
        entry_id: i64,
        req: FoodLineRequest,
    ) -> Result<FoodLineDetail, ApiError> {
        self.owned(user, plan_id, "edit meal plans").await?;
        self.entry(plan_id, entry_id).await?;

        let mut errors = FieldErrors::new();
        validate_food_line(&mut errors, "", &req);
        errors.into_result()?;

        let new = FoodResolver::new(self.store.as_ref()).prescribe(req).await?;
        let line_id = self.store.insert_prescribed_food(entry_id, &new).await?;
        info!("Added food {} ({} g) to entry {}", new.food_id, new.grams, entry_id);

        let line = self
            .store
            .get_prescribed_food(line_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Food line {} not found", line_id)))?;
        Ok(FoodLineDetail::from_line(line).0)
    }

    pub async fn remove_food(&self, user: &AuthUser, plan_id: i64, entry_id: i64, line_id: i64) -> Result<(), ApiError> {
        self.owned(user, plan_id, "edit meal plans").await?;
        self.entry(plan_id, entry_id).await?;

        let belongs = self
            .store
            .get_prescribed_food(line_id)
            .await?
            .is_some_and(|line| line.entry_id == entry_id);
        if !belongs || !self.store.delete_prescribed_food(line_id).await? {
            return Err(ApiError::not_found(format!("Food line {} not found in entry {}", line_id, entry_id)));
        }
        info!("Removed food line {} from entry {}", line_id, entry_id);
        Ok(())
    }

    async fn assemble(&self, plan: MealPlan, day: Option<PlanDay>) -> Result<MealPlanDetail, ApiError> {
        let entries = self.store.list_entries(plan.id).await?;
        let lines = try_join_all(entries.iter().map(|e| self.store.list_prescribed_foods(e.id))).await?;

        let mut entries: Vec<EntryDetail> = entries
            .into_iter()
            .zip(lines)
            .map(|(entry, lines)| EntryDetail::new(entry, lines))
            .collect();
        entries.sort_by_key(EntryDetail::sort_key);

        let (daily_totals, average_daily) = weekly_totals(&entries);

        if let Some(day) = day {
            let keep: HashSet<i64> = applies_on(&entries, day).iter().map(|e| e.entry.id).collect();
            entries.retain(|e| keep.contains(&e.entry.id));
        }
        let totals: Nutrients = entries.iter().map(|e| e.raw_totals).sum();

        Ok(MealPlanDetail {
            plan,
            entries,
            daily_totals,
            average_daily,
            totals: totals.rounded(),
        })
    }

    async fn patient(&self, id: i64) -> Result<Patient, ApiError> {
        self.store
            .get_patient(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Patient {} not found", id)))
    }

    async fn plan(&self, id: i64) -> Result<MealPlan, ApiError> {
        self.store
            .get_meal_plan(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Meal plan {} not found", id)))
    }

    /// Plan owned by the calling professional.
    async fn owned(&self, user: &AuthUser, id: i64, action: &str) -> Result<MealPlan, ApiError> {
        let professional_id = user.professional_id(action)?;
        let plan = self.plan(id).await?;
        if plan.professional_id != professional_id {
            return Err(ApiError::forbidden("Meal plan belongs to another professional"));
        }
        Ok(plan)
    }

    /// Entry that belongs to the given plan.
    async fn entry(&self, plan_id: i64, entry_id: i64) -> Result<MealPlanEntry, ApiError> {
        self.store
            .get_entry(entry_id)
            .await?
            .filter(|e| e.meal_plan_id == plan_id)
            .ok_or_else(|| ApiError::not_found(format!("Entry {} not found in meal plan {}", entry_id, plan_id)))
    }
}

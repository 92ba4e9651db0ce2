//! Nutrition domain types: meal slots, quantity units and nutrient math.
//!
//! Everything here is pure; persistence and HTTP live elsewhere.

pub mod meal;
pub mod nutrients;
pub mod units;

pub use meal::{MealType, ParseEnumError, PlanDay};
pub use nutrients::{NutrientProfile, Nutrients};
pub use units::{ConversionError, FoodMeasure, QuantityUnit};

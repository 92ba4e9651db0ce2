// Quantity units and their conversion to grams.
//
// Weight units convert directly. Volume units go through milliliters and need
// the food's density. Portions use the food's default portion weight.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MG_PER_GRAM: f64 = 1000.0;
const GRAMS_PER_KG: f64 = 1000.0;
const ML_PER_LITER: f64 = 1000.0;
const ML_PER_CUP: f64 = 240.0;
const ML_PER_TBSP: f64 = 15.0;
const ML_PER_TSP: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("Quantity must be a positive number, got {0}")]
    InvalidQuantity(f64),

    #[error("Food '{food}' has no density, so it cannot be measured in {unit}")]
    MissingDensity { food: String, unit: QuantityUnit },

    #[error("Food '{0}' has no default portion weight")]
    MissingPortion(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),
}

/// The parts of a food a conversion needs.
#[derive(Debug, Clone, Copy)]
pub struct FoodMeasure<'a> {
    pub name: &'a str,
    pub portion_grams: f64,
    pub grams_per_ml: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityUnit {
    #[default]
    Grams,
    Kilograms,
    Milligrams,
    Milliliters,
    Liters,
    Cups,
    Tablespoons,
    Teaspoons,
    Portions,
}

impl QuantityUnit {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grams => "grams",
            Self::Kilograms => "kilograms",
            Self::Milligrams => "milligrams",
            Self::Milliliters => "milliliters",
            Self::Liters => "liters",
            Self::Cups => "cups",
            Self::Tablespoons => "tablespoons",
            Self::Teaspoons => "teaspoons",
            Self::Portions => "portions",
        }
    }

    /// Milliliters in one of this unit, for volume units.
    const fn milliliters(&self) -> Option<f64> {
        match self {
            Self::Milliliters => Some(1.0),
            Self::Liters => Some(ML_PER_LITER),
            Self::Cups => Some(ML_PER_CUP),
            Self::Tablespoons => Some(ML_PER_TBSP),
            Self::Teaspoons => Some(ML_PER_TSP),
            _ => None,
        }
    }

    /// Convert `quantity` of this unit to grams. The result is always finite and positive.
    pub fn to_grams(&self, quantity: f64, food: FoodMeasure<'_>) -> Result<f64, ConversionError> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(ConversionError::InvalidQuantity(quantity));
        }

        let grams = match (self, self.milliliters()) {
            (Self::Grams, _) => quantity,
            (Self::Kilograms, _) => quantity * GRAMS_PER_KG,
            (Self::Milligrams, _) => quantity / MG_PER_GRAM,
            (Self::Portions, _) => {
                if food.portion_grams <= 0.0 {
                    return Err(ConversionError::MissingPortion(food.name.to_string()));
                }
                quantity * food.portion_grams
            }
            (volume, Some(ml_per_unit)) => {
                let density = food
                    .grams_per_ml
                    .filter(|d| *d > 0.0)
                    .ok_or_else(|| ConversionError::MissingDensity {
                        food: food.name.to_string(),
                        unit: *volume,
                    })?;
                quantity * ml_per_unit * density
            }
            (other, None) => return Err(ConversionError::UnknownUnit(other.to_string())),
        };

        // large inputs can overflow, tiny ones can underflow to zero
        if !grams.is_finite() || grams <= 0.0 {
            return Err(ConversionError::InvalidQuantity(quantity));
        }
        Ok(grams)
    }
}

impl fmt::Display for QuantityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantityUnit {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g" | "gram" | "grams" => Ok(Self::Grams),
            "kg" | "kilogram" | "kilograms" => Ok(Self::Kilograms),
            "mg" | "milligram" | "milligrams" => Ok(Self::Milligrams),
            "ml" | "milliliter" | "milliliters" => Ok(Self::Milliliters),
            "l" | "liter" | "liters" => Ok(Self::Liters),
            "cup" | "cups" => Ok(Self::Cups),
            "tbsp" | "tablespoon" | "tablespoons" => Ok(Self::Tablespoons),
            "tsp" | "teaspoon" | "teaspoons" => Ok(Self::Teaspoons),
            "portion" | "portions" => Ok(Self::Portions),
            other => Err(ConversionError::UnknownUnit(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milk() -> FoodMeasure<'static> {
        FoodMeasure { name: "Leite integral", portion_grams: 200.0, grams_per_ml: Some(1.03) }
    }

    fn rice() -> FoodMeasure<'static> {
        FoodMeasure { name: "Arroz cozido", portion_grams: 125.0, grams_per_ml: None }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn weight_units_ignore_the_food() {
        assert_close(QuantityUnit::Grams.to_grams(150.0, rice()).unwrap(), 150.0);
        assert_close(QuantityUnit::Kilograms.to_grams(0.25, rice()).unwrap(), 250.0);
        assert_close(QuantityUnit::Milligrams.to_grams(500.0, rice()).unwrap(), 0.5);
    }

    #[test]
    fn portions_use_default_portion_weight() {
        assert_close(QuantityUnit::Portions.to_grams(2.0, rice()).unwrap(), 250.0);
        assert_close(QuantityUnit::Portions.to_grams(0.5, milk()).unwrap(), 100.0);
    }

    #[test]
    fn volume_units_go_through_density() {
        assert_close(QuantityUnit::Milliliters.to_grams(100.0, milk()).unwrap(), 103.0);
        assert_close(QuantityUnit::Cups.to_grams(1.0, milk()).unwrap(), 240.0 * 1.03);
        assert_close(QuantityUnit::Tablespoons.to_grams(2.0, milk()).unwrap(), 30.0 * 1.03);
        assert_close(QuantityUnit::Liters.to_grams(1.0, milk()).unwrap(), 1030.0);
    }

    #[test]
    fn volume_without_density_is_rejected() {
        let err = QuantityUnit::Cups.to_grams(1.0, rice()).unwrap_err();
        assert_eq!(
            err,
            ConversionError::MissingDensity { food: "Arroz cozido".to_string(), unit: QuantityUnit::Cups }
        );
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        assert!(matches!(
            QuantityUnit::Grams.to_grams(0.0, rice()),
            Err(ConversionError::InvalidQuantity(_))
        ));
        assert!(matches!(
            QuantityUnit::Grams.to_grams(-3.0, rice()),
            Err(ConversionError::InvalidQuantity(_))
        ));
        assert!(matches!(
            QuantityUnit::Grams.to_grams(f64::NAN, rice()),
            Err(ConversionError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn conversions_that_overflow_are_rejected() {
        assert!(matches!(
            QuantityUnit::Kilograms.to_grams(1e306, rice()),
            Err(ConversionError::InvalidQuantity(q)) if q == 1e306
        ));
        assert!(matches!(
            QuantityUnit::Liters.to_grams(f64::MAX / 10.0, milk()),
            Err(ConversionError::InvalidQuantity(_))
        ));
        assert!(matches!(
            QuantityUnit::Milligrams.to_grams(5e-324, rice()),
            Err(ConversionError::InvalidQuantity(_))
        ));
        assert!(QuantityUnit::Grams.to_grams(1e306, rice()).is_ok());
    }

    #[test]
    fn parses_abbreviations() {
        assert_eq!("g".parse::<QuantityUnit>().unwrap(), QuantityUnit::Grams);
        assert_eq!(" TBSP ".parse::<QuantityUnit>().unwrap(), QuantityUnit::Tablespoons);
        assert_eq!("portion".parse::<QuantityUnit>().unwrap(), QuantityUnit::Portions);
        assert!(matches!("handful".parse::<QuantityUnit>(), Err(ConversionError::UnknownUnit(_))));
    }
}

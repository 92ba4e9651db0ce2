use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div};

/// Nutrient content of 100 g of a food.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientProfile {
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub carbohydrate_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl NutrientProfile {
    /// Nutrients contained in `grams` of the food.
    pub fn scaled(&self, grams: f64) -> Nutrients {
        let factor = grams / 100.0;
        Nutrients {
            energy_kcal: self.energy_kcal * factor,
            protein_g: self.protein_g * factor,
            carbohydrate_g: self.carbohydrate_g * factor,
            fat_g: self.fat_g * factor,
            fiber_g: self.fiber_g * factor,
        }
    }

    /// Name of the first negative or non-finite field, if any.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("energy_kcal", self.energy_kcal),
            ("protein_g", self.protein_g),
            ("carbohydrate_g", self.carbohydrate_g),
            ("fat_g", self.fat_g),
            ("fiber_g", self.fiber_g),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
        .map(|(name, _)| name)
    }
}

/// Absolute nutrient amounts for a food line, an entry, a day or a whole plan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrients {
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub carbohydrate_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl Nutrients {
    pub fn is_finite(&self) -> bool {
        [self.energy_kcal, self.protein_g, self.carbohydrate_g, self.fat_g, self.fiber_g]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Rounded to one decimal place for presentation.
    pub fn rounded(&self) -> Self {
        fn r(v: f64) -> f64 {
            (v * 10.0).round() / 10.0
        }
        Self {
            energy_kcal: r(self.energy_kcal),
            protein_g: r(self.protein_g),
            carbohydrate_g: r(self.carbohydrate_g),
            fat_g: r(self.fat_g),
            fiber_g: r(self.fiber_g),
        }
    }
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(self, rhs: Nutrients) -> Nutrients {
        Nutrients {
            energy_kcal: self.energy_kcal + rhs.energy_kcal,
            protein_g: self.protein_g + rhs.protein_g,
            carbohydrate_g: self.carbohydrate_g + rhs.carbohydrate_g,
            fat_g: self.fat_g + rhs.fat_g,
            fiber_g: self.fiber_g + rhs.fiber_g,
        }
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Nutrients) {
        *self = *self + rhs;
    }
}

impl Div<f64> for Nutrients {
    type Output = Nutrients;

    fn div(self, rhs: f64) -> Nutrients {
        Nutrients {
            energy_kcal: self.energy_kcal / rhs,
            protein_g: self.protein_g / rhs,
            carbohydrate_g: self.carbohydrate_g / rhs,
            fat_g: self.fat_g / rhs,
            fiber_g: self.fiber_g / rhs,
        }
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Nutrients>>(iter: I) -> Self {
        iter.fold(Nutrients::default(), Add::add)
    }
}

impl<'a> Sum<&'a Nutrients> for Nutrients {
    fn sum<I: Iterator<Item = &'a Nutrients>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oats() -> NutrientProfile {
        NutrientProfile {
            energy_kcal: 394.0,
            protein_g: 13.9,
            carbohydrate_g: 66.6,
            fat_g: 8.5,
            fiber_g: 9.1,
        }
    }

    #[test]
    fn scales_per_hundred_grams() {
        let n = oats().scaled(30.0);
        assert!((n.energy_kcal - 118.2).abs() < 1e-9);
        assert!((n.protein_g - 4.17).abs() < 1e-9);
    }

    #[test]
    fn sums_lines_into_totals() {
        let lines = [oats().scaled(50.0), oats().scaled(50.0)];
        let total: Nutrients = lines.iter().sum();
        assert_eq!(total.rounded(), oats().scaled(100.0).rounded());
        assert_eq!(Vec::<Nutrients>::new().into_iter().sum::<Nutrients>(), Nutrients::default());
    }

    #[test]
    fn overflowing_scale_is_not_finite() {
        assert!(oats().scaled(250.0).is_finite());
        assert!(!oats().scaled(f64::MAX).is_finite());
    }

    #[test]
    fn rounds_to_one_decimal() {
        let n = Nutrients { energy_kcal: 118.26, protein_g: 4.14, ..Default::default() };
        let r = n.rounded();
        assert_eq!(r.energy_kcal, 118.3);
        assert_eq!(r.protein_g, 4.1);
    }

    #[test]
    fn flags_negative_values() {
        assert_eq!(oats().invalid_field(), None);
        let bad = NutrientProfile { fat_g: -1.0, ..oats() };
        assert_eq!(bad.invalid_field(), Some("fat_g"));
    }
}

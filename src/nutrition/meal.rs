use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Meal occurrences of a day, declared in the order they are eaten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    MorningSnack,
    Lunch,
    AfternoonSnack,
    Dinner,
    Supper,
}

impl MealType {
    pub const ALL: [MealType; 6] = [
        Self::Breakfast,
        Self::MorningSnack,
        Self::Lunch,
        Self::AfternoonSnack,
        Self::Dinner,
        Self::Supper,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::MorningSnack => "morning_snack",
            Self::Lunch => "lunch",
            Self::AfternoonSnack => "afternoon_snack",
            Self::Dinner => "dinner",
            Self::Supper => "supper",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseEnumError { kind: "meal type", value: s.to_string() })
    }
}

/// Day an entry applies to. `EveryDay` is a template repeated across the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanDay {
    EveryDay,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl PlanDay {
    pub const ALL: [PlanDay; 8] = [
        Self::EveryDay,
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EveryDay => "every_day",
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl fmt::Display for PlanDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanDay {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseEnumError { kind: "plan day", value: s.to_string() })
    }
}

impl From<chrono::Weekday> for PlanDay {
    fn from(day: chrono::Weekday) -> Self {
        use chrono::Weekday::*;
        match day {
            Mon => Self::Monday,
            Tue => Self::Tuesday,
            Wed => Self::Wednesday,
            Thu => Self::Thursday,
            Fri => Self::Friday,
            Sat => Self::Saturday,
            Sun => Self::Sunday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_types_sort_in_eating_order() {
        let mut meals = vec![MealType::Dinner, MealType::Breakfast, MealType::AfternoonSnack];
        meals.sort();
        assert_eq!(meals, vec![MealType::Breakfast, MealType::AfternoonSnack, MealType::Dinner]);
    }

    #[test]
    fn round_trips_through_strings() {
        for meal in MealType::ALL {
            assert_eq!(meal.as_str().parse::<MealType>().unwrap(), meal);
        }
        for day in PlanDay::ALL {
            assert_eq!(day.as_str().parse::<PlanDay>().unwrap(), day);
        }
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(serde_json::to_value(MealType::MorningSnack).unwrap(), "morning_snack");
        assert_eq!(serde_json::from_value::<PlanDay>("every_day".into()).unwrap(), PlanDay::EveryDay);
    }

    #[test]
    fn converts_chrono_weekdays() {
        assert_eq!(PlanDay::from(chrono::Weekday::Sat), PlanDay::Saturday);
    }
}

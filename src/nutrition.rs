use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Nutrient amount stored under the catalog convention: per 100 grams of food.
///
/// The wrapped value is never an absolute amount. Use [`Per100g::for_quantity`]
/// to get the amount contained in a consumed quantity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Per100g(f64);

impl Per100g {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn for_quantity(self, quantity: Grams) -> f64 {
        self.0 * quantity.0 / 100.0
    }
}

/// A consumed quantity in grams. Always finite; strictly positive unless it is [`Grams::ZERO`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Grams(f64);

impl Grams {
    pub const ZERO: Grams = Grams(0.0);

    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Grams {
    type Error = anyhow::Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Grams::new(value).ok_or_else(|| anyhow::anyhow!("quantity must be a positive number of grams"))
    }
}

/// Per-100g nutrition facts of a food. Optional nutrients are absent in the catalog when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub calories: Per100g,
    pub protein: Per100g,
    pub carbs: Option<Per100g>,
    pub fat: Option<Per100g>,
    pub fiber: Option<Per100g>,
    pub sugar: Option<Per100g>,
    pub sodium: Option<Per100g>,
}

impl NutritionFacts {
    /// Absolute nutrients contained in `quantity` grams. Absent nutrients count as 0.
    pub fn scale(&self, quantity: Grams) -> Nutrients {
        let opt = |v: Option<Per100g>| v.map_or(0.0, |v| v.for_quantity(quantity));
        Nutrients {
            calories: self.calories.for_quantity(quantity),
            protein: self.protein.for_quantity(quantity),
            carbs: opt(self.carbs),
            fat: opt(self.fat),
            fiber: opt(self.fiber),
            sugar: opt(self.sugar),
            sodium: opt(self.sodium),
        }
    }
}

/// Absolute (already scaled) nutrient amounts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Nutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(self, rhs: Nutrients) -> Nutrients {
        Nutrients {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
            fiber: self.fiber + rhs.fiber,
            sugar: self.sugar + rhs.sugar,
            sodium: self.sodium + rhs.sodium,
        }
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Nutrients>>(iter: I) -> Self {
        iter.fold(Nutrients::default(), Add::add)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            other => anyhow::bail!("unknown meal type {other:?}"),
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sex input of the Mifflin-St Jeor formula, which only defines these two branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => anyhow::bail!("unknown gender {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
}

impl ActivityLevel {
    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
        }
    }

    /// Unknown levels fall back to sedentary.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim() {
            "lightly_active" => ActivityLevel::LightlyActive,
            "moderately_active" => ActivityLevel::ModeratelyActive,
            "very_active" => ActivityLevel::VeryActive,
            _ => ActivityLevel::Sedentary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl FromStr for Goal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lose" => Ok(Goal::Lose),
            "maintain" => Ok(Goal::Maintain),
            "gain" => Ok(Goal::Gain),
            other => anyhow::bail!("unknown goal {other:?}"),
        }
    }
}

const GOAL_ADJUSTMENT_KCAL: f64 = 500.0;

/// Basal metabolic rate (kcal/day), Mifflin-St Jeor.
pub fn bmr(weight_kg: f64, height_cm: f64, age_years: f64, gender: Gender) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years;
    match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

/// Total daily energy expenditure (kcal/day).
pub fn tdee(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.factor()
}

pub fn target_calories(tdee: f64, goal: Goal) -> f64 {
    match goal {
        Goal::Lose => tdee - GOAL_ADJUSTMENT_KCAL,
        Goal::Maintain => tdee,
        Goal::Gain => tdee + GOAL_ADJUSTMENT_KCAL,
    }
}

use anyhow::Context;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::foods::Food;
use crate::foods::repo_types::FoodRow;
use crate::nutrition::{Grams, MealType, Nutrients};

/// A `user_diets` row joined with its food.
#[derive(Debug, FromRow)]
pub struct DietEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub quantity: f64,
    pub meal_type: String,
    pub consumed_at: OffsetDateTime,
    pub food_name: String,
    pub food_calories: f64,
    pub food_protein: f64,
    pub food_carbs: Option<f64>,
    pub food_fat: Option<f64>,
    pub food_fiber: Option<f64>,
    pub food_sugar: Option<f64>,
    pub food_sodium: Option<f64>,
    pub food_created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DietEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub quantity: Grams,
    pub meal_type: MealType,
    #[serde(with = "time::serde::rfc3339")]
    pub consumed_at: OffsetDateTime,
    pub food: Food,
}

impl DietEntry {
    /// What this entry contributes to the day: the food's per-100g facts scaled by quantity.
    pub fn nutrients(&self) -> Nutrients {
        self.food.facts.scale(self.quantity)
    }
}

impl TryFrom<DietEntryRow> for DietEntry {
    type Error = anyhow::Error;

    fn try_from(r: DietEntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            food_id: r.food_id,
            quantity: Grams::try_from(r.quantity).context("stored quantity")?,
            meal_type: r.meal_type.parse().context("stored meal type")?,
            consumed_at: r.consumed_at,
            food: FoodRow {
                id: r.food_id,
                name: r.food_name,
                calories: r.food_calories,
                protein: r.food_protein,
                carbs: r.food_carbs,
                fat: r.food_fat,
                fiber: r.food_fiber,
                sugar: r.food_sugar,
                sodium: r.food_sodium,
                created_at: r.food_created_at,
            }
            .into(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewDietEntry {
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub quantity: Grams,
    pub meal_type: MealType,
}

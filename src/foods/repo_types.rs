use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::{NutritionFacts, Per100g};

/// Food record in the database. Nutrient columns are per 100 grams.
#[derive(Debug, FromRow)]
pub struct FoodRow {
    pub id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub facts: NutritionFacts,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<FoodRow> for Food {
    fn from(r: FoodRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            facts: NutritionFacts {
                calories: Per100g::new(r.calories),
                protein: Per100g::new(r.protein),
                carbs: r.carbs.map(Per100g::new),
                fat: r.fat.map(Per100g::new),
                fiber: r.fiber.map(Per100g::new),
                sugar: r.sugar.map(Per100g::new),
                sodium: r.sodium.map(Per100g::new),
            },
            created_at: r.created_at,
        }
    }
}

/// A catalog entry about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFood {
    pub name: String,
    pub facts: NutritionFacts,
}

/// Raised when the catalog already holds a food with the same name.
#[derive(Debug, Error)]
#[error("a food named {0:?} already exists")]
pub struct DuplicateFoodName(pub String);

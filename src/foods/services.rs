use super::dto::FoodFields;
use super::repo_types::{DuplicateFoodName, Food, NewFood};
use crate::error::ApiError;
use crate::nutrition::{NutritionFacts, Per100g};

fn nutrient(field: &str, value: Option<f64>) -> Result<Option<Per100g>, ApiError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ApiError::validation(format!(
            "{field} must be a non-negative number"
        ))),
        other => Ok(other.map(Per100g::new)),
    }
}

fn name(value: Option<String>) -> Result<Option<String>, ApiError> {
    match value.map(|n| n.trim().to_string()) {
        Some(n) if n.is_empty() => Err(ApiError::validation("Name must not be empty")),
        other => Ok(other),
    }
}

/// Validates a catalog insert. Name, calories and carbs are required; protein defaults to 0.
pub fn new_food(fields: FoodFields) -> Result<NewFood, ApiError> {
    let (Some(_), Some(_), Some(_)) = (&fields.name, fields.calories, fields.carbs) else {
        return Err(ApiError::validation("Name, calories and carbs are required"));
    };
    let name = name(fields.name)?.unwrap_or_default();
    let calories = nutrient("calories", fields.calories)?.unwrap_or_default();
    let protein = nutrient("protein", fields.protein)?.unwrap_or_default();

    Ok(NewFood {
        name,
        facts: NutritionFacts {
            calories,
            protein,
            carbs: nutrient("carbs", fields.carbs)?,
            fat: nutrient("fat", fields.fat)?,
            fiber: nutrient("fiber", fields.fiber)?,
            sugar: nutrient("sugar", fields.sugar)?,
            sodium: nutrient("sodium", fields.sodium)?,
        },
    })
}

/// Merges the provided fields over an existing row.
pub fn merge(existing: Food, fields: FoodFields) -> Result<Food, ApiError> {
    let f = existing.facts;
    Ok(Food {
        name: name(fields.name)?.unwrap_or(existing.name),
        facts: NutritionFacts {
            calories: nutrient("calories", fields.calories)?.unwrap_or(f.calories),
            protein: nutrient("protein", fields.protein)?.unwrap_or(f.protein),
            carbs: nutrient("carbs", fields.carbs)?.or(f.carbs),
            fat: nutrient("fat", fields.fat)?.or(f.fat),
            fiber: nutrient("fiber", fields.fiber)?.or(f.fiber),
            sugar: nutrient("sugar", fields.sugar)?.or(f.sugar),
            sodium: nutrient("sodium", fields.sodium)?.or(f.sodium),
        },
        ..existing
    })
}

/// Duplicate names are a client error; anything else stays internal.
pub(crate) fn map_duplicate(e: anyhow::Error) -> ApiError {
    match e.downcast_ref::<DuplicateFoodName>() {
        Some(dup) => ApiError::validation(format!("Food \"{}\" already exists", dup.0)),
        None => ApiError::Internal(e),
    }
}

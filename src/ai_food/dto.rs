use serde::{Deserialize, Serialize};

use crate::diets::DietEntry;
use crate::foods::Food;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub food_name: Option<String>,
}

/// Estimate as echoed back by the client. Shape matches [`super::NutritionEstimate`].
#[derive(Debug, Default, Deserialize)]
pub struct NutritionData {
    pub name: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptRequest {
    pub nutrition_data: Option<NutritionData>,
    pub quantity: Option<f64>,
    pub meal_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptResponse {
    pub message: &'static str,
    pub food: Food,
    pub user_diet: DietEntry,
}

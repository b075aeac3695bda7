use anyhow::{bail, Context};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::dto::NutritionData;
use super::gemini::TextGenerator;
use crate::error::ApiError;
use crate::foods::NewFood;
use crate::nutrition::{NutritionFacts, Per100g};

lazy_static! {
    static ref OPEN_FENCE: Regex = Regex::new(r"^```(?:json)?\s*").unwrap();
    static ref CLOSE_FENCE: Regex = Regex::new(r"\s*```$").unwrap();
}

/// Nutrition facts per 100 g as estimated by the model. Unknown optional nutrients are 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionEstimate {
    pub name: String,
    pub calories: Per100g,
    pub protein: Per100g,
    pub carbs: Per100g,
    pub fat: Per100g,
    pub fiber: Per100g,
    pub sugar: Per100g,
    pub sodium: Per100g,
}

impl NutritionEstimate {
    /// Catalog form of the estimate. A zero optional nutrient is stored as unknown.
    pub fn into_new_food(self) -> NewFood {
        let known = |v: Per100g| (v.value() != 0.0).then_some(v);
        NewFood {
            name: self.name,
            facts: NutritionFacts {
                calories: self.calories,
                protein: self.protein,
                carbs: known(self.carbs),
                fat: known(self.fat),
                fiber: known(self.fiber),
                sugar: known(self.sugar),
                sodium: known(self.sodium),
            },
        }
    }
}

pub fn build_prompt(food_name: &str) -> String {
    format!(
        r#"Please provide nutritional information for "{food_name}" per 100 grams. Return ONLY a valid JSON object with the following structure (no additional text or formatting):
{{
  "name": "exact food name",
  "calories": number,
  "protein": number,
  "carbs": number,
  "fat": number,
  "fiber": number,
  "sugar": number,
  "sodium": number
}}

All values should be in grams except calories (kcal) and sodium (mg). Use realistic nutritional values based on standard food databases. If a nutrient is not applicable or unknown, use 0."#
    )
}

/// Removes a surrounding ```json or bare ``` fence, if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(open) = OPEN_FENCE.find(text) else {
        return text;
    };
    let body = &text[open.end()..];
    match CLOSE_FENCE.find(body) {
        Some(close) => body[..close.start()].trim(),
        None => body.trim(),
    }
}

fn required_number(obj: &Value, field: &str) -> anyhow::Result<Per100g> {
    match obj.get(field).and_then(Value::as_f64) {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(Per100g::new(v)),
        Some(v) => bail!("{field} is out of range: {v}"),
        None => bail!("{field} must be a number"),
    }
}

// numbers and numeric strings count, anything else is 0
fn lenient_number(obj: &Value, field: &str) -> Per100g {
    let v = match obj.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Per100g::new(v.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0))
}

/// Parses the model's reply. `name` must be text, `calories` and `protein` numbers.
pub fn parse_estimate(reply: &str) -> anyhow::Result<NutritionEstimate> {
    let cleaned = strip_code_fences(reply);
    let obj: Value = serde_json::from_str(cleaned).context("reply is not JSON")?;
    let Some(name) = obj.get("name").and_then(Value::as_str) else {
        bail!("name must be a string");
    };

    Ok(NutritionEstimate {
        name: name.trim().to_string(),
        calories: required_number(&obj, "calories")?,
        protein: required_number(&obj, "protein")?,
        carbs: lenient_number(&obj, "carbs"),
        fat: lenient_number(&obj, "fat"),
        fiber: lenient_number(&obj, "fiber"),
        sugar: lenient_number(&obj, "sugar"),
        sodium: lenient_number(&obj, "sodium"),
    })
}

fn client_nutrient(field: &str, value: Option<f64>) -> Result<Per100g, ApiError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ApiError::validation(format!(
            "{field} must be a non-negative number"
        ))),
        other => Ok(Per100g::new(other.unwrap_or(0.0))),
    }
}

/// Rebuilds an estimate sent back by the client for acceptance.
pub fn estimate_from_data(data: NutritionData) -> Result<NutritionEstimate, ApiError> {
    let name = data.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let (Some(name), Some(_), Some(_)) = (name, data.calories, data.protein) else {
        return Err(ApiError::validation(
            "Nutrition data must include name, calories and protein",
        ));
    };
    Ok(NutritionEstimate {
        name: name.to_string(),
        calories: client_nutrient("calories", data.calories)?,
        protein: client_nutrient("protein", data.protein)?,
        carbs: client_nutrient("carbs", data.carbs)?,
        fat: client_nutrient("fat", data.fat)?,
        fiber: client_nutrient("fiber", data.fiber)?,
        sugar: client_nutrient("sugar", data.sugar)?,
        sodium: client_nutrient("sodium", data.sodium)?,
    })
}

/// Asks the model for an estimate. Every failure collapses into `None`.
pub async fn resolve(generator: &dyn TextGenerator, food_name: &str) -> Option<NutritionEstimate> {
    let reply = match generator.generate(&build_prompt(food_name)).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %format!("{e:#}"), food_name, "nutrition model call failed");
            return None;
        }
    };

    match parse_estimate(&reply) {
        Ok(estimate) => {
            debug!(food_name, name = %estimate.name, "nutrition estimate resolved");
            Some(estimate)
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), food_name, reply = %reply, "unusable nutrition reply");
            None
        }
    }
}

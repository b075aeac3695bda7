use serde::{Deserialize, Serialize};
use super::repo_types::DietEntry;
use super::services::DailySummary;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryRequest {
    pub food_id: Option<String>,
    pub quantity: Option<f64>,
    pub meal_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryResponse {
    pub message: &'static str,
    pub user_diet: DietEntry,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// `YYYY-MM-DD`, or `None` when the whole history was summarized.
    pub date: Option<String>,
    #[serde(flatten)]
    pub summary: DailySummary,
}

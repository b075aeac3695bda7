mod dto;
pub mod gemini;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use gemini::{GeminiClient, TextGenerator};
pub use services::NutritionEstimate;

pub fn router() -> Router<AppState> {
    handlers::ai_food_routes()
}

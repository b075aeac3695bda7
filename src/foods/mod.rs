mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub(crate) mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::{FoodRepo, PgFoodRepo};
pub use repo_types::{DuplicateFoodName, Food, NewFood};

pub fn router() -> Router<AppState> {
    handlers::food_routes()
}

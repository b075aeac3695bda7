use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{AcceptRequest, AcceptResponse, ResolveRequest};
use super::services::{self, NutritionEstimate};
use crate::diets::services::{parse_meal_type, parse_quantity};
use crate::foods::services::map_duplicate;
use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub fn ai_food_routes() -> Router<AppState> {
    Router::new().route("/ai-food", post(resolve_food).put(accept_food))
}

#[instrument(skip(state, user, body))]
pub async fn resolve_food(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<NutritionEstimate>, ApiError> {
    let Json(req) = body?;
    let food_name = req
        .food_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::validation("Food name is required"))?;

    let estimate = services::resolve(state.nutrition_ai.as_ref(), food_name)
        .await
        .ok_or_else(|| ApiError::not_found("Could not get nutrition data from AI"))?;

    info!(food_name, by = %user.email, "ai nutrition estimate served");
    Ok(Json(estimate))
}

#[instrument(skip(state, user, body))]
pub async fn accept_food(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<AcceptRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AcceptResponse>), ApiError> {
    let Json(req) = body?;
    let (Some(data), Some(quantity), Some(meal_type)) = (req.nutrition_data, req.quantity, req.meal_type)
    else {
        warn!(email = %user.email, "ai food accept missing fields");
        return Err(ApiError::validation(
            "Nutrition data, quantity, and meal type are required",
        ));
    };
    let estimate = services::estimate_from_data(data)?;
    let quantity = parse_quantity(quantity)?;
    let meal_type = parse_meal_type(&meal_type)?;

    let (food, entry) = state
        .diets
        .log_new_food(&user, &estimate.into_new_food(), quantity, meal_type)
        .await
        .map_err(map_duplicate)?;

    info!(food_id = %food.id, entry_id = %entry.id, %meal_type, "ai food accepted");
    Ok((
        StatusCode::CREATED,
        Json(AcceptResponse {
            message: "AI food added successfully",
            food,
            user_diet: entry,
        }),
    ))
}

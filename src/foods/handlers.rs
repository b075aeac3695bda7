use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{FoodFields, IdQuery, SearchQuery};
use super::repo_types::Food;
use super::services;
use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub fn food_routes() -> Router<AppState> {
    Router::new().route(
        "/food",
        get(search_foods).post(create_food).put(update_food),
    )
}

#[instrument(skip(state, _user))]
pub async fn search_foods(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Food>>, ApiError> {
    let Query(params) = query?;
    let q = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let foods = state.foods.search(q).await?;
    Ok(Json(foods))
}

#[instrument(skip(state, user, body))]
pub async fn create_food(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<FoodFields>, JsonRejection>,
) -> Result<Json<Food>, ApiError> {
    let Json(fields) = body?;
    let new_food = services::new_food(fields).inspect_err(|e| warn!(error = %e, "invalid food"))?;
    let food = state
        .foods
        .create(&new_food)
        .await
        .map_err(services::map_duplicate)?;
    info!(food_id = %food.id, name = %food.name, by = %user.email, "food created");
    Ok(Json(food))
}

#[instrument(skip(state, _user, body))]
pub async fn update_food(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    query: Result<Query<IdQuery>, QueryRejection>,
    body: Result<Json<FoodFields>, JsonRejection>,
) -> Result<Json<Food>, ApiError> {
    let Query(IdQuery { id }) = query?;
    let id = id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Food id is required"))?;
    let id = Uuid::parse_str(id.trim()).map_err(|_| ApiError::validation("Invalid food id"))?;
    let Json(fields) = body?;

    let existing = state
        .foods
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Food not found"))?;

    let merged = services::merge(existing, fields)?;
    let updated = state
        .foods
        .update(&merged)
        .await
        .map_err(services::map_duplicate)?
        .ok_or_else(|| ApiError::not_found("Food not found"))?;

    info!(food_id = %updated.id, "food updated");
    Ok(Json(updated))
}

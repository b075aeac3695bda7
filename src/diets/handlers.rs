use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    DateQuery, IdQuery, LogEntryRequest, LogEntryResponse, MessageResponse, SummaryResponse,
};
use super::repo_types::{DietEntry, NewDietEntry};
use super::services::{self, parse_meal_type, parse_quantity, DayRange};
use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/user-diets", get(list_entries))
        .route("/user-diets/summary", get(daily_summary))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/user-diets", axum::routing::post(log_entry).delete(delete_entry))
}

fn day_filter(state: &AppState, date: Option<&str>) -> Result<Option<(String, DayRange)>, ApiError> {
    let offset = state.config.local_offset;
    date.map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|raw| {
            let day = services::parse_day(raw, offset)?;
            let range = DayRange::for_date(day, offset).ok_or_else(services::invalid_date)?;
            Ok((day.to_string(), range))
        })
        .transpose()
}

#[instrument(skip(state, user, body))]
pub async fn log_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<LogEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LogEntryResponse>), ApiError> {
    let Json(req) = body?;
    let (Some(food_id), Some(quantity), Some(meal_type)) = (req.food_id, req.quantity, req.meal_type)
    else {
        warn!(email = %user.email, "diet entry missing fields");
        return Err(ApiError::validation("Food, quantity and meal type are required"));
    };
    let food_id = Uuid::parse_str(food_id.trim()).map_err(|_| ApiError::validation("Invalid food id"))?;
    let quantity = parse_quantity(quantity)?;
    let meal_type = parse_meal_type(&meal_type)?;

    let owner = state.users.ensure_user(&user).await?;

    if state.foods.find_by_id(food_id).await?.is_none() {
        warn!(%food_id, "diet entry for unknown food");
        return Err(ApiError::not_found("Food not found"));
    }

    let entry = state
        .diets
        .create(&NewDietEntry {
            user_id: owner.id,
            food_id,
            quantity,
            meal_type,
        })
        .await?;

    info!(entry_id = %entry.id, user_id = %owner.id, %meal_type, "diet entry logged");
    Ok((
        StatusCode::CREATED,
        Json(LogEntryResponse {
            message: "Food added to diet",
            user_diet: entry,
        }),
    ))
}

#[instrument(skip(state, user))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<DietEntry>>, ApiError> {
    let Query(params) = query?;
    let day = day_filter(&state, params.date.as_deref())?;

    let owner = state.users.ensure_user(&user).await?;
    let entries = state.diets.list(owner.id, day.map(|(_, range)| range)).await?;
    Ok(Json(entries))
}

#[instrument(skip(state, user))]
pub async fn daily_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Query(params) = query?;
    let day = day_filter(&state, params.date.as_deref())?;

    let owner = state.users.ensure_user(&user).await?;
    let (date, range) = day.unzip();
    let entries = state.diets.list(owner.id, range).await?;
    Ok(Json(SummaryResponse {
        date,
        summary: services::summarize(&entries),
    }))
}

#[instrument(skip(state, user))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Query(IdQuery { id }) = query?;
    let id = id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Diet entry ID is required"))?;

    let owner = state.users.ensure_user(&user).await?;

    // an id that is not a uuid cannot belong to anyone
    let not_found = || ApiError::not_found("Diet entry not found");
    let entry_id = Uuid::parse_str(id.trim()).map_err(|_| not_found())?;
    if !state.diets.delete_owned(owner.id, entry_id).await? {
        warn!(%entry_id, user_id = %owner.id, "delete of missing or foreign diet entry");
        return Err(not_found());
    }

    info!(%entry_id, user_id = %owner.id, "diet entry deleted");
    Ok(Json(MessageResponse {
        message: "Diet entry deleted successfully",
    }))
}

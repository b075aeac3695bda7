use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{CalorieGoals, GoalsQuery, ProfileRequest, ProfileUpdated};
use super::services;
use crate::users::User;
use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/user-profile", get(get_profile).put(update_profile))
        .route("/user-profile/goals", get(get_goals))
}

async fn existing_user(state: &AppState, email: &str) -> Result<User, ApiError> {
    state
        .users
        .find_by_email(email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

#[instrument(skip(state, user))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<User>, ApiError> {
    Ok(Json(existing_user(&state, &user.email).await?))
}

#[instrument(skip(state, user, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileUpdated>, ApiError> {
    let Json(req) = body?;
    let changes = services::validate_changes(req)
        .inspect_err(|e| warn!(email = %user.email, error = %e, "invalid profile update"))?;

    let updated = state.users.upsert_profile(&user, &changes).await?;
    info!(user_id = %updated.id, "profile updated");
    Ok(Json(ProfileUpdated {
        message: "Profile updated successfully",
        user: updated,
    }))
}

#[instrument(skip(state, user))]
pub async fn get_goals(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<GoalsQuery>, QueryRejection>,
) -> Result<Json<CalorieGoals>, ApiError> {
    let Query(params) = query?;
    let goal = services::parse_goal(params.goal.as_deref())?;
    let activity = services::parse_activity(params.activity_level.as_deref());

    let profile = existing_user(&state, &user.email).await?;
    Ok(Json(services::calorie_goals(&profile, activity, goal)?))
}

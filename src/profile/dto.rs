use serde::{Deserialize, Serialize};

use crate::nutrition::{ActivityLevel, Goal};
use crate::users::User;

#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub gender: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdated {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsQuery {
    pub activity_level: Option<String>,
    pub goal: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieGoals {
    pub bmr: f64,
    pub tdee: f64,
    pub target_calories: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

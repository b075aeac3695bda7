use std::collections::BTreeMap;

use serde::Serialize;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, Duration,
    OffsetDateTime, UtcOffset,
};

use super::repo_types::DietEntry;
use crate::error::ApiError;
use crate::nutrition::{Grams, MealType, Nutrients};

pub fn parse_quantity(raw: f64) -> Result<Grams, ApiError> {
    Grams::new(raw).ok_or_else(|| ApiError::validation("Quantity must be a positive number of grams"))
}

pub fn parse_meal_type(raw: &str) -> Result<MealType, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation("Meal type must be one of breakfast, lunch, dinner, snack"))
}

/// A local calendar day, inclusive on both ends: [00:00:00.000, 23:59:59.999].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl DayRange {
    /// `None` when the day's bounds fall outside the representable range.
    pub fn for_date(date: Date, offset: UtcOffset) -> Option<Self> {
        let start = date.midnight().assume_offset(offset);
        let end = date
            .next_day()?
            .midnight()
            .assume_offset(offset)
            .checked_sub(Duration::milliseconds(1))?;
        Some(Self { start, end })
    }

    pub fn contains(&self, t: OffsetDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, whose local date is used.
pub fn parse_day(raw: &str, offset: UtcOffset) -> Result<Date, ApiError> {
    let raw = raw.trim();
    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(date);
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|t| t.checked_to_offset(offset))
        .map(|t| t.date())
        .ok_or_else(invalid_date)
}

pub(crate) fn invalid_date() -> ApiError {
    ApiError::validation("Invalid date, expected YYYY-MM-DD")
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MealSummary {
    pub entries: usize,
    pub nutrients: Nutrients,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub total_calories: f64,
    pub totals: Nutrients,
    pub meals: BTreeMap<MealType, MealSummary>,
}

/// Totals per meal type and overall. Every meal type is present, empty ones at zero.
pub fn summarize(entries: &[DietEntry]) -> DailySummary {
    let mut meals: BTreeMap<MealType, MealSummary> = MealType::ALL
        .into_iter()
        .map(|m| (m, MealSummary::default()))
        .collect();

    for entry in entries {
        let meal = meals.entry(entry.meal_type).or_default();
        meal.entries += 1;
        meal.nutrients = meal.nutrients + entry.nutrients();
    }

    let totals: Nutrients = entries.iter().map(DietEntry::nutrients).sum();
    DailySummary {
        total_calories: totals.calories,
        totals,
        meals,
    }
}

use super::dto::{CalorieGoals, ProfileRequest};
use crate::error::ApiError;
use crate::nutrition::{self, ActivityLevel, Gender, Goal};
use crate::users::{ProfileChanges, User};

fn in_range<T: PartialOrd + Copy>(
    value: Option<T>,
    min: T,
    max: T,
    msg: &str,
) -> Result<Option<T>, ApiError> {
    match value {
        Some(v) if !(min <= v && v <= max) => Err(ApiError::validation(msg)),
        other => Ok(other),
    }
}

/// Range-checks every provided field. Absent fields stay `None` and keep their stored value.
pub fn validate_changes(req: ProfileRequest) -> Result<ProfileChanges, ApiError> {
    let gender = req
        .gender
        .map(|g| {
            g.parse::<Gender>()
                .map_err(|_| ApiError::validation("Gender must be either 'male' or 'female'"))
        })
        .transpose()?;

    Ok(ProfileChanges {
        age: in_range(req.age, 1, 150, "Age must be between 1 and 150")?,
        weight: in_range(req.weight, 1.0, 1000.0, "Weight must be between 1 and 1000 kg")?,
        height: in_range(req.height, 50.0, 300.0, "Height must be between 50 and 300 cm")?,
        gender,
    })
}

pub fn parse_goal(raw: Option<&str>) -> Result<Goal, ApiError> {
    match raw.map(str::trim).filter(|g| !g.is_empty()) {
        None => Ok(Goal::Maintain),
        Some(g) => g
            .parse()
            .map_err(|_| ApiError::validation("Goal must be one of lose, maintain, gain")),
    }
}

pub fn parse_activity(raw: Option<&str>) -> ActivityLevel {
    match raw.map(str::trim).filter(|a| !a.is_empty()) {
        None => ActivityLevel::ModeratelyActive,
        Some(a) => ActivityLevel::parse_or_default(a),
    }
}

pub fn calorie_goals(user: &User, activity_level: ActivityLevel, goal: Goal) -> Result<CalorieGoals, ApiError> {
    let (Some(age), Some(weight), Some(height), Some(gender)) =
        (user.age, user.weight, user.height, user.gender)
    else {
        return Err(ApiError::validation(
            "Age, weight, height and gender are required to compute goals",
        ));
    };

    let bmr = nutrition::bmr(weight, height, f64::from(age), gender);
    let tdee = nutrition::tdee(bmr, activity_level);
    Ok(CalorieGoals {
        bmr,
        tdee,
        target_calories: nutrition::target_calories(tdee, goal),
        activity_level,
        goal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            name: String::new(),
            image: String::new(),
            age: Some(30),
            weight: Some(70.0),
            height: Some(175.0),
            gender: Some(Gender::Male),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn provided_zero_is_out_of_range() {
        let err = validate_changes(ProfileRequest {
            age: Some(0),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Age must be between 1 and 150");

        assert!(validate_changes(ProfileRequest {
            weight: Some(1000.5),
            ..Default::default()
        })
        .is_err());
        assert!(validate_changes(ProfileRequest {
            height: Some(49.9),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn bounds_are_inclusive_and_gender_normalized() {
        let changes = validate_changes(ProfileRequest {
            age: Some(150),
            weight: Some(1.0),
            height: Some(300.0),
            gender: Some("  FEMALE ".into()),
        })
        .unwrap();
        assert_eq!(changes.age, Some(150));
        assert_eq!(changes.gender, Some(Gender::Female));

        let err = validate_changes(ProfileRequest {
            gender: Some("other".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Gender must be either 'male' or 'female'");
    }

    #[test]
    fn goals_follow_mifflin_st_jeor() {
        let goals = calorie_goals(&user(), ActivityLevel::Sedentary, Goal::Lose).unwrap();
        // 700 + 1093.75 - 150 + 5
        assert_eq!(goals.bmr, 1648.75);
        assert!((goals.tdee - 1978.5).abs() < 1e-9);
        assert!((goals.target_calories - 1478.5).abs() < 1e-9);
    }

    #[test]
    fn goals_need_complete_profile() {
        let mut u = user();
        u.height = None;
        assert!(calorie_goals(&u, ActivityLevel::Sedentary, Goal::Maintain).is_err());
    }

    #[test]
    fn query_defaults() {
        assert_eq!(parse_activity(None), ActivityLevel::ModeratelyActive);
        assert_eq!(parse_activity(Some("couch")), ActivityLevel::Sedentary);
        assert_eq!(parse_goal(None).unwrap(), Goal::Maintain);
        assert!(parse_goal(Some("bulk")).is_err());
    }
}

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::Gender;

/// User record in the database.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: String,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub gender: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: String,
    pub age: Option<i32>,   // years
    pub weight: Option<f64>, // kg
    pub height: Option<f64>, // cm
    pub gender: Option<Gender>,
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            email: r.email,
            name: r.name,
            image: r.image,
            age: r.age,
            weight: r.weight,
            height: r.height,
            gender: r.gender.as_deref().map(str::parse).transpose()?,
            created_at: r.created_at,
        })
    }
}

/// Profile fields to overwrite; `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfileChanges {
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub gender: Option<Gender>,
}

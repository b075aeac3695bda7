use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::{DietEntry, DietEntryRow, NewDietEntry};
use super::services::DayRange;
use crate::auth::SessionUser;
use crate::foods::repo::insert_food_on;
use crate::foods::{Food, NewFood};
use crate::nutrition::{Grams, MealType};
use crate::users::repo::ensure_user_on;

const ENTRY_SELECT: &str = r#"
    SELECT d.id, d.user_id, d.food_id, d.quantity, d.meal_type, d.consumed_at,
           f.name AS food_name, f.calories AS food_calories, f.protein AS food_protein,
           f.carbs AS food_carbs, f.fat AS food_fat, f.fiber AS food_fiber,
           f.sugar AS food_sugar, f.sodium AS food_sodium, f.created_at AS food_created_at
      FROM user_diets d
      JOIN foods f ON f.id = d.food_id
"#;

#[async_trait]
pub trait DietRepo: Send + Sync {
    /// Inserts an entry timestamped now and returns it joined with its food.
    async fn create(&self, entry: &NewDietEntry) -> anyhow::Result<DietEntry>;

    /// Entries of one user, newest first, optionally limited to one day.
    async fn list(&self, user_id: Uuid, day: Option<DayRange>) -> anyhow::Result<Vec<DietEntry>>;

    /// Deletes the entry only if `user_id` owns it. Returns whether a row was deleted.
    async fn delete_owned(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool>;

    /// Inserts a new catalog food and logs it for the identity as one unit of work.
    async fn log_new_food(
        &self,
        identity: &SessionUser,
        food: &NewFood,
        quantity: Grams,
        meal_type: MealType,
    ) -> anyhow::Result<(Food, DietEntry)>;
}

#[derive(Clone)]
pub struct PgDietRepo {
    db: PgPool,
}

impl PgDietRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn insert_entry_on(
    conn: &mut PgConnection,
    entry: &NewDietEntry,
) -> anyhow::Result<DietEntry> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO user_diets (user_id, food_id, quantity, meal_type)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.food_id)
    .bind(entry.quantity.value())
    .bind(entry.meal_type.as_str())
    .fetch_one(&mut *conn)
    .await
    .context("insert diet entry")?;

    let row = sqlx::query_as::<_, DietEntryRow>(&format!("{ENTRY_SELECT} WHERE d.id = $1"))
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .context("load inserted diet entry")?;
    DietEntry::try_from(row)
}

#[async_trait]
impl DietRepo for PgDietRepo {
    async fn create(&self, entry: &NewDietEntry) -> anyhow::Result<DietEntry> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        insert_entry_on(&mut conn, entry).await
    }

    async fn list(&self, user_id: Uuid, day: Option<DayRange>) -> anyhow::Result<Vec<DietEntry>> {
        let rows = match day {
            Some(day) => {
                sqlx::query_as::<_, DietEntryRow>(&format!(
                    r#"{ENTRY_SELECT}
                     WHERE d.user_id = $1 AND d.consumed_at BETWEEN $2 AND $3
                     ORDER BY d.consumed_at DESC"#
                ))
                .bind(user_id)
                .bind(day.start)
                .bind(day.end)
                .fetch_all(&self.db)
                .await
            }
            None => {
                sqlx::query_as::<_, DietEntryRow>(&format!(
                    r#"{ENTRY_SELECT}
                     WHERE d.user_id = $1
                     ORDER BY d.consumed_at DESC"#
                ))
                .bind(user_id)
                .fetch_all(&self.db)
                .await
            }
        }
        .context("list diet entries")?;

        rows.into_iter().map(DietEntry::try_from).collect()
    }

    async fn delete_owned(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM user_diets WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete diet entry")?;
        Ok(res.rows_affected() > 0)
    }

    async fn log_new_food(
        &self,
        identity: &SessionUser,
        food: &NewFood,
        quantity: Grams,
        meal_type: MealType,
    ) -> anyhow::Result<(Food, DietEntry)> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let food = insert_food_on(&mut tx, food).await?;
        let user = ensure_user_on(&mut tx, identity).await?;
        let entry = insert_entry_on(
            &mut tx,
            &NewDietEntry {
                user_id: user.id,
                food_id: food.id,
                quantity,
                meal_type,
            },
        )
        .await?;

        // dropping the transaction on any error above rolls back the food insert
        tx.commit().await.context("commit tx")?;
        Ok((food, entry))
    }
}

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::{DuplicateFoodName, Food, FoodRow, NewFood};
use crate::db::is_unique_violation;
use crate::nutrition::Per100g;

const FOOD_COLUMNS: &str =
    "id, name, calories, protein, carbs, fat, fiber, sugar, sodium, created_at";

/// Byte-wise descending, independent of the database locale.
const NAME_ORDER: &str = r#"ORDER BY name COLLATE "C" DESC"#;

#[async_trait]
pub trait FoodRepo: Send + Sync {
    /// Case-insensitive substring search on name, ordered by name descending.
    /// `None` lists the whole catalog.
    async fn search(&self, query: Option<&str>) -> anyhow::Result<Vec<Food>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Food>>;

    /// Fails with [`DuplicateFoodName`] when the name is taken.
    async fn create(&self, food: &NewFood) -> anyhow::Result<Food>;

    /// Overwrites every column of an existing row. `None` if the row is gone.
    async fn update(&self, food: &Food) -> anyhow::Result<Option<Food>>;
}

#[derive(Clone)]
pub struct PgFoodRepo {
    db: PgPool,
}

impl PgFoodRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Escapes LIKE metacharacters so the query matches literally.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn opt(v: Option<Per100g>) -> Option<f64> {
    v.map(Per100g::value)
}

pub(crate) async fn insert_food_on(
    conn: &mut PgConnection,
    food: &NewFood,
) -> anyhow::Result<Food> {
    let f = &food.facts;
    let res = sqlx::query_as::<_, FoodRow>(&format!(
        r#"
        INSERT INTO foods (name, calories, protein, carbs, fat, fiber, sugar, sodium)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {FOOD_COLUMNS}
        "#
    ))
    .bind(&food.name)
    .bind(f.calories.value())
    .bind(f.protein.value())
    .bind(opt(f.carbs))
    .bind(opt(f.fat))
    .bind(opt(f.fiber))
    .bind(opt(f.sugar))
    .bind(opt(f.sodium))
    .fetch_one(conn)
    .await;

    match res {
        Ok(row) => Ok(row.into()),
        Err(e) if is_unique_violation(&e) => Err(DuplicateFoodName(food.name.clone()).into()),
        Err(e) => Err(anyhow::Error::new(e).context("insert food")),
    }
}

#[async_trait]
impl FoodRepo for PgFoodRepo {
    async fn search(&self, query: Option<&str>) -> anyhow::Result<Vec<Food>> {
        let rows = match query {
            Some(q) => {
                sqlx::query_as::<_, FoodRow>(&format!(
                    r#"
                    SELECT {FOOD_COLUMNS}
                      FROM foods
                     WHERE name ILIKE $1 ESCAPE '\'
                     {NAME_ORDER}
                    "#
                ))
                .bind(like_pattern(q))
                .fetch_all(&self.db)
                .await
            }
            None => {
                sqlx::query_as::<_, FoodRow>(&format!(
                    "SELECT {FOOD_COLUMNS} FROM foods {NAME_ORDER}"
                ))
                .fetch_all(&self.db)
                .await
            }
        }
        .context("search foods")?;
        Ok(rows.into_iter().map(Food::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Food>> {
        let row = sqlx::query_as::<_, FoodRow>(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find food by id")?;
        Ok(row.map(Food::from))
    }

    async fn create(&self, food: &NewFood) -> anyhow::Result<Food> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        insert_food_on(&mut conn, food).await
    }

    async fn update(&self, food: &Food) -> anyhow::Result<Option<Food>> {
        let f = &food.facts;
        let res = sqlx::query_as::<_, FoodRow>(&format!(
            r#"
            UPDATE foods
               SET name = $2, calories = $3, protein = $4, carbs = $5,
                   fat = $6, fiber = $7, sugar = $8, sodium = $9
             WHERE id = $1
            RETURNING {FOOD_COLUMNS}
            "#
        ))
        .bind(food.id)
        .bind(&food.name)
        .bind(f.calories.value())
        .bind(f.protein.value())
        .bind(opt(f.carbs))
        .bind(opt(f.fat))
        .bind(opt(f.fiber))
        .bind(opt(f.sugar))
        .bind(opt(f.sodium))
        .fetch_optional(&self.db)
        .await;

        match res {
            Ok(row) => Ok(row.map(Food::from)),
            Err(e) if is_unique_violation(&e) => Err(DuplicateFoodName(food.name.clone()).into()),
            Err(e) => Err(anyhow::Error::new(e).context("update food")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{like_pattern, NAME_ORDER};

    #[test]
    fn name_order_ignores_locale() {
        assert!(NAME_ORDER.contains(r#"COLLATE "C""#));
        assert!(NAME_ORDER.ends_with("DESC"));
    }

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("rice"), "%rice%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }
}

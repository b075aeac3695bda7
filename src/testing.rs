//! In-memory stand-ins for Postgres and Gemini, plus a request driver over the real router.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use time::{OffsetDateTime, UtcOffset};
use tower::ServiceExt;
use uuid::Uuid;

use crate::ai_food::TextGenerator;
use crate::app::build_app;
use crate::auth::services::test_tokens;
use crate::auth::SessionUser;
use crate::config::{
    AppConfig, GeminiConfig, SessionConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL,
};
use crate::diets::services::DayRange;
use crate::diets::{DietEntry, DietRepo, NewDietEntry};
use crate::foods::{DuplicateFoodName, Food, FoodRepo, NewFood};
use crate::nutrition::{Grams, MealType, NutritionFacts, Per100g};
use crate::state::AppState;
use crate::users::{ProfileChanges, User, UserRepo};

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        session: SessionConfig {
            secret: "test-secret".into(),
            issuer: "nutrilog".into(),
            audience: "nutrilog-users".into(),
        },
        gemini: GeminiConfig {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.into(),
        },
        local_offset: UtcOffset::UTC,
    }
}

fn identity(email: &str) -> SessionUser {
    SessionUser {
        email: email.to_string(),
        name: "Test User".into(),
        image: String::new(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    foods: Mutex<Vec<Food>>,
    entries: Mutex<Vec<DietEntry>>,
}

impl MemoryStore {
    pub fn entries(&self) -> Vec<DietEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Logs an entry with an explicit timestamp, bypassing the API.
    pub fn insert_entry_at(
        &self,
        user_id: Uuid,
        food: &Food,
        quantity: f64,
        meal_type: MealType,
        consumed_at: OffsetDateTime,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.lock().unwrap().push(DietEntry {
            id,
            user_id,
            food_id: food.id,
            quantity: Grams::new(quantity).unwrap(),
            meal_type,
            consumed_at,
            food: food.clone(),
        });
        id
    }

    fn upsert_user(&self, identity: &SessionUser) -> User {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter().find(|u| u.email == identity.email) {
            return user.clone();
        }
        let user = User {
            id: Uuid::new_v4(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            image: identity.image.clone(),
            age: None,
            weight: None,
            height: None,
            gender: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        user
    }

    fn insert_food(&self, food: &NewFood) -> anyhow::Result<Food> {
        let mut foods = self.foods.lock().unwrap();
        if foods.iter().any(|f| f.name == food.name) {
            return Err(DuplicateFoodName(food.name.clone()).into());
        }
        let food = Food {
            id: Uuid::new_v4(),
            name: food.name.clone(),
            facts: food.facts,
            created_at: OffsetDateTime::now_utc(),
        };
        foods.push(food.clone());
        Ok(food)
    }

    fn insert_entry(&self, entry: &NewDietEntry) -> anyhow::Result<DietEntry> {
        let food = self
            .foods
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == entry.food_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("foreign key violation: food {}", entry.food_id))?;
        let entry = DietEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            food_id: entry.food_id,
            quantity: entry.quantity,
            meal_type: entry.meal_type,
            consumed_at: OffsetDateTime::now_utc(),
            food,
        };
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn ensure_user(&self, identity: &SessionUser) -> anyhow::Result<User> {
        Ok(self.upsert_user(identity))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn upsert_profile(
        &self,
        identity: &SessionUser,
        changes: &ProfileChanges,
    ) -> anyhow::Result<User> {
        self.upsert_user(identity);
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.email == identity.email)
            .ok_or_else(|| anyhow::anyhow!("user vanished"))?;
        user.age = changes.age.or(user.age);
        user.weight = changes.weight.or(user.weight);
        user.height = changes.height.or(user.height);
        user.gender = changes.gender.or(user.gender);
        Ok(user.clone())
    }
}

#[async_trait]
impl FoodRepo for MemoryStore {
    async fn search(&self, query: Option<&str>) -> anyhow::Result<Vec<Food>> {
        let needle = query.map(str::to_lowercase);
        let mut found: Vec<Food> = self
            .foods
            .lock()
            .unwrap()
            .iter()
            .filter(|f| match &needle {
                Some(n) => f.name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        // byte order, matching the catalog's `COLLATE "C"`
        found.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(found)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Food>> {
        Ok(self.foods.lock().unwrap().iter().find(|f| f.id == id).cloned())
    }

    async fn create(&self, food: &NewFood) -> anyhow::Result<Food> {
        self.insert_food(food)
    }

    async fn update(&self, food: &Food) -> anyhow::Result<Option<Food>> {
        let mut foods = self.foods.lock().unwrap();
        if foods.iter().any(|f| f.id != food.id && f.name == food.name) {
            return Err(DuplicateFoodName(food.name.clone()).into());
        }
        let Some(slot) = foods.iter_mut().find(|f| f.id == food.id) else {
            return Ok(None);
        };
        *slot = food.clone();
        Ok(Some(food.clone()))
    }
}

#[async_trait]
impl DietRepo for MemoryStore {
    async fn create(&self, entry: &NewDietEntry) -> anyhow::Result<DietEntry> {
        self.insert_entry(entry)
    }

    async fn list(&self, user_id: Uuid, day: Option<DayRange>) -> anyhow::Result<Vec<DietEntry>> {
        let mut found: Vec<DietEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| day.map_or(true, |d| d.contains(e.consumed_at)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.consumed_at.cmp(&a.consumed_at));
        Ok(found)
    }

    async fn delete_owned(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| !(e.id == entry_id && e.user_id == user_id));
        Ok(entries.len() < before)
    }

    async fn log_new_food(
        &self,
        identity: &SessionUser,
        food: &NewFood,
        quantity: Grams,
        meal_type: MealType,
    ) -> anyhow::Result<(Food, DietEntry)> {
        let food = self.insert_food(food)?;
        let user = self.upsert_user(identity);
        let entry = self.insert_entry(&NewDietEntry {
            user_id: user.id,
            food_id: food.id,
            quantity,
            meal_type,
        })?;
        Ok((food, entry))
    }
}

/// Replays a configured reply and records the prompts it was given.
pub struct CannedGenerator {
    reply: Mutex<Result<String, String>>,
    prompts: Mutex<Vec<String>>,
}

impl Default for CannedGenerator {
    fn default() -> Self {
        Self {
            reply: Mutex::new(Err("no reply configured".into())),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl CannedGenerator {
    pub fn reply_with(&self, text: &str) {
        *self.reply.lock().unwrap() = Ok(text.to_string());
    }

    pub fn fail_with(&self, error: &str) {
        *self.reply.lock().unwrap() = Err(error.to_string());
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.lock().unwrap().clone().map_err(anyhow::Error::msg)
    }
}

/// The full router over [`AppState::fake`]. Requests go out as [`ALICE`] unless stated otherwise.
pub struct TestApp {
    router: Router,
    config: AppConfig,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<CannedGenerator>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let generator = Arc::new(CannedGenerator::default());
        let state = AppState::fake(store.clone(), generator.clone());
        Self {
            config: (*state.config).clone(),
            router: build_app(state),
            store,
            generator,
        }
    }

    async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn request(&self, email: Option<&str>, method: Method, uri: &str, body: Body) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(email) = email {
            let token = test_tokens::sign(&self.config.session, Some(email), 3600);
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        req.body(body).unwrap()
    }

    fn json_body(body: Option<Value>) -> Body {
        body.map_or_else(Body::empty, |v| Body::from(v.to_string()))
    }

    pub async fn send_as(
        &self,
        email: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.call(self.request(Some(email), method, uri, Self::json_body(body)))
            .await
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(ALICE, method, uri, body).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn send_raw(&self, method: Method, uri: &str, raw: &str) -> (StatusCode, Value) {
        self.call(self.request(Some(ALICE), method, uri, Body::from(raw.to_string())))
            .await
    }

    pub async fn anonymous(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.call(self.request(None, method, uri, Self::json_body(body)))
            .await
    }

    pub async fn seed_food(&self, name: &str, calories: f64) -> Food {
        FoodRepo::create(
            self.store.as_ref(),
            &NewFood {
                name: name.to_string(),
                facts: NutritionFacts {
                    calories: Per100g::new(calories),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap()
    }

    pub async fn seed_user(&self, email: &str) -> User {
        self.store.ensure_user(&identity(email)).await.unwrap()
    }
}

use std::sync::Arc;

use crate::ai_food::{GeminiClient, TextGenerator};
use crate::config::AppConfig;
use crate::db;
use crate::diets::{DietRepo, PgDietRepo};
use crate::foods::{FoodRepo, PgFoodRepo};
use crate::users::{PgUserRepo, UserRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub foods: Arc<dyn FoodRepo>,
    pub diets: Arc<dyn DietRepo>,
    pub nutrition_ai: Arc<dyn TextGenerator>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = db::connect(&config).await?;
        db::migrate(&db).await;

        if config.gemini.api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set; AI nutrition lookups will fail");
        }
        let nutrition_ai = Arc::new(GeminiClient::new(&config.gemini)) as Arc<dyn TextGenerator>;

        Ok(Self {
            users: Arc::new(PgUserRepo::new(db.clone())),
            foods: Arc::new(PgFoodRepo::new(db.clone())),
            diets: Arc::new(PgDietRepo::new(db)),
            nutrition_ai,
            config: Arc::new(config),
        })
    }

    /// State backed by one in-memory store and a canned model.
    #[cfg(test)]
    pub fn fake(
        store: Arc<crate::testing::MemoryStore>,
        generator: Arc<crate::testing::CannedGenerator>,
    ) -> Self {
        Self {
            config: Arc::new(crate::testing::test_config()),
            users: store.clone(),
            foods: store.clone(),
            diets: store,
            nutrition_ai: generator,
        }
    }
}

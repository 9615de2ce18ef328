use std::sync::Arc;

use crate::ai::{AiClient, GeminiClient};
use crate::config::AppConfig;
use crate::store::{FileStore, KvStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn KvStore>,
    pub ai: Arc<dyn AiClient>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(FileStore::new(&config.data_dir)?) as Arc<dyn KvStore>;
        let ai = Arc::new(GeminiClient::new(&config.gemini)) as Arc<dyn AiClient>;
        Ok(Self { config, store, ai })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn KvStore>,
        ai: Arc<dyn AiClient>,
    ) -> Self {
        Self { config, store, ai }
    }

    /// Memory-backed state with a canned AI client, for tests.
    pub fn fake() -> Self {
        use crate::ai::{AiError, ExpiryFix, FoodDraft, ReceiptItem, WarrantyDraft};
        use crate::domain::{
            Category, FamilyProfile, InventoryItem, MealPlanDay, Recipe, RecipeIngredient,
        };
        use crate::store::MemoryStore;
        use async_trait::async_trait;
        use time::Date;

        struct FakeAi;

        #[async_trait]
        impl AiClient for FakeAi {
            async fn parse_receipt(
                &self,
                _image_b64: &str,
                today: Date,
            ) -> Result<Vec<ReceiptItem>, AiError> {
                Ok(vec![ReceiptItem {
                    name: "Milk".into(),
                    quantity: 1.0,
                    unit: "l".into(),
                    category: Category::Dairy,
                    expiry_date: crate::domain::format_ymd(today + time::Duration::days(5)),
                }])
            }

            async fn fix_expiry(
                &self,
                inventory: &[InventoryItem],
                today: Date,
            ) -> Result<Vec<ExpiryFix>, AiError> {
                Ok(inventory
                    .iter()
                    .map(|i| ExpiryFix {
                        id: i.id.clone(),
                        expiry_date: crate::domain::format_ymd(today + time::Duration::days(3)),
                    })
                    .collect())
            }

            async fn parse_warranty(
                &self,
                _image_b64: &str,
                today: Date,
            ) -> Result<WarrantyDraft, AiError> {
                Ok(WarrantyDraft {
                    product_name: "Blender".into(),
                    brand: "Acme".into(),
                    purchase_date: crate::domain::format_ymd(today),
                    expiry_date: crate::domain::format_ymd(today + time::Duration::days(365)),
                    model_number: Some("BL-9".into()),
                })
            }

            async fn identify_food(
                &self,
                _image_b64: &str,
                today: Date,
            ) -> Result<FoodDraft, AiError> {
                Ok(FoodDraft {
                    name: "Leftover pasta".into(),
                    ingredients: vec!["pasta".into(), "tomato".into()],
                    expiry_date: crate::domain::format_ymd(today + time::Duration::days(2)),
                    freshness_notes: "Keep refrigerated".into(),
                })
            }

            async fn recipe_for_meal(
                &self,
                meal_title: &str,
                _inventory: &[InventoryItem],
                _profile: &FamilyProfile,
            ) -> Result<Recipe, AiError> {
                Ok(Recipe {
                    id: crate::domain::new_id(),
                    title: meal_title.to_string(),
                    ingredients: vec![RecipeIngredient {
                        name: "milk".into(),
                        amount: "1 cup".into(),
                    }],
                    instructions: vec!["Mix".into(), "Serve".into()],
                    prep_time: "10 min".into(),
                    matching_items: vec!["Milk".into()],
                })
            }

            async fn generate_recipes(
                &self,
                _inventory: &[InventoryItem],
                _profile: &FamilyProfile,
                _today: Date,
            ) -> Result<Vec<Recipe>, AiError> {
                Ok(vec![Recipe {
                    id: crate::domain::new_id(),
                    title: "Fridge surprise".into(),
                    ingredients: vec![],
                    instructions: vec!["Improvise".into()],
                    prep_time: "15 min".into(),
                    matching_items: vec![],
                }])
            }

            async fn generate_meal_plan(
                &self,
                _inventory: &[InventoryItem],
                _profile: &FamilyProfile,
                start: Date,
            ) -> Result<Vec<MealPlanDay>, AiError> {
                Ok((0..7)
                    .map(|offset| {
                        let date = start + time::Duration::days(offset);
                        MealPlanDay {
                            date: crate::domain::format_ymd(date),
                            day_name: date.weekday().to_string(),
                            breakfast: "Oats".into(),
                            lunch: "Soup".into(),
                            dinner: "Pasta".into(),
                        }
                    })
                    .collect())
            }

            async fn compose_alert(
                &self,
                recipient: &str,
                items: &[InventoryItem],
            ) -> Result<String, AiError> {
                Ok(format!(
                    "Hi {recipient}, {} item(s) need attention.",
                    items.len()
                ))
            }
        }

        let config = Arc::new(AppConfig {
            data_dir: "unused".into(),
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            gemini: crate::config::GeminiConfig {
                api_key: "fake".into(),
                flash_model: "fake-flash".into(),
                pro_model: "fake-pro".into(),
                base_url: "https://fake.local".into(),
            },
        });

        Self::from_parts(config, Arc::new(MemoryStore::new()), Arc::new(FakeAi))
    }
}

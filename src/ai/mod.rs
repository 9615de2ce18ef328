use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::{Category, FamilyProfile, InventoryItem, MealPlanDay, Recipe};

mod gemini;

pub use gemini::GeminiClient;

/// Errors at the generative-service boundary. A transport or service
/// failure is distinct from a syntactically valid but empty response; the
/// handlers surface the two differently and neither is fatal.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI service error: {0}")]
    Service(String),
    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI returned an unusable payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("AI response was empty")]
    Empty,
}

impl AiError {
    pub fn is_empty(&self) -> bool {
        matches!(self, AiError::Empty)
    }
}

/// Candidate inventory item extracted from a receipt image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: Category,
    pub expiry_date: String,
}

/// Per-item expiry correction, merged by id into the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryFix {
    pub id: String,
    pub expiry_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarrantyDraft {
    pub product_name: String,
    pub brand: String,
    pub purchase_date: String,
    pub expiry_date: String,
    pub model_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FoodDraft {
    pub name: String,
    pub ingredients: Vec<String>,
    pub expiry_date: String,
    pub freshness_notes: String,
}

/// One typed operation per use case, so the external service can be
/// swapped or faked without touching domain logic. Every call is a single
/// all-or-nothing round trip: no retries, no streaming, no partial results.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Receipt photo to candidate inventory items. An empty list is a valid
    /// outcome ("no items detected"), not an error.
    async fn parse_receipt(&self, image_b64: &str, today: Date) -> Result<Vec<ReceiptItem>, AiError>;

    /// Shelf-life-based expiry corrections for the given inventory.
    async fn fix_expiry(
        &self,
        inventory: &[InventoryItem],
        today: Date,
    ) -> Result<Vec<ExpiryFix>, AiError>;

    /// Warranty document photo to a single asset draft.
    async fn parse_warranty(&self, image_b64: &str, today: Date) -> Result<WarrantyDraft, AiError>;

    /// Food photo to a single identified-food draft.
    async fn identify_food(&self, image_b64: &str, today: Date) -> Result<FoodDraft, AiError>;

    /// Full recipe for a named meal, constrained to the current inventory
    /// with substitutions suggested for missing ingredients.
    async fn recipe_for_meal(
        &self,
        meal_title: &str,
        inventory: &[InventoryItem],
        profile: &FamilyProfile,
    ) -> Result<Recipe, AiError>;

    /// Up to 3 recipes from current stock, soon-expiring items first.
    async fn generate_recipes(
        &self,
        inventory: &[InventoryItem],
        profile: &FamilyProfile,
        today: Date,
    ) -> Result<Vec<Recipe>, AiError>;

    /// 7-day meal plan, one entry per calendar day, every meal realizable
    /// from current stock.
    async fn generate_meal_plan(
        &self,
        inventory: &[InventoryItem],
        profile: &FamilyProfile,
        start: Date,
    ) -> Result<Vec<MealPlanDay>, AiError>;

    /// Short friendly alert email body for items needing attention.
    async fn compose_alert(
        &self,
        recipient: &str,
        items: &[InventoryItem],
    ) -> Result<String, AiError>;
}

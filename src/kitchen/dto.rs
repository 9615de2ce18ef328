use serde::{Deserialize, Serialize};

use crate::domain::{InventoryItem, MealPlanDay, Recipe};

#[derive(Debug, Deserialize)]
pub struct RecipeForMealRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedRecipesResponse {
    pub recipes: Vec<Recipe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CookResponse {
    /// Names of the inventory items the cook consumed.
    pub consumed: Vec<String>,
    pub inventory: Vec<InventoryItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMealPlanRequest {
    #[serde(default)]
    pub start_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MealPlanResponse {
    pub days: Vec<MealPlanDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

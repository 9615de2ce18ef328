use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use time::Date;
use tracing::{debug, instrument};

use crate::ai::{AiClient, AiError, ExpiryFix, FoodDraft, ReceiptItem, WarrantyDraft};
use crate::config::GeminiConfig;
use crate::domain::{format_ymd, FamilyProfile, InventoryItem, MealPlanDay, Recipe};

/// Client for the Gemini `generateContent` API. Extraction-style calls use
/// the flash model, recipe and meal-plan generation the pro model. Output
/// schemas are enforced by the service; locally we only parse.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    flash_model: String,
    pro_model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            flash_model: config.flash_model.clone(),
            pro_model: config.pro_model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// One round trip: post the parts, optionally pin a JSON output schema,
    /// return the first text part of the first candidate.
    #[instrument(skip(self, parts, schema), fields(model = %model))]
    async fn generate(
        &self,
        model: &str,
        parts: Vec<Value>,
        schema: Option<Value>,
    ) -> Result<String, AiError> {
        let mut body = json!({ "contents": [{ "parts": parts }] });
        if let Some(schema) = schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AiError::Service(format!("{status}: {detail}")));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = first_text(&parsed).ok_or(AiError::Empty)?;
        debug!(chars = text.len(), "generateContent response");
        Ok(text)
    }

    /// Array-shaped operations treat an empty response as an empty list;
    /// "nothing found" is a valid outcome there, not a failure.
    async fn generate_list<T: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        parts: Vec<Value>,
        schema: Value,
    ) -> Result<Vec<T>, AiError> {
        match self.generate(model, parts, Some(schema)).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(AiError::Empty) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    text: Option<String>,
}

fn first_text(response: &GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

fn image_part(image_b64: &str) -> Value {
    json!({ "inlineData": { "mimeType": "image/jpeg", "data": image_b64 } })
}

fn inventory_with_units(inventory: &[InventoryItem]) -> String {
    inventory
        .iter()
        .map(|i| format!("{} ({} {})", i.name, i.quantity, i.unit))
        .collect::<Vec<_>>()
        .join(", ")
}

fn recipe_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "STRING" },
            "title": { "type": "STRING" },
            "ingredients": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "amount": { "type": "STRING" }
                    },
                    "required": ["name", "amount"]
                }
            },
            "instructions": { "type": "ARRAY", "items": { "type": "STRING" } },
            "prepTime": { "type": "STRING" },
            "matchingItems": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["id", "title", "ingredients", "instructions", "prepTime", "matchingItems"]
    })
}

#[async_trait]
impl AiClient for GeminiClient {
    async fn parse_receipt(&self, image_b64: &str, today: Date) -> Result<Vec<ReceiptItem>, AiError> {
        let prompt = format!(
            "Extract grocery items from this receipt. Today's date is {}. For each item, \
             identify: name, estimated quantity, unit, and purchase date (today). ALSO, \
             estimate a reasonable expiry date based on standard shelf life for that food \
             type. Map items strictly to these Categories: Dairy, Fruits & Vegetables, \
             Meat & Seafood, Grains & Pasta, Snacks, Beverages, Pantry Essentials, Other. \
             Return as a JSON array.",
            format_ymd(today)
        );
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "name": { "type": "STRING" },
                    "quantity": { "type": "NUMBER" },
                    "unit": { "type": "STRING" },
                    "category": { "type": "STRING" },
                    "expiryDate": { "type": "STRING", "description": "Estimated expiry date YYYY-MM-DD" }
                },
                "required": ["name", "quantity", "unit", "category", "expiryDate"]
            }
        });
        self.generate_list(
            &self.flash_model,
            vec![image_part(image_b64), json!({ "text": prompt })],
            schema,
        )
        .await
    }

    async fn fix_expiry(
        &self,
        inventory: &[InventoryItem],
        today: Date,
    ) -> Result<Vec<ExpiryFix>, AiError> {
        let items_text = inventory
            .iter()
            .map(|i| format!("{}: {} (Cat: {})", i.id, i.name, i.category.label()))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Today is {}. I have an inventory list. Some expiry dates might be wrong. \
             Please suggest the most accurate YYYY-MM-DD expiry date for each ID based on \
             common shelf life from today. Return as JSON array of objects with 'id' and \
             'expiryDate'.\n{items_text}",
            format_ymd(today)
        );
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "id": { "type": "STRING" },
                    "expiryDate": { "type": "STRING" }
                },
                "required": ["id", "expiryDate"]
            }
        });
        self.generate_list(&self.flash_model, vec![json!({ "text": prompt })], schema)
            .await
    }

    async fn parse_warranty(&self, image_b64: &str, today: Date) -> Result<WarrantyDraft, AiError> {
        let prompt = format!(
            "Extract product warranty info. Today is {}. Identify the Product Name, Brand, \
             Purchase Date, Model Number, and Warranty Expiry Date. Return as JSON.",
            format_ymd(today)
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "productName": { "type": "STRING" },
                "brand": { "type": "STRING" },
                "purchaseDate": { "type": "STRING" },
                "expiryDate": { "type": "STRING" },
                "modelNumber": { "type": "STRING" }
            },
            "required": ["productName", "brand", "purchaseDate", "expiryDate"]
        });
        let text = self
            .generate(
                &self.flash_model,
                vec![image_part(image_b64), json!({ "text": prompt })],
                Some(schema),
            )
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn identify_food(&self, image_b64: &str, today: Date) -> Result<FoodDraft, AiError> {
        let prompt = format!(
            "Identify the food in this photo. Today's date is {}. Provide the name, \
             ingredients, and estimate a SAFE expiry date based on today. Also provide \
             brief freshness notes. Return JSON.",
            format_ymd(today)
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "ingredients": { "type": "ARRAY", "items": { "type": "STRING" } },
                "expiryDate": { "type": "STRING" },
                "freshnessNotes": { "type": "STRING" }
            },
            "required": ["name", "ingredients", "expiryDate", "freshnessNotes"]
        });
        let text = self
            .generate(
                &self.flash_model,
                vec![image_part(image_b64), json!({ "text": prompt })],
                Some(schema),
            )
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn recipe_for_meal(
        &self,
        meal_title: &str,
        inventory: &[InventoryItem],
        profile: &FamilyProfile,
    ) -> Result<Recipe, AiError> {
        let prompt = format!(
            "Detailed recipe for: \"{meal_title}\". Family Size: {}. Available Inventory: {}. \
             Diet: {}. STRICT CONSTRAINT: You MUST only use ingredients currently in the \
             inventory. If an item is missing, suggest a clever substitute using an \
             ingredient that IS in the inventory. Return as JSON.",
            profile.size,
            inventory_with_units(inventory),
            profile.preference.label(),
        );
        let text = self
            .generate(
                &self.pro_model,
                vec![json!({ "text": prompt })],
                Some(recipe_schema()),
            )
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn generate_recipes(
        &self,
        inventory: &[InventoryItem],
        profile: &FamilyProfile,
        today: Date,
    ) -> Result<Vec<Recipe>, AiError> {
        let inventory_text = inventory
            .iter()
            .map(|i| format!("{} (exp: {})", i.name, i.expiry_date))
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = format!(
            "Suggest 3 recipes using ONLY these ingredients: {inventory_text}. Today: {}. \
             Scale for {} people. Prioritize using items expiring soonest. Do not include \
             ingredients NOT in the list. Return JSON array.",
            format_ymd(today),
            profile.size,
        );
        let schema = json!({ "type": "ARRAY", "items": recipe_schema() });
        self.generate_list(&self.pro_model, vec![json!({ "text": prompt })], schema)
            .await
    }

    async fn generate_meal_plan(
        &self,
        inventory: &[InventoryItem],
        profile: &FamilyProfile,
        start: Date,
    ) -> Result<Vec<MealPlanDay>, AiError> {
        let prompt = format!(
            "Create a 7-day healthy meal plan starting {} using ONLY these ingredients: {}. \
             Family of {}. Diet: {}. STRICT CONSTRAINT: Every meal must be 100% cookable \
             with available stock. Focus on expiring items. Return JSON array.",
            format_ymd(start),
            inventory_with_units(inventory),
            profile.size,
            profile.preference.label(),
        );
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "date": { "type": "STRING" },
                    "dayName": { "type": "STRING" },
                    "breakfast": { "type": "STRING" },
                    "lunch": { "type": "STRING" },
                    "dinner": { "type": "STRING" }
                },
                "required": ["date", "dayName", "breakfast", "lunch", "dinner"]
            }
        });
        self.generate_list(&self.pro_model, vec![json!({ "text": prompt })], schema)
            .await
    }

    async fn compose_alert(
        &self,
        recipient: &str,
        items: &[InventoryItem],
    ) -> Result<String, AiError> {
        let names = inventory_with_units(items);
        let prompt = format!(
            "Write a short friendly email telling {recipient} these items need attention: {names}."
        );
        // Free-text output, no schema.
        self.generate(&self.flash_model, vec![json!({ "text": prompt })], None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_text_picks_the_first_non_empty_part() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": { "parts": [{ "text": "  " }, { "text": "[{\"id\":\"a\"}]" }] }
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(first_text(&response).as_deref(), Some("[{\"id\":\"a\"}]"));
    }

    #[test]
    fn first_text_is_none_for_empty_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(first_text(&response).is_none());

        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":null}]}"#).unwrap();
        assert!(first_text(&response).is_none());
    }

    #[test]
    fn receipt_items_parse_from_schema_shaped_json() {
        let items: Vec<ReceiptItem> = serde_json::from_str(
            r#"[{"name":"Milk","quantity":1,"unit":"l","category":"Dairy","expiryDate":"2026-09-01"}]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, crate::domain::Category::Dairy);
    }

    #[test]
    fn warranty_draft_tolerates_missing_fields() {
        let draft: WarrantyDraft = serde_json::from_str("{}").unwrap();
        assert!(draft.product_name.is_empty());
        assert!(draft.model_number.is_none());
    }

    #[test]
    fn recipe_schema_requires_the_wire_fields() {
        let schema = recipe_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        for field in ["id", "title", "ingredients", "instructions", "prepTime", "matchingItems"] {
            assert!(required.contains(&field), "missing {field}");
        }
    }
}

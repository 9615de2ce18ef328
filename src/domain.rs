use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, OffsetDateTime};

/// Inventory categories. The string forms are part of the persisted JSON
/// shape and of the AI output contract, so they are fixed here; an unknown
/// label deserializes as Other rather than failing the whole blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Dairy,
    Fruits,
    Meat,
    Grains,
    Snacks,
    Beverages,
    Pantry,
    Warranty,
    Other,
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Dairy" => Category::Dairy,
            "Fruits & Vegetables" => Category::Fruits,
            "Meat & Seafood" => Category::Meat,
            "Grains & Pasta" => Category::Grains,
            "Snacks" => Category::Snacks,
            "Beverages" => Category::Beverages,
            "Pantry Essentials" => Category::Pantry,
            "Warranty & Assets" => Category::Warranty,
            _ => Category::Other,
        }
    }
}

impl From<Category> for String {
    fn from(cat: Category) -> Self {
        cat.label().to_string()
    }
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Dairy,
        Category::Fruits,
        Category::Meat,
        Category::Grains,
        Category::Snacks,
        Category::Beverages,
        Category::Pantry,
        Category::Warranty,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Dairy => "Dairy",
            Category::Fruits => "Fruits & Vegetables",
            Category::Meat => "Meat & Seafood",
            Category::Grains => "Grains & Pasta",
            Category::Snacks => "Snacks",
            Category::Beverages => "Beverages",
            Category::Pantry => "Pantry Essentials",
            Category::Warranty => "Warranty & Assets",
            Category::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DietPreference {
    #[serde(rename = "Vegetarian")]
    Vegetarian,
    #[serde(rename = "Non-Vegetarian")]
    NonVegetarian,
    #[serde(rename = "Vegan")]
    Vegan,
}

impl DietPreference {
    pub fn label(&self) -> &'static str {
        match self {
            DietPreference::Vegetarian => "Vegetarian",
            DietPreference::NonVegetarian => "Non-Vegetarian",
            DietPreference::Vegan => "Vegan",
        }
    }
}

/// A pantry item. `expiry_date` is meaningful only outside the Warranty
/// category; dates are calendar-day strings (YYYY-MM-DD).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub quantity: f64,
    pub unit: String,
    pub purchase_date: String,
    pub expiry_date: String,
    #[serde(default)]
    pub min_stock_level: Option<f64>,
}

impl InventoryItem {
    /// Item-specific low-stock threshold, defaulting to 2 when unset.
    pub fn min_stock(&self) -> f64 {
        self.min_stock_level.unwrap_or(2.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedFood {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<String>,
    pub freshness_notes: String,
    pub expiry_date: String,
    pub identified_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyAsset {
    pub id: String,
    pub product_name: String,
    pub brand: String,
    pub purchase_date: String,
    pub expiry_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteRecord {
    pub id: String,
    pub item_name: String,
    pub date: String,
    pub quantity: f64,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyProfile {
    pub size: u32,
    pub preference: DietPreference,
    pub allergies: Vec<String>,
    pub email_alerts: bool,
    #[serde(default)]
    pub user_email: String,
}

impl FamilyProfile {
    pub fn default_for(email: &str) -> Self {
        Self {
            size: 2,
            preference: DietPreference::NonVegetarian,
            allergies: Vec::new(),
            email_alerts: true,
            user_email: email.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub name: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
    pub prep_time: String,
    #[serde(default)]
    pub matching_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanDay {
    pub date: String,
    pub day_name: String,
    pub breakfast: String,
    pub lunch: String,
    pub dinner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryItem {
    pub id: String,
    pub name: String,
    pub qty: f64,
    pub unit: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailStatus {
    Sent,
    Delivered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLog {
    pub id: String,
    pub subject: String,
    pub body: String,
    pub date: String,
    pub status: EmailStatus,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parses a YYYY-MM-DD calendar date; anything unparseable yields None and
/// the caller skips the record, mirroring how the persisted shapes treat
/// bad dates.
pub fn parse_ymd(s: &str) -> Option<Date> {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(s.trim(), fmt).ok()
}

pub fn format_ymd(date: Date) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    date.format(fmt).unwrap_or_default()
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn category_labels_round_trip_through_json() {
        for cat in Category::ALL {
            let json = serde_json::to_string(&cat).unwrap();
            assert_eq!(json, format!("\"{}\"", cat.label()));
            let back: Category = serde_json::from_str(&json).unwrap();
            assert_eq!(back, cat);
        }
    }

    #[test]
    fn unknown_category_falls_back_to_other() {
        let cat: Category = serde_json::from_str("\"Mystery Goods\"").unwrap();
        assert_eq!(cat, Category::Other);
    }

    #[test]
    fn inventory_item_uses_camel_case_keys() {
        let item = InventoryItem {
            id: "i1".into(),
            name: "Milk".into(),
            category: Category::Dairy,
            quantity: 1.0,
            unit: "l".into(),
            purchase_date: "2026-08-20".into(),
            expiry_date: "2026-08-27".into(),
            min_stock_level: Some(2.0),
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"expiryDate\""));
        assert!(json.contains("\"minStockLevel\""));
        assert!(json.contains("\"purchaseDate\""));
    }

    #[test]
    fn min_stock_defaults_to_two_when_unset() {
        let item: InventoryItem = serde_json::from_str(
            r#"{"id":"i1","name":"Eggs","category":"Dairy","quantity":6,
                "unit":"pcs","purchaseDate":"2026-08-20","expiryDate":"2026-09-01"}"#,
        )
        .unwrap();
        assert_eq!(item.min_stock(), 2.0);
    }

    #[test]
    fn parse_ymd_accepts_dates_and_rejects_garbage() {
        assert_eq!(parse_ymd("2026-08-25"), Some(date!(2026 - 08 - 25)));
        assert_eq!(parse_ymd(" 2026-08-25 "), Some(date!(2026 - 08 - 25)));
        assert_eq!(parse_ymd("soon"), None);
        assert_eq!(parse_ymd(""), None);
    }

    #[test]
    fn format_ymd_is_zero_padded() {
        assert_eq!(format_ymd(date!(2026 - 01 - 05)), "2026-01-05");
    }

    #[test]
    fn email_status_serializes_as_plain_strings() {
        assert_eq!(serde_json::to_string(&EmailStatus::Sent).unwrap(), "\"Sent\"");
        assert_eq!(
            serde_json::to_string(&EmailStatus::Delivered).unwrap(),
            "\"Delivered\""
        );
    }

    #[test]
    fn default_profile_carries_the_email() {
        let profile = FamilyProfile::default_for("a@b.com");
        assert_eq!(profile.size, 2);
        assert_eq!(profile.preference, DietPreference::NonVegetarian);
        assert!(profile.allergies.is_empty());
        assert!(profile.email_alerts);
        assert_eq!(profile.user_email, "a@b.com");
    }
}

use serde::{Deserialize, Serialize};

use crate::ai::ReceiptItem;
use crate::domain::{Category, InventoryItem};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItemRequest {
    pub name: String,
    pub category: Category,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub purchase_date: Option<String>,
    pub expiry_date: String,
    #[serde(default)]
    pub min_stock_level: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub min_stock_level: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveParams {
    /// When true the removal is logged as waste.
    #[serde(default)]
    pub wasted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptScanRequest {
    pub image_b64: String,
}

#[derive(Debug, Serialize)]
pub struct ReceiptScanResponse {
    pub items: Vec<ReceiptItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Serialize)]
pub struct FixExpiryResponse {
    pub updated: usize,
    pub inventory: Vec<InventoryItem>,
}

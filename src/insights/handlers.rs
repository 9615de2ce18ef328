use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::{error, instrument};

use crate::{
    auth::AuthUser,
    domain::{today, Category, InventoryItem, WasteRecord},
    state::AppState,
    store::Session,
    views::{self, CategorySlice},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/analytics", get(analytics))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_items: usize,
    pub expiring_soon: Vec<InventoryItem>,
    pub low_stock: Vec<InventoryItem>,
    pub asset_count: usize,
    pub monitored_food_count: usize,
    pub waste_entry_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub stock_by_category: Vec<CategorySlice>,
    pub waste_by_category: Vec<CategorySlice>,
    pub waste_history: Vec<WasteRecord>,
}

#[instrument(skip(state, user))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<DashboardResponse>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let now = today();
    let expiring_soon: Vec<InventoryItem> = views::expiring_soon(&session.inventory, now)
        .into_iter()
        .cloned()
        .collect();
    let low_stock: Vec<InventoryItem> = views::low_stock(&session.inventory)
        .into_iter()
        .cloned()
        .collect();
    let total_items = session
        .inventory
        .iter()
        .filter(|i| i.category != Category::Warranty)
        .count();

    Ok(Json(DashboardResponse {
        total_items,
        expiring_soon,
        low_stock,
        asset_count: session.asset_vault.len(),
        monitored_food_count: session.food_monitor.len(),
        waste_entry_count: session.waste_history.len(),
    }))
}

#[instrument(skip(state, user))]
pub async fn analytics(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<AnalyticsResponse>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    Ok(Json(AnalyticsResponse {
        stock_by_category: views::stock_by_category(&session.inventory),
        waste_by_category: views::waste_by_category(&session.waste_history),
        waste_history: session.waste_history,
    }))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;

    #[tokio::test]
    async fn dashboard_excludes_warranty_from_totals() {
        let state = AppState::fake();
        let email = "insights@example.com";

        let mut session = Session::open(state.store.as_ref(), email).await.unwrap();
        for (name, category) in [
            ("Milk", Category::Dairy),
            ("Blender", Category::Warranty),
        ] {
            session.inventory.push(InventoryItem {
                id: crate::domain::new_id(),
                name: name.into(),
                category,
                quantity: 5.0,
                unit: "pcs".into(),
                purchase_date: "2026-08-20".into(),
                expiry_date: "2099-01-01".into(),
                min_stock_level: Some(1.0),
            });
        }
        session.save_inventory(state.store.as_ref()).await.unwrap();

        let response = dashboard(
            State(state),
            AuthUser(Identity {
                email: email.into(),
                name: "T".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.total_items, 1);
        assert!(response.0.expiring_soon.is_empty());
        assert!(response.0.low_stock.is_empty());
    }
}

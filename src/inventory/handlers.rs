use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    ai::AiError,
    auth::AuthUser,
    domain::{format_ymd, new_id, today, InventoryItem, WasteRecord},
    state::AppState,
    store::Session,
};

use super::dto::{
    FixExpiryResponse, ImportRequest, NewItemRequest, ReceiptScanRequest, ReceiptScanResponse,
    RemoveParams, UpdateItemRequest,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/inventory", get(list_items))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", post(add_item))
        .route("/inventory/:id", put(update_item))
        .route("/inventory/:id", delete(remove_item))
        .route("/inventory/receipt-scan", post(scan_receipt))
        .route("/inventory/import", post(import_items))
        .route("/inventory/fix-expiry", post(fix_expiry))
}

#[instrument(skip(state, user))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<InventoryItem>>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    Ok(Json(session.inventory))
}

#[instrument(skip(state, user, payload))]
pub async fn add_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<NewItemRequest>,
) -> Result<(StatusCode, Json<InventoryItem>), (StatusCode, String)> {
    validate_name_and_quantity(&payload.name, payload.quantity)?;

    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let item = InventoryItem {
        id: new_id(),
        name: payload.name.trim().to_string(),
        category: payload.category,
        quantity: payload.quantity,
        unit: payload.unit,
        purchase_date: payload.purchase_date.unwrap_or_else(|| format_ymd(today())),
        expiry_date: payload.expiry_date,
        min_stock_level: payload.min_stock_level,
    };
    session.inventory.push(item.clone());
    session
        .save_inventory(state.store.as_ref())
        .await
        .map_err(internal)?;

    info!(item = %item.name, "inventory item added");
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<InventoryItem>, (StatusCode, String)> {
    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let item = session
        .inventory
        .iter_mut()
        .find(|i| i.id == id)
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(field_errors(&["name"]));
        }
        item.name = name.trim().to_string();
    }
    if let Some(quantity) = payload.quantity {
        if quantity < 0.0 {
            return Err(field_errors(&["quantity"]));
        }
        item.quantity = quantity;
    }
    if let Some(category) = payload.category {
        item.category = category;
    }
    if let Some(unit) = payload.unit {
        item.unit = unit;
    }
    if let Some(expiry_date) = payload.expiry_date {
        item.expiry_date = expiry_date;
    }
    if payload.min_stock_level.is_some() {
        item.min_stock_level = payload.min_stock_level;
    }
    let updated = item.clone();

    session
        .save_inventory(state.store.as_ref())
        .await
        .map_err(internal)?;
    Ok(Json(updated))
}

/// Removing with `?wasted=true` appends exactly one waste record carrying
/// the item's name, category and remaining quantity.
#[instrument(skip(state, user))]
pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Query(params): Query<RemoveParams>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let position = session
        .inventory
        .iter()
        .position(|i| i.id == id)
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))?;
    let item = session.inventory.remove(position);

    if params.wasted {
        session.waste_history.push(WasteRecord {
            id: new_id(),
            item_name: item.name.clone(),
            date: format_ymd(today()),
            quantity: item.quantity,
            category: item.category,
        });
        session
            .save_waste_history(state.store.as_ref())
            .await
            .map_err(internal)?;
        info!(item = %item.name, "inventory item wasted");
    } else {
        info!(item = %item.name, "inventory item used up");
    }

    session
        .save_inventory(state.store.as_ref())
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Receipt OCR. Returns candidate items only; nothing is persisted until
/// the caller confirms through the import endpoint.
#[instrument(skip(state, user, payload))]
pub async fn scan_receipt(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ReceiptScanRequest>,
) -> Result<Json<ReceiptScanResponse>, (StatusCode, String)> {
    if payload.image_b64.is_empty() {
        return Err(field_errors(&["imageB64"]));
    }

    let items = state
        .ai
        .parse_receipt(&payload.image_b64, today())
        .await
        .map_err(ai_failed)?;

    let message = if items.is_empty() {
        warn!(email = %user.email, "receipt scan found no items");
        Some("No items detected".to_string())
    } else {
        None
    };
    Ok(Json(ReceiptScanResponse { items, message }))
}

#[instrument(skip(state, user, payload))]
pub async fn import_items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ImportRequest>,
) -> Result<(StatusCode, Json<Vec<InventoryItem>>), (StatusCode, String)> {
    if payload.items.is_empty() {
        return Err(field_errors(&["items"]));
    }

    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let purchase_date = format_ymd(today());
    let mut added = Vec::with_capacity(payload.items.len());
    for candidate in payload.items {
        if candidate.name.trim().is_empty() {
            continue;
        }
        let item = InventoryItem {
            id: new_id(),
            name: candidate.name.trim().to_string(),
            category: candidate.category,
            quantity: candidate.quantity,
            unit: candidate.unit,
            purchase_date: purchase_date.clone(),
            expiry_date: candidate.expiry_date,
            min_stock_level: None,
        };
        session.inventory.push(item.clone());
        added.push(item);
    }

    session
        .save_inventory(state.store.as_ref())
        .await
        .map_err(internal)?;
    info!(count = added.len(), "receipt items imported");
    Ok((StatusCode::CREATED, Json(added)))
}

/// Asks the AI for per-id expiry corrections and merges them by id into
/// the stored inventory; ids the AI does not mention are left untouched.
#[instrument(skip(state, user))]
pub async fn fix_expiry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<FixExpiryResponse>, (StatusCode, String)> {
    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    if session.inventory.is_empty() {
        return Ok(Json(FixExpiryResponse {
            updated: 0,
            inventory: session.inventory,
        }));
    }

    let fixes = state
        .ai
        .fix_expiry(&session.inventory, today())
        .await
        .map_err(ai_failed)?;

    let mut updated = 0;
    for fix in fixes {
        if let Some(item) = session.inventory.iter_mut().find(|i| i.id == fix.id) {
            item.expiry_date = fix.expiry_date;
            updated += 1;
        }
    }
    if updated > 0 {
        session
            .save_inventory(state.store.as_ref())
            .await
            .map_err(internal)?;
    }

    info!(updated, "expiry dates corrected");
    Ok(Json(FixExpiryResponse {
        updated,
        inventory: session.inventory,
    }))
}

fn validate_name_and_quantity(name: &str, quantity: f64) -> Result<(), (StatusCode, String)> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push("name");
    }
    if quantity <= 0.0 {
        errors.push("quantity");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(field_errors(&errors))
    }
}

fn field_errors(fields: &[&str]) -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        serde_json::json!({ "errors": fields }).to_string(),
    )
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn ai_failed(e: AiError) -> (StatusCode, String) {
    error!(error = %e, "AI gateway call failed");
    (StatusCode::BAD_GATEWAY, format!("AI service unavailable: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_flags_each_bad_field() {
        let (status, body) = validate_name_and_quantity("  ", 0.0).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("name"));
        assert!(body.contains("quantity"));

        assert!(validate_name_and_quantity("Milk", 1.0).is_ok());
    }

    #[tokio::test]
    async fn wasted_removal_appends_exactly_one_record() {
        let state = AppState::fake();
        let email = "waste@example.com";

        let mut session = Session::open(state.store.as_ref(), email).await.unwrap();
        session.inventory.push(InventoryItem {
            id: "i1".into(),
            name: "Milk".into(),
            category: crate::domain::Category::Dairy,
            quantity: 2.0,
            unit: "l".into(),
            purchase_date: "2026-08-20".into(),
            expiry_date: "2026-08-24".into(),
            min_stock_level: None,
        });
        session.save_inventory(state.store.as_ref()).await.unwrap();

        let status = remove_item(
            State(state.clone()),
            AuthUser(crate::auth::Identity {
                email: email.into(),
                name: "W".into(),
            }),
            Path("i1".to_string()),
            Query(RemoveParams { wasted: true }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let session = Session::open(state.store.as_ref(), email).await.unwrap();
        assert!(session.inventory.is_empty());
        assert_eq!(session.waste_history.len(), 1);
        let record = &session.waste_history[0];
        assert_eq!(record.item_name, "Milk");
        assert_eq!(record.quantity, 2.0);
        assert_eq!(record.category, crate::domain::Category::Dairy);
    }

    #[tokio::test]
    async fn fix_expiry_merges_by_id() {
        let state = AppState::fake();
        let email = "fix@example.com";

        let mut session = Session::open(state.store.as_ref(), email).await.unwrap();
        session.inventory.push(InventoryItem {
            id: "i1".into(),
            name: "Milk".into(),
            category: crate::domain::Category::Dairy,
            quantity: 1.0,
            unit: "l".into(),
            purchase_date: "2026-08-20".into(),
            expiry_date: "2020-01-01".into(),
            min_stock_level: None,
        });
        session.save_inventory(state.store.as_ref()).await.unwrap();

        let response = fix_expiry(
            State(state.clone()),
            AuthUser(crate::auth::Identity {
                email: email.into(),
                name: "F".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.updated, 1);
        assert_ne!(response.0.inventory[0].expiry_date, "2020-01-01");
    }
}

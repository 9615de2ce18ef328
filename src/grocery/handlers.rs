use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::{
    auth::AuthUser,
    domain::{format_ymd, new_id, today, GroceryItem},
    state::AppState,
    store::Session,
    views,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groceries", get(list_groceries))
        .route("/groceries", post(add_grocery))
        .route("/groceries/:id", delete(remove_grocery))
        .route("/groceries/export", get(export_groceries))
}

/// Saved list plus the auto-suggestions derived from current inventory.
#[derive(Debug, Serialize)]
pub struct GroceryListResponse {
    pub saved: Vec<GroceryItem>,
    pub suggestions: Vec<GroceryItem>,
}

#[derive(Debug, Deserialize)]
pub struct AddGroceryRequest {
    pub name: String,
    pub qty: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "manual_reason")]
    pub reason: String,
}

fn default_unit() -> String {
    "pcs".into()
}

fn manual_reason() -> String {
    "Manual".into()
}

#[instrument(skip(state, user))]
pub async fn list_groceries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<GroceryListResponse>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    let suggestions = views::suggest_groceries(&session.inventory, &session.grocery_list, today());
    Ok(Json(GroceryListResponse {
        saved: session.grocery_list,
        suggestions,
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn add_grocery(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<AddGroceryRequest>,
) -> Result<(StatusCode, Json<GroceryItem>), (StatusCode, String)> {
    let mut errors = Vec::new();
    if payload.name.trim().is_empty() {
        errors.push("name");
    }
    if payload.qty <= 0.0 {
        errors.push("qty");
    }
    if !errors.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "errors": errors }).to_string(),
        ));
    }

    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let entry = GroceryItem {
        id: new_id(),
        name: payload.name.trim().to_string(),
        qty: payload.qty,
        unit: payload.unit,
        reason: payload.reason,
    };
    session.grocery_list.insert(0, entry.clone());
    session
        .save_grocery_list(state.store.as_ref())
        .await
        .map_err(internal)?;

    info!(item = %entry.name, "grocery added");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state, user))]
pub async fn remove_grocery(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let before = session.grocery_list.len();
    session.grocery_list.retain(|g| g.id != id);
    if session.grocery_list.len() == before {
        return Err((StatusCode::NOT_FOUND, "Entry not found".into()));
    }

    session
        .save_grocery_list(state.store.as_ref())
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Plain-text rendering of the saved list, one line per entry.
#[instrument(skip(state, user))]
pub async fn export_groceries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let body = session
        .grocery_list
        .iter()
        .map(|g| format!("{}: {} {} ({})", g.name, g.qty, g.unit, g.reason))
        .collect::<Vec<_>>()
        .join("\n");
    let filename = format!("smart-grocery-list-{}.txt", format_ymd(today()));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::domain::{Category, InventoryItem};

    fn auth(email: &str) -> AuthUser {
        AuthUser(Identity {
            email: email.into(),
            name: "T".into(),
        })
    }

    #[tokio::test]
    async fn saved_entry_suppresses_its_suggestion() {
        let state = AppState::fake();
        let email = "grocery@example.com";

        let mut session = Session::open(state.store.as_ref(), email).await.unwrap();
        session.inventory.push(InventoryItem {
            id: "i1".into(),
            name: "Milk".into(),
            category: Category::Dairy,
            quantity: 1.0,
            unit: "l".into(),
            purchase_date: "2026-08-20".into(),
            expiry_date: "2099-01-01".into(),
            min_stock_level: Some(2.0),
        });
        session.save_inventory(state.store.as_ref()).await.unwrap();

        let listed = list_groceries(State(state.clone()), auth(email)).await.unwrap();
        assert_eq!(listed.0.suggestions.len(), 1);
        assert_eq!(listed.0.suggestions[0].reason, "Auto: Low Stock");

        add_grocery(
            State(state.clone()),
            auth(email),
            Json(AddGroceryRequest {
                name: "milk".into(),
                qty: 2.0,
                unit: "l".into(),
                reason: "Auto: Low Stock".into(),
            }),
        )
        .await
        .unwrap();

        let listed = list_groceries(State(state.clone()), auth(email)).await.unwrap();
        assert!(listed.0.suggestions.is_empty());
        assert_eq!(listed.0.saved.len(), 1);
    }

    #[tokio::test]
    async fn add_rejects_blank_name_and_non_positive_qty() {
        let state = AppState::fake();
        let err = add_grocery(
            State(state),
            auth("grocery2@example.com"),
            Json(AddGroceryRequest {
                name: " ".into(),
                qty: 0.0,
                unit: "pcs".into(),
                reason: "Manual".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("name"));
        assert!(err.1.contains("qty"));
    }
}

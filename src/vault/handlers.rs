use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{
    ai::{AiError, WarrantyDraft},
    auth::AuthUser,
    domain::{new_id, today, WarrantyAsset},
    state::AppState,
    store::Session,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vault", get(list_assets))
        .route("/vault", post(add_asset))
        .route("/vault/scan", post(scan_warranty))
        .route("/vault/:id", delete(remove_asset))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyScanRequest {
    pub image_b64: String,
}

/// Scan result: a draft for the user to confirm, never persisted directly.
#[derive(Debug, Serialize)]
pub struct WarrantyScanResponse {
    pub draft: Option<WarrantyDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAssetRequest {
    pub product_name: String,
    pub brand: String,
    pub purchase_date: String,
    pub expiry_date: String,
    #[serde(default)]
    pub model_number: Option<String>,
}

#[instrument(skip(state, user))]
pub async fn list_assets(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<WarrantyAsset>>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    Ok(Json(session.asset_vault))
}

#[instrument(skip(state, user, payload))]
pub async fn scan_warranty(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<WarrantyScanRequest>,
) -> Result<Json<WarrantyScanResponse>, (StatusCode, String)> {
    if payload.image_b64.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "imageB64 is required".into()));
    }

    let draft = match state.ai.parse_warranty(&payload.image_b64, today()).await {
        Ok(d) => d,
        Err(e) if e.is_empty() => {
            warn!(email = %user.email, "warranty scan found nothing");
            return Ok(Json(WarrantyScanResponse {
                draft: None,
                message: Some("No warranty details found".into()),
            }));
        }
        Err(e) => return Err(ai_failed(e)),
    };
    if draft.product_name.trim().is_empty() {
        return Ok(Json(WarrantyScanResponse {
            draft: None,
            message: Some("No warranty details found".into()),
        }));
    }

    Ok(Json(WarrantyScanResponse {
        draft: Some(draft),
        message: None,
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn add_asset(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<AddAssetRequest>,
) -> Result<(StatusCode, Json<WarrantyAsset>), (StatusCode, String)> {
    if payload.product_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "errors": ["productName"] }).to_string(),
        ));
    }

    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let asset = WarrantyAsset {
        id: new_id(),
        product_name: payload.product_name.trim().to_string(),
        brand: payload.brand,
        purchase_date: payload.purchase_date,
        expiry_date: payload.expiry_date,
        model_number: payload.model_number,
    };
    session.asset_vault.push(asset.clone());
    session
        .save_asset_vault(state.store.as_ref())
        .await
        .map_err(internal)?;

    info!(asset = %asset.product_name, "warranty asset added");
    Ok((StatusCode::CREATED, Json(asset)))
}

#[instrument(skip(state, user))]
pub async fn remove_asset(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let before = session.asset_vault.len();
    session.asset_vault.retain(|a| a.id != id);
    if session.asset_vault.len() == before {
        return Err((StatusCode::NOT_FOUND, "Asset not found".into()));
    }

    session
        .save_asset_vault(state.store.as_ref())
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
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
    use crate::auth::Identity;

    fn auth(email: &str) -> AuthUser {
        AuthUser(Identity {
            email: email.into(),
            name: "T".into(),
        })
    }

    #[tokio::test]
    async fn scan_returns_a_draft_without_persisting() {
        let state = AppState::fake();
        let email = "vault@example.com";

        let response = scan_warranty(
            State(state.clone()),
            auth(email),
            Json(WarrantyScanRequest {
                image_b64: "abc".into(),
            }),
        )
        .await
        .unwrap();
        assert!(response.0.draft.is_some());

        // Nothing persisted until the asset is explicitly added.
        let session = Session::open(state.store.as_ref(), email).await.unwrap();
        assert!(session.asset_vault.is_empty());
    }

    #[tokio::test]
    async fn add_then_remove_round_trips() {
        let state = AppState::fake();
        let email = "vault2@example.com";

        let (status, Json(asset)) = add_asset(
            State(state.clone()),
            auth(email),
            Json(AddAssetRequest {
                product_name: "Blender".into(),
                brand: "Acme".into(),
                purchase_date: "2026-08-01".into(),
                expiry_date: "2027-08-01".into(),
                model_number: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let removed = remove_asset(State(state.clone()), auth(email), Path(asset.id))
            .await
            .unwrap();
        assert_eq!(removed, StatusCode::NO_CONTENT);
    }
}

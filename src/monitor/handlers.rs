use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{
    ai::AiError,
    auth::AuthUser,
    domain::{new_id, now_rfc3339, today, IdentifiedFood},
    state::AppState,
    store::Session,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/food-monitor", get(list_foods))
        .route("/food-monitor/scan", post(scan_food))
        .route("/food-monitor/:id", delete(remove_food))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodScanRequest {
    pub image_b64: String,
}

#[derive(Debug, Serialize)]
pub struct FoodScanResponse {
    pub food: Option<IdentifiedFood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[instrument(skip(state, user))]
pub async fn list_foods(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<IdentifiedFood>>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    Ok(Json(session.food_monitor))
}

/// Identifies the food in a photo and appends it to the monitor log. An
/// empty identification is reported as a notice, not an error, and nothing
/// is persisted in that case.
#[instrument(skip(state, user, payload))]
pub async fn scan_food(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<FoodScanRequest>,
) -> Result<Json<FoodScanResponse>, (StatusCode, String)> {
    if payload.image_b64.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "imageB64 is required".into()));
    }

    let draft = match state.ai.identify_food(&payload.image_b64, today()).await {
        Ok(d) => d,
        Err(e) if e.is_empty() => {
            warn!(email = %user.email, "food scan identified nothing");
            return Ok(Json(FoodScanResponse {
                food: None,
                message: Some("No food identified".into()),
            }));
        }
        Err(e) => return Err(ai_failed(e)),
    };
    if draft.name.trim().is_empty() {
        return Ok(Json(FoodScanResponse {
            food: None,
            message: Some("No food identified".into()),
        }));
    }

    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    let entry = IdentifiedFood {
        id: new_id(),
        name: draft.name,
        ingredients: draft.ingredients,
        freshness_notes: draft.freshness_notes,
        expiry_date: draft.expiry_date,
        identified_at: now_rfc3339(),
    };
    session.food_monitor.insert(0, entry.clone());
    session
        .save_food_monitor(state.store.as_ref())
        .await
        .map_err(internal)?;

    info!(food = %entry.name, "food identified");
    Ok(Json(FoodScanResponse {
        food: Some(entry),
        message: None,
    }))
}

#[instrument(skip(state, user))]
pub async fn remove_food(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let before = session.food_monitor.len();
    session.food_monitor.retain(|f| f.id != id);
    if session.food_monitor.len() == before {
        return Err((StatusCode::NOT_FOUND, "Entry not found".into()));
    }

    session
        .save_food_monitor(state.store.as_ref())
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
    async fn scan_appends_newest_first() {
        let state = AppState::fake();
        let email = "monitor@example.com";

        let response = scan_food(
            State(state.clone()),
            auth(email),
            Json(FoodScanRequest {
                image_b64: "abc".into(),
            }),
        )
        .await
        .unwrap();
        assert!(response.0.food.is_some());

        let session = Session::open(state.store.as_ref(), email).await.unwrap();
        assert_eq!(session.food_monitor.len(), 1);
        assert_eq!(session.food_monitor[0].name, "Leftover pasta");
    }

    #[tokio::test]
    async fn empty_image_is_rejected_before_any_call() {
        let state = AppState::fake();
        let err = scan_food(
            State(state),
            auth("monitor@example.com"),
            Json(FoodScanRequest {
                image_b64: String::new(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}

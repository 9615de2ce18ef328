use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::{
    ai::AiError,
    auth::AuthUser,
    domain::{new_id, now_rfc3339, today, EmailLog, EmailStatus, FamilyProfile},
    state::AppState,
    store::Session,
    views,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile", put(put_profile))
        .route("/emails", get(list_emails))
        .route("/alerts", post(send_alert))
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<EmailLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[instrument(skip(state, user))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<FamilyProfile>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    Ok(Json(session.profile))
}

#[instrument(skip(state, user, payload))]
pub async fn put_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(mut payload): Json<FamilyProfile>,
) -> Result<Json<FamilyProfile>, (StatusCode, String)> {
    if payload.size == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "errors": ["size"] }).to_string(),
        ));
    }
    // The profile always belongs to the authenticated namespace.
    payload.user_email = user.email.clone();

    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    session.profile = payload.clone();
    session
        .save_profile(state.store.as_ref())
        .await
        .map_err(internal)?;

    info!(email = %user.email, "profile updated");
    Ok(Json(payload))
}

/// Alert log, newest first.
#[instrument(skip(state, user))]
pub async fn list_emails(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<EmailLog>>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    Ok(Json(session.email_logs))
}

/// Composes an alert email for items currently expiring soon and appends
/// it to the log. Nothing is sent or logged when alerts are disabled or
/// nothing needs attention.
#[instrument(skip(state, user))]
pub async fn send_alert(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<AlertResponse>, (StatusCode, String)> {
    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    if !session.profile.email_alerts {
        return Ok(Json(AlertResponse {
            sent: false,
            log: None,
            message: Some("Email alerts are disabled".into()),
        }));
    }

    let expiring: Vec<_> = views::expiring_soon(&session.inventory, today())
        .into_iter()
        .cloned()
        .collect();
    if expiring.is_empty() {
        return Ok(Json(AlertResponse {
            sent: false,
            log: None,
            message: Some("Nothing needs attention".into()),
        }));
    }

    let body = match state.ai.compose_alert(&user.name, &expiring).await {
        Ok(text) => text,
        Err(e) if e.is_empty() => {
            warn!("alert composition came back empty, using fallback body");
            "Your items need attention.".to_string()
        }
        Err(e) => return Err(ai_failed(e)),
    };

    let entry = EmailLog {
        id: new_id(),
        subject: "SmartShelf Alert".into(),
        body,
        date: now_rfc3339(),
        status: EmailStatus::Delivered,
    };
    session.email_logs.insert(0, entry.clone());
    session
        .save_email_logs(state.store.as_ref())
        .await
        .map_err(internal)?;

    info!(items = expiring.len(), "alert email logged");
    Ok(Json(AlertResponse {
        sent: true,
        log: Some(entry),
        message: None,
    }))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn ai_failed(e: AiError) -> (StatusCode, String) {
    error!(error = %e, "AI gateway call failed");
    (StatusCode::BAD_GATEWAY, format!("AI service unavailable: {e}"))
}

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    ai::AiError,
    auth::AuthUser,
    domain::{parse_ymd, today, MealPlanDay, Recipe},
    state::AppState,
    store::Session,
    views,
};

use super::dto::{
    CookResponse, GenerateMealPlanRequest, GeneratedRecipesResponse, MealPlanResponse,
    RecipeForMealRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/generate", post(generate_recipes))
        .route("/recipes/for-meal", post(recipe_for_meal))
        .route("/recipes/cook", post(cook))
        .route("/mealplan", get(get_meal_plan))
        .route("/mealplan/generate", post(generate_meal_plan))
}

#[instrument(skip(state, user))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Recipe>>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    Ok(Json(session.recipes))
}

/// Generates up to 3 recipes from current stock and replaces the saved
/// recipe collection with them. An empty generation leaves the collection
/// untouched. Concurrent generations are last-write-wins.
#[instrument(skip(state, user))]
pub async fn generate_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<GeneratedRecipesResponse>, (StatusCode, String)> {
    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let recipes = state
        .ai
        .generate_recipes(&session.inventory, &session.profile, today())
        .await
        .map_err(ai_failed)?;

    if recipes.is_empty() {
        warn!(email = %user.email, "recipe generation came back empty");
        return Ok(Json(GeneratedRecipesResponse {
            recipes,
            message: Some("No recipes could be generated".into()),
        }));
    }

    session.recipes = recipes.clone();
    session
        .save_recipes(state.store.as_ref())
        .await
        .map_err(internal)?;

    info!(count = recipes.len(), "recipes generated");
    Ok(Json(GeneratedRecipesResponse {
        recipes,
        message: None,
    }))
}

/// Full recipe for a named meal (typically a meal-plan entry). Constrained
/// to current inventory; not persisted.
#[instrument(skip(state, user, payload))]
pub async fn recipe_for_meal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<RecipeForMealRequest>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    if payload.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "title is required".into()));
    }

    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let recipe = state
        .ai
        .recipe_for_meal(payload.title.trim(), &session.inventory, &session.profile)
        .await
        .map_err(ai_failed)?;
    Ok(Json(recipe))
}

/// Marks a recipe cooked: decrements matching inventory quantities and
/// drops items that reach zero.
#[instrument(skip(state, user, payload))]
pub async fn cook(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<Recipe>,
) -> Result<Json<CookResponse>, (StatusCode, String)> {
    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let consumed = views::cook_recipe(&mut session.inventory, &payload);
    if !consumed.is_empty() {
        session
            .save_inventory(state.store.as_ref())
            .await
            .map_err(internal)?;
    }

    info!(recipe = %payload.title, consumed = consumed.len(), "recipe cooked");
    Ok(Json(CookResponse {
        consumed,
        inventory: session.inventory,
    }))
}

#[instrument(skip(state, user))]
pub async fn get_meal_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<MealPlanDay>>, (StatusCode, String)> {
    let session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;
    Ok(Json(session.meal_plan))
}

/// 7-day plan starting at the given date (default today), one entry per
/// calendar day. Replaces the stored plan on success.
#[instrument(skip(state, user, payload))]
pub async fn generate_meal_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<GenerateMealPlanRequest>,
) -> Result<Json<MealPlanResponse>, (StatusCode, String)> {
    let start = match payload.start_date.as_deref() {
        Some(raw) => parse_ymd(raw)
            .ok_or((StatusCode::BAD_REQUEST, "startDate must be YYYY-MM-DD".to_string()))?,
        None => today(),
    };

    let mut session = Session::open(state.store.as_ref(), &user.email)
        .await
        .map_err(internal)?;

    let days = state
        .ai
        .generate_meal_plan(&session.inventory, &session.profile, start)
        .await
        .map_err(ai_failed)?;

    if days.is_empty() {
        warn!(email = %user.email, "meal plan generation came back empty");
        return Ok(Json(MealPlanResponse {
            days,
            message: Some("No meal plan could be generated".into()),
        }));
    }

    session.meal_plan = days.clone();
    session
        .save_meal_plan(state.store.as_ref())
        .await
        .map_err(internal)?;

    info!(days = days.len(), "meal plan generated");
    Ok(Json(MealPlanResponse {
        days,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::domain::{Category, InventoryItem, RecipeIngredient};

    fn auth(email: &str) -> AuthUser {
        AuthUser(Identity {
            email: email.into(),
            name: "T".into(),
        })
    }

    #[tokio::test]
    async fn generate_replaces_the_saved_collection() {
        let state = AppState::fake();
        let email = "kitchen@example.com";

        let response = generate_recipes(State(state.clone()), auth(email)).await.unwrap();
        assert_eq!(response.0.recipes.len(), 1);
        assert!(response.0.message.is_none());

        let session = Session::open(state.store.as_ref(), email).await.unwrap();
        assert_eq!(session.recipes.len(), 1);
        assert_eq!(session.recipes[0].title, "Fridge surprise");
    }

    #[tokio::test]
    async fn cooking_updates_persisted_inventory() {
        let state = AppState::fake();
        let email = "cook@example.com";

        let mut session = Session::open(state.store.as_ref(), email).await.unwrap();
        session.inventory.push(InventoryItem {
            id: "i1".into(),
            name: "Milk".into(),
            category: Category::Dairy,
            quantity: 2.0,
            unit: "l".into(),
            purchase_date: "2026-08-20".into(),
            expiry_date: "2099-01-01".into(),
            min_stock_level: None,
        });
        session.save_inventory(state.store.as_ref()).await.unwrap();

        let recipe = Recipe {
            id: "r1".into(),
            title: "Porridge".into(),
            ingredients: vec![RecipeIngredient {
                name: "milk".into(),
                amount: "1 cup".into(),
            }],
            instructions: vec![],
            prep_time: "5 min".into(),
            matching_items: vec!["Milk".into()],
        };

        let response = cook(State(state.clone()), auth(email), Json(recipe)).await.unwrap();
        assert_eq!(response.0.consumed, vec!["Milk".to_string()]);

        let session = Session::open(state.store.as_ref(), email).await.unwrap();
        assert_eq!(session.inventory[0].quantity, 1.0);
    }

    #[tokio::test]
    async fn meal_plan_covers_seven_days() {
        let state = AppState::fake();
        let email = "plan@example.com";

        let response = generate_meal_plan(
            State(state.clone()),
            auth(email),
            Json(GenerateMealPlanRequest {
                start_date: Some("2026-08-25".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.days.len(), 7);
        assert_eq!(response.0.days[0].date, "2026-08-25");
        assert_eq!(response.0.days[6].date, "2026-08-31");
    }

    #[tokio::test]
    async fn meal_plan_rejects_bad_start_date() {
        let state = AppState::fake();
        let err = generate_meal_plan(
            State(state),
            auth("plan2@example.com"),
            Json(GenerateMealPlanRequest {
                start_date: Some("next tuesday".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}

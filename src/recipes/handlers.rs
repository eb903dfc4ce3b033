use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::{AuthUser, MaybeAuthUser},
    error::ApiError,
    state::AppState,
};

use super::dto::{RecipeFilters, RecipePayload};
use super::repo::Recipe;

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/recipes/:id/favorite", patch(toggle_favorite))
        .route("/categories", get(list_categories))
}

#[instrument(skip(state, filters))]
pub async fn list_recipes(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Query(filters): Query<RecipeFilters>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = Recipe::list(&state.db, caller, &filters).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = Recipe::get(&state.db, id, caller).await?;
    Ok(Json(recipe))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecipePayload>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let draft = payload.validate()?;
    let recipe = Recipe::create(&state.db, Some(user_id), draft).await?;
    info!(recipe_id = %recipe.id, user_id = %user_id, "recipe created");
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<Recipe>, ApiError> {
    let draft = payload.validate()?;
    let recipe = Recipe::update(&state.db, id, user_id, draft).await?;
    info!(recipe_id = %id, user_id = %user_id, "recipe updated");
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    Recipe::delete(&state.db, id, user_id).await?;
    info!(recipe_id = %id, user_id = %user_id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = Recipe::toggle_favorite(&state.db, id, caller).await?;
    info!(recipe_id = %id, favorite = recipe.is_favorite, "favorite toggled");
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
) -> Result<Json<Vec<String>>, ApiError> {
    let categories = Recipe::list_categories(&state.db, caller).await?;
    Ok(Json(categories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn recipe_serializes_timestamps_as_rfc3339() {
        let now = OffsetDateTime::now_utc();
        let recipe = Recipe {
            id: Uuid::new_v4(),
            user_id: None,
            title: "Toast".into(),
            description: None,
            ingredients: "bread".into(),
            instructions: "toast it".into(),
            prep_time: None,
            cook_time: Some(3),
            servings: Some(1),
            difficulty: Some("Easy".into()),
            category: Some("Breakfast".into()),
            image_url: None,
            is_favorite: false,
            created_at: now,
            updated_at: now,
        };
        let value: serde_json::Value = serde_json::to_value(&recipe).unwrap();
        let created = value["created_at"].as_str().expect("string timestamp");
        assert!(created.contains('T'));
        assert_eq!(value["is_favorite"], false);
        assert_eq!(value["user_id"], serde_json::Value::Null);
    }
}

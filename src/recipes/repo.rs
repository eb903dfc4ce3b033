use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

use super::dto::{RecipeDraft, RecipeFilters};

/// A recipe row. `user_id = NULL` means the recipe is public: visible to
/// every caller and owned by no one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub ingredients: String,
    pub instructions: String,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_favorite: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Recipe {
    /// List recipes visible to `caller`, newest first. Anonymous callers see
    /// public rows only; authenticated callers additionally see their own.
    pub async fn list(
        db: &PgPool,
        caller: Option<Uuid>,
        filters: &RecipeFilters,
    ) -> Result<Vec<Recipe>, ApiError> {
        let search = filters
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));
        let category = filters.category.as_deref().filter(|s| !s.is_empty());
        let difficulty = filters.difficulty.as_deref().filter(|s| !s.is_empty());
        // favorites is only meaningful for a signed-in caller; anonymous
        // requests ignore it rather than erroring.
        let favorites_only = filters.favorites && caller.is_some();

        let rows = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, description, ingredients, instructions,
                   prep_time, cook_time, servings, difficulty, category, image_url,
                   is_favorite, created_at, updated_at
            FROM recipes
            WHERE (user_id IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR title ILIKE $2 OR description ILIKE $2
                   OR ingredients ILIKE $2 OR category ILIKE $2)
              AND ($3::text IS NULL OR category = $3)
              AND ($4::text IS NULL OR difficulty = $4)
              AND (NOT $5 OR (is_favorite AND user_id = $1))
            ORDER BY created_at DESC
            "#,
        )
        .bind(caller)
        .bind(search)
        .bind(category)
        .bind(difficulty)
        .bind(favorites_only)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Fetch one visible recipe. A row that exists but belongs to someone
    /// else is indistinguishable from a missing one.
    pub async fn get(db: &PgPool, id: Uuid, caller: Option<Uuid>) -> Result<Recipe, ApiError> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, description, ingredients, instructions,
                   prep_time, cook_time, servings, difficulty, category, image_url,
                   is_favorite, created_at, updated_at
            FROM recipes
            WHERE id = $1 AND (user_id IS NULL OR user_id = $2)
            "#,
        )
        .bind(id)
        .bind(caller)
        .fetch_optional(db)
        .await?;
        recipe.ok_or_else(|| ApiError::NotFound("Recipe not found".into()))
    }

    pub async fn create(
        db: &PgPool,
        owner: Option<Uuid>,
        draft: RecipeDraft,
    ) -> Result<Recipe, ApiError> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (user_id, title, description, ingredients, instructions,
                                 prep_time, cook_time, servings, difficulty, category, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, user_id, title, description, ingredients, instructions,
                      prep_time, cook_time, servings, difficulty, category, image_url,
                      is_favorite, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.ingredients)
        .bind(&draft.instructions)
        .bind(draft.prep_time)
        .bind(draft.cook_time)
        .bind(draft.servings)
        .bind(&draft.difficulty)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .fetch_one(db)
        .await?;
        Ok(recipe)
    }

    /// Replace a recipe's fields. Only the exact owner may update; a public
    /// recipe has no owner and is therefore never updatable.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        caller: Uuid,
        draft: RecipeDraft,
    ) -> Result<Recipe, ApiError> {
        let updated = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
            SET title = $3, description = $4, ingredients = $5, instructions = $6,
                prep_time = $7, cook_time = $8, servings = $9, difficulty = $10,
                category = $11, image_url = $12, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, ingredients, instructions,
                      prep_time, cook_time, servings, difficulty, category, image_url,
                      is_favorite, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(caller)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.ingredients)
        .bind(&draft.instructions)
        .bind(draft.prep_time)
        .bind(draft.cook_time)
        .bind(draft.servings)
        .bind(&draft.difficulty)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .fetch_optional(db)
        .await?;

        match updated {
            Some(recipe) => Ok(recipe),
            None => Err(Self::missing_or_forbidden(db, id).await?),
        }
    }

    pub async fn delete(db: &PgPool, id: Uuid, caller: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(caller)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Self::missing_or_forbidden(db, id).await?);
        }
        Ok(())
    }

    /// Flip the favorite flag. The flip and the ownership check happen in one
    /// statement, so two racing toggles serialize on the row and net out to
    /// the original value. Unowned recipes may be toggled by anyone,
    /// anonymous callers included; owned recipes only by their owner.
    pub async fn toggle_favorite(
        db: &PgPool,
        id: Uuid,
        caller: Option<Uuid>,
    ) -> Result<Recipe, ApiError> {
        let updated = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
            SET is_favorite = NOT is_favorite, updated_at = now()
            WHERE id = $1 AND (user_id IS NULL OR user_id = $2)
            RETURNING id, user_id, title, description, ingredients, instructions,
                      prep_time, cook_time, servings, difficulty, category, image_url,
                      is_favorite, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(caller)
        .fetch_optional(db)
        .await?;

        match updated {
            Some(recipe) => Ok(recipe),
            None => Err(Self::missing_or_forbidden(db, id).await?),
        }
    }

    /// Distinct categories across the caller's visible recipes, sorted so the
    /// output is stable for a given state.
    pub async fn list_categories(
        db: &PgPool,
        caller: Option<Uuid>,
    ) -> Result<Vec<String>, ApiError> {
        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category
            FROM recipes
            WHERE category IS NOT NULL AND (user_id IS NULL OR user_id = $1)
            ORDER BY category
            "#,
        )
        .bind(caller)
        .fetch_all(db)
        .await?;
        Ok(categories)
    }

    /// Decide which error to report when a guarded write matched no row: the
    /// id either does not exist at all, or exists under someone else's
    /// ownership.
    async fn missing_or_forbidden(db: &PgPool, id: Uuid) -> Result<ApiError, sqlx::Error> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM recipes WHERE id = $1)")
                .bind(id)
                .fetch_one(db)
                .await?;
        Ok(if exists {
            ApiError::Forbidden("You do not own this recipe".into())
        } else {
            ApiError::NotFound("Recipe not found".into())
        })
    }
}

use serde::Deserialize;

use crate::error::ApiError;

/// Recipe difficulty scale. Stored as plain text; enforced here at the
/// validation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Query parameters for the recipe listing.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeFilters {
    pub search: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub favorites: bool,
}

/// Request body shared by create and update. Everything is optional at the
/// deserialization layer; `validate` decides what is actually required and
/// normalizes blank strings to NULL.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// A payload that passed validation, ready to persist.
#[derive(Debug)]
pub struct RecipeDraft {
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
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RecipePayload {
    pub fn validate(self) -> Result<RecipeDraft, ApiError> {
        let title = blank_to_none(self.title);
        let ingredients = blank_to_none(self.ingredients);
        let instructions = blank_to_none(self.instructions);

        let (Some(title), Some(ingredients), Some(instructions)) =
            (title, ingredients, instructions)
        else {
            return Err(ApiError::Validation(
                "Title, ingredients, and instructions are required".into(),
            ));
        };

        for (field, value) in [
            ("prep_time", self.prep_time),
            ("cook_time", self.cook_time),
            ("servings", self.servings),
        ] {
            if value.is_some_and(|v| v < 0) {
                return Err(ApiError::Validation(format!(
                    "{field} must be a non-negative number"
                )));
            }
        }

        let difficulty = blank_to_none(self.difficulty);
        if let Some(d) = &difficulty {
            if Difficulty::parse(d).is_none() {
                return Err(ApiError::Validation(
                    "Difficulty must be Easy, Medium, or Hard".into(),
                ));
            }
        }

        Ok(RecipeDraft {
            title,
            description: blank_to_none(self.description),
            ingredients,
            instructions,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings,
            difficulty,
            category: blank_to_none(self.category),
            image_url: blank_to_none(self.image_url),
        })
    }
}

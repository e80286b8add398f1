use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{IngredientLine, RecipeView};

/// Full recipe payload. Updates use the same shape: scalar fields, the tag
/// set and the line set are all replaced.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipeInput {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientLine>,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub favorited_only: bool,
    pub in_shopping_cart_only: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecipeOrdering {
    #[default]
    Newest,
    Oldest,
    Name,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct RecipeList {
    #[schema(value_type = Vec<RecipeView>)]
    pub items: Vec<RecipeView>,
}

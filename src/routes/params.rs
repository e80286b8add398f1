use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::recipes::{RecipeFilter, RecipeOrdering};

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSortBy {
    CreatedAt,
    Name,
}

/// Recipe listing query. Pagination fields are inline rather than flattened
/// because flattening breaks numeric parsing of query strings.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RecipeQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub author: Option<Uuid>,
    /// Comma-separated tag slugs.
    pub tags: Option<String>,
    /// `1` keeps only the viewer's favorites.
    pub is_favorited: Option<u8>,
    /// `1` keeps only recipes in the viewer's shopping cart.
    pub is_in_shopping_cart: Option<u8>,
    pub sort_by: Option<RecipeSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl RecipeQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn filter(&self) -> RecipeFilter {
        RecipeFilter {
            author: self.author,
            tags: self
                .tags
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|slug| !slug.is_empty())
                .map(str::to_string)
                .collect(),
            favorited_only: self.is_favorited == Some(1),
            in_shopping_cart_only: self.is_in_shopping_cart == Some(1),
        }
    }

    pub fn ordering(&self) -> RecipeOrdering {
        match (
            self.sort_by.unwrap_or(RecipeSortBy::CreatedAt),
            self.sort_order.unwrap_or(SortOrder::Desc),
        ) {
            (RecipeSortBy::Name, _) => RecipeOrdering::Name,
            (RecipeSortBy::CreatedAt, SortOrder::Asc) => RecipeOrdering::Oldest,
            (RecipeSortBy::CreatedAt, SortOrder::Desc) => RecipeOrdering::Newest,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubscriptionQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub recipes_limit: Option<usize>,
}

impl SubscriptionQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<usize>,
}

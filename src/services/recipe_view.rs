//! Read-side assembly of recipes.
//!
//! The viewer is always passed in explicitly. For a page of recipes the
//! number of queries is fixed: one each for authors, tags, lines, and (for
//! an authenticated viewer) the favorite, shopping list and follow sets.

use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    entity::{
        ingredients::{self, Entity as Ingredients},
        recipe_ingredients::{self, Entity as RecipeIngredients},
        recipe_tags::{self, Entity as RecipeTags},
        recipes::{Entity as Recipes, Model as RecipeModel},
        tags::{self, Entity as Tags},
        users::{self, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    models::{RecipeIngredient, RecipeView, Tag, UserProfile},
    services::{relation_service, tag_service::tag_from_entity},
};

/// Per-page membership sets for one viewer. Empty for anonymous access.
#[derive(Debug, Default)]
pub struct ViewerFlags {
    pub favorited: HashSet<Uuid>,
    pub in_shopping_cart: HashSet<Uuid>,
    pub followed_authors: HashSet<Uuid>,
}

impl ViewerFlags {
    pub async fn load<C: ConnectionTrait>(
        db: &C,
        viewer: Option<Uuid>,
        recipe_ids: &[Uuid],
        author_ids: &[Uuid],
    ) -> AppResult<Self> {
        let Some(viewer) = viewer else {
            return Ok(Self::default());
        };
        Ok(Self {
            favorited: relation_service::favorited_among(db, viewer, recipe_ids).await?,
            in_shopping_cart: relation_service::in_shopping_list_among(db, viewer, recipe_ids)
                .await?,
            followed_authors: relation_service::followed_among(db, viewer, author_ids).await?,
        })
    }
}

pub async fn assemble_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_id: Uuid,
    viewer: Option<Uuid>,
) -> AppResult<RecipeView> {
    let recipe = Recipes::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;
    assemble_many(db, vec![recipe], viewer)
        .await?
        .pop()
        .ok_or(AppError::NotFound("recipe"))
}

/// Assemble `recipes` in the given order.
pub async fn assemble_many<C: ConnectionTrait>(
    db: &C,
    recipes: Vec<RecipeModel>,
    viewer: Option<Uuid>,
) -> AppResult<Vec<RecipeView>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<Uuid> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<Uuid, UserModel> = Users::find()
        .filter(users::Column::Id.is_in(author_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let mut tags_by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for (link, tag) in RecipeTags::find()
        .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids.clone()))
        .find_also_related(Tags)
        .order_by_asc(tags::Column::Name)
        .all(db)
        .await?
    {
        if let Some(tag) = tag {
            tags_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(tag_from_entity(tag));
        }
    }

    let mut lines_by_recipe: HashMap<Uuid, Vec<RecipeIngredient>> = HashMap::new();
    for (line, ingredient) in RecipeIngredients::find()
        .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.clone()))
        .find_also_related(Ingredients)
        .order_by_asc(ingredients::Column::Name)
        .all(db)
        .await?
    {
        if let Some(ingredient) = ingredient {
            lines_by_recipe
                .entry(line.recipe_id)
                .or_default()
                .push(RecipeIngredient {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: line.amount,
                });
        }
    }

    let flags = ViewerFlags::load(db, viewer, &recipe_ids, &author_ids).await?;

    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let author = authors
            .get(&recipe.author_id)
            .ok_or(AppError::NotFound("author"))?;
        views.push(RecipeView {
            id: recipe.id,
            tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
            author: profile_from_entity(author, flags.followed_authors.contains(&author.id)),
            ingredients: lines_by_recipe.remove(&recipe.id).unwrap_or_default(),
            is_favorited: flags.favorited.contains(&recipe.id),
            is_in_shopping_cart: flags.in_shopping_cart.contains(&recipe.id),
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        });
    }
    Ok(views)
}

pub(crate) fn profile_from_entity(user: &UserModel, is_subscribed: bool) -> UserProfile {
    UserProfile {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
    }
}

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::recipes::{RecipeFilter, RecipeInput, RecipeList, RecipeOrdering},
    entity::{
        favorites::{self, Entity as Favorites},
        ingredients::{self, Entity as Ingredients},
        recipe_ingredients::{self, Entity as RecipeIngredients},
        recipe_tags::{self, Entity as RecipeTags},
        recipes::{ActiveModel, Column, Entity as Recipes, Model as RecipeModel},
        shopping_list_entries::{self, Entity as ShoppingListEntries},
        tags::{self, Entity as Tags},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner},
    models::{IngredientLine, Recipe, ShortRecipe},
    response::Meta,
    routes::params::Pagination,
    services::recipe_view,
    state::AppState,
};

const MAX_NAME_LEN: usize = 200;
const MIN_AMOUNT: f64 = 1.0;
/// Upper bound per line; keeps shopping list sums finite.
const MAX_AMOUNT: f64 = 100_000.0;

/// Checks everything that can be decided without the store.
pub fn validate_input(input: &RecipeInput) -> AppResult<()> {
    let name = input.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "name must be 1..={MAX_NAME_LEN} characters"
        )));
    }
    if input.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".into()));
    }
    if input.image.trim().is_empty() {
        return Err(AppError::Validation("image must not be empty".into()));
    }
    if input.cooking_time < 1 {
        return Err(AppError::Validation(
            "cooking_time must be at least 1 minute".into(),
        ));
    }
    if input.ingredients.is_empty() {
        return Err(AppError::Validation(
            "recipe needs at least one ingredient".into(),
        ));
    }

    let mut seen = HashSet::new();
    for line in &input.ingredients {
        if !line.amount.is_finite() || !(MIN_AMOUNT..=MAX_AMOUNT).contains(&line.amount) {
            return Err(AppError::Validation(format!(
                "amount for ingredient {} must be between {MIN_AMOUNT} and {MAX_AMOUNT}",
                line.ingredient_id
            )));
        }
        if !seen.insert(line.ingredient_id) {
            return Err(AppError::Validation(format!(
                "ingredient {} is listed more than once",
                line.ingredient_id
            )));
        }
    }

    let mut seen = HashSet::new();
    if let Some(dup) = input.tags.iter().find(|id| !seen.insert(**id)) {
        return Err(AppError::Validation(format!(
            "tag {dup} is listed more than once"
        )));
    }

    Ok(())
}

/// Validation that needs the store: referenced ids exist and the name is
/// free. `exclude` is the recipe being updated, if any.
async fn validate_references<C: ConnectionTrait>(
    db: &C,
    input: &RecipeInput,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let ingredient_ids: Vec<Uuid> = input.ingredients.iter().map(|l| l.ingredient_id).collect();
    let known = Ingredients::find()
        .filter(ingredients::Column::Id.is_in(ingredient_ids.clone()))
        .count(db)
        .await?;
    if known != ingredient_ids.len() as u64 {
        return Err(AppError::Validation(
            "recipe references unknown ingredients".into(),
        ));
    }

    if !input.tags.is_empty() {
        let known = Tags::find()
            .filter(tags::Column::Id.is_in(input.tags.clone()))
            .count(db)
            .await?;
        if known != input.tags.len() as u64 {
            return Err(AppError::Validation("recipe references unknown tags".into()));
        }
    }

    let mut same_name = Condition::all().add(Column::Name.eq(input.name.trim()));
    if let Some(id) = exclude {
        same_name = same_name.add(Column::Id.ne(id));
    }
    if Recipes::find().filter(same_name).one(db).await?.is_some() {
        return Err(name_taken(&input.name));
    }

    Ok(())
}

fn name_taken(name: &str) -> AppError {
    AppError::Validation(format!("recipe named {:?} already exists", name.trim()))
}

/// Replace the tag set and line set of `recipe_id` wholesale.
async fn replace_children<C: ConnectionTrait>(
    db: &C,
    recipe_id: Uuid,
    input: &RecipeInput,
) -> AppResult<()> {
    RecipeTags::delete_many()
        .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    RecipeIngredients::delete_many()
        .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if !input.tags.is_empty() {
        RecipeTags::insert_many(input.tags.iter().map(|tag_id| recipe_tags::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
        }))
        .exec_without_returning(db)
        .await?;
    }

    RecipeIngredients::insert_many(input.ingredients.iter().map(|line| {
        recipe_ingredients::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(line.ingredient_id),
            amount: Set(line.amount),
        }
    }))
    .exec_without_returning(db)
    .await?;

    Ok(())
}

pub async fn create_recipe(
    state: &AppState,
    author: &AuthUser,
    input: RecipeInput,
) -> AppResult<Recipe> {
    validate_input(&input)?;

    let txn = state.orm.begin().await?;
    validate_references(&txn, &input, None).await?;

    let recipe = ActiveModel {
        id: Set(Uuid::new_v4()),
        author_id: Set(author.user_id),
        name: Set(input.name.trim().to_string()),
        image: Set(input.image.clone()),
        text: Set(input.text.clone()),
        cooking_time: Set(input.cooking_time),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await
    .map_err(|err| AppError::on_unique_violation(err, name_taken(&input.name)))?;

    replace_children(&txn, recipe.id, &input).await?;
    txn.commit().await?;

    tracing::info!(recipe_id = %recipe.id, author_id = %author.user_id, "recipe created");
    Ok(aggregate(recipe, input.tags, input.ingredients))
}

/// Owner-only full replacement: scalar fields, tag set and line set change
/// together or not at all.
pub async fn update_recipe(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
    input: RecipeInput,
) -> AppResult<Recipe> {
    let txn = state.orm.begin().await?;
    let existing = Recipes::find_by_id(recipe_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;
    ensure_owner(user, existing.author_id)?;

    validate_input(&input)?;
    validate_references(&txn, &input, Some(recipe_id)).await?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(input.name.trim().to_string());
    active.image = Set(input.image.clone());
    active.text = Set(input.text.clone());
    active.cooking_time = Set(input.cooking_time);
    let recipe = active
        .update(&txn)
        .await
        .map_err(|err| AppError::on_unique_violation(err, name_taken(&input.name)))?;

    replace_children(&txn, recipe_id, &input).await?;
    txn.commit().await?;

    tracing::info!(%recipe_id, "recipe updated");
    Ok(aggregate(recipe, input.tags, input.ingredients))
}

pub async fn delete_recipe(state: &AppState, user: &AuthUser, recipe_id: Uuid) -> AppResult<()> {
    let txn = state.orm.begin().await?;
    let existing = Recipes::find_by_id(recipe_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;
    ensure_owner(user, existing.author_id)?;

    delete_recipes_cascade(&txn, &[recipe_id]).await?;
    txn.commit().await?;

    tracing::info!(%recipe_id, "recipe deleted");
    Ok(())
}

/// Remove recipes together with their lines, tag links, favorites and
/// shopping list entries. Runs inside the caller's transaction.
pub(crate) async fn delete_recipes_cascade<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[Uuid],
) -> AppResult<u64> {
    if recipe_ids.is_empty() {
        return Ok(0);
    }
    let ids = || recipe_ids.iter().copied();

    RecipeIngredients::delete_many()
        .filter(recipe_ingredients::Column::RecipeId.is_in(ids()))
        .exec(db)
        .await?;
    RecipeTags::delete_many()
        .filter(recipe_tags::Column::RecipeId.is_in(ids()))
        .exec(db)
        .await?;
    Favorites::delete_many()
        .filter(favorites::Column::RecipeId.is_in(ids()))
        .exec(db)
        .await?;
    ShoppingListEntries::delete_many()
        .filter(shopping_list_entries::Column::RecipeId.is_in(ids()))
        .exec(db)
        .await?;
    let result = Recipes::delete_many()
        .filter(Column::Id.is_in(ids()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Load the recipe aggregate: scalar row, tag ids and ingredient lines.
pub async fn get_recipe(state: &AppState, recipe_id: Uuid) -> AppResult<Recipe> {
    let recipe = Recipes::find_by_id(recipe_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;

    let tag_ids = RecipeTags::find()
        .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| row.tag_id)
        .collect();
    let lines = RecipeIngredients::find()
        .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| IngredientLine {
            ingredient_id: row.ingredient_id,
            amount: row.amount,
        })
        .collect();

    Ok(aggregate(recipe, tag_ids, lines))
}

/// Filtered, ordered page of recipes in read form. Viewer-relative flags are
/// computed per page, not per recipe.
pub async fn list_recipes(
    state: &AppState,
    viewer: Option<Uuid>,
    filter: RecipeFilter,
    ordering: RecipeOrdering,
    pagination: Pagination,
) -> AppResult<(RecipeList, Meta)> {
    let (page, limit, offset) = pagination.normalize();
    let mut condition = Condition::all();

    if let Some(author) = filter.author {
        condition = condition.add(Column::AuthorId.eq(author));
    }

    if !filter.tags.is_empty() {
        let tag_ids: Vec<Uuid> = Tags::find()
            .select_only()
            .column(tags::Column::Id)
            .filter(tags::Column::Slug.is_in(filter.tags.clone()))
            .into_tuple()
            .all(&state.orm)
            .await?;
        condition = condition.add(
            Column::Id.in_subquery(
                Query::select()
                    .column(recipe_tags::Column::RecipeId)
                    .from(RecipeTags)
                    .and_where(recipe_tags::Column::TagId.is_in(tag_ids))
                    .to_owned(),
            ),
        );
    }

    if filter.favorited_only || filter.in_shopping_cart_only {
        let Some(viewer) = viewer else {
            let meta = Meta::new(page, limit, 0);
            return Ok((RecipeList { items: Vec::new() }, meta));
        };
        if filter.favorited_only {
            condition = condition.add(
                Column::Id.in_subquery(
                    Query::select()
                        .column(favorites::Column::RecipeId)
                        .from(Favorites)
                        .and_where(favorites::Column::UserId.eq(viewer))
                        .to_owned(),
                ),
            );
        }
        if filter.in_shopping_cart_only {
            condition = condition.add(
                Column::Id.in_subquery(
                    Query::select()
                        .column(shopping_list_entries::Column::RecipeId)
                        .from(ShoppingListEntries)
                        .and_where(shopping_list_entries::Column::UserId.eq(viewer))
                        .to_owned(),
                ),
            );
        }
    }

    let finder = Recipes::find().filter(condition);
    let finder = match ordering {
        RecipeOrdering::Newest => finder.order_by_desc(Column::CreatedAt),
        RecipeOrdering::Oldest => finder.order_by_asc(Column::CreatedAt),
        RecipeOrdering::Name => finder.order_by_asc(Column::Name),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = recipe_view::assemble_many(&state.orm, rows, viewer).await?;

    tracing::debug!(total, returned = items.len(), "recipes listed");
    Ok((RecipeList { items }, Meta::new(page, limit, total)))
}

pub async fn get_short_recipe(state: &AppState, recipe_id: Uuid) -> AppResult<ShortRecipe> {
    Recipes::find_by_id(recipe_id)
        .one(&state.orm)
        .await?
        .map(short_recipe_from_entity)
        .ok_or(AppError::NotFound("recipe"))
}

pub(crate) fn short_recipe_from_entity(model: RecipeModel) -> ShortRecipe {
    ShortRecipe {
        id: model.id,
        name: model.name,
        image: model.image,
        cooking_time: model.cooking_time,
    }
}

fn aggregate(model: RecipeModel, tag_ids: Vec<Uuid>, ingredients: Vec<IngredientLine>) -> Recipe {
    Recipe {
        id: model.id,
        author_id: model.author_id,
        name: model.name,
        image: model.image,
        text: model.text,
        cooking_time: model.cooking_time,
        created_at: model.created_at.with_timezone(&Utc),
        tag_ids,
        ingredients,
    }
}

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{
        favorites::{self, Entity as Favorites},
        follows::{self, Entity as Follows},
        recipes::Entity as Recipes,
        shopping_list_entries::{self, Entity as ShoppingListEntries},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOp {
    Add,
    Remove,
}

/// User-to-recipe relations that share the toggle contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeRelation {
    Favorite,
    ShoppingList,
}

impl RecipeRelation {
    fn label(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorite",
            RecipeRelation::ShoppingList => "shopping list entry",
        }
    }
}

pub async fn toggle_favorite(
    state: &AppState,
    user_id: Uuid,
    recipe_id: Uuid,
    op: ToggleOp,
) -> AppResult<()> {
    toggle_recipe_relation(state, RecipeRelation::Favorite, user_id, recipe_id, op).await
}

pub async fn toggle_shopping_list_entry(
    state: &AppState,
    user_id: Uuid,
    recipe_id: Uuid,
    op: ToggleOp,
) -> AppResult<()> {
    toggle_recipe_relation(state, RecipeRelation::ShoppingList, user_id, recipe_id, op).await
}

/// ADD fails with `Conflict` on an existing pair, REMOVE with `NotFound` on
/// a missing one. Both fail with `NotFound` when the recipe is absent.
///
/// ADD does not read the pair first: the primary key decides, so two
/// concurrent ADDs yield one row and one `Conflict`.
pub async fn toggle_recipe_relation(
    state: &AppState,
    kind: RecipeRelation,
    user_id: Uuid,
    recipe_id: Uuid,
    op: ToggleOp,
) -> AppResult<()> {
    match op {
        ToggleOp::Add => {
            let txn = state.orm.begin().await?;
            if Recipes::find_by_id(recipe_id).one(&txn).await?.is_none() {
                return Err(AppError::NotFound("recipe"));
            }
            insert_recipe_relation(&txn, kind, user_id, recipe_id)
                .await
                .map_err(|err| AppError::on_unique_violation(err, already_exists(kind)))?;
            txn.commit().await?;
            tracing::info!(%user_id, %recipe_id, relation = kind.label(), "relation added");
        }
        ToggleOp::Remove => {
            if Recipes::find_by_id(recipe_id).one(&state.orm).await?.is_none() {
                return Err(AppError::NotFound("recipe"));
            }
            let removed = delete_recipe_relation(&state.orm, kind, user_id, recipe_id).await?;
            if removed == 0 {
                return Err(AppError::NotFound(kind.label()));
            }
            tracing::info!(%user_id, %recipe_id, relation = kind.label(), "relation removed");
        }
    }
    Ok(())
}

fn already_exists(kind: RecipeRelation) -> AppError {
    AppError::Conflict(format!("{} already exists", kind.label()))
}

async fn recipe_relation_exists<C: ConnectionTrait>(
    db: &C,
    kind: RecipeRelation,
    user_id: Uuid,
    recipe_id: Uuid,
) -> AppResult<bool> {
    let exists = match kind {
        RecipeRelation::Favorite => Favorites::find_by_id((user_id, recipe_id))
            .one(db)
            .await?
            .is_some(),
        RecipeRelation::ShoppingList => ShoppingListEntries::find_by_id((user_id, recipe_id))
            .one(db)
            .await?
            .is_some(),
    };
    Ok(exists)
}

async fn insert_recipe_relation<C: ConnectionTrait>(
    db: &C,
    kind: RecipeRelation,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<(), DbErr> {
    match kind {
        RecipeRelation::Favorite => {
            Favorites::insert(favorites::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(Utc::now().into()),
            })
            .exec_without_returning(db)
            .await?;
        }
        RecipeRelation::ShoppingList => {
            ShoppingListEntries::insert(shopping_list_entries::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(Utc::now().into()),
            })
            .exec_without_returning(db)
            .await?;
        }
    }
    Ok(())
}

async fn delete_recipe_relation<C: ConnectionTrait>(
    db: &C,
    kind: RecipeRelation,
    user_id: Uuid,
    recipe_id: Uuid,
) -> AppResult<u64> {
    let result = match kind {
        RecipeRelation::Favorite => {
            Favorites::delete_by_id((user_id, recipe_id)).exec(db).await?
        }
        RecipeRelation::ShoppingList => {
            ShoppingListEntries::delete_by_id((user_id, recipe_id))
                .exec(db)
                .await?
        }
    };
    Ok(result.rows_affected)
}

/// Follow or unfollow `author_id`. Self-follow is rejected for both
/// operations before any state is read.
pub async fn toggle_follow(
    state: &AppState,
    user_id: Uuid,
    author_id: Uuid,
    op: ToggleOp,
) -> AppResult<()> {
    if user_id == author_id {
        return Err(AppError::Validation("cannot subscribe to yourself".into()));
    }

    match op {
        ToggleOp::Add => {
            let txn = state.orm.begin().await?;
            if Users::find_by_id(author_id).one(&txn).await?.is_none() {
                return Err(AppError::NotFound("user"));
            }
            Follows::insert(follows::ActiveModel {
                user_id: Set(user_id),
                author_id: Set(author_id),
                created_at: Set(Utc::now().into()),
            })
            .exec_without_returning(&txn)
            .await
            .map_err(|err| {
                AppError::on_unique_violation(err, AppError::Conflict("already subscribed".into()))
            })?;
            txn.commit().await?;
            tracing::info!(%user_id, %author_id, "subscription added");
        }
        ToggleOp::Remove => {
            if Users::find_by_id(author_id).one(&state.orm).await?.is_none() {
                return Err(AppError::NotFound("user"));
            }
            let result = Follows::delete_by_id((user_id, author_id))
                .exec(&state.orm)
                .await?;
            if result.rows_affected == 0 {
                return Err(AppError::NotFound("subscription"));
            }
            tracing::info!(%user_id, %author_id, "subscription removed");
        }
    }
    Ok(())
}

pub async fn is_favorited<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    recipe_id: Uuid,
) -> AppResult<bool> {
    recipe_relation_exists(db, RecipeRelation::Favorite, user_id, recipe_id).await
}

pub async fn is_in_shopping_list<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    recipe_id: Uuid,
) -> AppResult<bool> {
    recipe_relation_exists(db, RecipeRelation::ShoppingList, user_id, recipe_id).await
}

pub async fn is_following<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    author_id: Uuid,
) -> AppResult<bool> {
    Ok(Follows::find_by_id((user_id, author_id))
        .one(db)
        .await?
        .is_some())
}

/// Subset of `recipe_ids` the user has favorited, in one query.
pub async fn favorited_among<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    recipe_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<Uuid> = Favorites::find()
        .select_only()
        .column(favorites::Column::RecipeId)
        .filter(favorites::Column::UserId.eq(user_id))
        .filter(favorites::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Subset of `recipe_ids` in the user's shopping list, in one query.
pub async fn in_shopping_list_among<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    recipe_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<Uuid> = ShoppingListEntries::find()
        .select_only()
        .column(shopping_list_entries::Column::RecipeId)
        .filter(shopping_list_entries::Column::UserId.eq(user_id))
        .filter(shopping_list_entries::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Subset of `author_ids` the user follows, in one query.
pub async fn followed_among<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    author_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<Uuid> = Follows::find()
        .select_only()
        .column(follows::Column::AuthorId)
        .filter(follows::Column::UserId.eq(user_id))
        .filter(follows::Column::AuthorId.is_in(author_ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

pub async fn list_shopping_list_recipe_ids<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    let ids = ShoppingListEntries::find()
        .select_only()
        .column(shopping_list_entries::Column::RecipeId)
        .filter(shopping_list_entries::Column::UserId.eq(user_id))
        .order_by_asc(shopping_list_entries::Column::CreatedAt)
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids)
}

/// Authors the user follows, most recent subscription first.
pub async fn list_followed_authors<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    let ids = Follows::find()
        .select_only()
        .column(follows::Column::AuthorId)
        .filter(follows::Column::UserId.eq(user_id))
        .order_by_desc(follows::Column::CreatedAt)
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids)
}

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::users::{CreateUserRequest, SubscriptionList},
    entity::{
        favorites::{self, Entity as Favorites},
        follows::{self, Entity as Follows},
        recipes::{self, Entity as Recipes},
        shopping_list_entries::{self, Entity as ShoppingListEntries},
        users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    models::{ShortRecipe, Subscription, User, UserProfile},
    response::Meta,
    routes::params::Pagination,
    services::{
        recipe_service::{delete_recipes_cascade, short_recipe_from_entity},
        recipe_view::profile_from_entity,
        relation_service,
    },
    state::AppState,
};

pub async fn create_user(state: &AppState, payload: CreateUserRequest) -> AppResult<User> {
    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("email is not valid".into()));
    }
    if username.is_empty() {
        return Err(AppError::Validation("username must not be empty".into()));
    }

    let taken = Users::find()
        .filter(
            Condition::any()
                .add(Column::Email.eq(email.clone()))
                .add(Column::Username.eq(username.clone())),
        )
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Validation("email or username already taken".into()));
    }

    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        username: Set(username),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        AppError::on_unique_violation(
            err,
            AppError::Validation("email or username already taken".into()),
        )
    })?;

    tracing::info!(user_id = %user.id, "user created");
    Ok(user_from_entity(user))
}

/// Public profile of `user_id`; `is_subscribed` is false for anonymous viewers.
pub async fn get_profile(
    state: &AppState,
    user_id: Uuid,
    viewer: Option<Uuid>,
) -> AppResult<UserProfile> {
    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let is_subscribed = match viewer {
        Some(viewer) => relation_service::is_following(&state.orm, viewer, user_id).await?,
        None => false,
    };
    Ok(profile_from_entity(&user, is_subscribed))
}

/// Delete a user with everything hanging off them: their recipes (and the
/// rows those own), their favorites and shopping list entries, and follow
/// edges in both directions.
pub async fn delete_user(state: &AppState, user_id: Uuid) -> AppResult<()> {
    let txn = state.orm.begin().await?;
    if Users::find_by_id(user_id).one(&txn).await?.is_none() {
        return Err(AppError::NotFound("user"));
    }

    let recipe_ids: Vec<Uuid> = Recipes::find()
        .select_only()
        .column(recipes::Column::Id)
        .filter(recipes::Column::AuthorId.eq(user_id))
        .into_tuple()
        .all(&txn)
        .await?;
    let removed_recipes = delete_recipes_cascade(&txn, &recipe_ids).await?;

    Favorites::delete_many()
        .filter(favorites::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    ShoppingListEntries::delete_many()
        .filter(shopping_list_entries::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    Follows::delete_many()
        .filter(
            Condition::any()
                .add(follows::Column::UserId.eq(user_id))
                .add(follows::Column::AuthorId.eq(user_id)),
        )
        .exec(&txn)
        .await?;
    Users::delete_by_id(user_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(%user_id, removed_recipes, "user deleted");
    Ok(())
}

/// Authors the viewer follows, newest subscription first, each with a recipe
/// preview truncated to `recipes_limit` and the untruncated count.
pub async fn list_subscriptions(
    state: &AppState,
    viewer: Uuid,
    pagination: Pagination,
    recipes_limit: Option<usize>,
) -> AppResult<(SubscriptionList, Meta)> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Follows::find()
        .filter(follows::Column::UserId.eq(viewer))
        .order_by_desc(follows::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let author_ids: Vec<Uuid> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|follow| follow.author_id)
        .collect();

    let items = build_subscriptions(&state.orm, &author_ids, recipes_limit).await?;
    Ok((SubscriptionList { items }, Meta::new(page, limit, total)))
}

/// Subscription entry for a single author the viewer follows.
pub async fn subscription_for(
    state: &AppState,
    author_id: Uuid,
    recipes_limit: Option<usize>,
) -> AppResult<Subscription> {
    build_subscriptions(&state.orm, &[author_id], recipes_limit)
        .await?
        .pop()
        .ok_or(AppError::NotFound("user"))
}

async fn build_subscriptions<C: ConnectionTrait>(
    db: &C,
    author_ids: &[Uuid],
    recipes_limit: Option<usize>,
) -> AppResult<Vec<Subscription>> {
    if author_ids.is_empty() {
        return Ok(Vec::new());
    }

    let authors: HashMap<Uuid, UserModel> = Users::find()
        .filter(Column::Id.is_in(author_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let mut recipes_by_author: HashMap<Uuid, Vec<ShortRecipe>> = HashMap::new();
    for recipe in Recipes::find()
        .filter(recipes::Column::AuthorId.is_in(author_ids.iter().copied()))
        .order_by_desc(recipes::Column::CreatedAt)
        .all(db)
        .await?
    {
        recipes_by_author
            .entry(recipe.author_id)
            .or_default()
            .push(short_recipe_from_entity(recipe));
    }

    let subscriptions = author_ids
        .iter()
        .filter_map(|id| authors.get(id))
        .map(|author| {
            let mut recipes = recipes_by_author.remove(&author.id).unwrap_or_default();
            let recipes_count = recipes.len() as i64;
            if let Some(limit) = recipes_limit {
                recipes.truncate(limit);
            }
            Subscription {
                email: author.email.clone(),
                id: author.id,
                username: author.username.clone(),
                first_name: author.first_name.clone(),
                last_name: author.last_name.clone(),
                is_subscribed: true,
                recipes,
                recipes_count,
            }
        })
        .collect();
    Ok(subscriptions)
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        email: model.email,
        username: model.username,
        first_name: model.first_name,
        last_name: model.last_name,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

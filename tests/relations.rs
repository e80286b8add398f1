mod common;

use chrono::Utc;
use foodgram_api::{
    entity::{favorites, follows, recipes, shopping_list_entries, users},
    error::AppError,
    routes::params::Pagination,
    services::{
        relation_service::{self, ToggleOp},
        user_service,
    },
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

use common::{create_ingredient, create_recipe, create_user, setup_state};

#[tokio::test]
async fn favorite_add_then_remove_round_trips() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "alice").await?;
    let fan = create_user(&state, "bob").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let recipe = create_recipe(&state, &author, "Soup", &[(salt, 2.0)]).await?;

    relation_service::toggle_favorite(&state, fan.user_id, recipe.id, ToggleOp::Add).await?;
    assert!(relation_service::is_favorited(&state.orm, fan.user_id, recipe.id).await?);

    let err = relation_service::toggle_favorite(&state, fan.user_id, recipe.id, ToggleOp::Add)
        .await
        .expect_err("second add");
    assert!(matches!(err, AppError::Conflict(_)));

    relation_service::toggle_favorite(&state, fan.user_id, recipe.id, ToggleOp::Remove).await?;
    assert!(!relation_service::is_favorited(&state.orm, fan.user_id, recipe.id).await?);

    let err = relation_service::toggle_favorite(&state, fan.user_id, recipe.id, ToggleOp::Remove)
        .await
        .expect_err("nothing to remove");
    assert!(matches!(err, AppError::NotFound("favorite")));
    Ok(())
}

#[tokio::test]
async fn shopping_list_toggle_follows_the_same_contract() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "alice").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let recipe = create_recipe(&state, &author, "Soup", &[(salt, 2.0)]).await?;

    let err = relation_service::toggle_shopping_list_entry(
        &state,
        author.user_id,
        recipe.id,
        ToggleOp::Remove,
    )
    .await
    .expect_err("not in list");
    assert!(matches!(err, AppError::NotFound("shopping list entry")));

    relation_service::toggle_shopping_list_entry(&state, author.user_id, recipe.id, ToggleOp::Add)
        .await?;
    let ids = relation_service::list_shopping_list_recipe_ids(&state.orm, author.user_id).await?;
    assert_eq!(ids, vec![recipe.id]);

    // Favorites are a separate relation.
    assert!(!relation_service::is_favorited(&state.orm, author.user_id, recipe.id).await?);
    Ok(())
}

#[tokio::test]
async fn toggles_on_missing_recipe_are_not_found() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "alice").await?;
    let missing = Uuid::new_v4();

    for op in [ToggleOp::Add, ToggleOp::Remove] {
        let err = relation_service::toggle_favorite(&state, user.user_id, missing, op)
            .await
            .expect_err("recipe does not exist");
        assert!(matches!(err, AppError::NotFound("recipe")));
    }
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_produce_one_row_and_one_conflict() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "alice").await?;
    let fan = create_user(&state, "bob").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let recipe = create_recipe(&state, &author, "Soup", &[(salt, 2.0)]).await?;

    // The single test connection serializes the two transactions.
    let (first, second) = tokio::join!(
        relation_service::toggle_favorite(&state, fan.user_id, recipe.id, ToggleOp::Add),
        relation_service::toggle_favorite(&state, fan.user_id, recipe.id, ToggleOp::Add),
    );
    let conflicts = [&first, &second]
        .iter()
        .filter(|result| matches!(result, Err(AppError::Conflict(_))))
        .count();
    assert_eq!(conflicts, 1, "{first:?} / {second:?}");
    assert!(first.is_ok() || second.is_ok());
    assert_eq!(favorites::Entity::find().count(&state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn add_over_an_existing_row_maps_key_violation_to_conflict() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "alice").await?;
    let fan = create_user(&state, "bob").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let recipe = create_recipe(&state, &author, "Soup", &[(salt, 2.0)]).await?;

    // Rows written behind the service's back, as a racing request would.
    favorites::ActiveModel {
        user_id: Set(fan.user_id),
        recipe_id: Set(recipe.id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    follows::ActiveModel {
        user_id: Set(fan.user_id),
        author_id: Set(author.user_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    let err = relation_service::toggle_favorite(&state, fan.user_id, recipe.id, ToggleOp::Add)
        .await
        .expect_err("pair already stored");
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    let err = relation_service::toggle_follow(&state, fan.user_id, author.user_id, ToggleOp::Add)
        .await
        .expect_err("pair already stored");
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    assert_eq!(favorites::Entity::find().count(&state.orm).await?, 1);
    assert_eq!(follows::Entity::find().count(&state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn follow_rules() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let alice = create_user(&state, "alice").await?;
    let bob = create_user(&state, "bob").await?;

    for op in [ToggleOp::Add, ToggleOp::Remove] {
        let err = relation_service::toggle_follow(&state, alice.user_id, alice.user_id, op)
            .await
            .expect_err("self follow");
        assert!(matches!(err, AppError::Validation(_)));
    }

    let err = relation_service::toggle_follow(&state, alice.user_id, Uuid::new_v4(), ToggleOp::Add)
        .await
        .expect_err("unknown author");
    assert!(matches!(err, AppError::NotFound("user")));

    relation_service::toggle_follow(&state, alice.user_id, bob.user_id, ToggleOp::Add).await?;
    assert_eq!(
        relation_service::list_followed_authors(&state.orm, alice.user_id).await?,
        vec![bob.user_id]
    );
    let err = relation_service::toggle_follow(&state, alice.user_id, bob.user_id, ToggleOp::Add)
        .await
        .expect_err("already following");
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(relation_service::is_following(&state.orm, alice.user_id, bob.user_id).await?);
    assert!(!relation_service::is_following(&state.orm, bob.user_id, alice.user_id).await?);

    relation_service::toggle_follow(&state, alice.user_id, bob.user_id, ToggleOp::Remove).await?;
    let err = relation_service::toggle_follow(&state, alice.user_id, bob.user_id, ToggleOp::Remove)
        .await
        .expect_err("not following");
    assert!(matches!(err, AppError::NotFound("subscription")));
    Ok(())
}

#[tokio::test]
async fn subscriptions_list_followed_authors_with_limited_recipes() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let alice = create_user(&state, "alice").await?;
    let bob = create_user(&state, "bob").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    for name in ["One", "Two", "Three"] {
        create_recipe(&state, &bob, name, &[(salt, 1.0)]).await?;
    }
    relation_service::toggle_follow(&state, alice.user_id, bob.user_id, ToggleOp::Add).await?;

    let (list, meta) =
        user_service::list_subscriptions(&state, alice.user_id, Pagination::default(), Some(2))
            .await?;
    assert_eq!(meta.total, Some(1));
    let entry = &list.items[0];
    assert_eq!(entry.id, bob.user_id);
    assert!(entry.is_subscribed);
    assert_eq!(entry.recipes.len(), 2);
    assert_eq!(entry.recipes_count, 3);
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_removes_everything_they_own() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let alice = create_user(&state, "alice").await?;
    let bob = create_user(&state, "bob").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let soup = create_recipe(&state, &alice, "Soup", &[(salt, 2.0)]).await?;
    let cake = create_recipe(&state, &bob, "Cake", &[(salt, 1.0)]).await?;

    relation_service::toggle_favorite(&state, bob.user_id, soup.id, ToggleOp::Add).await?;
    relation_service::toggle_shopping_list_entry(&state, alice.user_id, cake.id, ToggleOp::Add)
        .await?;
    relation_service::toggle_follow(&state, alice.user_id, bob.user_id, ToggleOp::Add).await?;
    relation_service::toggle_follow(&state, bob.user_id, alice.user_id, ToggleOp::Add).await?;

    user_service::delete_user(&state, alice.user_id).await?;

    assert_eq!(users::Entity::find().count(&state.orm).await?, 1);
    assert_eq!(recipes::Entity::find().count(&state.orm).await?, 1);
    assert_eq!(favorites::Entity::find().count(&state.orm).await?, 0);
    assert_eq!(shopping_list_entries::Entity::find().count(&state.orm).await?, 0);
    assert_eq!(follows::Entity::find().count(&state.orm).await?, 0);

    let err = user_service::delete_user(&state, alice.user_id)
        .await
        .expect_err("already gone");
    assert!(matches!(err, AppError::NotFound("user")));
    Ok(())
}

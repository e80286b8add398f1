mod common;

use foodgram_api::{
    dto::recipes::{RecipeFilter, RecipeOrdering},
    routes::params::Pagination,
    services::{
        recipe_service, recipe_view,
        relation_service::{self, ToggleOp},
        user_service,
    },
};

use common::{create_ingredient, create_recipe, create_tag, create_user, recipe_input, setup_state};

#[tokio::test]
async fn anonymous_viewer_sees_no_flags() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "alice").await?;
    let fan = create_user(&state, "bob").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let recipe = create_recipe(&state, &author, "Soup", &[(salt, 2.0)]).await?;
    relation_service::toggle_favorite(&state, fan.user_id, recipe.id, ToggleOp::Add).await?;
    relation_service::toggle_follow(&state, fan.user_id, author.user_id, ToggleOp::Add).await?;

    let view = recipe_view::assemble_recipe(&state.orm, recipe.id, None).await?;
    assert!(!view.is_favorited);
    assert!(!view.is_in_shopping_cart);
    assert!(!view.author.is_subscribed);
    Ok(())
}

#[tokio::test]
async fn flags_are_relative_to_the_viewer() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "alice").await?;
    let fan = create_user(&state, "bob").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let soup = create_recipe(&state, &author, "Soup", &[(salt, 2.0)]).await?;
    let cake = create_recipe(&state, &author, "Cake", &[(salt, 1.0)]).await?;

    relation_service::toggle_favorite(&state, fan.user_id, soup.id, ToggleOp::Add).await?;
    relation_service::toggle_shopping_list_entry(&state, fan.user_id, cake.id, ToggleOp::Add)
        .await?;
    relation_service::toggle_follow(&state, fan.user_id, author.user_id, ToggleOp::Add).await?;

    let soup_view = recipe_view::assemble_recipe(&state.orm, soup.id, Some(fan.user_id)).await?;
    assert!(soup_view.is_favorited);
    assert!(!soup_view.is_in_shopping_cart);
    assert!(soup_view.author.is_subscribed);

    let cake_view = recipe_view::assemble_recipe(&state.orm, cake.id, Some(fan.user_id)).await?;
    assert!(!cake_view.is_favorited);
    assert!(cake_view.is_in_shopping_cart);

    // The author sees the same recipes without the fan's flags.
    let own_view = recipe_view::assemble_recipe(&state.orm, soup.id, Some(author.user_id)).await?;
    assert!(!own_view.is_favorited);
    assert!(!own_view.author.is_subscribed);
    Ok(())
}

#[tokio::test]
async fn view_carries_tags_and_resolved_lines() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "alice").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let milk = create_ingredient(&state, "milk", "ml").await?;
    let lunch = create_tag(&state, "lunch", "#00FF00").await?;
    let recipe = recipe_service::create_recipe(
        &state,
        &author,
        recipe_input("Porridge", vec![lunch], &[(salt, 2.0), (milk, 300.0)]),
    )
    .await?;

    let view = recipe_view::assemble_recipe(&state.orm, recipe.id, None).await?;
    assert_eq!(view.author.id, author.user_id);
    assert_eq!(view.tags.len(), 1);
    assert_eq!(view.tags[0].slug, "lunch");
    let lines: Vec<(&str, &str, f64)> = view
        .ingredients
        .iter()
        .map(|l| (l.name.as_str(), l.measurement_unit.as_str(), l.amount))
        .collect();
    assert_eq!(lines, vec![("milk", "ml", 300.0), ("salt", "g", 2.0)]);
    Ok(())
}

#[tokio::test]
async fn listing_computes_flags_per_page() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "alice").await?;
    let fan = create_user(&state, "bob").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let soup = create_recipe(&state, &author, "Soup", &[(salt, 2.0)]).await?;
    create_recipe(&state, &author, "Cake", &[(salt, 1.0)]).await?;
    relation_service::toggle_favorite(&state, fan.user_id, soup.id, ToggleOp::Add).await?;

    let (list, _) = recipe_service::list_recipes(
        &state,
        Some(fan.user_id),
        RecipeFilter::default(),
        RecipeOrdering::Name,
        Pagination::default(),
    )
    .await?;
    let flags: Vec<(&str, bool)> = list
        .items
        .iter()
        .map(|r| (r.name.as_str(), r.is_favorited))
        .collect();
    assert_eq!(flags, vec![("Cake", false), ("Soup", true)]);
    Ok(())
}

#[tokio::test]
async fn profile_reports_subscription_for_viewer() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let alice = create_user(&state, "alice").await?;
    let bob = create_user(&state, "bob").await?;
    relation_service::toggle_follow(&state, bob.user_id, alice.user_id, ToggleOp::Add).await?;

    let seen_by_bob = user_service::get_profile(&state, alice.user_id, Some(bob.user_id)).await?;
    assert!(seen_by_bob.is_subscribed);
    let anonymous = user_service::get_profile(&state, alice.user_id, None).await?;
    assert!(!anonymous.is_subscribed);
    Ok(())
}

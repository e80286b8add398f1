mod common;

use foodgram_api::services::{
    relation_service::{self, ToggleOp},
    shopping_list_service,
};

use common::{create_ingredient, create_recipe, create_user, setup_state};

#[tokio::test]
async fn amounts_for_the_same_ingredient_are_summed() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "alice").await?;
    let shopper = create_user(&state, "bob").await?;
    let salt = create_ingredient(&state, "salt", "g").await?;
    let flour = create_ingredient(&state, "flour", "g").await?;
    let soup = create_recipe(&state, &author, "Soup", &[(salt, 5.0)]).await?;
    let bread = create_recipe(&state, &author, "Bread", &[(salt, 10.0), (flour, 500.0)]).await?;
    let unrelated = create_recipe(&state, &author, "Cake", &[(salt, 100.0)]).await?;

    for id in [soup.id, bread.id] {
        relation_service::toggle_shopping_list_entry(&state, shopper.user_id, id, ToggleOp::Add)
            .await?;
    }
    relation_service::toggle_favorite(&state, shopper.user_id, unrelated.id, ToggleOp::Add)
        .await?;

    let report = shopping_list_service::shopping_list_report(&state.orm, shopper.user_id).await?;
    let items: Vec<(&str, &str, f64)> = report
        .items
        .iter()
        .map(|l| (l.name.as_str(), l.measurement_unit.as_str(), l.amount))
        .collect();
    assert_eq!(items, vec![("flour", "g", 500.0), ("salt", "g", 15.0)]);
    assert_eq!(report.render(), "flour (g) — 500;\n\nsalt (g) — 15;\n\n");
    Ok(())
}

#[tokio::test]
async fn empty_shopping_list_gives_empty_report() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "alice").await?;

    let report = shopping_list_service::shopping_list_report(&state.orm, user.user_id).await?;
    assert!(report.is_empty());
    assert_eq!(report.render(), "");
    Ok(())
}

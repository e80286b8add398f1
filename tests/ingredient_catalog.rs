mod common;

use foodgram_api::{error::AppError, services::ingredient_service};
use uuid::Uuid;

use common::{create_ingredient, setup_state};

#[tokio::test]
async fn prefix_matches_come_first() -> anyhow::Result<()> {
    let state = setup_state().await?;
    for name in ["Rock Salt", "Salad", "Pepper", "salmon"] {
        create_ingredient(&state, name, "g").await?;
    }

    let names: Vec<String> = ingredient_service::lookup(&state, "Sal")
        .await?
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["Salad", "salmon", "Rock Salt"]);
    Ok(())
}

#[tokio::test]
async fn lookup_returns_at_most_ten() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let catalog = (0..15).map(|i| (format!("sugar {i:02}"), "g".to_string()));
    let inserted = ingredient_service::load_catalog(&state.orm, catalog).await?;
    assert_eq!(inserted, 15);

    let found = ingredient_service::lookup(&state, "sug").await?;
    assert_eq!(found.len(), ingredient_service::LOOKUP_LIMIT);
    assert!(ingredient_service::lookup(&state, "  ").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn catalog_load_skips_existing_names() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let first = vec![("salt".to_string(), "g".to_string())];
    assert_eq!(ingredient_service::load_catalog(&state.orm, first.clone()).await?, 1);
    assert_eq!(ingredient_service::load_catalog(&state.orm, first).await?, 0);

    let all = ingredient_service::list_ingredients(&state, None).await?;
    assert_eq!(all.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_ingredient_is_not_found() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let err = ingredient_service::get_ingredient(&state, Uuid::new_v4())
        .await
        .expect_err("missing");
    assert!(matches!(err, AppError::NotFound("ingredient")));
    Ok(())
}

#[tokio::test]
async fn non_ascii_names_match_in_any_case() -> anyhow::Result<()> {
    let state = setup_state().await?;
    for name in ["Соль", "Salt", "Морская соль"] {
        create_ingredient(&state, name, "г").await?;
    }

    for query in ["соль", "Соль", "СОЛЬ"] {
        let names: Vec<String> = ingredient_service::lookup(&state, query)
            .await?
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Соль", "Морская соль"], "query {query}");
    }

    let names: Vec<String> = ingredient_service::lookup(&state, "SALT")
        .await?
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["Salt"]);
    Ok(())
}

#[tokio::test]
async fn substring_tier_fills_remaining_slots() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let prefixed = (0..8).map(|i| (format!("oil {i}"), "ml".to_string()));
    let contained = (0..5).map(|i| (format!("boiled egg {i}"), "pcs".to_string()));
    ingredient_service::load_catalog(&state.orm, prefixed.chain(contained)).await?;
    create_ingredient(&state, "100% oil", "ml").await?;

    let names: Vec<String> = ingredient_service::lookup(&state, "oil")
        .await?
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names.len(), ingredient_service::LOOKUP_LIMIT);
    assert!(names[..8].iter().all(|n| n.starts_with("oil")));
    assert_eq!(names[8..], ["100% oil", "boiled egg 0"]);

    // Wildcards in the query match literally.
    let names: Vec<String> = ingredient_service::lookup(&state, "0%")
        .await?
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["100% oil"]);
    Ok(())
}

use foodgram_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{tags::CreateTagRequest, users::CreateUserRequest},
    entity::users,
    error::AppError,
    services::{ingredient_service, tag_service, user_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let state = AppState {
        orm,
        jwt_secret: config.jwt_secret,
    };

    let user_id = ensure_user(&state, "cook@example.com", "cook").await?;
    seed_tags(&state).await?;
    seed_ingredients(&state).await?;

    println!("Seed completed. Demo user ID: {user_id}");
    Ok(())
}

async fn ensure_user(state: &AppState, email: &str, username: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(&state.orm)
        .await?
    {
        return Ok(existing.id);
    }

    let user = user_service::create_user(
        state,
        CreateUserRequest {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "Demo".to_string(),
            last_name: "Cook".to_string(),
        },
    )
    .await?;
    Ok(user.id)
}

async fn seed_tags(state: &AppState) -> anyhow::Result<()> {
    let tags = vec![
        ("Breakfast", "#F4A261", "breakfast"),
        ("Lunch", "#2A9D8F", "lunch"),
        ("Dinner", "#264653", "dinner"),
    ];

    for (name, color, slug) in tags {
        let payload = CreateTagRequest {
            name: name.to_string(),
            color: color.to_string(),
            slug: slug.to_string(),
        };
        match tag_service::create_tag(state, payload).await {
            Ok(_) | Err(AppError::Validation(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    println!("Seeded tags");
    Ok(())
}

async fn seed_ingredients(state: &AppState) -> anyhow::Result<()> {
    let catalog = [
        ("salt", "g"),
        ("sugar", "g"),
        ("wheat flour", "g"),
        ("milk", "ml"),
        ("eggs", "pcs"),
        ("butter", "g"),
        ("olive oil", "tbsp"),
        ("black pepper", "pinch"),
        ("rock salt", "g"),
        ("salad leaves", "bunch"),
    ];

    let inserted = ingredient_service::load_catalog(
        &state.orm,
        catalog
            .iter()
            .map(|(name, unit)| (name.to_string(), unit.to_string())),
    )
    .await?;

    println!("Seeded {inserted} ingredients");
    Ok(())
}

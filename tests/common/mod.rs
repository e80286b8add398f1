#![allow(dead_code)]

use foodgram_api::{
    dto::{recipes::RecipeInput, tags::CreateTagRequest, users::CreateUserRequest},
    middleware::auth::{AuthUser, Claims},
    migration::Migrator,
    models::{IngredientLine, Recipe},
    services::{ingredient_service, recipe_service, tag_service, user_service},
    state::AppState,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ColumnTrait, ConnectOptions, Database, EntityTrait, QueryFilter};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

/// Fresh in-memory database. A single connection keeps every query on the
/// same SQLite instance.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let orm = Database::connect(opt).await?;
    Migrator::up(&orm, None).await?;
    Ok(AppState {
        orm,
        jwt_secret: JWT_SECRET.to_string(),
    })
}

pub async fn create_user(state: &AppState, username: &str) -> anyhow::Result<AuthUser> {
    let user = user_service::create_user(
        state,
        CreateUserRequest {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        },
    )
    .await?;
    Ok(AuthUser { user_id: user.id })
}

pub async fn create_ingredient(state: &AppState, name: &str, unit: &str) -> anyhow::Result<Uuid> {
    ingredient_service::load_catalog(&state.orm, [(name.to_string(), unit.to_string())]).await?;
    let row = foodgram_api::entity::ingredients::Entity::find()
        .filter(foodgram_api::entity::ingredients::Column::Name.eq(name))
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("ingredient {name} was not inserted"))?;
    Ok(row.id)
}

pub async fn create_tag(state: &AppState, slug: &str, color: &str) -> anyhow::Result<Uuid> {
    let tag = tag_service::create_tag(
        state,
        CreateTagRequest {
            name: slug.to_uppercase(),
            color: color.to_string(),
            slug: slug.to_string(),
        },
    )
    .await?;
    Ok(tag.id)
}

pub fn recipe_input(name: &str, tags: Vec<Uuid>, lines: &[(Uuid, f64)]) -> RecipeInput {
    RecipeInput {
        name: name.to_string(),
        image: "data:image/png;base64,AAAA".to_string(),
        text: "Mix everything and cook.".to_string(),
        cooking_time: 15,
        tags,
        ingredients: lines
            .iter()
            .map(|(ingredient_id, amount)| IngredientLine {
                ingredient_id: *ingredient_id,
                amount: *amount,
            })
            .collect(),
    }
}

pub async fn create_recipe(
    state: &AppState,
    author: &AuthUser,
    name: &str,
    lines: &[(Uuid, f64)],
) -> anyhow::Result<Recipe> {
    Ok(recipe_service::create_recipe(state, author, recipe_input(name, Vec::new(), lines)).await?)
}

pub fn bearer_for(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode token");
    format!("Bearer {token}")
}

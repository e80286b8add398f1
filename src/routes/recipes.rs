use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::recipes::{RecipeInput, RecipeList},
    error::AppResult,
    middleware::auth::{AuthUser, Viewer},
    models::{RecipeView, ShortRecipe},
    response::{ApiResponse, Meta},
    routes::params::RecipeQuery,
    services::{
        recipe_service, recipe_view,
        relation_service::{self, ToggleOp},
        shopping_list_service,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route(
            "/{id}",
            get(get_recipe)
                .put(update_recipe)
                .patch(update_recipe)
                .delete(delete_recipe),
        )
        .route("/{id}/favorite", post(add_favorite).delete(remove_favorite))
        .route(
            "/{id}/shopping_cart",
            post(add_to_shopping_cart).delete(remove_from_shopping_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("author" = Option<Uuid>, Query, description = "Only recipes by this author"),
        ("tags" = Option<String>, Query, description = "Comma-separated tag slugs"),
        ("is_favorited" = Option<u8>, Query, description = "1 = only the viewer's favorites"),
        ("is_in_shopping_cart" = Option<u8>, Query, description = "1 = only recipes in the viewer's cart"),
        ("sort_by" = Option<String>, Query, description = "created_at | name"),
        ("sort_order" = Option<String>, Query, description = "asc | desc")
    ),
    responses(
        (status = 200, description = "List recipes", body = ApiResponse<RecipeList>)
    ),
    tag = "Recipes"
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<ApiResponse<RecipeList>>> {
    let (data, meta) = recipe_service::list_recipes(
        &state,
        viewer.user_id(),
        query.filter(),
        query.ordering(),
        query.pagination(),
    )
    .await?;
    Ok(Json(ApiResponse::success("Recipes", data, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Get recipe", body = ApiResponse<RecipeView>),
        (status = 404, description = "Recipe not found")
    ),
    tag = "Recipes"
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeView>>> {
    let view = recipe_view::assemble_recipe(&state.orm, id, viewer.user_id()).await?;
    Ok(Json(ApiResponse::success("Recipe", view, None)))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = RecipeInput,
    responses(
        (status = 201, description = "Create recipe", body = ApiResponse<RecipeView>),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RecipeInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<RecipeView>>)> {
    let recipe = recipe_service::create_recipe(&state, &user, payload).await?;
    let view = recipe_view::assemble_recipe(&state.orm, recipe.id, Some(user.user_id)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Recipe created", view, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RecipeInput,
    responses(
        (status = 200, description = "Updated recipe", body = ApiResponse<RecipeView>),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipeInput>,
) -> AppResult<Json<ApiResponse<RecipeView>>> {
    recipe_service::update_recipe(&state, &user, id, payload).await?;
    let view = recipe_view::assemble_recipe(&state.orm, id, Some(user.user_id)).await?;
    Ok(Json(ApiResponse::success("Updated", view, Some(Meta::empty()))))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Deleted recipe"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    recipe_service::delete_recipe(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = ApiResponse<ShortRecipe>),
        (status = 404, description = "Recipe not found"),
        (status = 409, description = "Already in favorites")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApiResponse<ShortRecipe>>)> {
    relation_service::toggle_favorite(&state, user.user_id, id, ToggleOp::Add).await?;
    let recipe = recipe_service::get_short_recipe(&state, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Added to favorites", recipe, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 404, description = "Favorite not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    relation_service::toggle_favorite(&state, user.user_id, id, ToggleOp::Remove).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to shopping cart", body = ApiResponse<ShortRecipe>),
        (status = 404, description = "Recipe not found"),
        (status = 409, description = "Already in shopping cart")
    ),
    security(("bearer_auth" = [])),
    tag = "Shopping cart"
)]
pub async fn add_to_shopping_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApiResponse<ShortRecipe>>)> {
    relation_service::toggle_shopping_list_entry(&state, user.user_id, id, ToggleOp::Add).await?;
    let recipe = recipe_service::get_short_recipe(&state, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Added to shopping cart", recipe, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from shopping cart"),
        (status = 404, description = "Shopping list entry not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shopping cart"
)]
pub async fn remove_from_shopping_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    relation_service::toggle_shopping_list_entry(&state, user.user_id, id, ToggleOp::Remove)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Aggregated shopping list", body = String, content_type = "text/plain")
    ),
    security(("bearer_auth" = [])),
    tag = "Shopping cart"
)]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let report = shopping_list_service::shopping_list_report(&state.orm, user.user_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        report.render(),
    ))
}

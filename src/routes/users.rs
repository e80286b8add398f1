use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::users::SubscriptionList,
    error::AppResult,
    middleware::auth::{AuthUser, Viewer},
    models::{Subscription, UserProfile},
    response::{ApiResponse, Meta},
    routes::params::{RecipesLimitQuery, SubscriptionQuery},
    services::{
        relation_service::{self, ToggleOp},
        user_service,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/subscriptions", get(list_subscriptions))
        .route("/{id}", get(get_profile))
        .route("/{id}/subscribe", post(subscribe).delete(unsubscribe))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = ApiResponse<UserProfile>),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let profile = user_service::get_profile(&state, id, viewer.user_id()).await?;
    Ok(Json(ApiResponse::success("User", profile, None)))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let profile = user_service::get_profile(&state, user.user_id, Some(user.user_id)).await?;
    Ok(Json(ApiResponse::success("User", profile, None)))
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("recipes_limit" = Option<usize>, Query, description = "Recipes shown per author")
    ),
    responses(
        (status = 200, description = "Followed authors", body = ApiResponse<SubscriptionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SubscriptionQuery>,
) -> AppResult<Json<ApiResponse<SubscriptionList>>> {
    let (data, meta) = user_service::list_subscriptions(
        &state,
        user.user_id,
        query.pagination(),
        query.recipes_limit,
    )
    .await?;
    Ok(Json(ApiResponse::success("Subscriptions", data, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    params(
        ("id" = Uuid, Path, description = "Author ID"),
        ("recipes_limit" = Option<usize>, Query, description = "Recipes shown in the response")
    ),
    responses(
        (status = 201, description = "Subscribed", body = ApiResponse<Subscription>),
        (status = 400, description = "Cannot subscribe to yourself"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already subscribed")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<RecipesLimitQuery>,
) -> AppResult<(StatusCode, Json<ApiResponse<Subscription>>)> {
    relation_service::toggle_follow(&state, user.user_id, id, ToggleOp::Add).await?;
    let subscription = user_service::subscription_for(&state, id, query.recipes_limit).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Subscribed", subscription, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    params(
        ("id" = Uuid, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 404, description = "Subscription not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    relation_service::toggle_follow(&state, user.user_id, id, ToggleOp::Remove).await?;
    Ok(StatusCode::NO_CONTENT)
}

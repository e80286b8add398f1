use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        recipes::{RecipeInput, RecipeList},
        users::SubscriptionList,
    },
    models::{
        Ingredient, IngredientLine, RecipeIngredient, RecipeView, ShortRecipe, Subscription, Tag,
        UserProfile,
    },
    response::{ApiResponse, Meta},
    routes::{health, ingredients, params, recipes, tags, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_shopping_cart,
        recipes::remove_from_shopping_cart,
        recipes::download_shopping_cart,
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        tags::list_tags,
        tags::get_tag,
        users::get_profile,
        users::me,
        users::list_subscriptions,
        users::subscribe,
        users::unsubscribe
    ),
    components(
        schemas(
            UserProfile,
            Ingredient,
            IngredientLine,
            Tag,
            RecipeIngredient,
            RecipeView,
            ShortRecipe,
            Subscription,
            RecipeInput,
            RecipeList,
            SubscriptionList,
            params::Pagination,
            params::RecipeQuery,
            params::SubscriptionQuery,
            health::HealthData,
            Meta,
            ApiResponse<RecipeView>,
            ApiResponse<RecipeList>,
            ApiResponse<ShortRecipe>,
            ApiResponse<SubscriptionList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Recipes", description = "Recipe endpoints"),
        (name = "Favorites", description = "Favorite toggles"),
        (name = "Shopping cart", description = "Shopping list toggles and download"),
        (name = "Ingredients", description = "Ingredient catalog"),
        (name = "Tags", description = "Tag catalog"),
        (name = "Users", description = "Profiles and subscriptions"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

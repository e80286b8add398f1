use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entity::{
    Favorites, Follows, Ingredients, RecipeIngredients, RecipeTags, Recipes, ShoppingListEntries,
    Tags, Users, recipes,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Parents before children so foreign keys resolve on Postgres.
        manager.create_table(schema.create_table_from_entity(Users)).await?;
        manager.create_table(schema.create_table_from_entity(Ingredients)).await?;
        manager.create_table(schema.create_table_from_entity(Tags)).await?;
        manager.create_table(schema.create_table_from_entity(Recipes)).await?;
        manager.create_table(schema.create_table_from_entity(RecipeIngredients)).await?;
        manager.create_table(schema.create_table_from_entity(RecipeTags)).await?;
        manager.create_table(schema.create_table_from_entity(Favorites)).await?;
        manager.create_table(schema.create_table_from_entity(ShoppingListEntries)).await?;
        manager.create_table(schema.create_table_from_entity(Follows)).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_created_at")
                    .table(Recipes)
                    .col(recipes::Column::CreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_author_id")
                    .table(Recipes)
                    .col(recipes::Column::AuthorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, Follows).await?;
        drop_table(manager, ShoppingListEntries).await?;
        drop_table(manager, Favorites).await?;
        drop_table(manager, RecipeTags).await?;
        drop_table(manager, RecipeIngredients).await?;
        drop_table(manager, Recipes).await?;
        drop_table(manager, Tags).await?;
        drop_table(manager, Ingredients).await?;
        drop_table(manager, Users).await?;
        Ok(())
    }
}

async fn drop_table<E: EntityTrait>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}

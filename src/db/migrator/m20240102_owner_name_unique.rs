use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Reconciliation relies on these indexes: get-or-create is an
/// `INSERT .. ON CONFLICT (user_id, name) DO NOTHING` followed by a lookup.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_tags_user_name_unique")
                    .table(Tags::Table)
                    .col(Tags::UserId)
                    .col(Tags::Name)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ingredients_user_name_unique")
                    .table(Ingredients::Table)
                    .col(Ingredients::UserId)
                    .col(Ingredients::Name)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_user_id")
                    .table(Recipes::Table)
                    .col(Recipes::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_recipes_user_id").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ingredients_user_name_unique")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_tags_user_name_unique").to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    UserId,
    Name,
}

#[derive(DeriveIden)]
enum Ingredients {
    Table,
    UserId,
    Name,
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    UserId,
}

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite cannot add a foreign key to an existing table; on that
        // backend the set-null behavior is handled by the service layer.
        if manager.get_database_backend() == DbBackend::Sqlite {
            return Ok(());
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Collections::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_collections_featured_product_id")
                            .from_tbl(Collections::Table)
                            .from_col(Collections::FeaturedProductId)
                            .to_tbl(Products::Table)
                            .to_col(Products::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() == DbBackend::Sqlite {
            return Ok(());
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Collections::Table)
                    .drop_foreign_key(Alias::new("fk_collections_featured_product_id"))
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Collections {
    Table,
    FeaturedProductId,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}

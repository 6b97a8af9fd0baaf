use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Products::Title).string().not_null())
                    .col(ColumnDef::new(Products::Description).text().not_null())
                    .col(ColumnDef::new(Products::Slug).string().not_null())
                    .col(
                        ColumnDef::new(Products::UnitPrice)
                            .decimal_len(6, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Products::Inventory).integer().not_null())
                    .col(
                        ColumnDef::new(Products::LastUpdate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Products::CollectionId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_collection_id")
                            .from(Products::Table, Products::CollectionId)
                            .to(
                                super::m20240101_000001_create_collections_table::Collections::Table,
                                super::m20240101_000001_create_collections_table::Collections::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    Title,
    Description,
    Slug,
    UnitPrice,
    Inventory,
    LastUpdate,
    CollectionId,
}

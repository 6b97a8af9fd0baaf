use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CartItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CartItems::CartId).uuid().not_null())
                    .col(ColumnDef::new(CartItems::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(CartItems::Quantity)
                            .small_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_items_cart_id")
                            .from(CartItems::Table, CartItems::CartId)
                            .to(
                                super::m20240101_000009_create_carts_table::Carts::Table,
                                super::m20240101_000009_create_carts_table::Carts::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_items_product_id")
                            .from(CartItems::Table, CartItems::ProductId)
                            .to(
                                super::m20240101_000003_create_products_table::Products::Table,
                                super::m20240101_000003_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CartItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CartItems {
    Table,
    Id,
    CartId,
    ProductId,
    Quantity,
}

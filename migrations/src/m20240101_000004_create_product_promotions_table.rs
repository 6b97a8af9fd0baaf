use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Join table for the product <-> promotion many-to-many. The
        // composite primary key doubles as the uniqueness constraint.
        manager
            .create_table(
                Table::create()
                    .table(ProductPromotions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductPromotions::ProductId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductPromotions::PromotionId)
                            .uuid()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ProductPromotions::ProductId)
                            .col(ProductPromotions::PromotionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_promotions_product_id")
                            .from(ProductPromotions::Table, ProductPromotions::ProductId)
                            .to(
                                super::m20240101_000003_create_products_table::Products::Table,
                                super::m20240101_000003_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_promotions_promotion_id")
                            .from(ProductPromotions::Table, ProductPromotions::PromotionId)
                            .to(
                                super::m20240101_000002_create_promotions_table::Promotions::Table,
                                super::m20240101_000002_create_promotions_table::Promotions::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductPromotions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ProductPromotions {
    Table,
    ProductId,
    PromotionId,
}

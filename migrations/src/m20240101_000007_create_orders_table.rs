use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Orders::PlacedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .string_len(1)
                            .not_null()
                            .default("P"),
                    )
                    .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_customer_id")
                            .from(Orders::Table, Orders::CustomerId)
                            .to(
                                super::m20240101_000005_create_customers_table::Customers::Table,
                                super::m20240101_000005_create_customers_table::Customers::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    PlacedAt,
    PaymentStatus,
    CustomerId,
}

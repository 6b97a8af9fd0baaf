use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The customer id is the primary key, which caps the relation at
        // one address per customer.
        manager
            .create_table(
                Table::create()
                    .table(Addresses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Addresses::CustomerId)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Addresses::Street).string().not_null())
                    .col(ColumnDef::new(Addresses::City).string().not_null())
                    .col(ColumnDef::new(Addresses::ZipCode).string_len(10).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_addresses_customer_id")
                            .from(Addresses::Table, Addresses::CustomerId)
                            .to(
                                super::m20240101_000005_create_customers_table::Customers::Table,
                                super::m20240101_000005_create_customers_table::Customers::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Addresses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Addresses {
    Table,
    CustomerId,
    Street,
    City,
    ZipCode,
}

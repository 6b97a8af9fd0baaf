use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Customers::FirstName).string().not_null())
                    .col(ColumnDef::new(Customers::LastName).string().not_null())
                    .col(
                        ColumnDef::new(Customers::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Customers::Phone).string().not_null())
                    .col(ColumnDef::new(Customers::BirthDate).date().null())
                    .col(
                        ColumnDef::new(Customers::MembershipType)
                            .string_len(1)
                            .not_null()
                            .default("B"),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Customers {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    BirthDate,
    MembershipType,
}

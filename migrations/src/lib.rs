pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_collections_table;
mod m20240101_000002_create_promotions_table;
mod m20240101_000003_create_products_table;
mod m20240101_000004_create_product_promotions_table;
mod m20240101_000005_create_customers_table;
mod m20240101_000006_create_addresses_table;
mod m20240101_000007_create_orders_table;
mod m20240101_000008_create_order_items_table;
mod m20240101_000009_create_carts_table;
mod m20240101_000010_create_cart_items_table;
mod m20240102_000011_add_featured_product_fk;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_collections_table::Migration),
            Box::new(m20240101_000002_create_promotions_table::Migration),
            Box::new(m20240101_000003_create_products_table::Migration),
            Box::new(m20240101_000004_create_product_promotions_table::Migration),
            Box::new(m20240101_000005_create_customers_table::Migration),
            Box::new(m20240101_000006_create_addresses_table::Migration),
            Box::new(m20240101_000007_create_orders_table::Migration),
            Box::new(m20240101_000008_create_order_items_table::Migration),
            Box::new(m20240101_000009_create_carts_table::Migration),
            Box::new(m20240101_000010_create_cart_items_table::Migration),
            Box::new(m20240102_000011_add_featured_product_fk::Migration),
        ]
    }
}

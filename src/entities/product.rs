use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// URL-safe identifier used in storefront links.
    pub slug: String,
    #[sea_orm(column_type = "Decimal(Some((6, 2)))")]
    pub unit_price: Decimal,
    pub inventory: i32,
    pub last_update: DateTime<Utc>,
    pub collection_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collection::Entity",
        from = "Column::CollectionId",
        to = "super::collection::Column::Id"
    )]
    Collection,
    #[sea_orm(has_many = "super::product_promotion::Entity")]
    ProductPromotions,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collection.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::promotion::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_promotion::Relation::Promotion.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_promotion::Relation::Product.def().rev())
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    // last_update is server-maintained: stamped on every save.
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        active_model.last_update = Set(Utc::now());
        Ok(active_model)
    }
}

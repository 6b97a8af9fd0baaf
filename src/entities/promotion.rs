use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Promotion entity; linked to products through the join table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub description: String,
    pub discount: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_promotion::Entity")]
    ProductPromotions,
}

impl Related<super::product_promotion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductPromotions.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_promotion::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_promotion::Relation::Promotion.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

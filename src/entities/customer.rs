use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: String,
    #[sea_orm(nullable)]
    pub birth_date: Option<NaiveDate>,
    pub membership_type: MembershipType,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::address::Entity")]
    Address,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Membership tier, stored as the single-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum MembershipType {
    #[sea_orm(string_value = "B")]
    Bronze,
    #[sea_orm(string_value = "S")]
    Silver,
    #[sea_orm(string_value = "G")]
    Gold,
}

impl Default for MembershipType {
    fn default() -> Self {
        MembershipType::Bronze
    }
}

//! Order fact entity
//!
//! One row per ingested transaction record. Order rows carry the
//! measures and reference the customer, product and region dimensions.
//! There is no uniqueness constraint on `external_id`: re-ingesting the
//! same batch appends new rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Order identifier from the source system (not unique)
    #[sea_orm(column_type = "Text")]
    pub external_id: String,

    pub customer_id: Uuid,

    pub product_id: Uuid,

    pub region_id: Uuid,

    /// Calendar date of the sale; every aggregate query filters on it
    #[sea_orm(indexed)]
    pub date_of_sale: Date,

    pub quantity_sold: i32,

    pub discount: f64,

    pub shipping_cost: f64,

    #[sea_orm(column_type = "Text")]
    pub payment_method: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,

    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,

    #[sea_orm(
        belongs_to = "super::region::Entity",
        from = "Column::RegionId",
        to = "super::region::Column::Id"
    )]
    Region,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::region::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Region.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

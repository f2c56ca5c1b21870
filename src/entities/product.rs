//! Product entity - A sellable digital good.
//!
//! Pricing lives on variants. The delivery type decides which stock payload
//! columns are meaningful and cannot change once stock exists.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a product's stock is handed to the buyer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryType {
    /// Activation or gift code
    #[sea_orm(string_value = "CODE")]
    Code,
    /// Email and password pair
    #[sea_orm(string_value = "ACCOUNT")]
    Account,
    /// Free-form text payload
    #[sea_orm(string_value = "TEXT")]
    Text,
}

impl DeliveryType {
    /// Stored and displayed name of the delivery type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "CODE",
            Self::Account => "ACCOUNT",
            Self::Text => "TEXT",
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display title (e.g., "Netflix Premium")
    pub title: String,
    /// Unique URL-safe handle (e.g., "netflix-premium")
    #[sea_orm(unique)]
    pub slug: String,
    /// Which payload fields stock rows carry
    pub delivery_type: DeliveryType,
    /// Gates both visibility and purchasability
    pub active: bool,
    /// Optional long description
    pub description: Option<String>,
    /// When the product was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many variants
    #[sea_orm(has_many = "super::product_variant::Entity")]
    Variants,
    /// One product has many stock items
    #[sea_orm(has_many = "super::stock_item::Entity")]
    StockItems,
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variants.def()
    }
}

impl Related<super::stock_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

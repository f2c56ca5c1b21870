//! Stock item entity - One deliverable unit of inventory.
//!
//! The payload columns that are populated depend on the parent product's
//! delivery type. `allocated`, `allocated_to_id` and `allocated_at` flip exactly
//! once, when a purchase reserves the row.

use super::product::DeliveryType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_items")]
pub struct Model {
    /// Unique identifier; allocation order follows it
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning product
    pub product_id: i64,
    /// Variant this stock is tagged with, None for product-level stock
    pub variant_id: Option<i64>,
    /// Code payload (CODE products)
    pub code: Option<String>,
    /// Account email (ACCOUNT products)
    pub email: Option<String>,
    /// Account password (ACCOUNT products)
    pub password: Option<String>,
    /// Text payload (TEXT products)
    pub text: Option<String>,
    /// Optional note delivered with the payload
    pub note: Option<String>,
    /// Whether the row has been handed to a buyer
    pub allocated: bool,
    /// Buyer's user id, set iff allocated
    pub allocated_to_id: Option<i64>,
    /// Allocation time, set iff allocated
    pub allocated_at: Option<DateTimeUtc>,
    /// When the row was loaded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `StockItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each stock item belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Variant-scoped stock belongs to one variant
    #[sea_orm(
        belongs_to = "super::product_variant::Entity",
        from = "Column::VariantId",
        to = "super::product_variant::Column::Id"
    )]
    Variant,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The deliverable part of a stock row, typed by delivery kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryPayload {
    /// Activation code
    Code {
        /// The code itself
        code: String,
    },
    /// Account credentials
    Account {
        /// Login email
        email: String,
        /// Login password
        password: String,
    },
    /// Free-form text
    Text {
        /// The text itself
        text: String,
    },
}

impl DeliveryPayload {
    /// Delivery type this payload belongs to.
    #[must_use]
    pub const fn delivery_type(&self) -> DeliveryType {
        match self {
            Self::Code { .. } => DeliveryType::Code,
            Self::Account { .. } => DeliveryType::Account,
            Self::Text { .. } => DeliveryType::Text,
        }
    }

    /// Splits the payload into `(code, email, password, text)` columns.
    #[must_use]
    pub fn into_columns(
        self,
    ) -> (
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
    ) {
        match self {
            Self::Code { code } => (Some(code), None, None, None),
            Self::Account { email, password } => (None, Some(email), Some(password), None),
            Self::Text { text } => (None, None, None, Some(text)),
        }
    }
}

impl Model {
    /// Rebuilds the typed payload for the given delivery type.
    ///
    /// Returns None when the columns for that type are not populated.
    #[must_use]
    pub fn payload(&self, delivery_type: DeliveryType) -> Option<DeliveryPayload> {
        match delivery_type {
            DeliveryType::Code => self.code.clone().map(|code| DeliveryPayload::Code { code }),
            DeliveryType::Account => match (&self.email, &self.password) {
                (Some(email), Some(password)) => Some(DeliveryPayload::Account {
                    email: email.clone(),
                    password: password.clone(),
                }),
                _ => None,
            },
            DeliveryType::Text => self.text.clone().map(|text| DeliveryPayload::Text { text }),
        }
    }
}

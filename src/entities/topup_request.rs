//! Top-up request entity - A customer's request to fund their wallet.
//!
//! Requests start PENDING and are decided once, by an administrator.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a top-up request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum TopupStatus {
    /// Waiting for an administrator
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Credited to the wallet
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Declined, nothing credited
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

/// Top-up request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "topup_requests")]
pub struct Model {
    /// Unique identifier for the request
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Requesting user
    pub user_id: i64,
    /// Amount to credit
    pub amount: i64,
    /// Payment method (e.g., "KBZ")
    pub method: String,
    /// Payment reference the customer supplied
    pub reference: Option<String>,
    /// Current state
    pub status: TopupStatus,
    /// When the request was made
    pub created_at: DateTimeUtc,
    /// When it was approved or rejected
    pub decided_at: Option<DateTimeUtc>,
}

/// Defines relationships between `TopupRequest` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each request belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

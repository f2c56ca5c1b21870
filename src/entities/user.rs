//! User entity - A customer or administrator with a prepaid wallet.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Access level of a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular customer
    #[sea_orm(string_value = "USER")]
    User,
    /// Catalog, stock and top-up administrator
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID the identity resolver maps from
    #[sea_orm(unique)]
    pub discord_id: String,
    /// Contact email used for notifications
    pub email: String,
    /// Access level
    pub role: Role,
    /// Current wallet balance, never negative
    pub wallet_balance: i64,
    /// When the user registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many wallet transactions
    #[sea_orm(has_many = "super::wallet_transaction::Entity")]
    WalletTransactions,
    /// One user has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::wallet_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletTransactions.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this user may run admin commands.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

//! Entity module - Contains all SeaORM entity definitions for the storefront database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod order;
pub mod order_item;
pub mod product;
pub mod product_variant;
pub mod stock_item;
pub mod topup_request;
pub mod user;
pub mod wallet_transaction;

// Re-export specific types to avoid conflicts
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use product::{
    Column as ProductColumn, DeliveryType, Entity as Product, Model as ProductModel,
};
pub use product_variant::{
    Column as ProductVariantColumn, Entity as ProductVariant, Model as ProductVariantModel,
};
pub use stock_item::{
    Column as StockItemColumn, DeliveryPayload, Entity as StockItem, Model as StockItemModel,
};
pub use topup_request::{
    Column as TopupRequestColumn, Entity as TopupRequest, Model as TopupRequestModel,
    TopupStatus,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
pub use wallet_transaction::{
    Column as WalletTransactionColumn, Entity as WalletTransaction,
    Model as WalletTransactionModel,
};

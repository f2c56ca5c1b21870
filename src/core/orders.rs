//! Order store business logic - Immutable purchase receipts.
//!
//! Orders are written once by the purchase flow and never updated or deleted by any
//! catalog operation. Each order item is a verbatim copy of an allocated stock payload,
//! so history stays readable after stock rows or whole products are purged.

use crate::{
    entities::{DeliveryType, Order, OrderItem, order, order_item, stock_item},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use std::collections::HashMap;

/// Header fields of an order about to be written.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Buyer
    pub user_id: i64,
    /// Product bought
    pub product_id: i64,
    /// "Product - Variant" snapshot
    pub product_title: String,
    /// Delivery type snapshot
    pub delivery_type: DeliveryType,
}

/// An order with its delivered items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithItems {
    /// Order header
    pub order: order::Model,
    /// Delivered payloads, in allocation order
    pub items: Vec<order_item::Model>,
}

/// Writes an order and one snapshot item per stock row.
///
/// Meant to run inside the purchase transaction.
pub async fn create_order<C>(
    db: &C,
    new_order: NewOrder,
    stock: &[stock_item::Model],
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let order = order::ActiveModel {
        user_id: Set(new_order.user_id),
        product_id: Set(new_order.product_id),
        product_title: Set(new_order.product_title),
        delivery_type: Set(new_order.delivery_type),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    if !stock.is_empty() {
        let items = stock.iter().map(|row| order_item::ActiveModel {
            order_id: Set(order.id),
            code: Set(row.code.clone()),
            email: Set(row.email.clone()),
            password: Set(row.password.clone()),
            text: Set(row.text.clone()),
            note: Set(row.note.clone()),
            ..Default::default()
        });
        OrderItem::insert_many(items)
            .exec_without_returning(db)
            .await?;
    }

    Ok(order)
}

/// Lists a user's orders with items, newest first.
pub async fn list_orders_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<OrderWithItems>> {
    let orders = Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order: HashMap<i64, Vec<order_item::Model>> = HashMap::new();
    for item in OrderItem::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?
    {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

/// Fetches one of the user's orders.
///
/// # Errors
/// Returns `NotFound` when the order does not exist or belongs to someone else.
pub async fn get_order_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    order_id: i64,
) -> Result<OrderWithItems> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .filter(|order| order.user_id == user_id)
        .ok_or_else(|| Error::not_found("Order", order_id))?;

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;
    Ok(OrderWithItems { order, items })
}

/// Counts orders ever placed for a product, purged or not.
pub async fn count_orders_for_product<C>(db: &C, product_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::ProductId.eq(product_id))
        .count(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::purchase;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_history_is_newest_first_with_items() -> Result<()> {
        let db = setup_test_db().await?;
        let (_product, variant) = setup_code_offering(&db, 100, 5).await?;
        let buyer = create_test_user(&db, "buyer", 1000).await?;

        let first = purchase::purchase(&db, buyer.id, variant.id, Some(2)).await?;
        let second = purchase::purchase(&db, buyer.id, variant.id, Some(1)).await?;

        let history = list_orders_for_user(&db, buyer.id).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].order.id, second.order_id);
        assert_eq!(history[0].items.len(), 1);
        assert_eq!(history[1].order.id, first.order_id);
        assert_eq!(history[1].items.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_other_users_order_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let (_product, variant) = setup_code_offering(&db, 100, 1).await?;
        let buyer = create_test_user(&db, "buyer", 100).await?;
        let snoop = create_test_user(&db, "snoop", 0).await?;

        let receipt = purchase::purchase(&db, buyer.id, variant.id, None).await?;

        let result = get_order_for_user(&db, snoop.id, receipt.order_id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        assert!(list_orders_for_user(&db, snoop.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_order_items_copy_payload_verbatim() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, variant) = setup_code_offering(&db, 100, 1).await?;
        let buyer = create_test_user(&db, "buyer", 100).await?;

        let stock_before =
            crate::core::stock::find_unallocated(&db, product.id, Some(variant.id), 1).await?;
        let receipt = purchase::purchase(&db, buyer.id, variant.id, Some(1)).await?;

        let order = get_order_for_user(&db, buyer.id, receipt.order_id).await?;
        assert_eq!(order.order.delivery_type, DeliveryType::Code);
        assert_eq!(order.items[0].code, stock_before[0].code);
        assert_eq!(order.items[0].note, stock_before[0].note);
        Ok(())
    }
}

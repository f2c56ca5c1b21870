//! Purchase orchestration - The transactional core of the storefront.
//!
//! A purchase reserves stock, debits the wallet and writes the order inside one
//! database transaction. Every read and write below goes through that transaction;
//! nothing touches the pool directly until commit, and any early return drops the
//! transaction, which rolls everything back.
//!
//! Two conditional updates carry the concurrency guarantees:
//! - the wallet debit only matches while `wallet_balance >= total`;
//! - the stock reservation only matches rows that are still `allocated = false`.
//!
//! Both affected-row counts are checked. A shortfall in either aborts the purchase.

use crate::{
    core::{
        catalog,
        orders::{self, NewOrder},
        stock, users, wallet,
    },
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, instrument, warn};

/// Outcome of a successful purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// The order that was written
    pub order_id: i64,
    /// Wallet balance after the debit
    pub new_wallet_balance: i64,
    /// Number of items delivered
    pub quantity: i64,
    /// Amount debited
    pub total: i64,
}

/// Coerces a requested quantity to at least one item.
///
/// Missing, zero and negative quantities all mean "one".
#[must_use]
pub fn normalize_quantity(quantity: Option<i64>) -> i64 {
    quantity.filter(|q| *q >= 1).unwrap_or(1)
}

/// Buys `quantity` items of a variant with the user's wallet balance.
///
/// # Errors
/// Checked in this order, each with its own variant:
/// - The user or the variant (with its product) does not exist (`NotFound`)
/// - The variant or its product is inactive (`Unavailable`)
/// - Fewer than `quantity` unallocated rows exist, or a concurrent purchase took some
///   of them first (`OutOfStock`)
/// - `price × quantity` overflows (`Validation`)
/// - The wallet holds less than the total (`InsufficientFunds`)
#[instrument(skip(db))]
pub async fn purchase(
    db: &DatabaseConnection,
    user_id: i64,
    variant_id: i64,
    quantity: Option<i64>,
) -> Result<PurchaseReceipt> {
    let txn = db.begin().await?;

    let user = users::get_user_by_id(&txn, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    let (variant, product) = catalog::get_variant_with_product(&txn, variant_id)
        .await?
        .ok_or_else(|| Error::not_found("Variant", variant_id))?;

    let quantity = normalize_quantity(quantity);
    let title = catalog::offering_title(&product, &variant);

    if !variant.active || !product.active {
        return Err(Error::Unavailable { title });
    }

    let requested = quantity.unsigned_abs();
    let candidates =
        stock::find_unallocated(&txn, product.id, Some(variant.id), requested).await?;
    if (candidates.len() as u64) < requested {
        return Err(Error::OutOfStock {
            requested,
            available: candidates.len() as u64,
        });
    }

    let total = variant.price.checked_mul(quantity).ok_or_else(|| {
        Error::validation(format!(
            "Total for {quantity} × {} is too large",
            variant.price
        ))
    })?;
    if user.wallet_balance < total {
        return Err(Error::InsufficientFunds {
            balance: user.wallet_balance,
            required: total,
        });
    }

    // A free variant has nothing to debit and leaves the ledger alone.
    let new_wallet_balance = if total > 0 {
        wallet::debit(&txn, user.id, total, &format!("Purchase: {title}")).await?
    } else {
        user.wallet_balance
    };

    let ids: Vec<i64> = candidates.iter().map(|row| row.id).collect();
    let reserved = stock::reserve(&txn, &ids, user.id).await?;
    if reserved != requested {
        warn!(
            user_id,
            variant_id, requested, reserved, "Lost stock reservation race, aborting"
        );
        return Err(Error::OutOfStock {
            requested,
            available: reserved,
        });
    }

    let order = orders::create_order(
        &txn,
        NewOrder {
            user_id: user.id,
            product_id: product.id,
            product_title: title,
            delivery_type: product.delivery_type,
        },
        &candidates,
    )
    .await?;

    txn.commit().await?;

    info!(
        order_id = order.id,
        user_id,
        variant_id,
        quantity,
        total,
        new_wallet_balance,
        "Purchase completed"
    );

    Ok(PurchaseReceipt {
        order_id: order.id,
        new_wallet_balance,
        quantity,
        total,
    })
}

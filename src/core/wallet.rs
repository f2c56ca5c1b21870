//! Wallet ledger business logic - Balance mutations and their audit trail.
//!
//! Every balance change is a single conditional `UPDATE` on the user row followed by
//! exactly one append-only `wallet_transactions` row, both inside one database
//! transaction. Debits carry the `wallet_balance >= amount` predicate in the same
//! statement as the decrement, so two concurrent debits can never overdraw a wallet.
//!
//! Both mutations accept any [`TransactionTrait`] connection. Called on a plain
//! connection they open their own transaction; called on an open transaction (as the
//! purchase flow does) they nest inside it and roll back with it.

use crate::{
    entities::{User, WalletTransaction, user, wallet_transaction},
    errors::{Error, Result},
};
use sea_orm::{
    QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::debug;

/// Debits `amount` from the user's wallet and records `-amount` in the ledger.
///
/// # Returns
/// The balance after the debit.
///
/// # Errors
/// Returns an error if:
/// - `amount` is not positive (`Validation`)
/// - The user does not exist (`NotFound`)
/// - The balance is lower than `amount` at the moment of the update (`InsufficientFunds`)
pub async fn debit<C>(db: &C, user_id: i64, amount: i64, reason: &str) -> Result<i64>
where
    C: TransactionTrait,
{
    if amount <= 0 {
        return Err(Error::validation(format!(
            "Debit amount must be positive, got {amount}"
        )));
    }

    let txn = db.begin().await?;

    let updated = User::update_many()
        .col_expr(
            user::Column::WalletBalance,
            Expr::col(user::Column::WalletBalance).sub(amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::WalletBalance.gte(amount))
        .exec(&txn)
        .await?;

    if updated.rows_affected != 1 {
        // Nothing matched: either no such user or not enough money.
        let user = User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::not_found("User", user_id))?;
        return Err(Error::InsufficientFunds {
            balance: user.wallet_balance,
            required: amount,
        });
    }

    append_entry(&txn, user_id, -amount, reason).await?;
    let balance = current_balance(&txn, user_id).await?;
    txn.commit().await?;

    debug!(user_id, amount, balance, "Wallet debited");
    Ok(balance)
}

/// Credits `amount` to the user's wallet and records it in the ledger.
///
/// # Returns
/// The balance after the credit.
///
/// # Errors
/// Returns an error if `amount` is not positive or the user does not exist.
pub async fn credit<C>(db: &C, user_id: i64, amount: i64, reason: &str) -> Result<i64>
where
    C: TransactionTrait,
{
    if amount <= 0 {
        return Err(Error::validation(format!(
            "Credit amount must be positive, got {amount}"
        )));
    }

    let txn = db.begin().await?;

    let updated = User::update_many()
        .col_expr(
            user::Column::WalletBalance,
            Expr::col(user::Column::WalletBalance).add(amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(&txn)
        .await?;

    if updated.rows_affected != 1 {
        return Err(Error::not_found("User", user_id));
    }

    append_entry(&txn, user_id, amount, reason).await?;
    let balance = current_balance(&txn, user_id).await?;
    txn.commit().await?;

    debug!(user_id, amount, balance, "Wallet credited");
    Ok(balance)
}

async fn append_entry<C>(db: &C, user_id: i64, amount: i64, reason: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    wallet_transaction::ActiveModel {
        user_id: Set(user_id),
        amount: Set(amount),
        reason: Set(reason.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn current_balance<C>(db: &C, user_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .map(|user| user.wallet_balance)
        .ok_or_else(|| Error::not_found("User", user_id))
}

/// Returns the user's current wallet balance.
pub async fn get_balance(db: &DatabaseConnection, user_id: i64) -> Result<i64> {
    current_balance(db, user_id).await
}

/// Lists the user's ledger entries, newest first.
pub async fn list_transactions(
    db: &DatabaseConnection,
    user_id: i64,
    limit: u64,
) -> Result<Vec<wallet_transaction::Model>> {
    WalletTransaction::find()
        .filter(wallet_transaction::Column::UserId.eq(user_id))
        .order_by_desc(wallet_transaction::Column::CreatedAt)
        .order_by_desc(wallet_transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums every ledger entry of the user; always equal to the wallet balance.
pub async fn ledger_sum<C>(db: &C, user_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let entries = WalletTransaction::find()
        .filter(wallet_transaction::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    Ok(entries.iter().map(|entry| entry.amount).sum())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_credit_and_debit_keep_ledger_in_sync() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u1", 0).await?;

        assert_eq!(credit(&db, user.id, 2500, "Top-up").await?, 2500);
        assert_eq!(debit(&db, user.id, 1000, "Purchase: Test").await?, 1500);

        assert_eq!(get_balance(&db, user.id).await?, 1500);
        assert_eq!(ledger_sum(&db, user.id).await?, 1500);

        let entries = list_transactions(&db, user.id, 10).await?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].amount, -1000);
        assert_eq!(entries[0].reason, "Purchase: Test");
        assert_eq!(entries[1].amount, 2500);
        Ok(())
    }

    #[tokio::test]
    async fn test_debit_insufficient_funds_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u1", 500).await?;

        let result = debit(&db, user.id, 501, "Too much").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientFunds {
                balance: 500,
                required: 501
            }
        ));

        assert_eq!(get_balance(&db, user.id).await?, 500);
        assert_eq!(list_transactions(&db, user.id, 10).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_debit_exact_balance_reaches_zero() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u1", 700).await?;

        assert_eq!(debit(&db, user.id, 700, "All in").await?, 0);
        assert_eq!(ledger_sum(&db, user.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_user_and_invalid_amounts() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(matches!(
            debit(&db, 999, 10, "x").await.unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            credit(&db, 999, 10, "x").await.unwrap_err(),
            Error::NotFound { .. }
        ));

        let user = create_test_user(&db, "u1", 100).await?;
        assert!(matches!(
            debit(&db, user.id, 0, "x").await.unwrap_err(),
            Error::Validation { .. }
        ));
        assert!(matches!(
            credit(&db, user.id, -5, "x").await.unwrap_err(),
            Error::Validation { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_debit_rolls_back_with_outer_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u1", 1000).await?;

        let txn = db.begin().await?;
        assert_eq!(debit(&txn, user.id, 400, "Nested").await?, 600);
        txn.rollback().await?;

        assert_eq!(get_balance(&db, user.id).await?, 1000);
        assert_eq!(ledger_sum(&db, user.id).await?, 1000);
        Ok(())
    }
}

//! Top-up business logic - Customer funding requests and their approval.
//!
//! A request is created PENDING and decided exactly once. Approval flips the status
//! with a conditional update (`WHERE status = 'PENDING'`) and credits the wallet in the
//! same transaction, so a request approved twice concurrently credits only once.
//! Notifications are the caller's business and happen after commit.

use crate::{
    core::{users, wallet},
    entities::{TopupRequest, TopupStatus, topup_request},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// An approved request and the wallet balance it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedTopup {
    /// The request, now APPROVED
    pub request: topup_request::Model,
    /// Balance after the credit
    pub new_wallet_balance: i64,
}

/// Records a pending top-up request.
///
/// # Errors
/// Returns an error if:
/// - `amount` is not positive or `method` is blank (`Validation`)
/// - The user does not exist (`NotFound`)
pub async fn request_topup(
    db: &DatabaseConnection,
    user_id: i64,
    amount: i64,
    method: &str,
    reference: Option<&str>,
) -> Result<topup_request::Model> {
    if amount <= 0 {
        return Err(Error::validation("Top-up amount must be positive"));
    }
    let method = method.trim();
    if method.is_empty() {
        return Err(Error::validation("Payment method is required"));
    }
    if users::get_user_by_id(db, user_id).await?.is_none() {
        return Err(Error::not_found("User", user_id));
    }

    let request = topup_request::ActiveModel {
        user_id: Set(user_id),
        amount: Set(amount),
        method: Set(method.to_string()),
        reference: Set(reference
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(ToString::to_string)),
        status: Set(TopupStatus::Pending),
        created_at: Set(chrono::Utc::now()),
        decided_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(topup_id = request.id, user_id, amount, "Top-up requested");
    Ok(request)
}

/// Approves a pending request and credits the wallet.
///
/// # Errors
/// Returns `NotFound` for an unknown request and `Conflict` when it was already decided.
#[instrument(skip(db))]
pub async fn approve_topup(db: &DatabaseConnection, topup_id: i64) -> Result<ApprovedTopup> {
    let txn = db.begin().await?;

    let request = decide(&txn, topup_id, TopupStatus::Approved).await?;
    let new_wallet_balance = wallet::credit(
        &txn,
        request.user_id,
        request.amount,
        &format!("Top-up #{} ({})", request.id, request.method),
    )
    .await?;

    txn.commit().await?;

    info!(
        topup_id,
        user_id = request.user_id,
        amount = request.amount,
        new_wallet_balance,
        "Top-up approved"
    );
    Ok(ApprovedTopup {
        request,
        new_wallet_balance,
    })
}

/// Rejects a pending request. Nothing is credited.
///
/// # Errors
/// Returns `NotFound` for an unknown request and `Conflict` when it was already decided.
#[instrument(skip(db))]
pub async fn reject_topup(db: &DatabaseConnection, topup_id: i64) -> Result<topup_request::Model> {
    let request = decide(db, topup_id, TopupStatus::Rejected).await?;
    info!(topup_id, user_id = request.user_id, "Top-up rejected");
    Ok(request)
}

async fn decide<C>(db: &C, topup_id: i64, status: TopupStatus) -> Result<topup_request::Model>
where
    C: ConnectionTrait,
{
    let updated = TopupRequest::update_many()
        .col_expr(topup_request::Column::Status, Expr::value(status))
        .col_expr(
            topup_request::Column::DecidedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(topup_request::Column::Id.eq(topup_id))
        .filter(topup_request::Column::Status.eq(TopupStatus::Pending))
        .exec(db)
        .await?;

    let request = TopupRequest::find_by_id(topup_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Top-up", topup_id))?;

    if updated.rows_affected != 1 {
        return Err(Error::conflict(format!(
            "Top-up #{topup_id} was already {:?}",
            request.status
        )));
    }
    Ok(request)
}

/// Lists pending requests, oldest first.
pub async fn list_pending_topups(db: &DatabaseConnection) -> Result<Vec<topup_request::Model>> {
    TopupRequest::find()
        .filter(topup_request::Column::Status.eq(TopupStatus::Pending))
        .order_by_asc(topup_request::Column::CreatedAt)
        .order_by_asc(topup_request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists a user's requests, newest first.
pub async fn list_topups_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<topup_request::Model>> {
    TopupRequest::find()
        .filter(topup_request::Column::UserId.eq(user_id))
        .order_by_desc(topup_request::Column::CreatedAt)
        .order_by_desc(topup_request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_request_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u1", 0).await?;

        assert!(matches!(
            request_topup(&db, user.id, 0, "KBZ", None).await.unwrap_err(),
            Error::Validation { .. }
        ));
        assert!(matches!(
            request_topup(&db, user.id, 100, "  ", None).await.unwrap_err(),
            Error::Validation { .. }
        ));
        assert!(matches!(
            request_topup(&db, 999, 100, "KBZ", None).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_credits_once() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u1", 500).await?;
        let request = request_topup(&db, user.id, 20000, "KBZ", Some(" 123456 ")).await?;
        assert_eq!(request.status, TopupStatus::Pending);
        assert_eq!(request.reference.as_deref(), Some("123456"));
        assert_eq!(list_pending_topups(&db).await?.len(), 1);

        let approved = approve_topup(&db, request.id).await?;
        assert_eq!(approved.request.status, TopupStatus::Approved);
        assert!(approved.request.decided_at.is_some());
        assert_eq!(approved.new_wallet_balance, 20500);

        assert!(matches!(
            approve_topup(&db, request.id).await.unwrap_err(),
            Error::Conflict { .. }
        ));
        assert!(matches!(
            reject_topup(&db, request.id).await.unwrap_err(),
            Error::Conflict { .. }
        ));

        assert_eq!(wallet::get_balance(&db, user.id).await?, 20500);
        assert_eq!(wallet::ledger_sum(&db, user.id).await?, 20500);
        assert!(list_pending_topups(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reject_leaves_wallet_alone() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u1", 0).await?;
        let request = request_topup(&db, user.id, 5000, "Wave", None).await?;

        let rejected = reject_topup(&db, request.id).await?;
        assert_eq!(rejected.status, TopupStatus::Rejected);
        assert_eq!(wallet::get_balance(&db, user.id).await?, 0);

        assert!(matches!(
            approve_topup(&db, 999).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_user_history_is_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u1", 0).await?;
        let first = request_topup(&db, user.id, 100, "KBZ", None).await?;
        let second = request_topup(&db, user.id, 200, "KBZ", None).await?;

        let history = list_topups_for_user(&db, user.id).await?;
        assert_eq!(
            history.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
        Ok(())
    }
}

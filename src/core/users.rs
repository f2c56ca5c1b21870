//! Identity business logic - Maps Discord users to storefront users.
//!
//! The storefront treats the Discord user id as an opaque identity. A user row is
//! created once through `/register`; every other command resolves the caller through
//! [`resolve_identity`].

use crate::{
    entities::{Role, User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Result of resolving a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No registered user for this Discord id
    Anonymous,
    /// A registered user
    User(user::Model),
}

impl Identity {
    /// Returns the user, or `NotFound` for anonymous callers.
    pub fn require_user(self, discord_id: &str) -> Result<user::Model> {
        match self {
            Self::User(user) => Ok(user),
            Self::Anonymous => Err(Error::not_found("User", discord_id)),
        }
    }
}

/// Resolves a Discord user id to a storefront identity.
pub async fn resolve_identity(db: &DatabaseConnection, discord_id: &str) -> Result<Identity> {
    Ok(find_user_by_discord_id(db, discord_id)
        .await?
        .map_or(Identity::Anonymous, Identity::User))
}

/// Finds a user by Discord id.
pub async fn find_user_by_discord_id(
    db: &DatabaseConnection,
    discord_id: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::DiscordId.eq(discord_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a user by primary key.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Registers a new user with an empty wallet.
///
/// # Errors
/// Returns an error if:
/// - The email is empty or has no `@` (`Validation`)
/// - The Discord id is already registered (`Conflict`)
/// - The database insert fails
pub async fn register_user(
    db: &DatabaseConnection,
    discord_id: &str,
    email: &str,
    role: Role,
) -> Result<user::Model> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::validation(format!("'{email}' is not a valid email")));
    }

    if find_user_by_discord_id(db, discord_id).await?.is_some() {
        return Err(Error::conflict("You are already registered"));
    }

    let model = user::ActiveModel {
        discord_id: Set(discord_id.to_string()),
        email: Set(email.to_lowercase()),
        role: Set(role),
        wallet_balance: Set(0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let user = model.insert(db).await?;
    info!(user_id = user.id, role = ?user.role, "Registered user");
    Ok(user)
}

/// Changes a user's role.
pub async fn set_role(db: &DatabaseConnection, user_id: i64, role: Role) -> Result<user::Model> {
    let user = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;

    let mut active: user::ActiveModel = user.into();
    active.role = Set(role);
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_register_and_resolve() -> Result<()> {
        let db = setup_test_db().await?;

        assert_eq!(
            resolve_identity(&db, "42").await?,
            Identity::Anonymous
        );

        let user = register_user(&db, "42", " Buyer@Example.com ", Role::User).await?;
        assert_eq!(user.email, "buyer@example.com");
        assert_eq!(user.wallet_balance, 0);

        let resolved = resolve_identity(&db, "42").await?.require_user("42")?;
        assert_eq!(resolved.id, user.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email_and_duplicates() -> Result<()> {
        let db = setup_test_db().await?;

        let result = register_user(&db, "1", "not-an-email", Role::User).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        register_user(&db, "1", "a@x.com", Role::User).await?;
        let result = register_user(&db, "1", "b@x.com", Role::User).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        Ok(())
    }

    #[test]
    fn test_anonymous_require_user_is_not_found() {
        let result = Identity::Anonymous.require_user("7");
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_role() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "9", 0).await?;

        let admin = set_role(&db, user.id, Role::Admin).await?;
        assert!(admin.is_admin());
        Ok(())
    }
}

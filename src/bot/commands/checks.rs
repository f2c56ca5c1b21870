//! Permission checks and caller resolution shared by the commands.

use crate::{
    bot::Context,
    core::users::{self, Identity},
    entities::{Role, user},
    errors::Result,
};
use tracing::info;

/// Whether the caller may run admin commands.
///
/// Discord ids listed in `ADMIN_USER_IDS` always pass; their user row is promoted to
/// ADMIN on the way if it was registered before the id was listed. Registered users with
/// the ADMIN role pass as well.
pub async fn is_admin(ctx: Context<'_>) -> Result<bool> {
    let discord_id = ctx.author().id.to_string();
    let db = &ctx.data().database;
    let listed = ctx.data().admin_ids.contains(&discord_id);

    match users::resolve_identity(db, &discord_id).await? {
        Identity::User(user) if listed && !user.is_admin() => {
            users::set_role(db, user.id, Role::Admin).await?;
            info!(user_id = user.id, "Promoted listed admin");
            Ok(true)
        }
        Identity::User(user) => Ok(listed || user.is_admin()),
        Identity::Anonymous => Ok(listed),
    }
}

/// Resolves the caller, telling them to register when they have not.
///
/// Returns `None` after replying, so commands can bail out with `let ... else`.
pub async fn current_user(ctx: Context<'_>) -> Result<Option<user::Model>> {
    let discord_id = ctx.author().id.to_string();
    match users::resolve_identity(&ctx.data().database, &discord_id).await? {
        Identity::User(user) => Ok(Some(user)),
        Identity::Anonymous => {
            ctx.send(
                poise::CreateReply::default()
                    .content("👋 You are not registered yet. Use `/register <email>` first.")
                    .ephemeral(true),
            )
            .await?;
            Ok(None)
        }
    }
}

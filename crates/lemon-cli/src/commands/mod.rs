//! Subcommand implementations.

pub mod feedback;
pub mod login;
pub mod logout;
pub mod menu;
pub mod profile;
pub mod request;
pub mod status;
pub mod whoami;

use anyhow::Result;
use lemon_core::User;

use crate::context::Context;

/// The signed-in user, or an error telling the person to log in.
pub(crate) async fn require_user(ctx: &Context) -> Result<User> {
    ctx.manager.initialize().await;
    match ctx.manager.user().await {
        Some(user) => Ok(user),
        None => anyhow::bail!("Not logged in. Run 'lemon login' first."),
    }
}

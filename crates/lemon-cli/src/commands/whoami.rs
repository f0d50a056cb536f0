//! Whoami command implementation.

use anyhow::Result;

use super::require_user;
use crate::context::Context;
use crate::output;

pub async fn run(ctx: &Context) -> Result<()> {
    let user = require_user(ctx).await?;

    output::field("Name", &user.name);
    output::field("Email", &user.email);
    output::field("ID", &user.id.to_string());
    if let Some(ref role) = user.role {
        output::field("Role", role);
    }

    Ok(())
}

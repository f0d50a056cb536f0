//! Logout command implementation.

use anyhow::Result;

use crate::context::Context;
use crate::output;

pub async fn run(ctx: &Context) -> Result<()> {
    ctx.manager.initialize().await;
    ctx.manager.logout().await;
    output::success("Logged out");
    Ok(())
}

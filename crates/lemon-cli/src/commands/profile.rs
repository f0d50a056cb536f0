//! Profile command implementation.

use anyhow::Result;

use super::require_user;
use crate::context::Context;
use crate::output;

pub async fn run(ctx: &Context) -> Result<()> {
    require_user(ctx).await?;
    let profile = ctx.manager.api().get_user_profile().await?;
    output::json_pretty(&profile)
}

//! Status command implementation.

use anyhow::Result;
use chrono::Utc;

use crate::context::Context;
use crate::output;

pub async fn run(ctx: &Context) -> Result<()> {
    ctx.manager.initialize().await;

    let server = if ctx.demo {
        "demo account"
    } else {
        ctx.manager.client().config().base_url.as_str()
    };
    output::field("Server", server);
    output::field("Data", &ctx.data_dir.display().to_string());

    let Some(session) = ctx.manager.session().await else {
        output::field("Session", "signed out");
        return Ok(());
    };

    let state = if ctx.manager.is_authenticated().await {
        "authenticated"
    } else {
        "expired"
    };
    output::field("Session", state);
    output::field("User", &session.user.email);

    if let Ok(claims) = session.access_token.claims() {
        let remaining = claims.remaining_at(Utc::now());
        if let Some(expires) = claims.expires_at() {
            output::field(
                "Expires",
                &format!("{} ({}s left)", expires.to_rfc3339(), remaining.max(0)),
            );
        }
    }

    Ok(())
}

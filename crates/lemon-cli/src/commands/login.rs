//! Login command implementation.

use anyhow::Result;
use clap::Args;

use lemon_core::Credentials;
use lemon_core::validation::{validate_email, validate_password};

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "LEMON_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(ctx: &Context, args: LoginArgs) -> Result<()> {
    let email = args.email.trim();
    validate_email(email)?;
    validate_password(&args.password)?;

    output::note("Logging in...");
    let session = ctx
        .manager
        .login(Credentials::new(email, args.password))
        .await?;

    output::success("Logged in successfully");
    println!();
    output::field("Name", &session.user.name);
    output::field("Email", &session.user.email);

    Ok(())
}

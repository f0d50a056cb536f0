//! lemon - Command-line client for the Little Lemon API.
//!
//! A thin wrapper over `lemon-core`: the session lives on disk between
//! invocations and every request goes through the authenticated pipeline.

mod cli;
mod commands;
mod context;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use context::Context;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Bare library errors carry a message meant for people.
            let library = err
                .chain()
                .next()
                .and_then(|e| e.downcast_ref::<lemon_core::Error>());
            match library {
                Some(e) => {
                    tracing::debug!(error = %e, "Command failed");
                    output::error(&e.user_message());
                }
                None => output::error(&format!("{err:#}")),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::new(&cli.connection)?;

    match cli.command {
        Commands::Login(args) => commands::login::run(&ctx, args).await,
        Commands::Logout => commands::logout::run(&ctx).await,
        Commands::Whoami => commands::whoami::run(&ctx).await,
        Commands::Status => commands::status::run(&ctx).await,
        Commands::Request(args) => commands::request::run(&ctx, args).await,
        Commands::Menu => commands::menu::run(&ctx).await,
        Commands::Profile => commands::profile::run(&ctx).await,
        Commands::Feedback(args) => commands::feedback::run(&ctx, args).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout is reserved for command output
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lemon_core::config::DEFAULT_BASE_URL;

use crate::commands::{feedback, login, request};

/// Command-line client for the Little Lemon API.
#[derive(Parser, Debug)]
#[command(name = "lemon")]
#[command(author, version = env!("LEMON_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to connect and how hard to try.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// API base URL
    #[arg(long, env = "LEMON_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Per-attempt timeout in milliseconds
    #[arg(long, env = "LEMON_TIMEOUT_MS", default_value_t = 10_000, global = true)]
    pub timeout_ms: u64,

    /// Retries after the first attempt, for network failures
    #[arg(long, env = "LEMON_RETRY_ATTEMPTS", default_value_t = 3, global = true)]
    pub retries: u32,

    /// Base backoff delay in milliseconds, doubled per retry
    #[arg(long, env = "LEMON_RETRY_DELAY_MS", default_value_t = 1_000, global = true)]
    pub retry_delay_ms: u64,

    /// Directory the session is stored in
    #[arg(long, env = "LEMON_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Sign in against the built-in demo account instead of the server
    #[arg(long, env = "LEMON_DEMO", global = true)]
    pub demo: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login(login::LoginArgs),

    /// Forget the stored session
    Logout,

    /// Display the signed-in user
    Whoami,

    /// Show whether the stored session is usable
    Status,

    /// Send an authenticated request to any path
    Request(request::RequestArgs),

    /// List the menu
    Menu,

    /// Fetch the signed-in user's profile
    Profile,

    /// Send feedback to the restaurant
    Feedback(feedback::FeedbackArgs),
}

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI with an isolated data directory and no colors.
pub fn run_cli(args: &[&str], data_dir: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lemon"));
    cmd.args(args);
    cmd.arg("--data-dir").arg(data_dir);
    cmd.env("NO_COLOR", "1");
    for var in [
        "LEMON_BASE_URL",
        "LEMON_DEMO",
        "LEMON_PASSWORD",
        "LEMON_DATA_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub fn run_cli_success(args: &[&str], data_dir: &Path) -> String {
    let output = run_cli(args, data_dir);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub fn run_cli_failure(args: &[&str], data_dir: &Path) -> String {
    let output = run_cli(args, data_dir);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Log in to the demo account.
pub fn demo_login(data_dir: &Path) -> String {
    run_cli_success(
        &[
            "--demo",
            "login",
            "--email",
            "demo@example.com",
            "--password",
            "demo123",
        ],
        data_dir,
    )
}

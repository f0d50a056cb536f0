//! Stamps the binary with a version string.
//!
//! `LEMON_VERSION` from the environment wins, then `git describe`, then the
//! package version.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=LEMON_VERSION");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let version = env::var("LEMON_VERSION")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(git_version)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=LEMON_VERSION={version}");
}

fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    (!described.is_empty()).then(|| described.trim_start_matches('v').to_string())
}

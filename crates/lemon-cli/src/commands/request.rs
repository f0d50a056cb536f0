//! Request command implementation.

use anyhow::{Context as _, Result};
use clap::Args;
use http::{HeaderName, HeaderValue, Method};

use lemon_core::RequestOptions;

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Path relative to the base URL, or an absolute URL
    pub target: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request body, sent as-is
    #[arg(short, long)]
    pub data: Option<String>,

    /// Extra header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,
}

pub async fn run(ctx: &Context, args: RequestArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid method '{}'", args.method))?;

    let mut options = RequestOptions::new(method);
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        options = options.header(name, value);
    }
    if let Some(data) = args.data {
        options = options.with_body(data);
    }

    ctx.manager.initialize().await;
    let response = ctx.manager.client().request(&args.target, options).await?;

    output::note(&format!("HTTP {}", response.status));
    match serde_json::from_slice::<serde_json::Value>(&response.body) {
        Ok(value) => output::json_pretty(&value)?,
        Err(_) => println!("{}", response.text()),
    }

    Ok(())
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("Header '{raw}' must look like 'Name: value'"))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .with_context(|| format!("Invalid header name in '{raw}'"))?;
    let value = HeaderValue::from_str(value.trim())
        .with_context(|| format!("Invalid header value in '{raw}'"))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers() {
        let (name, value) = parse_header("X-Table:  12 ").unwrap();
        assert_eq!(name, "x-table");
        assert_eq!(value, "12");
    }

    #[test]
    fn rejects_headers_without_colon() {
        assert!(parse_header("X-Table 12").is_err());
        assert!(parse_header("Bad Name: 1").is_err());
    }
}

//! Feedback command implementation.

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use lemon_core::api::Feedback;
use lemon_core::validation::{ValidationError, format_phone_number, validate_name, validate_phone};

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// Optional contact number
    #[arg(long)]
    pub phone: Option<String>,

    /// What you would like to tell us
    #[arg(long)]
    pub message: String,
}

/// Validate the form and build the submission.
fn build(args: FeedbackArgs) -> Result<Feedback, ValidationError> {
    validate_name("first name", &args.first_name)?;
    validate_name("last name", &args.last_name)?;
    let phone_number = match args.phone.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(phone) => {
            validate_phone(phone)?;
            Some(format_phone_number(phone))
        }
    };
    let message = args.message.trim();
    if message.is_empty() {
        return Err(ValidationError::Missing { field: "message" });
    }

    Ok(Feedback {
        first_name: args.first_name.trim().to_string(),
        last_name: args.last_name.trim().to_string(),
        phone_number,
        message: message.to_string(),
        timestamp: Utc::now(),
    })
}

pub async fn run(ctx: &Context, args: FeedbackArgs) -> Result<()> {
    let feedback = build(args)?;

    ctx.manager.initialize().await;
    ctx.manager.api().submit_feedback(&feedback).await?;

    output::success("Thanks for your feedback!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(phone: Option<&str>, message: &str) -> FeedbackArgs {
        FeedbackArgs {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            phone: phone.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn formats_phone_and_trims_names() {
        let feedback = build(args(Some("555 123 4567"), "Lovely")).unwrap();
        assert_eq!(feedback.first_name, "Ada");
        assert_eq!(feedback.phone_number.as_deref(), Some("(555) 123-4567"));
    }

    #[test]
    fn blank_phone_is_omitted() {
        let feedback = build(args(Some("  "), "Lovely")).unwrap();
        assert_eq!(feedback.phone_number, None);
    }

    #[test]
    fn rejects_empty_message_and_bad_phone() {
        assert_eq!(
            build(args(None, "   ")).unwrap_err(),
            ValidationError::Missing { field: "message" }
        );
        assert!(matches!(
            build(args(Some("123"), "Lovely")),
            Err(ValidationError::Phone { .. })
        ));
    }
}

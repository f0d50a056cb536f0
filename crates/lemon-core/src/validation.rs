//! Form input checks, run before anything is sent.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Minimum password length accepted by the login form.
pub const MIN_PASSWORD_LEN: usize = 6;

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s\-']{2,}$").expect("name pattern is valid"));

/// A rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("please enter a valid email address")]
    Email,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("phone number must have between {min} and {max} digits")]
    Phone { min: usize, max: usize },

    #[error("{field} must be at least 2 letters, spaces, hyphens or apostrophes")]
    Name { field: &'static str },
}

/// `local@domain.tld` with no whitespace.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Missing { field: "email" });
    }
    if !EMAIL.is_match(email) {
        return Err(ValidationError::Email);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Missing { field: "password" });
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Between 7 and 15 digits once punctuation is ignored.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() {
        return Err(ValidationError::Missing { field: "phone" });
    }
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Err(ValidationError::Phone {
            min: MIN_PHONE_DIGITS,
            max: MAX_PHONE_DIGITS,
        });
    }
    Ok(())
}

/// Letters, spaces, hyphens and apostrophes, at least two of them.
pub fn validate_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if !NAME.is_match(name) {
        return Err(ValidationError::Name { field });
    }
    Ok(())
}

/// Format a ten-digit number as `(555) 123-4567`.
///
/// Anything that is not exactly ten digits is returned unchanged.
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 10 {
        return phone.to_string();
    }
    format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
}

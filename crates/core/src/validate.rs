use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("{field} out of range: {value} (max {max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
    #[error("invalid email address: {email}")]
    InvalidEmail { email: String },
    #[error("password too short: minimum {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("unknown branch: {branch}")]
    UnknownBranch { branch: String },
    #[error("semester must be 1-8, got {semester}")]
    InvalidSemester { semester: u8 },
    #[error("a quiz question needs at least {min} options, got {got}")]
    TooFewOptions { min: usize, got: usize },
    #[error("correct answer index {index} out of bounds for {len} options")]
    CorrectOutOfBounds { index: usize, len: usize },
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email regex"));

/// Loose email shape check, rejected locally before any gateway call.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Require a non-empty trimmed string field.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(())
    }
}

/// Password strength score 0..=5: length >= 8, lowercase, uppercase, digit,
/// symbol. Purely advisory; only the minimum length is enforced.
pub fn password_strength(password: &str) -> u8 {
    let mut strength = 0;
    if password.len() >= 8 {
        strength += 1;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        strength += 1;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        strength += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        strength += 1;
    }
    if password.chars().any(|c| "$@#&!".contains(c)) {
        strength += 1;
    }
    strength
}

/// Enforced password check.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LEN {
        Err(ValidationError::PasswordTooShort)
    } else {
        Ok(())
    }
}

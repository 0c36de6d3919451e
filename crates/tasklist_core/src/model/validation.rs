//! Submission rules for task owner names and descriptions.
//!
//! # Responsibility
//! - Validate user input before any store request is issued.
//! - Provide one stable, human-readable message per failed constraint.
//!
//! # Invariants
//! - Owner-name errors take precedence over text errors.
//! - Length limits count Unicode scalar values, not bytes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum owner name length in characters.
pub const USER_NAME_MAX_CHARS: usize = 20;
/// Minimum task text length in characters.
pub const TEXT_MIN_CHARS: usize = 4;

static USER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Zа-яА-Я._-]*$").expect("valid user name regex"));

const REQUIRED_MESSAGE: &str = "Все поля являются обязательными";
const USER_NAME_PATTERN_MESSAGE: &str =
    "ERROR: Имя должно содержать только кириллицу, латиницу, \".\", \"_\" и \"-\"";
const USER_NAME_TOO_LONG_MESSAGE: &str = "ERROR: Имя не должен быть длиннее 20 символов";
const TEXT_TOO_SHORT_MESSAGE: &str = "ERROR: новое дело не должен быть короче 4 символов";

/// Submitted form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    UserName,
    Text,
}

/// First failed constraint of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required(Field),
    UserNamePattern,
    UserNameTooLong { chars: usize },
    TextTooShort { chars: usize },
}

impl ValidationError {
    /// Field that failed validation.
    pub fn field(&self) -> Field {
        match self {
            Self::Required(field) => *field,
            Self::UserNamePattern | Self::UserNameTooLong { .. } => Field::UserName,
            Self::TextTooShort { .. } => Field::Text,
        }
    }

    /// Message shown in the single form error slot.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Required(_) => REQUIRED_MESSAGE,
            Self::UserNamePattern => USER_NAME_PATTERN_MESSAGE,
            Self::UserNameTooLong { .. } => USER_NAME_TOO_LONG_MESSAGE,
            Self::TextTooShort { .. } => TEXT_TOO_SHORT_MESSAGE,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for ValidationError {}

/// Validates a create submission, reporting the owner-name error first.
pub fn validate_submission(user_name: &str, text: &str) -> Result<(), ValidationError> {
    validate_user_name(user_name)?;
    validate_text(text)
}

/// Checks required, allowed characters and max length, in that order.
pub fn validate_user_name(user_name: &str) -> Result<(), ValidationError> {
    if user_name.is_empty() {
        return Err(ValidationError::Required(Field::UserName));
    }
    if !USER_NAME_RE.is_match(user_name) {
        return Err(ValidationError::UserNamePattern);
    }
    let chars = user_name.chars().count();
    if chars > USER_NAME_MAX_CHARS {
        return Err(ValidationError::UserNameTooLong { chars });
    }
    Ok(())
}

/// Checks required and min length.
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::Required(Field::Text));
    }
    let chars = text.chars().count();
    if chars < TEXT_MIN_CHARS {
        return Err(ValidationError::TextTooShort { chars });
    }
    Ok(())
}

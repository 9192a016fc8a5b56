use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::check_digit::{BASE_LEN, FULL_LEN};

/// Why a raw input line is not a usable identifier
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    #[error("identifier contains non-digit characters")]
    NotDigits,

    #[error("identifier must have 14 or 15 digits, got {0}")]
    WrongLength(usize),
}

/// A validated IMEI, either a 14-digit base or a complete 15-digit number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Check digit unknown
    Base(String),
    Full(String),
}

impl Identifier {
    /// Validate an already trimmed input string
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::NotDigits);
        }

        match raw.len() {
            BASE_LEN => Ok(Identifier::Base(raw.to_string())),
            FULL_LEN => Ok(Identifier::Full(raw.to_string())),
            other => Err(ValidationError::WrongLength(other)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Identifier::Base(s) | Identifier::Full(s) => s,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Identifier::Full(_))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

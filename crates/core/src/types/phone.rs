//! Brazilian phone numbers as entered in signup and address forms.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{digits, mask_digits};

/// Errors that can occur when parsing a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("phone number must have 10 or 11 digits including the area code, got {0}")]
    InvalidLength(usize),
}

/// A phone number split the way the commerce platform expects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phone {
    /// Two-digit area code (DDD), e.g. `67`.
    pub area_code: String,
    /// Masked local number, e.g. `99999-9999`.
    pub number: String,
}

impl Phone {
    /// Parse a phone number from masked or bare input.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::InvalidLength`] unless the input has ten or
    /// eleven digits.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let digits = digits(input);
        if !(10..=11).contains(&digits.len()) {
            return Err(PhoneError::InvalidLength(digits.len()));
        }

        let masked = mask_phone(&digits);
        let area_code = digits.chars().take(2).collect();
        // "(67) " is five characters
        let number = masked.chars().skip(5).collect();

        Ok(Self { area_code, number })
    }

    /// Parse an optional form field; blank input yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::InvalidLength`] for non-blank input that is not
    /// a phone number.
    pub fn parse_optional(input: Option<&str>) -> Result<Option<Self>, PhoneError> {
        match input.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Self::parse(value).map(Some),
        }
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.area_code, self.number)
    }
}

/// Mask partial phone input: `(67) 99999-9999`.
#[must_use]
pub fn mask_phone(input: &str) -> String {
    mask_digits(input, &[(2, "("), (5, ") "), (4, "-")])
}

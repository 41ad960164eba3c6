//! Brazilian postal codes (CEP).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{digits, mask_digits};

const CEP_LEN: usize = 8;

/// Errors that can occur when parsing a CEP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CepError {
    /// The input did not contain exactly eight digits.
    #[error("CEP must have 8 digits, got {0}")]
    InvalidLength(usize),
}

/// An eight-digit CEP, stored without punctuation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cep(String);

impl Cep {
    /// Parse a CEP, ignoring any non-digit characters.
    ///
    /// # Errors
    ///
    /// Returns [`CepError::InvalidLength`] unless exactly eight digits remain.
    pub fn parse(input: &str) -> Result<Self, CepError> {
        let digits = digits(input);
        if digits.len() != CEP_LEN {
            return Err(CepError::InvalidLength(digits.len()));
        }
        Ok(Self(digits))
    }

    /// The bare eight digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The CEP as `01001-000`.
    #[must_use]
    pub fn formatted(&self) -> String {
        mask_cep(&self.0)
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl FromStr for Cep {
    type Err = CepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cep {
    type Error = CepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cep> for String {
    fn from(cep: Cep) -> Self {
        cep.0
    }
}

/// Mask partial CEP input as the shopper types it: `01001-000`.
#[must_use]
pub fn mask_cep(input: &str) -> String {
    mask_digits(input, &[(5, ""), (3, "-")])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_cep() {
        assert_eq!(mask_cep("01001000"), "01001-000");
        assert_eq!(mask_cep("0100"), "0100");
        assert_eq!(mask_cep("01001"), "01001");
        assert_eq!(mask_cep("010010"), "01001-0");
        assert_eq!(mask_cep("01001-000999"), "01001-000");
        assert_eq!(mask_cep(""), "");
    }

    #[test]
    fn test_parse_accepts_punctuation() {
        let cep = Cep::parse("01001-000").unwrap();
        assert_eq!(cep.as_str(), "01001000");
        assert_eq!(cep.to_string(), "01001-000");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(Cep::parse("0100100"), Err(CepError::InvalidLength(7)));
        assert_eq!(Cep::parse(""), Err(CepError::InvalidLength(0)));
        assert!("010010000".parse::<Cep>().is_err());
    }

    #[test]
    fn test_serde_uses_bare_digits() {
        let cep: Cep = serde_json::from_str("\"79002-000\"").unwrap();
        assert_eq!(serde_json::to_string(&cep).unwrap(), "\"79002000\"");
        assert!(serde_json::from_str::<Cep>("\"123\"").is_err());
    }
}

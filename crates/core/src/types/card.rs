//! Payment card form helpers.
//!
//! Card data is never stored; these helpers only shape what the shopper
//! typed before it is forwarded to the payment gateway.

use core::fmt;

use thiserror::Error;

use super::{digits, mask_digits};

/// Mask partial card number input: `#### #### #### ####`.
#[must_use]
pub fn mask_card_number(input: &str) -> String {
    mask_digits(input, &[(4, ""), (4, " "), (4, " "), (4, " ")])
}

/// Keep at most four digits of a security code.
#[must_use]
pub fn mask_cvc(input: &str) -> String {
    mask_digits(input, &[(4, "")])
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardExpiryError {
    #[error("invalid expiry month: {0}")]
    InvalidMonth(String),

    #[error("invalid expiry year: {0}")]
    InvalidYear(String),
}

/// Card expiry month and four-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardExpiry {
    month: u8,
    year: u16,
}

impl CardExpiry {
    /// Build an expiry from the month and year selects of the card form.
    ///
    /// Two-digit years are read as `20YY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the month is not 1-12 or the year is not a
    /// two- or four-digit number.
    pub fn parse(month: &str, year: &str) -> Result<Self, CardExpiryError> {
        let m: u8 = digits(month)
            .parse()
            .map_err(|_| CardExpiryError::InvalidMonth(month.to_owned()))?;
        if !(1..=12).contains(&m) {
            return Err(CardExpiryError::InvalidMonth(month.to_owned()));
        }

        let year_digits = digits(year);
        let y: u16 = year_digits
            .parse()
            .map_err(|_| CardExpiryError::InvalidYear(year.to_owned()))?;
        let y = match year_digits.len() {
            2 => 2000 + y,
            4 => y,
            _ => return Err(CardExpiryError::InvalidYear(year.to_owned())),
        };

        Ok(Self { month: m, year: y })
    }

    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }
}

impl fmt::Display for CardExpiry {
    /// `MM/YYYY`, the format the payment gateway expects.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_card_number() {
        assert_eq!(mask_card_number("4111"), "4111");
        assert_eq!(mask_card_number("41111"), "4111 1");
        assert_eq!(mask_card_number("4111111111111111"), "4111 1111 1111 1111");
        assert_eq!(mask_card_number("4111-1111-1111-1111-99"), "4111 1111 1111 1111");
    }

    #[test]
    fn test_mask_cvc() {
        assert_eq!(mask_cvc("12a3"), "123");
        assert_eq!(mask_cvc("123456"), "1234");
    }

    #[test]
    fn test_expiry_display() {
        let expiry = CardExpiry::parse("3", "2031").unwrap();
        assert_eq!(expiry.to_string(), "03/2031");

        let expiry = CardExpiry::parse("12", "29").unwrap();
        assert_eq!(expiry.year(), 2029);
        assert_eq!(expiry.to_string(), "12/2029");
    }

    #[test]
    fn test_expiry_rejects_bad_values() {
        assert!(matches!(
            CardExpiry::parse("13", "2030"),
            Err(CardExpiryError::InvalidMonth(_))
        ));
        assert!(matches!(
            CardExpiry::parse("0", "2030"),
            Err(CardExpiryError::InvalidMonth(_))
        ));
        assert!(matches!(
            CardExpiry::parse("1", "203"),
            Err(CardExpiryError::InvalidYear(_))
        ));
        assert!(matches!(
            CardExpiry::parse("", "2030"),
            Err(CardExpiryError::InvalidMonth(_))
        ));
    }
}

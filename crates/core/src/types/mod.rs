//! Core types for Abacate.
//!
//! This module provides type-safe wrappers for common checkout concepts.

pub mod card;
pub mod cep;
pub mod document;
pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use card::{CardExpiry, CardExpiryError, mask_card_number, mask_cvc};
pub use cep::{Cep, CepError, mask_cep};
pub use document::{Cnpj, Cpf, Document, DocumentError, DocumentKind, mask_cnpj, mask_cpf};
pub use id::*;
pub use money::Price;
pub use phone::{Phone, PhoneError, mask_phone};
pub use status::OrderStatus;

/// Keep only ASCII digits from `input`.
#[must_use]
pub fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Apply a progressive input mask to the digits of `input`.
///
/// Each group is `(width, prefix)`. A group's prefix is only written when
/// the group has at least one digit; digits past the last group are dropped.
pub(crate) fn mask_digits(input: &str, groups: &[(usize, &str)]) -> String {
    let digits = digits(input);
    let mut rest = digits.as_str();
    let mut out = String::with_capacity(digits.len() + groups.len() * 2);

    for &(width, prefix) in groups {
        if rest.is_empty() {
            break;
        }
        let take = width.min(rest.len());
        let (group, tail) = rest.split_at(take);
        out.push_str(prefix);
        out.push_str(group);
        rest = tail;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_strips_everything_else() {
        assert_eq!(digits("(67) 99999-9999"), "67999999999");
        assert_eq!(digits("abc"), "");
    }

    #[test]
    fn test_mask_digits_drops_overflow() {
        assert_eq!(mask_digits("123456789", &[(2, ""), (2, "-")]), "12-34");
        assert_eq!(mask_digits("1", &[(2, "("), (2, ") ")]), "(1");
        assert_eq!(mask_digits("", &[(2, "(")]), "");
    }
}

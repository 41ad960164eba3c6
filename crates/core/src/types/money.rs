//! Brazilian real amounts using decimal arithmetic.
//!
//! The commerce platform reports every price as a plain number in reais
//! (e.g. `199.9`). [`Price`] keeps that value as a [`Decimal`] and renders it
//! the way `Intl.NumberFormat("pt-BR", { currency: "BRL" })` does:
//! `R$ 1.234,56`, with a non-breaking space after the symbol.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency symbol for Brazilian reais.
pub const CURRENCY_SYMBOL: &str = "R$";

/// Separator between the currency symbol and the amount (U+00A0).
pub const CURRENCY_SEPARATOR: char = '\u{a0}';

/// An amount in Brazilian reais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero reais.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from an amount in reais.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an integer amount of centavos.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The amount in reais.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Render as `R$ 1.234,56`.
    #[must_use]
    pub fn format(&self) -> String {
        format_brl(self.0)
    }

    /// Render a discount as `R$ -10,00`.
    #[must_use]
    pub fn format_as_discount(&self) -> String {
        let amount = format_brl(self.0.abs());
        amount.replacen(
            &format!("{CURRENCY_SYMBOL}{CURRENCY_SEPARATOR}"),
            &format!("{CURRENCY_SYMBOL} -"),
            1,
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Format a decimal amount of reais as `R$ 1.234,56`.
///
/// Rounds half away from zero to two places. Negative amounts render as
/// `-R$ 1,00`.
#[must_use]
pub fn format_brl(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{CURRENCY_SYMBOL}{CURRENCY_SEPARATOR}{grouped},{fraction}")
}

//! CPF and CNPJ taxpayer documents.
//!
//! Both documents end in two modulo-11 check digits computed over the digits
//! that precede them. A CPF has nine base digits and a CNPJ has twelve.
//!
//! ```rust
//! use abacate_core::{Cpf, Document};
//!
//! let cpf = Cpf::parse("529.982.247-25").unwrap();
//! assert_eq!(cpf.formatted(), "529.982.247-25");
//!
//! assert!(Document::parse("11.222.333/0001-81").is_ok());
//! ```

use core::fmt;
use core::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{digits, mask_digits};

const CPF_BASE_LEN: usize = 9;
const CPF_LEN: usize = 11;
const CNPJ_BASE_LEN: usize = 12;
const CNPJ_LEN: usize = 14;

const CNPJ_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Which document a value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Cpf,
    Cnpj,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpf => f.write_str("CPF"),
            Self::Cnpj => f.write_str("CNPJ"),
        }
    }
}

/// Errors that can occur when parsing a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("{kind} must have {expected} digits, got {actual}")]
    InvalidLength {
        kind: DocumentKind,
        expected: usize,
        actual: usize,
    },

    #[error("document must have 11 (CPF) or 14 (CNPJ) digits, got {0}")]
    UnknownLength(usize),

    #[error("{0} check digits do not match")]
    InvalidChecksum(DocumentKind),
}

// =============================================================================
// Check digits
// =============================================================================

fn digit_values(base: &str) -> Vec<u32> {
    base.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn mod11(sum: u32) -> u32 {
    let digit = (sum * 10) % 11;
    if digit == 10 { 0 } else { digit }
}

/// Compute the two CPF check digits for a nine-digit base.
///
/// Non-digit characters in `base` are ignored.
#[must_use]
pub fn cpf_check_digits(base: &str) -> String {
    let mut values = digit_values(base);
    values.truncate(CPF_BASE_LEN);

    for _ in 0..2 {
        let top = u32::try_from(values.len()).unwrap_or(u32::MAX) + 1;
        let sum = values
            .iter()
            .zip((2..=top).rev())
            .map(|(d, w)| d * w)
            .sum();
        values.push(mod11(sum));
    }

    values
        .iter()
        .rev()
        .take(2)
        .rev()
        .map(u32::to_string)
        .collect()
}

/// Compute the two CNPJ check digits for a twelve-digit base.
///
/// Non-digit characters in `base` are ignored.
#[must_use]
pub fn cnpj_check_digits(base: &str) -> String {
    let mut values = digit_values(base);
    values.truncate(CNPJ_BASE_LEN);

    for pass in 0..2 {
        let weights = CNPJ_WEIGHTS.get(1 - pass..).unwrap_or(&CNPJ_WEIGHTS);
        let sum = values.iter().zip(weights).map(|(d, w)| d * w).sum();
        values.push(mod11(sum));
    }

    values
        .iter()
        .rev()
        .take(2)
        .rev()
        .map(u32::to_string)
        .collect()
}

fn random_base<R: Rng + ?Sized>(rng: &mut R, seed: &str, len: usize) -> String {
    let mut base: String = digits(seed).chars().take(len).collect();
    while base.len() < len {
        let d: u8 = rng.random_range(0..10);
        base.push(char::from(b'0' + d));
    }
    base
}

// =============================================================================
// CPF
// =============================================================================

/// An individual taxpayer number (Cadastro de Pessoas Físicas).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    /// Parse and validate a CPF, ignoring punctuation.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not have eleven digits or the
    /// check digits do not match.
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        let digits = digits(input);
        if digits.len() != CPF_LEN {
            return Err(DocumentError::InvalidLength {
                kind: DocumentKind::Cpf,
                expected: CPF_LEN,
                actual: digits.len(),
            });
        }
        let (base, check) = digits.split_at(CPF_BASE_LEN);
        if cpf_check_digits(base) != check {
            return Err(DocumentError::InvalidChecksum(DocumentKind::Cpf));
        }
        Ok(Self(digits))
    }

    /// Generate a valid CPF.
    ///
    /// The digits of `seed` (at most nine) are kept as the prefix and the
    /// rest of the base is filled with random digits.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, seed: &str) -> Self {
        let mut base = random_base(rng, seed, CPF_BASE_LEN);
        let check = cpf_check_digits(&base);
        base.push_str(&check);
        Self(base)
    }

    /// Whether `input` is a valid CPF.
    #[must_use]
    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    /// The bare eleven digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The CPF as `000.000.000-00`.
    #[must_use]
    pub fn formatted(&self) -> String {
        mask_cpf(&self.0)
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl FromStr for Cpf {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cpf {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cpf> for String {
    fn from(cpf: Cpf) -> Self {
        cpf.0
    }
}

// =============================================================================
// CNPJ
// =============================================================================

/// A company taxpayer number (Cadastro Nacional da Pessoa Jurídica).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cnpj(String);

impl Cnpj {
    /// Parse and validate a CNPJ, ignoring punctuation.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not have fourteen digits or the
    /// check digits do not match.
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        let digits = digits(input);
        if digits.len() != CNPJ_LEN {
            return Err(DocumentError::InvalidLength {
                kind: DocumentKind::Cnpj,
                expected: CNPJ_LEN,
                actual: digits.len(),
            });
        }
        let (base, check) = digits.split_at(CNPJ_BASE_LEN);
        if cnpj_check_digits(base) != check {
            return Err(DocumentError::InvalidChecksum(DocumentKind::Cnpj));
        }
        Ok(Self(digits))
    }

    /// Generate a valid CNPJ.
    ///
    /// The digits of `seed` (at most twelve) are kept as the prefix and the
    /// rest of the base is filled with random digits.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, seed: &str) -> Self {
        let mut base = random_base(rng, seed, CNPJ_BASE_LEN);
        let check = cnpj_check_digits(&base);
        base.push_str(&check);
        Self(base)
    }

    /// Whether `input` is a valid CNPJ.
    #[must_use]
    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    /// The bare fourteen digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The CNPJ as `00.000.000/0000-00`.
    #[must_use]
    pub fn formatted(&self) -> String {
        mask_cnpj(&self.0)
    }
}

impl fmt::Display for Cnpj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl FromStr for Cnpj {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cnpj {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cnpj> for String {
    fn from(cnpj: Cnpj) -> Self {
        cnpj.0
    }
}

// =============================================================================
// Either document
// =============================================================================

/// A CPF or a CNPJ, told apart by digit count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Document {
    Cpf(Cpf),
    Cnpj(Cnpj),
}

impl Document {
    /// Parse either document. Eleven digits is a CPF, fourteen a CNPJ.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnknownLength`] for any other digit count,
    /// or a checksum error from the matching document type.
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        match digits(input).len() {
            CPF_LEN => Cpf::parse(input).map(Self::Cpf),
            CNPJ_LEN => Cnpj::parse(input).map(Self::Cnpj),
            other => Err(DocumentError::UnknownLength(other)),
        }
    }

    /// Which document this is.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        match self {
            Self::Cpf(_) => DocumentKind::Cpf,
            Self::Cnpj(_) => DocumentKind::Cnpj,
        }
    }

    /// The bare digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cpf(cpf) => cpf.as_str(),
            Self::Cnpj(cnpj) => cnpj.as_str(),
        }
    }

    /// The punctuated form.
    #[must_use]
    pub fn formatted(&self) -> String {
        match self {
            Self::Cpf(cpf) => cpf.formatted(),
            Self::Cnpj(cnpj) => cnpj.formatted(),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl FromStr for Document {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Input masks
// =============================================================================

/// Mask partial CPF input: `000.000.000-00`.
#[must_use]
pub fn mask_cpf(input: &str) -> String {
    mask_digits(input, &[(3, ""), (3, "."), (3, "."), (2, "-")])
}

/// Mask partial CNPJ input: `00.000.000/0000-00`.
#[must_use]
pub fn mask_cnpj(input: &str) -> String {
    mask_digits(input, &[(2, ""), (3, "."), (3, "."), (4, "/"), (2, "-")])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_cpf_check_digits_known_values() {
        assert_eq!(cpf_check_digits("529982247"), "25");
        assert_eq!(cpf_check_digits("111444777"), "35");
        assert_eq!(cpf_check_digits("000000000"), "00");
    }

    #[test]
    fn test_cnpj_check_digits_known_values() {
        assert_eq!(cnpj_check_digits("112223330001"), "81");
        assert_eq!(cnpj_check_digits("11.222.333/0001"), "81");
    }

    #[test]
    fn test_cpf_parse() {
        let cpf = Cpf::parse("529.982.247-25").unwrap();
        assert_eq!(cpf.as_str(), "52998224725");
        assert_eq!(cpf.to_string(), "529.982.247-25");
    }

    #[test]
    fn test_cpf_single_digit_change_fails() {
        assert_eq!(
            Cpf::parse("52998224726"),
            Err(DocumentError::InvalidChecksum(DocumentKind::Cpf))
        );
        assert!(!Cpf::is_valid("62998224725"));
    }

    #[test]
    fn test_cpf_wrong_length() {
        assert_eq!(
            Cpf::parse("123"),
            Err(DocumentError::InvalidLength {
                kind: DocumentKind::Cpf,
                expected: 11,
                actual: 3,
            })
        );
    }

    #[test]
    fn test_cnpj_parse() {
        let cnpj = Cnpj::parse("11222333000181").unwrap();
        assert_eq!(cnpj.to_string(), "11.222.333/0001-81");
        assert!(!Cnpj::is_valid("11222333000182"));
    }

    #[test]
    fn test_generated_documents_validate() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let cpf = Cpf::generate(&mut rng, "");
            assert!(Cpf::is_valid(cpf.as_str()), "{cpf}");

            let cnpj = Cnpj::generate(&mut rng, "");
            assert!(Cnpj::is_valid(cnpj.as_str()), "{cnpj}");
        }
    }

    #[test]
    fn test_generate_keeps_seed_prefix() {
        let mut rng = StdRng::seed_from_u64(1);
        let cpf = Cpf::generate(&mut rng, "123.45");
        assert!(cpf.as_str().starts_with("12345"));

        let cpf = Cpf::generate(&mut rng, "5299822479999");
        assert_eq!(cpf.as_str(), "52998224725");

        let cnpj = Cnpj::generate(&mut rng, "11222333");
        assert!(cnpj.as_str().starts_with("11222333"));
    }

    #[test]
    fn test_document_parse_by_length() {
        let doc = Document::parse("529.982.247-25").unwrap();
        assert_eq!(doc.kind(), DocumentKind::Cpf);

        let doc = Document::parse("11.222.333/0001-81").unwrap();
        assert_eq!(doc.kind(), DocumentKind::Cnpj);
        assert_eq!(doc.as_str(), "11222333000181");

        assert_eq!(
            Document::parse("1234567890"),
            Err(DocumentError::UnknownLength(10))
        );
    }

    #[test]
    fn test_masks_are_progressive() {
        assert_eq!(mask_cpf("529"), "529");
        assert_eq!(mask_cpf("5299"), "529.9");
        assert_eq!(mask_cpf("5299822472"), "529.982.247-2");
        assert_eq!(mask_cpf("529982247251234"), "529.982.247-25");

        assert_eq!(mask_cnpj("112"), "11.2");
        assert_eq!(mask_cnpj("112223330001"), "11.222.333/0001");
        assert_eq!(mask_cnpj("11222333000181"), "11.222.333/0001-81");
    }
}

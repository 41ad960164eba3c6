//! CPF and CNPJ commands.
//!
//! Generated documents pass the check-digit validation the storefront and
//! the commerce platform run, which is all test signups need.

use abacate_core::{Cnpj, Cpf, Document, DocumentError, DocumentKind, mask_cnpj, mask_cpf};

/// Generate `count` valid documents of `kind`, each starting with `seed`.
pub fn generate(kind: DocumentKind, seed: &str, count: usize) -> Vec<Document> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| match kind {
            DocumentKind::Cpf => Document::Cpf(Cpf::generate(&mut rng, seed)),
            DocumentKind::Cnpj => Document::Cnpj(Cnpj::generate(&mut rng, seed)),
        })
        .collect()
}

/// Parse a CPF or CNPJ, telling them apart by digit count.
///
/// # Errors
///
/// Returns an error for an unknown length or mismatched check digits.
pub fn validate(input: &str) -> Result<Document, DocumentError> {
    Document::parse(input)
}

/// Punctuate a document without validating it.
///
/// Up to eleven digits are masked as a CPF, anything longer as a CNPJ.
pub fn format(input: &str) -> String {
    let digits = input.chars().filter(char::is_ascii_digit).count();
    if digits <= 11 {
        mask_cpf(input)
    } else {
        mask_cnpj(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keeps_seed_and_validates() {
        let documents = generate(DocumentKind::Cpf, "123", 5);
        assert_eq!(documents.len(), 5);
        for document in &documents {
            assert!(document.as_str().starts_with("123"));
            assert!(Cpf::is_valid(document.as_str()));
        }

        let companies = generate(DocumentKind::Cnpj, "", 3);
        assert!(companies.iter().all(|d| d.kind() == DocumentKind::Cnpj));
        assert!(companies.iter().all(|d| Cnpj::is_valid(d.as_str())));
    }

    #[test]
    fn test_validate_tells_documents_apart() {
        assert_eq!(
            validate("52998224725").map(|d| d.kind()),
            Ok(DocumentKind::Cpf)
        );
        assert_eq!(
            validate("11.222.333/0001-81").map(|d| d.kind()),
            Ok(DocumentKind::Cnpj)
        );
        assert_eq!(
            validate("12345").map(|d| d.kind()),
            Err(DocumentError::UnknownLength(5))
        );
    }

    #[test]
    fn test_format_picks_mask_by_length() {
        assert_eq!(format("52998224725"), "529.982.247-25");
        assert_eq!(format("11222333000181"), "11.222.333/0001-81");
        assert_eq!(format("5299"), "529.9");
    }
}

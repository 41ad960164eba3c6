//! Cache types for catalog responses.

use abacate_core::ProductId;

use super::types::{Product, ProductCustomizations};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// Product list for a set of SKUs, sorted so line order does not matter.
    ProductList(Vec<String>),
    Customizations(ProductId),
}

impl CacheKey {
    pub fn product_list(skus: &[String]) -> Self {
        let mut skus = skus.to_vec();
        skus.sort_unstable();
        skus.dedup();
        Self::ProductList(skus)
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    ProductList(Vec<Product>),
    /// `None` remembers that the group has no customizations.
    Customizations(Option<Box<ProductCustomizations>>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_list_key_ignores_order_and_duplicates() {
        let a = CacheKey::product_list(&["B".to_string(), "A".to_string(), "B".to_string()]);
        let b = CacheKey::product_list(&["A".to_string(), "B".to_string()]);
        assert_eq!(a, b);
    }
}

//! Default catalog of product kinds.
//!
//! This module provides built-in display metadata for every product a
//! program can taper: human-readable names and default unit labels.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<ProductCatalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static ProductCatalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of product kinds
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns
/// a cached reference. This function is retained for testing and custom
/// catalog creation.
pub fn build_default_catalog() -> ProductCatalog {
    build_default_catalog_internal()
}

fn build_default_catalog_internal() -> ProductCatalog {
    let mut products = HashMap::new();

    let entries = [
        (ProductKind::Cigarette, "Cigarette", "cigarettes"),
        (ProductKind::Snus, "Snus", "pouches"),
        (ProductKind::Vape, "Vape", "puffs"),
        (ProductKind::Chew, "Chewing tobacco", "portions"),
        (ProductKind::Patch, "Nicotine patch", "patches"),
        (ProductKind::Gum, "Nicotine gum", "pieces"),
        (ProductKind::Lozenge, "Nicotine lozenge", "lozenges"),
        (ProductKind::Other, "Other", "units"),
    ];

    for (kind, display_name, default_unit) in entries {
        products.insert(
            kind,
            ProductInfo {
                kind,
                display_name: display_name.into(),
                default_unit: default_unit.into(),
            },
        );
    }

    ProductCatalog { products }
}

impl ProductCatalog {
    /// Look up metadata for a product kind
    pub fn info(&self, kind: ProductKind) -> Option<&ProductInfo> {
        self.products.get(&kind)
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (kind, info) in &self.products {
            if kind != &info.kind {
                errors.push(format!(
                    "Catalog key {:?} doesn't match info.kind {:?}",
                    kind, info.kind
                ));
            }
            if info.display_name.is_empty() {
                errors.push(format!("Product {:?} has empty display name", kind));
            }
            if info.default_unit.is_empty() {
                errors.push(format!("Product {:?} has empty default unit", kind));
            }
        }

        // Every product kind a program can name must be representable
        let all_kinds = [
            ProductKind::Cigarette,
            ProductKind::Snus,
            ProductKind::Vape,
            ProductKind::Chew,
            ProductKind::Patch,
            ProductKind::Gum,
            ProductKind::Lozenge,
            ProductKind::Other,
        ];
        for kind in all_kinds {
            if !self.products.contains_key(&kind) {
                errors.push(format!("Catalog is missing product kind {:?}", kind));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.products.len(), 8);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_info_lookup() {
        let catalog = get_default_catalog();
        let info = catalog.info(ProductKind::Cigarette).unwrap();
        assert_eq!(info.display_name, "Cigarette");
        assert_eq!(info.default_unit, "cigarettes");
    }

    #[test]
    fn test_cached_catalog_matches_built() {
        let cached = get_default_catalog();
        let built = build_default_catalog();
        assert_eq!(cached.products.len(), built.products.len());
    }
}

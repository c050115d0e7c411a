//! Product data needed to put something in the cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariantId};

/// Variant title Shopify assigns to products without options.
pub const DEFAULT_VARIANT_TITLE: &str = "Default Title";

/// A selected product option (e.g., Size: Large).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name.
    pub name: String,
    /// Selected value.
    pub value: String,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub id: VariantId,
    pub title: String,
    /// Tax-inclusive unit price.
    pub price: Decimal,
    pub image_url: Option<String>,
    pub selected_options: Vec<SelectedOption>,
    pub available_for_sale: bool,
}

/// The subset of a catalog product the cart cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    pub image_url: Option<String>,
    pub variants: Vec<VariantSummary>,
}

impl ProductSummary {
    /// Pick the variant to add to the cart.
    ///
    /// An explicit `requested` ID must match one of the product's variants.
    /// Without one, the first variant available for sale is used, falling
    /// back to the first variant listed.
    #[must_use]
    pub fn resolve_variant(&self, requested: Option<&VariantId>) -> Option<&VariantSummary> {
        match requested {
            Some(id) => self.variants.iter().find(|v| &v.id == id),
            None => self
                .variants
                .iter()
                .find(|v| v.available_for_sale)
                .or_else(|| self.variants.first()),
        }
    }

    /// Display title for a line holding `variant`.
    #[must_use]
    pub fn line_title(&self, variant: &VariantSummary) -> String {
        if variant.title.is_empty() || variant.title == DEFAULT_VARIANT_TITLE {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, variant.title)
        }
    }
}

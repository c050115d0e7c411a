//! Product type conversion functions.

use rust_decimal::Decimal;
use serde::Deserialize;
use storefront_cart_core::{ProductId, ProductSummary, SelectedOption, VariantId, VariantSummary};

use crate::shopify::ShopifyError;

use super::{ImageFields, MoneyFields, Nodes};

#[derive(Debug, Clone, Deserialize)]
pub struct ProductData {
    pub product: Option<ProductFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub featured_image: Option<ImageFields>,
    pub variants: Nodes<VariantFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantFields {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub price: MoneyFields,
    pub image: Option<ImageFields>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOptionFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionFields {
    pub name: String,
    pub value: String,
}

fn parse_amount(money: &MoneyFields) -> Result<Decimal, ShopifyError> {
    money
        .amount
        .parse::<Decimal>()
        .map_err(|_| ShopifyError::InvalidMoney(money.amount.clone()))
}

/// Convert a product response into the summary the cart needs.
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidMoney`] if a variant price is not a decimal.
pub fn convert_product(product: ProductFields) -> Result<ProductSummary, ShopifyError> {
    let variants = product
        .variants
        .nodes
        .into_iter()
        .map(|variant| {
            Ok(VariantSummary {
                price: parse_amount(&variant.price)?,
                id: VariantId::new(variant.id),
                title: variant.title,
                image_url: variant.image.map(|img| img.url),
                selected_options: variant
                    .selected_options
                    .into_iter()
                    .map(|o| SelectedOption {
                        name: o.name,
                        value: o.value,
                    })
                    .collect(),
                available_for_sale: variant.available_for_sale,
            })
        })
        .collect::<Result<Vec<_>, ShopifyError>>()?;

    Ok(ProductSummary {
        id: ProductId::new(product.id),
        handle: product.handle,
        title: product.title,
        image_url: product.featured_image.map(|img| img.url),
        variants,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json(price: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Product/1",
            "handle": "pineapple-tee",
            "title": "Pineapple Tee",
            "featuredImage": { "url": "https://cdn.example.com/tee.jpg" },
            "variants": { "nodes": [{
                "id": "gid://shopify/ProductVariant/11",
                "title": "Large",
                "availableForSale": true,
                "price": { "amount": price, "currencyCode": "GBP" },
                "image": null,
                "selectedOptions": [{ "name": "Size", "value": "Large" }]
            }] }
        })
    }

    #[test]
    fn test_convert_product() {
        let fields: ProductFields = serde_json::from_value(product_json("20.0")).unwrap();
        let product = convert_product(fields).unwrap();

        assert_eq!(product.handle, "pineapple-tee");
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://cdn.example.com/tee.jpg")
        );
        let variant = product.variants.first().unwrap();
        assert_eq!(variant.price, Decimal::new(20, 0));
        assert_eq!(variant.selected_options.len(), 1);
    }

    #[test]
    fn test_convert_product_rejects_bad_price() {
        let fields: ProductFields = serde_json::from_value(product_json("twenty")).unwrap();
        assert!(matches!(
            convert_product(fields),
            Err(ShopifyError::InvalidMoney(amount)) if amount == "twenty"
        ));
    }
}

//! GraphQL documents for the Shopify Storefront API.
//!
//! Each cart operation selects the same cart fields so every response can be
//! converted with one set of types.

/// Fields selected on every cart.
macro_rules! cart_fragment {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount { amount currencyCode }
    totalAmount { amount currencyCode }
  }
  lines(first: 100) {
    nodes {
      id
      quantity
      cost { totalAmount { amount currencyCode } }
      merchandise {
        ... on ProductVariant { id title }
      }
    }
  }
}
"
    };
}

/// Fields selected on every cart mutation's user errors.
macro_rules! user_error_fields {
    () => {
        "userErrors { code field message }"
    };
}

pub const CREATE_CART_OPERATION: &str = "CreateCart";
pub const CREATE_CART: &str = concat!(
    "mutation CreateCart($input: CartInput!) {\n",
    "  cartCreate(input: $input) { cart { ...CartFields } ",
    user_error_fields!(),
    " }\n}\n",
    cart_fragment!()
);

pub const GET_CART_OPERATION: &str = "GetCart";
pub const GET_CART: &str = concat!(
    "query GetCart($cartId: ID!) {\n",
    "  cart(id: $cartId) { ...CartFields }\n}\n",
    cart_fragment!()
);

pub const ADD_TO_CART_OPERATION: &str = "AddToCart";
pub const ADD_TO_CART: &str = concat!(
    "mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {\n",
    "  cartLinesAdd(cartId: $cartId, lines: $lines) { cart { ...CartFields } ",
    user_error_fields!(),
    " }\n}\n",
    cart_fragment!()
);

pub const UPDATE_CART_LINES_OPERATION: &str = "UpdateCartLines";
pub const UPDATE_CART_LINES: &str = concat!(
    "mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {\n",
    "  cartLinesUpdate(cartId: $cartId, lines: $lines) { cart { ...CartFields } ",
    user_error_fields!(),
    " }\n}\n",
    cart_fragment!()
);

pub const REMOVE_FROM_CART_OPERATION: &str = "RemoveFromCart";
pub const REMOVE_FROM_CART: &str = concat!(
    "mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {\n",
    "  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) { cart { ...CartFields } ",
    user_error_fields!(),
    " }\n}\n",
    cart_fragment!()
);

pub const GET_PRODUCT_BY_HANDLE_OPERATION: &str = "GetProductByHandle";
pub const GET_PRODUCT_BY_HANDLE: &str = r"
query GetProductByHandle($handle: String!, $variantCount: Int) {
  product(handle: $handle) {
    id
    handle
    title
    featuredImage { url }
    variants(first: $variantCount) {
      nodes {
        id
        title
        availableForSale
        price { amount currencyCode }
        image { url }
        selectedOptions { name value }
      }
    }
  }
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_documents_include_fragment() {
        for doc in [CREATE_CART, GET_CART, ADD_TO_CART, UPDATE_CART_LINES, REMOVE_FROM_CART] {
            assert!(doc.contains("...CartFields"));
            assert!(doc.contains("fragment CartFields on Cart"));
        }
    }

    #[test]
    fn test_mutations_select_user_errors() {
        for doc in [CREATE_CART, ADD_TO_CART, UPDATE_CART_LINES, REMOVE_FROM_CART] {
            assert!(doc.contains("userErrors { code field message }"));
        }
        assert!(!GET_CART.contains("userErrors"));
    }
}

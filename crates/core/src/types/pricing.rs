//! Pricing rules applied when cart totals are recomputed.
//!
//! Unit prices are tax-inclusive. The tax portion shown to the shopper is
//! back-calculated from the subtotal, and shipping is a flat fee that drops
//! to zero once the subtotal exceeds the free-shipping threshold.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round a monetary amount to two decimal places (midpoint away from zero).
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Tax and shipping rules for a storefront.
///
/// The defaults are the storefront's fixed constants: 20% VAT embedded in
/// prices, free shipping above 50.00, and a 5.99 flat fee otherwise. They
/// assume a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// VAT rate embedded in unit prices (e.g. `0.20`).
    pub vat_rate: Decimal,
    /// Subtotal strictly above which shipping is free.
    pub free_shipping_threshold: Decimal,
    /// Flat shipping fee charged below the threshold.
    pub shipping_fee: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            vat_rate: Decimal::new(20, 2),
            free_shipping_threshold: Decimal::new(5000, 2),
            shipping_fee: Decimal::new(599, 2),
        }
    }
}

impl PricingPolicy {
    /// Tax portion contained in a tax-inclusive amount.
    #[must_use]
    pub fn tax_portion(&self, gross: Decimal) -> Decimal {
        let divisor = Decimal::ONE + self.vat_rate;
        if divisor.is_zero() {
            return Decimal::ZERO;
        }
        round_money(gross * self.vat_rate / divisor)
    }

    /// Shipping fee for a cart with the given subtotal.
    ///
    /// Empty carts never pay shipping.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal, is_empty: bool) -> Decimal {
        if is_empty || subtotal > self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }
}

/// Totals derived from a cart's line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartTotals {
    /// Sum of `unit_price * quantity` over all lines.
    pub subtotal: Decimal,
    /// Tax embedded in the subtotal (informational).
    pub tax: Decimal,
    /// Shipping fee.
    pub shipping: Decimal,
    /// `subtotal + shipping`.
    pub total: Decimal,
    /// Sum of quantities over all lines.
    pub item_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_midpoint_away_from_zero() {
        assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_money(Decimal::new(3333, 3)), Decimal::new(333, 2));
    }

    #[test]
    fn test_tax_portion_back_calculated() {
        let policy = PricingPolicy::default();
        // 60.00 gross at 20% VAT holds 10.00 of tax
        assert_eq!(policy.tax_portion(Decimal::new(6000, 2)), Decimal::new(1000, 2));
        assert_eq!(policy.tax_portion(Decimal::new(2000, 2)), Decimal::new(333, 2));
    }

    #[test]
    fn test_tax_portion_zero_rate() {
        let policy = PricingPolicy {
            vat_rate: Decimal::ZERO,
            ..PricingPolicy::default()
        };
        assert_eq!(policy.tax_portion(Decimal::new(2000, 2)), Decimal::ZERO);
    }

    #[test]
    fn test_shipping_threshold_is_strict() {
        let policy = PricingPolicy::default();
        assert_eq!(
            policy.shipping_for(Decimal::new(5000, 2), false),
            Decimal::new(599, 2)
        );
        assert_eq!(policy.shipping_for(Decimal::new(5001, 2), false), Decimal::ZERO);
        assert_eq!(policy.shipping_for(Decimal::ZERO, true), Decimal::ZERO);
    }
}

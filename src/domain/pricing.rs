//! Checkout pricing: subtotal, discount, shipping, tax and total.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::PricingConfig;

/// Round to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A cart line after unit prices were resolved for the buyer
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub variation_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl PricedLine {
    pub fn line_total(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

/// Totals shown at checkout and stored on the order
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PriceBreakdown {
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub shipping: Decimal,
    #[schema(value_type = String)]
    pub tax: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
}

impl PriceBreakdown {
    pub fn subtotal_of(lines: &[PricedLine]) -> Decimal {
        lines.iter().map(PricedLine::line_total).sum()
    }

    /// `discount` must already be capped at the subtotal.
    pub fn compute(lines: &[PricedLine], discount: Decimal, config: &PricingConfig) -> Self {
        let subtotal = Self::subtotal_of(lines);
        let discount = round_money(discount.min(subtotal).max(Decimal::ZERO));
        let taxable = subtotal - discount;

        let shipping = if lines.is_empty() || taxable >= config.free_shipping_threshold {
            Decimal::ZERO
        } else {
            round_money(config.shipping_flat)
        };
        let tax = round_money(taxable * config.tax_rate);

        Self {
            subtotal,
            discount,
            shipping,
            tax,
            total: taxable + shipping + tax,
        }
    }
}

/// Referral commission for an order amount.
pub fn commission_for(amount: Decimal, rate: Decimal) -> Decimal {
    round_money(round_money(amount) * rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tax: Decimal) -> PricingConfig {
        PricingConfig {
            commission_rate: Decimal::new(10, 2),
            shipping_flat: Decimal::new(999, 2),
            free_shipping_threshold: Decimal::new(100, 0),
            tax_rate: tax,
        }
    }

    fn line(cents: i64, quantity: i32) -> PricedLine {
        PricedLine {
            variation_id: Uuid::new_v4(),
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn small_orders_pay_flat_shipping() {
        let b = PriceBreakdown::compute(&[line(2499, 2)], Decimal::ZERO, &config(Decimal::ZERO));
        assert_eq!(b.subtotal, Decimal::new(4998, 2));
        assert_eq!(b.shipping, Decimal::new(999, 2));
        assert_eq!(b.total, Decimal::new(5997, 2));
    }

    #[test]
    fn free_shipping_uses_discounted_subtotal() {
        let lines = [line(5500, 2)];
        let free = PriceBreakdown::compute(&lines, Decimal::ZERO, &config(Decimal::ZERO));
        assert_eq!(free.shipping, Decimal::ZERO);

        let discounted = PriceBreakdown::compute(&lines, Decimal::new(20, 0), &config(Decimal::ZERO));
        assert_eq!(discounted.shipping, Decimal::new(999, 2));
        assert_eq!(discounted.total, Decimal::new(9999, 2));
    }

    #[test]
    fn tax_applies_after_discount() {
        let b = PriceBreakdown::compute(
            &[line(10000, 1)],
            Decimal::new(10, 0),
            &config(Decimal::new(8, 2)),
        );
        assert_eq!(b.tax, Decimal::new(720, 2));
        assert_eq!(b.shipping, Decimal::new(999, 2));
        assert_eq!(b.total, Decimal::new(10719, 2));
    }

    #[test]
    fn empty_cart_costs_nothing() {
        let b = PriceBreakdown::compute(&[], Decimal::ZERO, &config(Decimal::ZERO));
        assert_eq!(b.total, Decimal::ZERO);
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2));
        assert_eq!(
            commission_for(Decimal::new(4998, 2), Decimal::new(10, 2)),
            Decimal::new(500, 2)
        );
    }
}

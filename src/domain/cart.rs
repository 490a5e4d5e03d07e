//! Shopping cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::pricing::PricedLine;
use super::product::{Product, ProductVariation};
use super::user::UserRole;

/// Stored cart row
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub variation_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart row priced for the viewing user
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub variation_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub strength: Option<String>,
    pub flavor: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
    /// Warehouse quantity available right now
    pub available: i32,
}

impl CartLine {
    /// Price a stored row for a buyer with `role`.
    pub fn price(
        item: &CartItem,
        variation: &ProductVariation,
        product: &Product,
        available: i32,
        role: UserRole,
    ) -> Self {
        let unit_price = product.unit_price(variation, role);
        Self {
            id: item.id,
            variation_id: variation.id,
            product_id: product.id,
            product_name: product.name.clone(),
            sku: variation.sku.clone(),
            strength: variation.strength.clone(),
            flavor: variation.flavor.clone(),
            quantity: item.quantity,
            unit_price,
            line_total: unit_price * Decimal::from(item.quantity),
            available,
        }
    }

    pub fn priced(&self) -> PricedLine {
        PricedLine {
            variation_id: self.variation_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

/// Cart contents with subtotal
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    pub item_count: i32,
}

impl CartView {
    pub fn new(items: Vec<CartLine>) -> Self {
        let subtotal = items.iter().map(|l| l.line_total).sum();
        let item_count = items.iter().map(|l| l.quantity).sum();
        Self {
            items,
            subtotal,
            item_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (CartItem, ProductVariation, Product) {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: "Mint Pouches".into(),
            description: None,
            category: "pouches".into(),
            price: Decimal::new(1999, 2),
            wholesale_price: Some(Decimal::new(1200, 2)),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let variation = ProductVariation {
            id: Uuid::new_v4(),
            product_id: product.id,
            sku: "MINT-6".into(),
            strength: Some("6mg".into()),
            flavor: Some("mint".into()),
            price_override: None,
            active: true,
            created_at: now,
            updated_at: now,
        };
        let item = CartItem {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            variation_id: variation.id,
            quantity: 3,
            created_at: now,
            updated_at: now,
        };
        (item, variation, product)
    }

    #[test]
    fn lines_are_priced_for_the_buyer_role() {
        let (item, variation, product) = fixtures();

        let retail = CartLine::price(&item, &variation, &product, 10, UserRole::Retail);
        assert_eq!(retail.line_total, Decimal::new(5997, 2));

        let wholesale = CartLine::price(&item, &variation, &product, 10, UserRole::Wholesale);
        assert_eq!(wholesale.unit_price, Decimal::new(1200, 2));
        assert_eq!(wholesale.line_total, Decimal::new(3600, 2));
    }

    #[test]
    fn view_totals_lines() {
        let (item, variation, product) = fixtures();
        let line = CartLine::price(&item, &variation, &product, 10, UserRole::Retail);
        let view = CartView::new(vec![line.clone(), line]);
        assert_eq!(view.subtotal, Decimal::new(11994, 2));
        assert_eq!(view.item_count, 6);
        assert!(!view.is_empty());
    }
}

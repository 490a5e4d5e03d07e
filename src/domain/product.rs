//! Catalog entities: products and their sellable variations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserRole;
use crate::errors::{AppError, AppResult};

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Cold Brew Concentrate")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "beverages")]
    pub category: String,
    /// Retail price
    #[schema(value_type = String, example = "24.99")]
    pub price: Decimal,
    /// Price for approved wholesale buyers
    #[schema(value_type = Option<String>, example = "18.00")]
    pub wholesale_price: Option<Decimal>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Variation of a product (strength / flavor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductVariation {
    pub id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "CBC-STRONG-VAN")]
    pub sku: String,
    pub strength: Option<String>,
    pub flavor: Option<String>,
    /// Overrides the product's retail price when set
    #[schema(value_type = Option<String>)]
    pub price_override: Option<Decimal>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price charged to a buyer with the given role for one unit of `variation`.
    pub fn unit_price(&self, variation: &ProductVariation, role: UserRole) -> Decimal {
        if role == UserRole::Wholesale {
            if let Some(wholesale) = self.wholesale_price {
                return wholesale;
            }
        }
        variation.price_override.unwrap_or(self.price)
    }

    /// Whether a variation of this product may be put in a cart.
    pub fn is_purchasable(&self, variation: &ProductVariation) -> bool {
        self.active && variation.active && variation.product_id == self.id
    }
}

/// Variation plus its sellable (warehouse) stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VariationWithStock {
    #[serde(flatten)]
    pub variation: ProductVariation,
    pub stock: i32,
}

/// Product with its variations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variations: Vec<VariationWithStock>,
}

/// Catalog listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// Data required to create a product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub wholesale_price: Option<Decimal>,
}

/// Partial product update
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
    pub active: Option<bool>,
}

/// Data required to create a variation
#[derive(Debug, Clone)]
pub struct NewVariation {
    pub sku: String,
    pub strength: Option<String>,
    pub flavor: Option<String>,
    pub price_override: Option<Decimal>,
}

/// Partial variation update
#[derive(Debug, Clone, Default)]
pub struct VariationUpdate {
    pub strength: Option<String>,
    pub flavor: Option<String>,
    pub price_override: Option<Decimal>,
    pub active: Option<bool>,
}

/// Validate retail / wholesale price pair.
pub fn validate_prices(price: Decimal, wholesale_price: Option<Decimal>) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::validation("Price must be greater than zero"));
    }
    if let Some(wholesale) = wholesale_price {
        if wholesale <= Decimal::ZERO {
            return Err(AppError::validation(
                "Wholesale price must be greater than zero",
            ));
        }
        if wholesale > price {
            return Err(AppError::validation(
                "Wholesale price cannot exceed the retail price",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(wholesale: Option<Decimal>) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Tea".into(),
            description: None,
            category: "drinks".into(),
            price: Decimal::new(2000, 2),
            wholesale_price: wholesale,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn variation(product: &Product, price_override: Option<Decimal>) -> ProductVariation {
        let now = Utc::now();
        ProductVariation {
            id: Uuid::new_v4(),
            product_id: product.id,
            sku: "TEA-1".into(),
            strength: Some("strong".into()),
            flavor: None,
            price_override,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn retail_buyers_pay_override_or_list_price() {
        let p = product(Some(Decimal::new(1500, 2)));
        assert_eq!(
            p.unit_price(&variation(&p, None), UserRole::Retail),
            Decimal::new(2000, 2)
        );
        assert_eq!(
            p.unit_price(&variation(&p, Some(Decimal::new(2200, 2))), UserRole::Retail),
            Decimal::new(2200, 2)
        );
    }

    #[test]
    fn wholesale_buyers_get_wholesale_price_when_set() {
        let p = product(Some(Decimal::new(1500, 2)));
        let v = variation(&p, Some(Decimal::new(2200, 2)));
        assert_eq!(p.unit_price(&v, UserRole::Wholesale), Decimal::new(1500, 2));

        let no_wholesale = product(None);
        let v = variation(&no_wholesale, None);
        assert_eq!(
            no_wholesale.unit_price(&v, UserRole::Wholesale),
            Decimal::new(2000, 2)
        );
    }

    #[test]
    fn inactive_products_are_not_purchasable() {
        let mut p = product(None);
        let v = variation(&p, None);
        assert!(p.is_purchasable(&v));
        p.active = false;
        assert!(!p.is_purchasable(&v));
    }

    #[test]
    fn price_validation() {
        assert!(validate_prices(Decimal::ZERO, None).is_err());
        assert!(validate_prices(Decimal::ONE, Some(Decimal::TWO)).is_err());
        assert!(validate_prices(Decimal::TWO, Some(Decimal::ONE)).is_ok());
    }

    #[test]
    fn cached_detail_reads_back_unchanged() {
        let p = product(Some(Decimal::new(1500, 2)));
        let detail = ProductDetail {
            variations: vec![VariationWithStock {
                variation: variation(&p, Some(Decimal::new(2200, 2))),
                stock: 7,
            }],
            product: p,
        };

        let json = serde_json::to_string(&detail).unwrap();
        let back: ProductDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(back, detail);
    }
}

//! Entity rows for driving the repositories through sea-orm's `MockDatabase`.
//!
//! Postgres reads (including `RETURNING` inserts and updates) consume query
//! results, plain inserts and bulk updates consume exec results. Tests queue
//! both in the order the workflow issues them.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, MockExecResult, Value};
use uuid::Uuid;

use super::entities::{
    cart_item, commission, discount_code, order, order_item, product, product_variation, stock_level, user,
    wholesale_application,
};
use crate::domain::{Location, OrderStatus, PaymentStatus, UserRole};

pub(crate) fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Exec result touching `rows` rows.
pub(crate) fn affected(rows: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: rows,
    }
}

/// Row returned by `count()`.
pub(crate) fn count_row(n: i64) -> BTreeMap<String, Value> {
    BTreeMap::from([("num_items".to_string(), Value::BigInt(Some(n)))])
}

/// Unpaid order of 50.00 + 9.99 shipping.
pub(crate) fn order_row(id: Uuid, user_id: Uuid, status: OrderStatus) -> order::Model {
    let now = Utc::now();
    order::Model {
        id,
        user_id,
        status: status.as_str().to_string(),
        payment_status: PaymentStatus::Unpaid.as_str().to_string(),
        subtotal: money(5000),
        discount: Decimal::ZERO,
        shipping: money(999),
        tax: Decimal::ZERO,
        total: money(5999),
        discount_code: None,
        shipping_address: "1 Main St, Springfield".to_string(),
        notes: None,
        distributor_id: None,
        payment_id: None,
        paid_at: None,
        tracking_number: None,
        carrier: None,
        fulfillment_proof_url: None,
        fulfillment_notes: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn assigned_order_row(
    id: Uuid,
    status: OrderStatus,
    distributor_id: Uuid,
) -> order::Model {
    order::Model {
        distributor_id: Some(distributor_id),
        payment_status: PaymentStatus::Paid.as_str().to_string(),
        ..order_row(id, Uuid::new_v4(), status)
    }
}

pub(crate) fn item_row(order_id: Uuid, variation_id: Uuid, sku: &str, quantity: i32) -> order_item::Model {
    order_item::Model {
        id: Uuid::new_v4(),
        order_id,
        variation_id,
        product_name: "Cold Brew Concentrate".to_string(),
        sku: sku.to_string(),
        quantity,
        unit_price: money(2500),
        line_total: money(2500) * Decimal::from(quantity),
    }
}

pub(crate) fn user_row(id: Uuid, role: UserRole) -> user::Model {
    let now = Utc::now();
    user::Model {
        id,
        email: format!("{}@example.com", role.as_str()),
        password_hash: "$argon2id$hash".to_string(),
        name: "Pat Doe".to_string(),
        role: role.as_str().to_string(),
        status: "active".to_string(),
        referral_code: format!("REF{}", &id.simple().to_string()[..6]).to_uppercase(),
        referred_by: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub(crate) fn commission_row(user_id: Uuid, order_id: Uuid, amount: Decimal) -> commission::Model {
    commission::Model {
        id: Uuid::new_v4(),
        user_id,
        order_id,
        amount,
        rate: Decimal::new(10, 2),
        status: "pending_payout".to_string(),
        created_at: Utc::now(),
        paid_at: None,
    }
}

pub(crate) fn product_row(id: Uuid, price_cents: i64) -> product::Model {
    let now = Utc::now();
    product::Model {
        id,
        name: "Cold Brew Concentrate".to_string(),
        description: None,
        category: "coffee".to_string(),
        price: money(price_cents),
        wholesale_price: None,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn variation_row(id: Uuid, product_id: Uuid, sku: &str) -> product_variation::Model {
    let now = Utc::now();
    product_variation::Model {
        id,
        product_id,
        sku: sku.to_string(),
        strength: Some("strong".to_string()),
        flavor: None,
        price_override: None,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn stock_row(variation_id: Uuid, location: Location, quantity: i32) -> stock_level::Model {
    stock_level::Model {
        id: Uuid::new_v4(),
        variation_id,
        location: location.to_string(),
        quantity,
        updated_at: Utc::now(),
    }
}

pub(crate) fn cart_row(user_id: Uuid, variation_id: Uuid, quantity: i32) -> cart_item::Model {
    let now = Utc::now();
    cart_item::Model {
        id: Uuid::new_v4(),
        user_id,
        variation_id,
        quantity,
        created_at: now,
        updated_at: now,
    }
}

/// Active, unlimited fixed-amount code.
pub(crate) fn discount_row(code: &str, value_cents: i64) -> discount_code::Model {
    discount_code::Model {
        id: Uuid::new_v4(),
        code: code.to_string(),
        kind: "fixed".to_string(),
        value: money(value_cents),
        min_subtotal: None,
        max_uses: None,
        used_count: 0,
        active: true,
        starts_at: None,
        expires_at: None,
        created_at: Utc::now(),
    }
}

pub(crate) fn application_row(id: Uuid, user_id: Uuid, status: &str) -> wholesale_application::Model {
    wholesale_application::Model {
        id,
        user_id,
        business_name: "Corner Cafe LLC".to_string(),
        tax_id: None,
        message: None,
        status: status.to_string(),
        reviewed_by: None,
        review_note: None,
        reviewed_at: None,
        created_at: Utc::now(),
    }
}

/// Every statement the connection ran, values inlined, in order.
/// Transactions appear between their `BEGIN` and `COMMIT`/`ROLLBACK`.
pub(crate) fn executed_sql(db: DatabaseConnection) -> Vec<String> {
    db.into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.to_string()))
        .collect()
}

/// Statements whose SQL mentions `needle`.
pub(crate) fn matching<'a>(sql: &'a [String], needle: &str) -> Vec<&'a String> {
    sql.iter().filter(|stmt| stmt.contains(needle)).collect()
}

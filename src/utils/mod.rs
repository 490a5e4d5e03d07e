//! Utility functions and helpers.

pub mod referral;
pub mod signature;

pub use referral::{generate_referral_code, normalize_referral_code};

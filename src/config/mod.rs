//! Runtime settings read from the environment, plus fixed business limits.

mod constants;
mod settings;

pub use constants::*;
pub use settings::{Config, PricingConfig};

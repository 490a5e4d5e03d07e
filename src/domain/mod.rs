//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns:
//! catalog, carts, orders and their fulfillment state machine,
//! pricing, commissions, inventory, tasks and wholesale applications.

/// Declares a string-backed enum stored as text in the database.
///
/// Generates `as_str`, `Display`, `FromStr` (unknown values are a
/// validation error) and serde/OpenAPI derives.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize, utoipa::ToSchema,
        )]
        #[serde(rename_all = "snake_case")]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Database / wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $value ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::errors::AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $( if s == $value { return Ok($name::$variant); } )+
                Err(crate::errors::AppError::validation(format!(
                    concat!("Unknown ", stringify!($name), " '{}'"),
                    s
                )))
            }
        }
    };
}

pub mod cart;
pub mod commission;
pub mod discount;
pub mod inventory;
pub mod order;
pub mod password;
pub mod payment;
pub mod pricing;
pub mod product;
pub mod task;
pub mod user;
pub mod wholesale;

pub use cart::{CartItem, CartLine, CartView};
pub use commission::{Commission, CommissionStatus, ReferralSummary};
pub use discount::{DiscountCode, DiscountKind, DiscountUpdate, NewDiscount};
pub use inventory::{InventoryMovement, Location, StockLevel, StockMove};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderAction, OrderDetail, OrderFilter, OrderItem,
    OrderStatus, OrderStatusChange, PaymentStatus,
};
pub use password::Password;
pub use payment::{PaymentEventKind, PaymentOutcome, WebhookEvent, WebhookEventData};
pub use pricing::{PriceBreakdown, PricedLine};
pub use product::{
    NewProduct, NewVariation, Product, ProductDetail, ProductFilter, ProductUpdate,
    ProductVariation, VariationUpdate, VariationWithStock,
};
pub use task::{NewTask, Task, TaskKind, TaskStatus};
pub use user::{CurrentUser, NewUser, User, UserFilter, UserResponse, UserRole, UserStatus};
pub use wholesale::{ApplicationStatus, WholesaleApplication};

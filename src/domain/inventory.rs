//! Stock levels per location and the movement ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{DISTRIBUTOR_LOCATION_PREFIX, WAREHOUSE_LOCATION};
use crate::errors::{AppError, AppResult};

/// Where stock is held: the central warehouse or a distributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Warehouse,
    Distributor(Uuid),
}

impl Location {
    /// Warehouse stock is the sellable stock shown in the catalog.
    pub fn is_warehouse(&self) -> bool {
        matches!(self, Location::Warehouse)
    }

    pub fn distributor_id(&self) -> Option<Uuid> {
        match self {
            Location::Distributor(id) => Some(*id),
            Location::Warehouse => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Warehouse => f.write_str(WAREHOUSE_LOCATION),
            Location::Distributor(id) => write!(f, "{}{}", DISTRIBUTOR_LOCATION_PREFIX, id),
        }
    }
}

impl FromStr for Location {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == WAREHOUSE_LOCATION {
            return Ok(Location::Warehouse);
        }
        s.strip_prefix(DISTRIBUTOR_LOCATION_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(Location::Distributor)
            .ok_or_else(|| AppError::validation(format!("Unknown location '{}'", s)))
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Quantity of one variation at one location
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StockLevel {
    pub id: Uuid,
    pub variation_id: Uuid,
    #[schema(value_type = String, example = "warehouse")]
    pub location: Location,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry for any stock change
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InventoryMovement {
    pub id: Uuid,
    pub variation_id: Uuid,
    #[schema(value_type = Option<String>)]
    pub from_location: Option<Location>,
    #[schema(value_type = Option<String>)]
    pub to_location: Option<Location>,
    pub quantity: i32,
    #[schema(example = "fulfillment")]
    pub reason: String,
    pub order_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A quantity leaving `from` and arriving at `to`.
///
/// `from = None` is stock entering the system (receiving, upward
/// adjustment); `to = None` is stock leaving it (shipment to a customer,
/// downward adjustment).
#[derive(Debug, Clone, PartialEq)]
pub struct StockMove {
    pub variation_id: Uuid,
    pub from: Option<Location>,
    pub to: Option<Location>,
    pub quantity: i32,
    pub reason: String,
    pub order_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
}

impl StockMove {
    pub fn new(variation_id: Uuid, quantity: i32, reason: impl Into<String>) -> Self {
        Self {
            variation_id,
            from: None,
            to: None,
            quantity,
            reason: reason.into(),
            order_id: None,
            actor_id: None,
        }
    }

    pub fn from(mut self, location: Location) -> Self {
        self.from = Some(location);
        self
    }

    pub fn to(mut self, location: Location) -> Self {
        self.to = Some(location);
        self
    }

    pub fn for_order(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn by(mut self, actor_id: Option<Uuid>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than zero"));
        }
        if self.from.is_none() && self.to.is_none() {
            return Err(AppError::validation("A stock move needs a source or a destination"));
        }
        if self.from == self.to {
            return Err(AppError::validation("Source and destination must differ"));
        }
        Ok(())
    }
}

//! Per-hub inventory records
//!
//! One record per `(hub, product)`. `reserved_quantity` is the part of
//! `quantity` already promised to orders:
//!
//! ```text
//! 0 <= reserved_quantity <= quantity
//! available = quantity - reserved_quantity
//! ```
//!
//! Persisted rows may be missing fields (older writers stored only what
//! they touched). [`InventoryRecord::from_raw`] is the single place where
//! missing values default to zero and integrity is checked; every other
//! piece of code works with validated records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hub::HubId;

pub type ProductId = i64;

/// Restock source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestockSource {
    MainHub,
    Admin,
    Purchase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockEntry {
    pub amount: i64,
    pub source: RestockSource,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Row as persisted (fields may be missing)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInventoryRow {
    #[serde(default)]
    pub hub_id: HubId,
    #[serde(default)]
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub reserved_quantity: Option<i64>,
    #[serde(default)]
    pub restock_history: Vec<RestockEntry>,
    #[serde(default)]
    pub last_restocked_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

/// Integrity violation of a stored row
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrityViolation {
    #[error("negative quantity {quantity}")]
    NegativeQuantity { quantity: i64 },

    #[error("negative reserved quantity {reserved}")]
    NegativeReserved { reserved: i64 },

    #[error("reserved {reserved} exceeds quantity {quantity}")]
    ReservedExceedsQuantity { quantity: i64, reserved: i64 },
}

/// Stock mutation rejected by the record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: i64, available: i64 },

    #[error("invalid fulfillment: requested {requested}, reserved {reserved}, quantity {quantity}")]
    InvalidFulfillment {
        requested: i64,
        reserved: i64,
        quantity: i64,
    },

    #[error("amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("adding {amount} to {current} leaves the counter range")]
    Overflow { current: i64, amount: i64 },
}

/// Line that could not be reserved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortfall {
    pub product_id: ProductId,
    pub requested: i64,
    pub available: i64,
}

impl StockShortfall {
    pub fn missing(&self) -> i64 {
        (self.requested - self.available).max(0)
    }
}

/// Validated inventory record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub hub_id: HubId,
    pub product_id: ProductId,
    quantity: i64,
    reserved_quantity: i64,
    pub restock_history: Vec<RestockEntry>,
    pub last_restocked_at: Option<i64>,
    pub updated_at: i64,
}

impl InventoryRecord {
    /// Empty record (created lazily on first touch)
    pub fn new(hub_id: HubId, product_id: ProductId) -> Self {
        Self {
            hub_id,
            product_id,
            quantity: 0,
            reserved_quantity: 0,
            restock_history: Vec::new(),
            last_restocked_at: None,
            updated_at: crate::util::now_millis(),
        }
    }

    /// Normalize a persisted row: missing counters become zero, then the
    /// invariants are checked.
    pub fn from_raw(raw: RawInventoryRow) -> Result<Self, IntegrityViolation> {
        let quantity = raw.quantity.unwrap_or(0);
        let reserved = raw.reserved_quantity.unwrap_or(0);
        check_counters(quantity, reserved)?;
        Ok(Self {
            hub_id: raw.hub_id,
            product_id: raw.product_id,
            quantity,
            reserved_quantity: reserved,
            restock_history: raw.restock_history,
            last_restocked_at: raw.last_restocked_at,
            updated_at: raw.updated_at.unwrap_or(0),
        })
    }

    pub fn to_raw(&self) -> RawInventoryRow {
        RawInventoryRow {
            hub_id: self.hub_id,
            product_id: self.product_id,
            quantity: Some(self.quantity),
            reserved_quantity: Some(self.reserved_quantity),
            restock_history: self.restock_history.clone(),
            last_restocked_at: self.last_restocked_at,
            updated_at: Some(self.updated_at),
        }
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn reserved_quantity(&self) -> i64 {
        self.reserved_quantity
    }

    pub fn available(&self) -> i64 {
        self.quantity - self.reserved_quantity
    }

    pub fn reserve(&mut self, amount: i64) -> Result<(), StockError> {
        ensure_positive(amount)?;
        let available = self.available();
        if amount > available {
            return Err(StockError::Insufficient {
                requested: amount,
                available,
            });
        }
        self.reserved_quantity += amount;
        self.touch();
        Ok(())
    }

    /// Returns the amount actually released. Releasing more than is
    /// reserved clamps to the reserved quantity.
    pub fn release(&mut self, amount: i64) -> Result<i64, StockError> {
        if amount < 0 {
            return Err(StockError::InvalidAmount(amount));
        }
        let released = amount.min(self.reserved_quantity);
        self.reserved_quantity -= released;
        self.touch();
        Ok(released)
    }

    /// Goods physically leave the hub.
    pub fn fulfill(&mut self, amount: i64) -> Result<(), StockError> {
        ensure_positive(amount)?;
        if amount > self.reserved_quantity || amount > self.quantity {
            return Err(StockError::InvalidFulfillment {
                requested: amount,
                reserved: self.reserved_quantity,
                quantity: self.quantity,
            });
        }
        self.reserved_quantity -= amount;
        self.quantity -= amount;
        self.touch();
        Ok(())
    }

    pub fn restock(
        &mut self,
        amount: i64,
        source: RestockSource,
        note: Option<String>,
    ) -> Result<(), StockError> {
        ensure_positive(amount)?;
        let quantity = self
            .quantity
            .checked_add(amount)
            .ok_or(StockError::Overflow {
                current: self.quantity,
                amount,
            })?;
        let now = crate::util::now_millis();
        self.quantity = quantity;
        self.restock_history.push(RestockEntry {
            amount,
            source,
            timestamp: now,
            note,
        });
        self.last_restocked_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Manual repair: overwrite both counters after an audit.
    pub fn set_counters(&mut self, quantity: i64, reserved: i64) -> Result<(), IntegrityViolation> {
        check_counters(quantity, reserved)?;
        self.quantity = quantity;
        self.reserved_quantity = reserved;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = crate::util::now_millis();
    }
}

fn ensure_positive(amount: i64) -> Result<(), StockError> {
    if amount <= 0 {
        return Err(StockError::InvalidAmount(amount));
    }
    Ok(())
}

fn check_counters(quantity: i64, reserved: i64) -> Result<(), IntegrityViolation> {
    if quantity < 0 {
        return Err(IntegrityViolation::NegativeQuantity { quantity });
    }
    if reserved < 0 {
        return Err(IntegrityViolation::NegativeReserved { reserved });
    }
    if reserved > quantity {
        return Err(IntegrityViolation::ReservedExceedsQuantity { quantity, reserved });
    }
    Ok(())
}

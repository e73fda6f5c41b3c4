use crate::db::StorageError;
use shared::error::{AppError, ErrorCode};
use shared::hub::HubId;
use shared::inventory::{IntegrityViolation, ProductId};
use thiserror::Error;

/// Inventory errors
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(
        "Insufficient stock at hub {hub_id} for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        hub_id: HubId,
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    #[error("Inventory row ({hub_id}, {product_id}) failed integrity check: {violation}")]
    Integrity {
        hub_id: HubId,
        product_id: ProductId,
        violation: IntegrityViolation,
    },

    #[error(
        "Invalid fulfillment at hub {hub_id} for product {product_id}: requested {requested}, reserved {reserved}, quantity {quantity}"
    )]
    InvalidFulfillment {
        hub_id: HubId,
        product_id: ProductId,
        requested: i64,
        reserved: i64,
        quantity: i64,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Quantity out of range at hub {hub_id} for product {product_id}: {current} + {amount}")]
    QuantityOverflow {
        hub_id: HubId,
        product_id: ProductId,
        current: i64,
        amount: i64,
    },

    #[error("Inventory row ({hub_id}, {product_id}) not found")]
    NotFound { hub_id: HubId, product_id: ProductId },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type InventoryResult<T> = Result<T, InventoryError>;

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        let message = err.to_string();
        match err {
            InventoryError::InsufficientStock {
                hub_id,
                product_id,
                requested,
                available,
            } => AppError::with_message(ErrorCode::InsufficientStock, message)
                .with_detail("hub_id", hub_id)
                .with_detail("product_id", product_id)
                .with_detail("requested", requested)
                .with_detail("available", available),
            InventoryError::Integrity {
                hub_id, product_id, ..
            } => {
                tracing::error!(hub_id, product_id, %message, "Inventory integrity violation surfaced");
                AppError::with_message(ErrorCode::InventoryIntegrity, message)
                    .with_detail("hub_id", hub_id)
                    .with_detail("product_id", product_id)
            }
            InventoryError::InvalidFulfillment {
                hub_id, product_id, ..
            } => AppError::with_message(ErrorCode::InvalidFulfillment, message)
                .with_detail("hub_id", hub_id)
                .with_detail("product_id", product_id),
            InventoryError::InvalidAmount(_) => {
                AppError::with_message(ErrorCode::InvalidQuantity, message)
            }
            InventoryError::QuantityOverflow {
                hub_id, product_id, ..
            } => AppError::with_message(ErrorCode::ValueOutOfRange, message)
                .with_detail("hub_id", hub_id)
                .with_detail("product_id", product_id),
            InventoryError::NotFound { .. } => {
                AppError::with_message(ErrorCode::InventoryNotFound, message)
            }
            InventoryError::Storage(e) => AppError::with_message(e.error_code(), message),
        }
    }
}

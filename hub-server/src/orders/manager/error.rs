use crate::db::StorageError;
use crate::inventory::InventoryError;
use crate::orders::traits::OrderError;
use crate::topology::TopologyError;
use shared::error::{AppError, ErrorCode};
use shared::order::TrackingEventType;
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Business rule rejection, state unchanged
    #[error(transparent)]
    Rejected(OrderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ManagerResult<T> = Result<T, ManagerError>;

impl From<OrderError> for ManagerError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(id) => ManagerError::OrderNotFound(id),
            OrderError::Storage(e) => ManagerError::Storage(e),
            OrderError::Topology(e) => ManagerError::Topology(e),
            OrderError::Inventory(e) => ManagerError::Inventory(e),
            other => ManagerError::Rejected(other),
        }
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => e.into(),
            ManagerError::Topology(e) => e.into(),
            ManagerError::Inventory(e) => e.into(),
            ManagerError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order not found: {id}"))
                    .with_detail("order_id", id)
            }
            ManagerError::Rejected(e) => rejection(e),
            ManagerError::Internal(msg) => AppError::with_message(ErrorCode::InternalError, msg),
        }
    }
}

/// 业务拒绝 → 错误码 + 冲突事件详情
fn rejection(err: OrderError) -> AppError {
    let message = err.to_string();
    match err {
        OrderError::EmptyOrder => AppError::with_message(ErrorCode::OrderEmpty, message),
        OrderError::HubNotFound(hub_id) => {
            AppError::with_message(ErrorCode::HubNotFound, message).with_detail("hub_id", hub_id)
        }
        OrderError::InvalidStateTransition {
            order_id,
            from,
            to,
            conflicting_event,
        } => AppError::with_message(ErrorCode::InvalidStateTransition, message)
            .with_detail("order_id", order_id)
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str())
            .with_detail("conflicting_event", conflicting_event),
        OrderError::AlreadyDispatched {
            order_id,
            hub_id,
            event_type,
            sequence,
        } => AppError::with_message(ErrorCode::AlreadyDispatched, message)
            .with_detail("order_id", order_id)
            .with_event(event_type.as_str(), hub_id, sequence),
        OrderError::AlreadyScanned {
            order_id,
            hub_id,
            sequence,
        } => AppError::with_message(ErrorCode::AlreadyScanned, message)
            .with_detail("order_id", order_id)
            .with_event(TrackingEventType::ArrivedAtHub.as_str(), hub_id, sequence),
        OrderError::HubNotOnRoute { order_id, hub_id } => {
            AppError::with_message(ErrorCode::HubNotOnRoute, message)
                .with_detail("order_id", order_id)
                .with_detail("hub_id", hub_id)
        }
        OrderError::OrderNotAtHub {
            order_id,
            hub_id,
            current_hub,
        } => AppError::with_message(ErrorCode::OrderNotAtHub, message)
            .with_detail("order_id", order_id)
            .with_detail("hub_id", hub_id)
            .with_detail("current_hub", current_hub),
        OrderError::AlreadyCancelled(order_id) => {
            AppError::with_message(ErrorCode::OrderAlreadyCancelled, message)
                .with_detail("order_id", order_id)
        }
        OrderError::AlreadyDelivered(order_id) => {
            AppError::with_message(ErrorCode::OrderAlreadyDelivered, message)
                .with_detail("order_id", order_id)
        }
        OrderError::AlreadyRefunded(order_id) => {
            AppError::with_message(ErrorCode::AlreadyRefunded, message)
                .with_detail("order_id", order_id)
        }
        OrderError::InvalidCollectionCode(order_id) => {
            AppError::with_message(ErrorCode::InvalidCollectionCode, message)
                .with_detail("order_id", order_id)
        }
        OrderError::CollectionNotAvailable { order_id, status } => {
            AppError::with_message(ErrorCode::CollectionNotAvailable, message)
                .with_detail("order_id", order_id)
                .with_detail("status", status.as_str())
        }
        OrderError::Validation(msg) => AppError::validation(msg),
        OrderError::InvalidOperation(msg) => AppError::invalid_operation(msg),
        OrderError::OrderNotFound(id) => {
            AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
        }
        OrderError::Topology(e) => e.into(),
        OrderError::Inventory(e) => e.into(),
        OrderError::Storage(e) => ManagerError::Storage(e).into(),
    }
}

//! 外部协作方 - restock, notification and refund contracts
//!
//! # 服务列表
//!
//! - [`RestockSink`] - 缺货补货请求
//! - [`NotificationSink`] - 枢纽管理员通知
//! - [`RefundProcessor`] - 退款执行
//!
//! All three are called after the order transaction commits. Failures are
//! logged and never roll back order state.

pub mod notification;
pub mod refund;
pub mod restock;

use std::sync::Arc;

use thiserror::Error;

pub use notification::{HubNotice, NotificationSink, TracingNotifier};
pub use refund::{GATEWAY_NOT_CONFIGURED, RefundOutcome, RefundProcessor, UnconfiguredRefunds};
pub use restock::{RecordingRestockSink, RestockPriority, RestockRequest, RestockSink};

/// Collaborator call failure
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Service rejected request: {0}")]
    Rejected(String),
}

/// The set of collaborators handed to the order manager
#[derive(Clone)]
pub struct Collaborators {
    pub restock: Arc<dyn RestockSink>,
    pub notifier: Arc<dyn NotificationSink>,
    pub refunds: Arc<dyn RefundProcessor>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            restock: Arc::new(RecordingRestockSink::new()),
            notifier: Arc::new(TracingNotifier),
            refunds: Arc::new(UnconfiguredRefunds),
        }
    }
}

//! Hub manager notifications (best-effort)

use serde::{Deserialize, Serialize};
use shared::hub::HubId;

use super::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HubNotice {
    /// 订单因缺货挂起
    StockShortfall,
    /// 订单即将到达
    Incoming,
    ReadyForCollection,
    Cancelled,
}

pub trait NotificationSink: Send + Sync {
    fn notify_hub_managers(
        &self,
        hub_id: HubId,
        order_id: &str,
        notice: HubNotice,
    ) -> Result<(), ServiceError>;
}

/// Logs notices instead of delivering them
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify_hub_managers(
        &self,
        hub_id: HubId,
        order_id: &str,
        notice: HubNotice,
    ) -> Result<(), ServiceError> {
        tracing::info!(hub_id, order_id, notice = ?notice, "Hub managers notified");
        Ok(())
    }
}

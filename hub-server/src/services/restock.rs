//! Restock requests raised for reservation shortfalls

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::hub::HubId;
use shared::inventory::{ProductId, StockShortfall};

use super::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestockPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Restock request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockRequest {
    pub request_id: i64,
    pub hub_id: HubId,
    pub product_id: ProductId,
    /// Missing units
    pub amount: i64,
    pub order_id: Option<String>,
    pub priority: RestockPriority,
    pub created_at: i64,
}

impl RestockRequest {
    /// 订单缺货触发的补货请求，优先级 HIGH
    pub fn for_shortfall(hub_id: HubId, order_id: &str, shortfall: &StockShortfall) -> Self {
        Self {
            request_id: shared::util::snowflake_id(),
            hub_id,
            product_id: shortfall.product_id,
            amount: shortfall.missing(),
            order_id: Some(order_id.to_string()),
            priority: RestockPriority::High,
            created_at: shared::util::now_millis(),
        }
    }
}

/// Receives restock requests (fire-and-forget)
pub trait RestockSink: Send + Sync {
    /// Returns the request id as accepted by the sink
    fn raise_restock_request(&self, request: RestockRequest) -> Result<i64, ServiceError>;
}

/// Keeps every request in memory
#[derive(Debug, Default)]
pub struct RecordingRestockSink {
    requests: Mutex<Vec<RestockRequest>>,
}

impl RecordingRestockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<RestockRequest> {
        self.requests.lock().clone()
    }
}

impl RestockSink for RecordingRestockSink {
    fn raise_restock_request(&self, request: RestockRequest) -> Result<i64, ServiceError> {
        let id = request.request_id;
        tracing::info!(
            request_id = id,
            hub_id = request.hub_id,
            product_id = request.product_id,
            amount = request.amount,
            order_id = ?request.order_id,
            "Restock request raised"
        );
        self.requests.lock().push(request);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_requests() {
        let sink = RecordingRestockSink::new();
        let shortfall = StockShortfall {
            product_id: 5,
            requested: 4,
            available: 1,
        };
        let request = RestockRequest::for_shortfall(9, "order-1", &shortfall);
        let id = sink.raise_restock_request(request.clone()).unwrap();

        assert_eq!(id, request.request_id);
        assert_eq!(sink.requests(), vec![request]);
        assert_eq!(sink.requests()[0].amount, 3);
        assert_eq!(sink.requests()[0].priority, RestockPriority::High);
    }
}

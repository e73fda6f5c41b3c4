//! Refund execution contract

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundOutcome {
    pub success: bool,
    pub refund_id: Option<String>,
    pub error_code: Option<String>,
}

impl RefundOutcome {
    pub fn succeeded(refund_id: impl Into<String>) -> Self {
        Self {
            success: true,
            refund_id: Some(refund_id.into()),
            error_code: None,
        }
    }

    pub fn failed(error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            refund_id: None,
            error_code: Some(error_code.into()),
        }
    }
}

pub trait RefundProcessor: Send + Sync {
    fn refund(
        &self,
        transaction_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> Result<RefundOutcome, ServiceError>;
}

/// No gateway wired in: every refund is recorded as failed for retry
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredRefunds;

pub const GATEWAY_NOT_CONFIGURED: &str = "GATEWAY_NOT_CONFIGURED";

impl RefundProcessor for UnconfiguredRefunds {
    fn refund(
        &self,
        transaction_id: &str,
        amount: Decimal,
        _reason: &str,
    ) -> Result<RefundOutcome, ServiceError> {
        tracing::warn!(transaction_id, %amount, "Refund gateway not configured");
        Ok(RefundOutcome::failed(GATEWAY_NOT_CONFIGURED))
    }
}

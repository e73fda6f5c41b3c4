//! RecordRefund command handler
//!
//! Refunds run after the cancellation commits; their outcome is recorded
//! as a separate timeline event.

use rust_decimal::Decimal;
use shared::order::{EventPayload, RefundStatus, TrackingEvent, TrackingEventType};

use super::new_event;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use crate::services::RefundOutcome;

/// RecordRefund action
#[derive(Debug, Clone)]
pub struct RecordRefundAction {
    pub order_id: String,
    pub amount: Decimal,
    pub outcome: RefundOutcome,
}

impl CommandHandler for RecordRefundAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        let order = ctx.load_snapshot(&self.order_id)?;

        match order.payment.refund_status {
            Some(RefundStatus::Pending) | Some(RefundStatus::Failed) => {}
            Some(RefundStatus::Processed) => {
                return Err(OrderError::AlreadyRefunded(self.order_id.clone()));
            }
            None => {
                return Err(OrderError::InvalidOperation(format!(
                    "order {} has no refund in progress",
                    self.order_id
                )));
            }
        }

        let (status, description) = if self.outcome.success {
            (RefundStatus::Processed, "Refund processed".to_string())
        } else {
            (
                RefundStatus::Failed,
                format!(
                    "Refund failed: {}",
                    self.outcome.error_code.as_deref().unwrap_or("unknown")
                ),
            )
        };

        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            TrackingEventType::RefundUpdated,
            order.current_hub,
            description,
            EventPayload::RefundUpdated {
                status,
                refund_id: self.outcome.refund_id.clone(),
                amount: Some(self.amount),
                error: self.outcome.error_code.clone(),
            },
        );
        Ok(vec![event])
    }
}

//! CancelOrder command handler
//!
//! Releases reserved stock in the same transaction, invalidates any
//! collection code and queues the refund for after commit.

use shared::order::{
    EventPayload, OrderStatus, ReservationStatus, TrackingEvent, TrackingEventType,
};

use super::{ensure_transition, new_event};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, SideEffect,
};
use crate::services::HubNotice;

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: Option<String>,
}

impl CommandHandler for CancelOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        // 1. Load and validate
        let order = ctx.load_snapshot(&self.order_id)?;
        ensure_transition(&order, order.status, OrderStatus::Cancelled)?;

        // 2. Release stock still reserved at the fulfilling hub
        let stock_released = match (order.reservation.status, order.reservation.hub_id) {
            (ReservationStatus::Reserved, Some(hub_id)) => {
                let released = ctx
                    .coordinator()
                    .release_order_txn(ctx.txn(), hub_id, &order.items)?;
                tracing::debug!(order_id = %self.order_id, hub_id, released, "Reservation released");
                true
            }
            _ => false,
        };

        // 3. Any outstanding collection code dies with the order
        ctx.storage()
            .remove_collection_code(ctx.txn(), &self.order_id)?;

        // 4. Refund after commit
        let refund_pending = order.payment.refund_eligible();
        if refund_pending {
            ctx.push_effect(SideEffect::Refund {
                order_id: self.order_id.clone(),
                transaction_id: order.payment.transaction_id.clone(),
                amount: order.total_amount,
                reason: self
                    .reason
                    .clone()
                    .unwrap_or_else(|| "Order cancelled".to_string()),
            });
        }
        if let Some(hub_id) = order.current_hub {
            ctx.push_effect(SideEffect::NotifyHub {
                hub_id,
                order_id: self.order_id.clone(),
                notice: HubNotice::Cancelled,
            });
        }

        let description = match &self.reason {
            Some(reason) => format!("Cancelled: {reason}"),
            None => "Cancelled".to_string(),
        };
        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            TrackingEventType::Cancelled,
            order.current_hub,
            description,
            EventPayload::Cancelled {
                reason: self.reason.clone(),
                stock_released,
                refund_pending,
            },
        );
        Ok(vec![event])
    }
}

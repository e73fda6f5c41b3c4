//! ConfirmDelivery command handler

use shared::order::{EventPayload, OrderStatus, TrackingEvent, TrackingEventType};

use super::{ensure_transition, fulfill_if_reserved_at, new_event};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};

/// ConfirmDelivery action - courier handed the parcel over
#[derive(Debug, Clone)]
pub struct ConfirmDeliveryAction {
    pub order_id: String,
}

impl CommandHandler for ConfirmDeliveryAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        let order = ctx.load_snapshot(&self.order_id)?;
        ensure_transition(&order, order.status, OrderStatus::Delivered)?;

        if order.is_collection() {
            return Err(OrderError::InvalidOperation(format!(
                "order {} is delivered by collection code",
                self.order_id
            )));
        }

        let stock_fulfilled = match order.reservation.hub_id {
            Some(hub_id) => fulfill_if_reserved_at(ctx, &order, hub_id)?,
            None => false,
        };

        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            TrackingEventType::Delivered,
            order.current_hub,
            "Delivered to customer",
            EventPayload::Delivered {
                stock_fulfilled,
                via_collection: false,
            },
        );
        Ok(vec![event])
    }
}

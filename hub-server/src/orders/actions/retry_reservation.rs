//! RetryReservation command handler
//!
//! Used after a restock: a held order gets one more all-or-nothing try at
//! its fulfilling hub. Orders that are not held are left alone.

use shared::order::{ReservationStatus, TrackingEvent};

use super::retry_held_reservation;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};

/// RetryReservation action
#[derive(Debug, Clone)]
pub struct RetryReservationAction {
    pub order_id: String,
}

impl CommandHandler for RetryReservationAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        let order = ctx.load_snapshot(&self.order_id)?;
        if order.is_terminal() || order.reservation.status != ReservationStatus::Held {
            return Ok(Vec::new());
        }

        let hub_id = order
            .reservation
            .hub_id
            .or(order.fulfilling_hub)
            .ok_or_else(|| {
                OrderError::InvalidOperation(format!(
                    "held order {} has no fulfilling hub",
                    self.order_id
                ))
            })?;

        Ok(retry_held_reservation(ctx, metadata, &order, hub_id)?
            .into_iter()
            .collect())
    }
}

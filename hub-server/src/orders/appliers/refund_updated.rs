//! RefundUpdated event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderSnapshot, PaymentStatus, RefundStatus, TrackingEvent};

/// RefundUpdated applier
pub struct RefundUpdatedApplier;

impl EventApplier for RefundUpdatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::RefundUpdated {
            status,
            refund_id,
            amount,
            error,
        } = &event.payload
        {
            snapshot.record(event);

            let payment = &mut snapshot.payment;
            payment.refund_status = Some(*status);
            if refund_id.is_some() {
                payment.refund_id = refund_id.clone();
            }
            if amount.is_some() {
                payment.refund_amount = *amount;
            }
            payment.refund_error = error.clone();
            if *status == RefundStatus::Processed {
                payment.status = PaymentStatus::Refunded;
            }
        }
    }
}

//! StatusRepaired event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderSnapshot, TrackingEvent};

/// StatusRepaired applier
pub struct StatusRepairedApplier;

impl EventApplier for StatusRepairedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::StatusRepaired { to, .. } = &event.payload {
            snapshot.record(event);
            snapshot.status = *to;
        }
    }
}

//! ArrivedAtHub event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderSnapshot, TrackingEvent};

/// HubArrived applier - the scanning hub becomes the current hub
pub struct HubArrivedApplier;

impl EventApplier for HubArrivedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::ArrivedAtHub { .. } = &event.payload {
            snapshot.record(event);
            if event.hub_id.is_some() {
                snapshot.current_hub = event.hub_id;
            }
        }
    }
}

//! RouteReassigned event applier

use crate::orders::actions::reassigned_destination;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderSnapshot, TrackingEvent};

/// RouteReassigned applier
pub struct RouteReassignedApplier;

impl EventApplier for RouteReassignedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::RouteReassigned {
            from_hub_id,
            to_hub_id,
            route,
            current_hub_id,
        } = &event.payload
        {
            snapshot.record(event);
            snapshot.route = route.clone();
            snapshot.current_hub = *current_hub_id;
            snapshot.destination =
                reassigned_destination(&snapshot.destination, *from_hub_id, *to_hub_id);
        }
    }
}

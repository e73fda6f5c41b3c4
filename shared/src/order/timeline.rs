//! Timeline rules
//!
//! Pure functions over an order's route and tracking timeline. Status is
//! never stored independently of these: the server recomputes it with
//! [`derive_status`] after every applied event, and the dispatch checks
//! and hub views all go through [`dispatched_from`].

use super::event::{TrackingEvent, TrackingEventType};
use super::snapshot::{OrderSnapshot, OrderStatus};
use crate::hub::HubId;

/// True iff the timeline holds an `IN_TRANSIT` event recorded at `hub_id`.
pub fn dispatched_from(order: &OrderSnapshot, hub_id: HubId) -> bool {
    dispatch_event(&order.timeline, hub_id).is_some()
}

/// The `IN_TRANSIT` event recorded at `hub_id`, if any
pub fn dispatch_event(timeline: &[TrackingEvent], hub_id: HubId) -> Option<&TrackingEvent> {
    timeline
        .iter()
        .find(|e| e.event_type == TrackingEventType::InTransit && e.hub_id == Some(hub_id))
}

/// Status implied by a single event, `None` for non-advancing events.
///
/// `ARRIVED_AT_HUB` at the final hub of the route means the order reached
/// its last hub; anywhere else it means received and ready for dispatch.
pub fn implied_status(event: &TrackingEvent, final_hub: Option<HubId>) -> Option<OrderStatus> {
    let status = match event.event_type {
        TrackingEventType::Pending => OrderStatus::Pending,
        TrackingEventType::Approved => OrderStatus::Approved,
        TrackingEventType::ArrivedAtHub => {
            if event.hub_id.is_some() && event.hub_id == final_hub {
                OrderStatus::ArrivedAtHub
            } else {
                OrderStatus::Approved
            }
        }
        TrackingEventType::InTransit => OrderStatus::InTransit,
        TrackingEventType::OutForDelivery => OrderStatus::OutForDelivery,
        TrackingEventType::ReadyForCollection => OrderStatus::ReadyForCollection,
        TrackingEventType::Delivered => OrderStatus::Delivered,
        TrackingEventType::Cancelled => OrderStatus::Cancelled,
        TrackingEventType::StockShortfall
        | TrackingEventType::StatusRepaired
        | TrackingEventType::RouteReassigned
        | TrackingEventType::RefundUpdated => return None,
    };
    Some(status)
}

/// Fold the timeline into a status.
///
/// - an `ARRIVED_AT_HUB` event opens a new hop and always sets its status
/// - `CANCELLED` always applies
/// - any other status-bearing event applies only when it ranks higher
/// - nothing changes after a terminal status
pub fn derive_status(route: &[HubId], timeline: &[TrackingEvent]) -> OrderStatus {
    let final_hub = route.last().copied();
    let mut status = OrderStatus::Pending;
    for event in timeline {
        if status.is_terminal() {
            break;
        }
        let Some(implied) = implied_status(event, final_hub) else {
            continue;
        };
        status = match event.event_type {
            TrackingEventType::ArrivedAtHub | TrackingEventType::Cancelled => implied,
            _ if implied.rank() > status.rank() => implied,
            _ => status,
        };
    }
    status
}

/// Hubs the goods have yet to leave: the remaining route, minus the
/// current hub once the order has been dispatched from it
pub fn route_ahead(order: &OrderSnapshot) -> &[HubId] {
    let remaining = order.remaining_route();
    match order.current_hub {
        Some(current) if dispatched_from(order, current) => remaining.get(1..).unwrap_or_default(),
        _ => remaining,
    }
}

/// Stored status vs. the one the timeline implies
pub fn status_drift(order: &OrderSnapshot) -> Option<(OrderStatus, OrderStatus)> {
    let derived = derive_status(&order.route, &order.timeline);
    (derived != order.status).then_some((order.status, derived))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::event::EventPayload;
    use proptest::prelude::*;

    fn ev(seq: u64, event_type: TrackingEventType, hub: HubId) -> TrackingEvent {
        let payload = match event_type {
            TrackingEventType::InTransit => EventPayload::Dispatched {
                next_hub_id: hub + 1,
                stock_fulfilled: false,
            },
            TrackingEventType::ArrivedAtHub => EventPayload::ArrivedAtHub { route_index: 0 },
            TrackingEventType::StatusRepaired => EventPayload::StatusRepaired {
                from: OrderStatus::Pending,
                to: OrderStatus::Pending,
            },
            TrackingEventType::Approved => EventPayload::StockReserved { hub_id: hub },
            TrackingEventType::StockShortfall => EventPayload::StockShortfall {
                hub_id: hub,
                shortfalls: vec![],
            },
            TrackingEventType::OutForDelivery => EventPayload::OutForDelivery {
                stock_fulfilled: false,
            },
            TrackingEventType::ReadyForCollection => EventPayload::ReadyForCollection {
                stock_fulfilled: false,
            },
            TrackingEventType::Delivered => EventPayload::Delivered {
                stock_fulfilled: false,
                via_collection: false,
            },
            TrackingEventType::Cancelled => EventPayload::Cancelled {
                reason: None,
                stock_released: false,
                refund_pending: false,
            },
            _ => EventPayload::StockReserved { hub_id: hub },
        };
        let mut event = TrackingEvent::new(seq, "o-1", event_type, Some(hub), "", payload);
        event.timestamp = seq as i64;
        event
    }

    #[test]
    fn test_arrival_after_pending_implies_approved() {
        // PENDING → ARRIVED_AT_HUB at an intermediate hub
        let route = [9, 8, 1];
        let timeline = vec![
            ev(1, TrackingEventType::Pending, 9),
            ev(2, TrackingEventType::ArrivedAtHub, 9),
        ];
        assert_eq!(derive_status(&route, &timeline), OrderStatus::Approved);
    }

    #[test]
    fn test_arrival_at_final_hub() {
        let route = [9, 8];
        let timeline = vec![
            ev(1, TrackingEventType::Pending, 9),
            ev(2, TrackingEventType::Approved, 9),
            ev(3, TrackingEventType::InTransit, 9),
            ev(4, TrackingEventType::ArrivedAtHub, 8),
        ];
        assert_eq!(derive_status(&route, &timeline), OrderStatus::ArrivedAtHub);
    }

    #[test]
    fn test_arrival_supersedes_in_transit() {
        let route = [9, 8, 4, 1];
        let timeline = vec![
            ev(1, TrackingEventType::Pending, 9),
            ev(2, TrackingEventType::Approved, 9),
            ev(3, TrackingEventType::InTransit, 9),
            ev(4, TrackingEventType::ArrivedAtHub, 8),
        ];
        assert_eq!(derive_status(&route, &timeline), OrderStatus::Approved);
    }

    #[test]
    fn test_non_advancing_events_ignored() {
        let route = [9, 8];
        let timeline = vec![
            ev(1, TrackingEventType::Pending, 9),
            ev(2, TrackingEventType::StockShortfall, 9),
            ev(3, TrackingEventType::StatusRepaired, 9),
        ];
        assert_eq!(derive_status(&route, &timeline), OrderStatus::Pending);
    }

    #[test]
    fn test_terminal_stops_fold() {
        let route = [9, 8];
        let timeline = vec![
            ev(1, TrackingEventType::Pending, 9),
            ev(2, TrackingEventType::Cancelled, 9),
            ev(3, TrackingEventType::Approved, 9),
        ];
        assert_eq!(derive_status(&route, &timeline), OrderStatus::Cancelled);
    }

    #[test]
    fn test_dispatched_from_only_matches_same_hub() {
        let mut order = OrderSnapshot::new("o-1".into());
        order.route = vec![9, 8, 1];
        order.timeline = vec![
            ev(1, TrackingEventType::Pending, 9),
            ev(2, TrackingEventType::InTransit, 9),
            ev(3, TrackingEventType::ArrivedAtHub, 8),
        ];
        assert!(dispatched_from(&order, 9));
        assert!(!dispatched_from(&order, 8));
        assert!(!dispatched_from(&order, 1));
    }

    #[test]
    fn test_route_ahead_drops_left_hub() {
        let mut order = OrderSnapshot::new("o-1".into());
        order.route = vec![9, 8, 1];
        order.current_hub = Some(9);
        order.timeline = vec![ev(1, TrackingEventType::Pending, 9)];
        assert_eq!(route_ahead(&order), &[9, 8, 1]);

        order.timeline.push(ev(2, TrackingEventType::InTransit, 9));
        assert_eq!(route_ahead(&order), &[8, 1]);
    }

    #[test]
    fn test_status_drift() {
        let mut order = OrderSnapshot::new("o-1".into());
        order.route = vec![9, 8, 1];
        order.timeline = vec![
            ev(1, TrackingEventType::Pending, 9),
            ev(2, TrackingEventType::ArrivedAtHub, 9),
        ];
        order.status = OrderStatus::Pending;
        assert_eq!(
            status_drift(&order),
            Some((OrderStatus::Pending, OrderStatus::Approved))
        );
        order.status = OrderStatus::Approved;
        assert_eq!(status_drift(&order), None);
    }

    // ========================================================================
    // Property: a timeline built by valid operations never drifts from the
    // status those operations produce.
    // ========================================================================

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Reserve,
        Shortfall,
        Scan,
        Dispatch,
        Ready,
        Deliver,
        Cancel,
        Repair,
    }

    struct Model {
        route: Vec<HubId>,
        collection: bool,
        index: usize,
        scanned_at_index: bool,
        status: OrderStatus,
        timeline: Vec<TrackingEvent>,
    }

    impl Model {
        fn new(route_len: usize, collection: bool) -> Self {
            let route: Vec<HubId> = (0..route_len as i64).map(|i| 100 + i).collect();
            let timeline = vec![ev(1, TrackingEventType::Pending, route[0])];
            Self {
                route,
                collection,
                index: 0,
                scanned_at_index: false,
                status: OrderStatus::Pending,
                timeline,
            }
        }

        fn last(&self) -> usize {
            self.route.len() - 1
        }

        fn hub(&self) -> HubId {
            self.route[self.index]
        }

        fn candidates(&self) -> Vec<Op> {
            use OrderStatus::*;
            let mut ops = vec![Op::Repair];
            match self.status {
                Pending => ops.extend([Op::Reserve, Op::Shortfall]),
                Approved => {
                    if self.index == 0 && !self.scanned_at_index {
                        ops.push(Op::Scan);
                    }
                    if self.index < self.last() || !self.collection {
                        ops.push(Op::Dispatch);
                    }
                }
                InTransit => ops.push(Op::Scan),
                ArrivedAtHub => {
                    if self.collection {
                        ops.push(Op::Ready);
                    } else {
                        ops.push(Op::Dispatch);
                    }
                }
                OutForDelivery | ReadyForCollection => ops.push(Op::Deliver),
                Delivered | Cancelled => return vec![],
            }
            ops.push(Op::Cancel);
            ops
        }

        fn push(&mut self, event_type: TrackingEventType) {
            let seq = self.timeline.len() as u64 + 1;
            self.timeline.push(ev(seq, event_type, self.hub()));
        }

        fn apply(&mut self, op: Op) {
            use OrderStatus::*;
            match op {
                Op::Reserve => {
                    self.push(TrackingEventType::Approved);
                    self.status = Approved;
                }
                Op::Shortfall => self.push(TrackingEventType::StockShortfall),
                Op::Scan => {
                    self.push(TrackingEventType::ArrivedAtHub);
                    self.scanned_at_index = true;
                    self.status = if self.index == self.last() {
                        ArrivedAtHub
                    } else {
                        Approved
                    };
                }
                Op::Dispatch => {
                    if self.index == self.last() {
                        self.push(TrackingEventType::OutForDelivery);
                        self.status = OutForDelivery;
                    } else {
                        self.push(TrackingEventType::InTransit);
                        self.index += 1;
                        self.scanned_at_index = false;
                        self.status = InTransit;
                    }
                }
                Op::Ready => {
                    self.push(TrackingEventType::ReadyForCollection);
                    self.status = ReadyForCollection;
                }
                Op::Deliver => {
                    self.push(TrackingEventType::Delivered);
                    self.status = Delivered;
                }
                Op::Cancel => {
                    self.push(TrackingEventType::Cancelled);
                    self.status = Cancelled;
                }
                Op::Repair => self.push(TrackingEventType::StatusRepaired),
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_valid_timelines_never_drift(
            route_len in 1usize..6,
            collection in any::<bool>(),
            picks in proptest::collection::vec(any::<u8>(), 0..40),
        ) {
            let mut model = Model::new(route_len, collection);
            prop_assert_eq!(derive_status(&model.route, &model.timeline), model.status);

            for pick in picks {
                let candidates = model.candidates();
                if candidates.is_empty() {
                    break;
                }
                let before = model.status;
                let op = candidates[pick as usize % candidates.len()];
                model.apply(op);

                prop_assert_eq!(derive_status(&model.route, &model.timeline), model.status);
                prop_assert!(
                    before == model.status || before.can_transition_to(model.status),
                    "{:?} -> {:?} via {:?}", before, model.status, op
                );
            }
        }

        #[test]
        fn prop_dispatched_hubs_are_behind_current(
            route_len in 2usize..6,
            picks in proptest::collection::vec(any::<u8>(), 0..40),
        ) {
            let mut model = Model::new(route_len, false);
            for pick in picks {
                let candidates = model.candidates();
                if candidates.is_empty() {
                    break;
                }
                model.apply(candidates[pick as usize % candidates.len()]);
            }
            let mut order = OrderSnapshot::new("o-1".into());
            order.route = model.route.clone();
            order.timeline = model.timeline.clone();
            for (i, hub) in model.route.iter().enumerate() {
                prop_assert_eq!(dispatched_from(&order, *hub), i < model.index);
            }
        }
    }
}

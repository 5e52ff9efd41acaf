//! AI event bus: noise and sighting fan-out
//!
//! Replaces engine-level static events with an explicit channel. Subscriber
//! lifetime is tied to agent activation: subscribe on activation, unsubscribe
//! on deactivation. A deactivated agent left subscribed is a leak this
//! design forbids, so the simulation owns both calls.
//!
//! Delivery is synchronous and unqueued: a publish call returns only after
//! every currently-subscribed listener has processed the event. Fan-out order
//! equals subscription order, which keeps runs reproducible. Listeners may
//! emit follow-up events from their handlers; those are drained iteratively
//! inside the originating publish call, so re-entrant publication cannot
//! recurse.

pub mod alarm;

use ahash::AHashSet;
use glam::Vec3;
use std::collections::VecDeque;

use crate::core::types::{GuardId, ListenerId};

pub use alarm::AlarmCoordinator;

/// Events carried by the bus
///
/// Both kinds are ephemeral: they exist for the duration of one dispatch and
/// are never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiEvent {
    /// Something made a sound at `position`, audible within `radius`
    /// (scaled per listener by its hearing multiplier)
    Noise { position: Vec3, radius: f32 },
    /// A guard has direct sight of the player at `position`
    Spotted { observer: GuardId, position: Vec3 },
}

/// A bus subscriber
///
/// Handlers return any events they want published in reaction; the bus
/// delivers those before the originating publish call returns.
pub trait EventListener {
    fn listener_id(&self) -> ListenerId;

    fn on_event(&mut self, event: &AiEvent) -> Vec<AiEvent>;
}

/// Process-wide publish/subscribe channel for [`AiEvent`]
///
/// The bus tracks subscriptions only; the concrete listeners live with their
/// owner and are lent to [`EventBus::publish`] per dispatch. That keeps
/// delivery free of shared-ownership cells while the subscription list stays
/// the single shared structure the tick model serializes writes to.
#[derive(Debug, Default)]
pub struct EventBus {
    order: Vec<ListenerId>,
    subscribed: AHashSet<ListenerId>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber; re-subscribing is a no-op and keeps the original
    /// position in the fan-out order
    pub fn subscribe(&mut self, id: ListenerId) {
        if self.subscribed.insert(id) {
            self.order.push(id);
        }
    }

    /// Remove a subscriber; unknown ids are a no-op
    pub fn unsubscribe(&mut self, id: ListenerId) {
        if self.subscribed.remove(&id) {
            self.order.retain(|&sub| sub != id);
        }
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.subscribed.contains(&id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.order.len()
    }

    /// Deliver `event` to every subscribed listener in the roster, in
    /// subscription order
    ///
    /// Follow-up events returned by handlers are appended to a FIFO and
    /// delivered to the same subscriber snapshot before this call
    /// returns. Roster entries that are not subscribed are skipped, so a
    /// caller may lend its whole agent collection regardless of lifecycle
    /// state.
    pub fn publish(&self, event: AiEvent, listeners: &mut [&mut dyn EventListener]) {
        let snapshot = self.order.clone();
        let mut pending = VecDeque::from([event]);

        while let Some(current) = pending.pop_front() {
            for &id in &snapshot {
                let Some(listener) = listeners.iter_mut().find(|l| l.listener_id() == id) else {
                    continue;
                };
                pending.extend(listener.on_event(&current));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Listener that records what it hears and optionally echoes a follow-up
    struct Recorder {
        id: ListenerId,
        heard: Vec<AiEvent>,
        echo: Option<AiEvent>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                id: ListenerId::new(),
                heard: Vec::new(),
                echo: None,
            }
        }
    }

    impl EventListener for Recorder {
        fn listener_id(&self) -> ListenerId {
            self.id
        }

        fn on_event(&mut self, event: &AiEvent) -> Vec<AiEvent> {
            self.heard.push(*event);
            // Echo once, then stop
            self.echo.take().into_iter().collect()
        }
    }

    fn noise(radius: f32) -> AiEvent {
        AiEvent::Noise {
            position: Vec3::ZERO,
            radius,
        }
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let mut bus = EventBus::new();
        let mut a = Recorder::new();
        let mut b = Recorder::new();
        bus.subscribe(a.id);
        bus.subscribe(b.id);

        bus.publish(noise(6.0), &mut [&mut a, &mut b]);

        assert_eq!(a.heard.len(), 1);
        assert_eq!(b.heard.len(), 1);
    }

    #[test]
    fn test_unsubscribed_listener_skipped() {
        let mut bus = EventBus::new();
        let mut a = Recorder::new();
        let mut b = Recorder::new();
        bus.subscribe(a.id);
        bus.subscribe(b.id);
        bus.unsubscribe(a.id);

        bus.publish(noise(6.0), &mut [&mut a, &mut b]);

        assert!(a.heard.is_empty());
        assert_eq!(b.heard.len(), 1);
    }

    #[test]
    fn test_double_subscribe_delivers_once() {
        let mut bus = EventBus::new();
        let mut a = Recorder::new();
        bus.subscribe(a.id);
        bus.subscribe(a.id);
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(noise(6.0), &mut [&mut a]);
        assert_eq!(a.heard.len(), 1);
    }

    #[test]
    fn test_reentrant_follow_up_delivered_in_same_publish() {
        let mut bus = EventBus::new();
        let mut echoer = Recorder::new();
        echoer.echo = Some(noise(2.0));
        let mut other = Recorder::new();
        bus.subscribe(echoer.id);
        bus.subscribe(other.id);

        bus.publish(noise(6.0), &mut [&mut echoer, &mut other]);

        // Both hear the original and the echo; no unbounded cascade
        assert_eq!(echoer.heard.len(), 2);
        assert_eq!(other.heard.len(), 2);
    }

    #[test]
    fn test_fan_out_follows_subscription_order() {
        let mut bus = EventBus::new();
        let mut a = Recorder::new();
        let mut b = Recorder::new();
        bus.subscribe(b.id);
        bus.subscribe(a.id);

        // Roster order differs from subscription order on purpose
        bus.publish(noise(6.0), &mut [&mut a, &mut b]);
        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(a.heard.len(), 1);
        assert_eq!(b.heard.len(), 1);
    }
}

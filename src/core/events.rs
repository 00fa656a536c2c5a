//! Engine event surface
//!
//! One typed emitter with explicit subscribe/unsubscribe replaces the
//! usual tangle of per-widget callback wiring. Events are fire-and-forget
//! notifications toward the presentation layer; nothing is returned.

use crate::types::CardId;

/// Outbound events from the match engine to its presentation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ScoreChanged { score: u32 },
    /// Remaining fraction (0..=1) of the combo window; 0 means expired.
    ComboTimerChanged { fraction: f32 },
    /// A match landed outside the combo window while a combo was running.
    ComboBroken,
    MatchResolved { matched: bool, first: CardId, second: CardId },
    /// Mismatched cards have returned to face-down.
    CardsFlippedBack { first: CardId, second: CardId },
    SessionWon,
    StartingIn { seconds_remaining: u32 },
    SessionRestarted,
}

/// Handle returned by [`EventBus::subscribe`]; pass back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Minimal typed observer list.
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(u64, Box<dyn FnMut(&EngineEvent)>)>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        SubscriptionId(id)
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id.0);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn emit(&mut self, event: &EngineEvent) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

//! Core module - pure match-session logic
//!
//! Deck generation, the session model, combo scoring, the event surface,
//! and the match resolution engine. Everything here runs on the
//! caller-driven clock; the only I/O is behind the injected store.

pub mod deck;
pub mod engine;
pub mod events;
pub mod scoring;
pub mod session;

pub use deck::{generate_pairs, DeckError};
pub use engine::{MatchEngine, SessionError};
pub use events::{EngineEvent, EventBus, SubscriptionId};
pub use scoring::{ComboTracker, MatchScore};
pub use session::Session;

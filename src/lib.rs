//! matchdeck - memory card match-session engine
//!
//! Owns the deck, the face-up/matched bookkeeping, time-windowed combo
//! scoring, win detection, and session save/restore. Presentation concerns
//! (rendering, animation, audio, input) live with the embedding; they call
//! the inbound operations on [`core::MatchEngine`] and subscribe to its
//! [`core::EngineEvent`] stream.
//!
//! Timing is cooperative: the embedding advances the engine clock with
//! `tick(elapsed_ms)` from its own loop, and all delayed work (pair
//! resolution, combo countdown, restart countdown) fires from there.

pub mod core;
pub mod persist;
pub mod types;

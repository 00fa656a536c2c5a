//! Session persistence - snapshot schema and the key-value store boundary
//!
//! A session is saved wholesale as one JSON blob under a fixed key and
//! reconstructed wholesale on load. Failures at this boundary are soft:
//! callers see "no session" / save-not-confirmed, never a panic.

pub mod store;

pub use store::{FileStore, MemoryStore, SessionStore};

use serde::{Deserialize, Serialize};

use crate::core::scoring::ComboTracker;
use crate::core::session::Session;
use crate::types::{Card, CardId, Rgba, Token};

/// Fixed save-slot key.
pub const SAVE_KEY: &str = "matchdeck.session.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCard {
    pub id: u32,
    pub value: String,
    pub color_r: f32,
    pub color_g: f32,
    pub color_b: f32,
    pub color_a: f32,
    pub is_flipped: bool,
    pub is_matched: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub rows: u32,
    pub columns: u32,
    pub score: u32,
    pub last_match_at_ms: u64,
    pub combo_level: u32,
    pub is_first_match: bool,
    pub flipped_card_ids: Vec<u32>,
    pub matched_card_ids: Vec<u32>,
    pub cards: Vec<SavedCard>,
}

impl SavedCard {
    fn capture(card: &Card) -> Self {
        Self {
            id: card.id,
            value: card.token.symbol.clone(),
            color_r: card.token.color.r,
            color_g: card.token.color.g,
            color_b: card.token.color.b,
            color_a: card.token.color.a,
            is_flipped: card.is_revealed,
            is_matched: card.is_matched,
        }
    }

    fn restore(&self) -> Card {
        Card {
            id: self.id,
            token: Token::new(
                self.value.clone(),
                Rgba::new(self.color_r, self.color_g, self.color_b, self.color_a),
            ),
            is_revealed: self.is_flipped,
            is_matched: self.is_matched,
        }
    }
}

impl SavedSession {
    /// Snapshot the full session state. Cards face-up but unresolved at
    /// save time are recorded only via `flipped_card_ids`; an in-flight
    /// resolution itself is deliberately not representable.
    pub fn capture(session: &Session, scoring: &ComboTracker) -> Self {
        let flipped_card_ids = session
            .cards()
            .iter()
            .filter(|c| c.is_revealed && !c.is_matched)
            .map(|c| c.id)
            .collect();
        Self {
            rows: session.rows(),
            columns: session.columns(),
            score: scoring.score(),
            last_match_at_ms: scoring.last_match_at_ms(),
            combo_level: scoring.combo_level(),
            is_first_match: scoring.is_first_match(),
            flipped_card_ids,
            matched_card_ids: session.matched_ids().iter().copied().collect(),
            cards: session.cards().iter().map(SavedCard::capture).collect(),
        }
    }

    /// Structural validity of a decoded snapshot. Anything failing here is
    /// treated the same as a deserialization failure.
    ///
    /// The id lists must mirror the card flags exactly, in both
    /// directions and without repeats: the session rebuild derives its
    /// matched set from the flags and its reveal FIFO from
    /// `flipped_card_ids`, so any skew between the two representations
    /// would install a state no live session can reach.
    pub fn is_consistent(&self) -> bool {
        let total = self.rows as usize * self.columns as usize;
        if total == 0 || self.cards.len() != total {
            return false;
        }

        let mut by_id: Vec<Option<&SavedCard>> = vec![None; total];
        for card in &self.cards {
            let Some(slot) = by_id.get_mut(card.id as usize) else {
                return false;
            };
            if slot.is_some() {
                return false;
            }
            if card.is_matched && !card.is_flipped {
                return false;
            }
            *slot = Some(card);
        }

        if self.matched_card_ids.len() % 2 != 0 {
            return false;
        }

        let matched_flagged = self.cards.iter().filter(|c| c.is_matched).count();
        let flipped_flagged = self
            .cards
            .iter()
            .filter(|c| c.is_flipped && !c.is_matched)
            .count();
        ids_mirror_flags(&self.matched_card_ids, matched_flagged, &by_id, |c| {
            c.is_matched
        }) && ids_mirror_flags(&self.flipped_card_ids, flipped_flagged, &by_id, |c| {
            c.is_flipped && !c.is_matched
        })
    }

    /// Rebuild the session, every card at its original board position
    /// (derived from id, rows, columns) with flags set directly. Returns
    /// the flipped-but-unmatched ids, oldest-first, for the reveal FIFO.
    pub fn into_session(self) -> Option<(Session, Vec<CardId>)> {
        if !self.is_consistent() {
            return None;
        }

        let total = self.rows as usize * self.columns as usize;
        let mut slots: Vec<Option<Card>> = vec![None; total];
        for saved in &self.cards {
            slots[saved.id as usize] = Some(saved.restore());
        }
        let cards = slots.into_iter().collect::<Option<Vec<Card>>>()?;

        let session = Session::from_cards(self.rows, self.columns, cards);
        Some((session, self.flipped_card_ids))
    }
}

/// Whether `ids` names exactly the cards satisfying `flag`: each id once,
/// each flagged card listed.
fn ids_mirror_flags(
    ids: &[u32],
    flagged: usize,
    by_id: &[Option<&SavedCard>],
    flag: impl Fn(&SavedCard) -> bool,
) -> bool {
    if ids.len() != flagged {
        return false;
    }
    let mut listed = vec![false; by_id.len()];
    for &id in ids {
        let Some(&Some(card)) = by_id.get(id as usize) else {
            return false;
        };
        if listed[id as usize] || !flag(card) {
            return false;
        }
        listed[id as usize] = true;
    }
    true
}

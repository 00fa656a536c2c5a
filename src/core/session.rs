//! Session model - one play-through of a board from deal to win
//!
//! Owns the cards plus the revealed/matched bookkeeping the resolution
//! engine mutates. A session is always replaced wholesale (new deal or
//! snapshot load), never reset in place.

use std::collections::BTreeSet;

use crate::types::{Card, CardId, Token};

#[derive(Debug, Clone)]
pub struct Session {
    rows: u32,
    columns: u32,
    cards: Vec<Card>,
    /// Cards currently face-up and not yet claimed by a resolution,
    /// in reveal (FIFO) order.
    revealed: Vec<CardId>,
    matched: BTreeSet<CardId>,
}

impl Session {
    /// Deal a new session from a generated deck. Ids run 0..N-1 in board
    /// order (row-major).
    pub fn deal(rows: u32, columns: u32, deck: Vec<Token>) -> Self {
        let cards = deck
            .into_iter()
            .enumerate()
            .map(|(i, token)| Card::face_down(i as CardId, token))
            .collect();
        Self {
            rows,
            columns,
            cards,
            revealed: Vec::new(),
            matched: BTreeSet::new(),
        }
    }

    /// Rebuild a session from restored cards (snapshot load). Flags are
    /// taken as-is; `revealed` is re-derived by the caller.
    pub fn from_cards(rows: u32, columns: u32, cards: Vec<Card>) -> Self {
        let matched = cards
            .iter()
            .filter(|c| c.is_matched)
            .map(|c| c.id)
            .collect();
        Self {
            rows,
            columns,
            cards,
            revealed: Vec::new(),
            matched,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(id as usize)
    }

    pub(crate) fn card_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.get_mut(id as usize)
    }

    /// Board position of a card, row-major from its id.
    pub fn position_of(&self, id: CardId) -> (u32, u32) {
        (id / self.columns, id % self.columns)
    }

    pub fn revealed_ids(&self) -> &[CardId] {
        &self.revealed
    }

    pub fn matched_ids(&self) -> &BTreeSet<CardId> {
        &self.matched
    }

    pub fn is_matched(&self, id: CardId) -> bool {
        self.matched.contains(&id)
    }

    pub fn is_complete(&self) -> bool {
        !self.cards.is_empty() && self.matched.len() == self.cards.len()
    }

    pub(crate) fn push_revealed(&mut self, id: CardId) {
        self.revealed.push(id);
    }

    /// Pop the two longest-waiting revealed ids, if a full pair is present.
    pub(crate) fn pop_oldest_pair(&mut self) -> Option<(CardId, CardId)> {
        if self.revealed.len() < 2 {
            return None;
        }
        let first = self.revealed.remove(0);
        let second = self.revealed.remove(0);
        Some((first, second))
    }

    pub(crate) fn mark_matched(&mut self, id: CardId) {
        if let Some(card) = self.card_mut(id) {
            card.is_revealed = true;
            card.is_matched = true;
        }
        self.matched.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgba;

    fn deck(n: usize) -> Vec<Token> {
        (0..n)
            .map(|i| Token::new(format!("{}", i / 2), Rgba::opaque(0.0, 0.0, 0.0)))
            .collect()
    }

    #[test]
    fn test_deal_assigns_board_order_ids() {
        let session = Session::deal(2, 3, deck(6));
        assert_eq!(session.cards().len(), 6);
        for (i, card) in session.cards().iter().enumerate() {
            assert_eq!(card.id, i as CardId);
            assert!(!card.is_revealed);
            assert!(!card.is_matched);
        }
    }

    #[test]
    fn test_position_is_row_major() {
        let session = Session::deal(2, 3, deck(6));
        assert_eq!(session.position_of(0), (0, 0));
        assert_eq!(session.position_of(2), (0, 2));
        assert_eq!(session.position_of(3), (1, 0));
        assert_eq!(session.position_of(5), (1, 2));
    }

    #[test]
    fn test_pop_oldest_pair_is_fifo() {
        let mut session = Session::deal(2, 2, deck(4));
        session.push_revealed(2);
        session.push_revealed(0);
        assert_eq!(session.pop_oldest_pair(), Some((2, 0)));
        assert_eq!(session.pop_oldest_pair(), None);

        session.push_revealed(3);
        assert_eq!(session.pop_oldest_pair(), None);
        assert_eq!(session.revealed_ids(), &[3]);
    }

    #[test]
    fn test_from_cards_rebuilds_matched_set() {
        let mut cards: Vec<Card> = deck(4)
            .into_iter()
            .enumerate()
            .map(|(i, t)| Card::face_down(i as CardId, t))
            .collect();
        cards[1].is_revealed = true;
        cards[1].is_matched = true;
        cards[3].is_revealed = true;
        cards[3].is_matched = true;

        let session = Session::from_cards(2, 2, cards);
        assert!(session.is_matched(1));
        assert!(session.is_matched(3));
        assert!(!session.is_matched(0));
        assert!(!session.is_complete());
    }
}

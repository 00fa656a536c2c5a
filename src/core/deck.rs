//! Deck generator - builds the shuffled multiset of paired tokens
//!
//! Pair slot `i` draws `(symbol, color)` from the palettes at `i % len`,
//! emits the token twice, then the whole sequence is shuffled with a
//! uniform Fisher-Yates permutation.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{Rgba, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckError {
    /// The requested card count was odd or zero; pairs cannot be formed.
    OddCardCount,
    EmptyPalette,
}

impl DeckError {
    pub fn code(self) -> &'static str {
        match self {
            DeckError::OddCardCount => "odd_card_count",
            DeckError::EmptyPalette => "empty_palette",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            DeckError::OddCardCount => "card count must be a positive even number",
            DeckError::EmptyPalette => "symbol and color palettes must be non-empty",
        }
    }
}

/// Generate `total_cards` tokens: `total_cards / 2` distinct pair slots,
/// each emitted exactly twice, in uniformly random board order.
///
/// The output is pseudo-random; callers wanting reproducible decks pass a
/// seeded `rng`.
pub fn generate_pairs<R: Rng + ?Sized>(
    total_cards: usize,
    symbols: &[String],
    colors: &[Rgba],
    rng: &mut R,
) -> Result<Vec<Token>, DeckError> {
    if total_cards == 0 || total_cards % 2 != 0 {
        return Err(DeckError::OddCardCount);
    }
    if symbols.is_empty() || colors.is_empty() {
        return Err(DeckError::EmptyPalette);
    }

    let pair_count = total_cards / 2;
    let mut tokens = Vec::with_capacity(total_cards);
    for i in 0..pair_count {
        let token = Token::new(
            symbols[i % symbols.len()].clone(),
            colors[i % colors.len()],
        );
        tokens.push(token.clone());
        tokens.push(token);
    }

    tokens.shuffle(rng);
    Ok(tokens)
}

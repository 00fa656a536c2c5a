//! Core types shared across the crate
//!
//! Card/token data model, timing and scoring constants, and the injected
//! game configuration. Pure data, no game logic.

use serde::{Deserialize, Serialize};

/// Stable card identity, assigned 0..N-1 in board order at deal time.
pub type CardId = u32;

/// Resolution timing (in milliseconds)
pub const REVEAL_RESOLVE_DELAY_MS: u64 = 300;
pub const MISMATCH_FLIP_BACK_DELAY_MS: u64 = 400;

/// Scoring defaults
pub const BASE_MATCH_POINTS: u32 = 10;
pub const COMBO_WINDOW_MS: u64 = 3000;
pub const COMBO_MULTIPLIER: u32 = 2;
pub const MAX_COMBO_LEVEL: u32 = 5;

/// Board bounds (inclusive)
pub const MIN_ROWS: u32 = 2;
pub const MIN_COLUMNS: u32 = 2;
pub const MAX_ROWS: u32 = 6;
pub const MAX_COLUMNS: u32 = 6;

/// Seconds of "starting in N" countdown after a won session.
pub const RESTART_COUNTDOWN_SECS: u32 = 2;

/// Normalized RGBA color channel carried by a card face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

/// A card face value: symbol plus pair color. Immutable after the deal;
/// two cards match when their tokens are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub symbol: String,
    pub color: Rgba,
}

impl Token {
    pub fn new(symbol: impl Into<String>, color: Rgba) -> Self {
        Self {
            symbol: symbol.into(),
            color,
        }
    }
}

/// A single tile on the board.
///
/// Invariant: `is_matched` implies `is_revealed` (matched cards stay
/// face-up for the rest of the session).
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub token: Token,
    pub is_revealed: bool,
    pub is_matched: bool,
}

impl Card {
    pub fn face_down(id: CardId, token: Token) -> Self {
        Self {
            id,
            token,
            is_revealed: false,
            is_matched: false,
        }
    }
}

/// Default symbol palette, indexed modulo length per pair slot.
pub const DEFAULT_SYMBOLS: [&str; 47] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z", "★", "♠", "♣", "♥", "♦", "♪", "♫", "☀", "☂", "☃", "✈", "0",
    "1", "2", "3", "4", "5", "6", "7", "8", "9",
];

/// Default pair color palette, indexed modulo length per pair slot.
pub const DEFAULT_COLORS: [Rgba; 15] = [
    Rgba::opaque(1.0, 0.0, 0.0),
    Rgba::opaque(0.0, 0.0, 1.0),
    Rgba::opaque(0.0, 1.0, 0.0),
    Rgba::opaque(1.0, 0.92, 0.016),
    Rgba::opaque(1.0, 0.0, 1.0),
    Rgba::opaque(0.0, 1.0, 1.0),
    Rgba::opaque(1.0, 0.5, 0.0),
    Rgba::opaque(0.5, 0.0, 1.0),
    Rgba::opaque(1.0, 0.75, 0.8),
    Rgba::opaque(0.5, 1.0, 0.5),
    Rgba::opaque(1.0, 1.0, 0.5),
    Rgba::opaque(0.8, 0.4, 0.2),
    Rgba::opaque(0.2, 0.8, 0.8),
    Rgba::opaque(0.8, 0.2, 0.8),
    Rgba::opaque(0.4, 0.4, 0.8),
];

/// Injected game configuration.
///
/// Replaces ambient singleton access to game data: the engine receives one
/// of these at construction and consults nothing global.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub min_rows: u32,
    pub min_columns: u32,
    pub max_rows: u32,
    pub max_columns: u32,
    pub base_match_points: u32,
    pub combo_window_ms: u64,
    pub combo_multiplier: u32,
    pub max_combo_level: u32,
    pub reveal_resolve_delay_ms: u64,
    pub mismatch_flip_back_delay_ms: u64,
    pub restart_countdown_secs: u32,
    pub symbols: Vec<String>,
    pub colors: Vec<Rgba>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_rows: MIN_ROWS,
            min_columns: MIN_COLUMNS,
            max_rows: MAX_ROWS,
            max_columns: MAX_COLUMNS,
            base_match_points: BASE_MATCH_POINTS,
            combo_window_ms: COMBO_WINDOW_MS,
            combo_multiplier: COMBO_MULTIPLIER,
            max_combo_level: MAX_COMBO_LEVEL,
            reveal_resolve_delay_ms: REVEAL_RESOLVE_DELAY_MS,
            mismatch_flip_back_delay_ms: MISMATCH_FLIP_BACK_DELAY_MS,
            restart_countdown_secs: RESTART_COUNTDOWN_SECS,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            colors: DEFAULT_COLORS.to_vec(),
        }
    }
}

impl GameConfig {
    /// Whether a layout is acceptable for a new session: dimensions within
    /// bounds and an even card count. Callers present their own feedback
    /// (toast, dialog) on rejection.
    pub fn layout_valid(&self, rows: u32, columns: u32) -> bool {
        rows >= self.min_rows
            && rows <= self.max_rows
            && columns >= self.min_columns
            && columns <= self.max_columns
            && (rows * columns) % 2 == 0
    }
}

//! Combo score tracker
//!
//! Points per match depend on the elapsed time since the previous match:
//! matches landing inside the combo window escalate the combo level and
//! earn a bonus, matches outside it break the combo back to base points.
//! The tracker also owns the single combo countdown; (re)starting it
//! always supersedes the previous one.

use crate::types::GameConfig;

/// Outcome of scoring one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchScore {
    /// Points awarded for this match (base plus any combo bonus).
    pub awarded: u32,
    /// Total session score after the award.
    pub score: u32,
    /// Combo level after the award.
    pub combo_level: u32,
    /// Whether this match arrived past the combo window (non-first matches
    /// only); the combo level was reset before the award.
    pub combo_broken: bool,
}

#[derive(Debug, Clone)]
pub struct ComboTracker {
    base_points: u32,
    window_ms: u64,
    multiplier: u32,
    max_level: u32,
    score: u32,
    combo_level: u32,
    last_match_at_ms: u64,
    first_match: bool,
    /// Deadline of the active countdown, `None` when idle.
    countdown_deadline_ms: Option<u64>,
}

impl ComboTracker {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            base_points: config.base_match_points,
            window_ms: config.combo_window_ms,
            multiplier: config.combo_multiplier,
            max_level: config.max_combo_level,
            score: 0,
            combo_level: 0,
            last_match_at_ms: 0,
            first_match: true,
            countdown_deadline_ms: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn combo_level(&self) -> u32 {
        self.combo_level
    }

    pub fn is_first_match(&self) -> bool {
        self.first_match
    }

    pub fn last_match_at_ms(&self) -> u64 {
        self.last_match_at_ms
    }

    pub fn countdown_active(&self) -> bool {
        self.countdown_deadline_ms.is_some()
    }

    /// Score one successful match at `now_ms` and restart the countdown.
    pub fn record_match(&mut self, now_ms: u64) -> MatchScore {
        let mut combo_broken = false;

        let awarded = if self.first_match {
            self.first_match = false;
            self.base_points
        } else if now_ms.saturating_sub(self.last_match_at_ms) <= self.window_ms {
            self.combo_level = (self.combo_level + 1).min(self.max_level);
            self.base_points + self.base_points * self.multiplier * self.combo_level
        } else {
            combo_broken = true;
            self.combo_level = 0;
            self.base_points
        };

        self.score += awarded;
        self.last_match_at_ms = now_ms;
        self.countdown_deadline_ms = Some(now_ms + self.window_ms);

        MatchScore {
            awarded,
            score: self.score,
            combo_level: self.combo_level,
            combo_broken,
        }
    }

    /// Advance the countdown. Returns the remaining window fraction while
    /// one is running; yields `Some(0.0)` exactly once at expiry (resetting
    /// the combo level), then `None` until the next match.
    pub fn tick(&mut self, now_ms: u64) -> Option<f32> {
        let deadline = self.countdown_deadline_ms?;
        if now_ms >= deadline {
            self.countdown_deadline_ms = None;
            self.combo_level = 0;
            return Some(0.0);
        }
        let remaining = (deadline - now_ms) as f32;
        Some(remaining / self.window_ms as f32)
    }

    /// Zero everything and cancel any running countdown.
    pub fn reset(&mut self) {
        self.score = 0;
        self.combo_level = 0;
        self.last_match_at_ms = 0;
        self.first_match = true;
        self.countdown_deadline_ms = None;
    }

    /// Snapshot-load path: set state directly, re-arming a full-window
    /// countdown only when a combo was running at save time. The saved
    /// wall-clock timestamp is meaningless across runs, so the window
    /// restarts from `now_ms`.
    pub fn restore(&mut self, score: u32, combo_level: u32, first_match: bool, now_ms: u64) {
        self.score = score;
        self.combo_level = combo_level.min(self.max_level);
        self.first_match = first_match;
        self.last_match_at_ms = now_ms;
        self.countdown_deadline_ms = if self.combo_level > 0 && !first_match {
            Some(now_ms + self.window_ms)
        } else {
            None
        };
    }
}

//! Match resolution engine - the session state machine
//!
//! Owns the session, drives every delayed resolution, the combo countdown
//! and the win/restart countdown on one caller-driven clock. All timing is
//! cooperative: callers advance the clock with [`MatchEngine::tick`], and
//! between ticks no state moves. Pending work captures the session
//! generation at launch and re-validates it after every delay, so a reset
//! mid-flight silently invalidates stale tasks instead of corrupting the
//! new session.

use crate::core::deck::{self, DeckError};
use crate::core::events::{EngineEvent, EventBus, SubscriptionId};
use crate::core::scoring::ComboTracker;
use crate::core::session::Session;
use crate::persist::{SavedSession, SessionStore, SAVE_KEY};
use crate::types::{Card, CardId, GameConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Odd or zero card count; no session was created.
    InvalidLayout { rows: u32, columns: u32 },
    /// The configured symbol or color palette is empty.
    EmptyPalette,
}

impl SessionError {
    pub fn code(self) -> &'static str {
        match self {
            SessionError::InvalidLayout { .. } => "invalid_layout",
            SessionError::EmptyPalette => "empty_palette",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SessionError::InvalidLayout { .. } => "row x column must be a positive even product",
            SessionError::EmptyPalette => "configured palettes must be non-empty",
        }
    }
}

/// Which delay a pending resolution is currently sitting out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolutionPhase {
    /// Reveal delay before comparing the two faces.
    Judge,
    /// Mismatch feedback delay before flipping both cards back down.
    FlipBack,
}

/// One in-flight pair resolution, captured at pairing time.
///
/// Never persisted: a save taken while one of these is live stores the two
/// cards merely as face-up.
#[derive(Debug, Clone, Copy)]
struct PendingResolution {
    first: CardId,
    second: CardId,
    generation: u64,
    due_at_ms: u64,
    phase: ResolutionPhase,
}

#[derive(Debug, Clone, Copy)]
struct RestartCountdown {
    generation: u64,
    seconds_remaining: u32,
    next_tick_at_ms: u64,
}

pub struct MatchEngine {
    config: GameConfig,
    store: Box<dyn SessionStore>,
    session: Option<Session>,
    scoring: ComboTracker,
    pending: Vec<PendingResolution>,
    restart: Option<RestartCountdown>,
    events: EventBus,
    clock_ms: u64,
    /// Bumped on every session replacement; stale tasks compare against it.
    generation: u64,
}

impl MatchEngine {
    pub fn new(config: GameConfig, store: Box<dyn SessionStore>) -> Self {
        let scoring = ComboTracker::new(&config);
        Self {
            config,
            store,
            session: None,
            scoring,
            pending: Vec::new(),
            restart: None,
            events: EventBus::new(),
            clock_ms: 0,
            generation: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn cards(&self) -> &[Card] {
        match &self.session {
            Some(session) => session.cards(),
            None => &[],
        }
    }

    pub fn score(&self) -> u32 {
        self.scoring.score()
    }

    pub fn combo_level(&self) -> u32 {
        self.scoring.combo_level()
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pairs currently awaiting resolution (diagnostic view).
    pub fn pending_pairs(&self) -> Vec<(CardId, CardId)> {
        self.pending
            .iter()
            .filter(|p| p.generation == self.generation)
            .map(|p| (p.first, p.second))
            .collect()
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.events.unsubscribe(id);
    }

    fn emit(&mut self, event: EngineEvent) {
        self.events.emit(&event);
    }

    /// Deal a fresh shuffled session, replacing any current one wholesale.
    ///
    /// Rejects odd/zero products; dimension bounds are the caller's
    /// concern (see [`GameConfig::layout_valid`]).
    pub fn start_session(&mut self, rows: u32, columns: u32) -> Result<(), SessionError> {
        let total = rows as usize * columns as usize;
        if total == 0 || total % 2 != 0 {
            return Err(SessionError::InvalidLayout { rows, columns });
        }
        let deck = deck::generate_pairs(
            total,
            &self.config.symbols,
            &self.config.colors,
            &mut rand::rng(),
        )
        .map_err(|err| match err {
            DeckError::EmptyPalette => SessionError::EmptyPalette,
            DeckError::OddCardCount => SessionError::InvalidLayout { rows, columns },
        })?;

        self.begin_session(Session::deal(rows, columns, deck));
        Ok(())
    }

    /// Re-deal the current layout. No-op without an active session.
    pub fn replay_session(&mut self) -> Result<(), SessionError> {
        let Some(session) = &self.session else {
            return Ok(());
        };
        let (rows, columns) = (session.rows(), session.columns());
        self.start_session(rows, columns)
    }

    /// Install a new session and invalidate everything in flight.
    fn begin_session(&mut self, session: Session) {
        self.generation = self.generation.wrapping_add(1);
        self.pending.clear();
        self.restart = None;
        self.scoring.reset();
        self.session = Some(session);
        self.emit(EngineEvent::ScoreChanged { score: 0 });
        self.emit(EngineEvent::ComboTimerChanged { fraction: 0.0 });
    }

    /// A card was flipped face-up by the player.
    ///
    /// Idempotent: matched cards, cards already face-up, and cards held by
    /// an in-flight resolution are silently ignored. Every complete pair is
    /// drained immediately, FIFO over reveal order, so a card can never be
    /// claimed by two resolutions.
    pub fn on_card_revealed(&mut self, id: CardId) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.card(id) {
            Some(card) if !card.is_matched && !card.is_revealed => {}
            _ => return,
        }
        if let Some(card) = session.card_mut(id) {
            card.is_revealed = true;
        }
        session.push_revealed(id);

        while let Some((first, second)) = session.pop_oldest_pair() {
            self.pending.push(PendingResolution {
                first,
                second,
                generation: self.generation,
                due_at_ms: self.clock_ms + self.config.reveal_resolve_delay_ms,
                phase: ResolutionPhase::Judge,
            });
        }
    }

    /// Advance the engine clock and run everything that came due.
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.clock_ms += elapsed_ms;
        self.tick_restart_countdown();
        self.tick_combo_countdown();
        self.tick_resolutions();
    }

    fn tick_combo_countdown(&mut self) {
        if let Some(fraction) = self.scoring.tick(self.clock_ms) {
            self.emit(EngineEvent::ComboTimerChanged { fraction });
        }
    }

    fn tick_restart_countdown(&mut self) {
        loop {
            let Some(countdown) = self.restart else {
                return;
            };
            if countdown.generation != self.generation {
                self.restart = None;
                return;
            }
            if self.clock_ms < countdown.next_tick_at_ms {
                return;
            }
            let seconds_remaining = countdown.seconds_remaining.saturating_sub(1);
            if seconds_remaining == 0 {
                self.restart = None;
                self.emit(EngineEvent::SessionRestarted);
                self.restart_current_layout();
                return;
            }
            self.restart = Some(RestartCountdown {
                seconds_remaining,
                next_tick_at_ms: countdown.next_tick_at_ms + 1000,
                ..countdown
            });
            self.emit(EngineEvent::StartingIn { seconds_remaining });
        }
    }

    fn restart_current_layout(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let (rows, columns) = (session.rows(), session.columns());
        // The layout was valid when the session was dealt; a failure here
        // would only mean a palette was emptied mid-session.
        let _ = self.start_session(rows, columns);
    }

    fn tick_resolutions(&mut self) {
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].generation != self.generation {
                self.pending.remove(i);
                continue;
            }
            if self.pending[i].due_at_ms <= self.clock_ms {
                let task = self.pending.remove(i);
                self.resolve(task);
                // A mismatch re-queues at the tail with a future deadline;
                // continue scanning from the same slot.
                continue;
            }
            i += 1;
        }
    }

    /// Run one due resolution. Validation happens here, after the delay:
    /// stale generations and already-matched cards abort with no state
    /// change.
    fn resolve(&mut self, task: PendingResolution) {
        if task.generation != self.generation {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_matched(task.first) || session.is_matched(task.second) {
            return;
        }

        match task.phase {
            ResolutionPhase::Judge => {
                let matched = match (session.card(task.first), session.card(task.second)) {
                    (Some(a), Some(b)) => a.token == b.token,
                    _ => return,
                };

                if matched {
                    session.mark_matched(task.first);
                    session.mark_matched(task.second);
                    let won = session.is_complete();

                    let result = self.scoring.record_match(self.clock_ms);
                    self.emit(EngineEvent::ScoreChanged {
                        score: result.score,
                    });
                    if result.combo_broken {
                        self.emit(EngineEvent::ComboBroken);
                    }
                    self.emit(EngineEvent::MatchResolved {
                        matched: true,
                        first: task.first,
                        second: task.second,
                    });

                    if won {
                        self.emit(EngineEvent::SessionWon);
                        self.start_restart_countdown(task.generation);
                    }
                } else {
                    self.emit(EngineEvent::MatchResolved {
                        matched: false,
                        first: task.first,
                        second: task.second,
                    });
                    self.pending.push(PendingResolution {
                        due_at_ms: self.clock_ms + self.config.mismatch_flip_back_delay_ms,
                        phase: ResolutionPhase::FlipBack,
                        ..task
                    });
                }
            }
            ResolutionPhase::FlipBack => {
                for id in [task.first, task.second] {
                    if let Some(card) = session.card_mut(id) {
                        card.is_revealed = false;
                    }
                }
                self.emit(EngineEvent::CardsFlippedBack {
                    first: task.first,
                    second: task.second,
                });
            }
        }
    }

    fn start_restart_countdown(&mut self, generation: u64) {
        let seconds = self.config.restart_countdown_secs;
        if seconds == 0 {
            self.emit(EngineEvent::SessionRestarted);
            self.restart_current_layout();
            return;
        }
        self.restart = Some(RestartCountdown {
            generation,
            seconds_remaining: seconds,
            next_tick_at_ms: self.clock_ms + 1000,
        });
        self.emit(EngineEvent::StartingIn {
            seconds_remaining: seconds,
        });
    }

    /// Serialize the current session under the fixed save key, overwriting
    /// any prior save. Returns `false` (save not confirmed) when there is
    /// no session or the store rejects the write.
    pub fn save_session(&mut self) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        let saved = SavedSession::capture(session, &self.scoring);
        let Ok(raw) = serde_json::to_string(&saved) else {
            return false;
        };
        self.store.write(SAVE_KEY, &raw).is_ok()
    }

    /// Restore the saved session, replacing any current one. Soft-fails to
    /// `false` on a missing key, parse failure, or inconsistent snapshot.
    ///
    /// This is a direct state load, not an event replay: card flags are set
    /// as saved, and cards that were face-up but unresolved at save time
    /// come back as inert face-up cards that only pair once a future reveal
    /// drains them.
    pub fn load_session(&mut self) -> bool {
        let raw = match self.store.read(SAVE_KEY) {
            Ok(Some(raw)) => raw,
            _ => return false,
        };
        let Ok(saved) = serde_json::from_str::<SavedSession>(&raw) else {
            return false;
        };
        let score = saved.score;
        let combo_level = saved.combo_level;
        let first_match = saved.is_first_match;
        let Some((mut session, flipped)) = saved.into_session() else {
            return false;
        };

        for id in flipped {
            session.push_revealed(id);
        }

        self.generation = self.generation.wrapping_add(1);
        self.pending.clear();
        self.restart = None;
        self.scoring
            .restore(score, combo_level, first_match, self.clock_ms);
        self.session = Some(session);
        self.emit(EngineEvent::ScoreChanged { score });
        true
    }

    pub fn has_saved_session(&self) -> bool {
        match self.store.read(SAVE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<SavedSession>(&raw)
                .map(|saved| saved.is_consistent())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Remove the save slot. No-op when absent.
    pub fn delete_saved_session(&mut self) {
        let _ = self.store.delete(SAVE_KEY);
    }
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("clock_ms", &self.clock_ms)
            .field("generation", &self.generation)
            .field("session", &self.session)
            .field("pending", &self.pending)
            .field("restart", &self.restart)
            .finish()
    }
}

//! Match resolution engine tests
//!
//! Timelines are driven through `tick` with explicit elapsed times; the
//! default delays are 300ms to judge a pair and 400ms of mismatch
//! feedback before the flip-back.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use matchdeck::core::{EngineEvent, MatchEngine, SessionError};
use matchdeck::persist::MemoryStore;
use matchdeck::types::{CardId, GameConfig};

type EventLog = Rc<RefCell<Vec<EngineEvent>>>;

fn engine_with_log() -> (MatchEngine, EventLog) {
    let mut engine = MatchEngine::new(GameConfig::default(), Box::new(MemoryStore::new()));
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    (engine, log)
}

/// Group card ids by face value: one `(a, b)` entry per pair.
fn pairs_by_value(engine: &MatchEngine) -> Vec<(CardId, CardId)> {
    let mut groups: HashMap<String, Vec<CardId>> = HashMap::new();
    for card in engine.cards() {
        groups.entry(card.token.symbol.clone()).or_default().push(card.id);
    }
    let mut pairs: Vec<(CardId, CardId)> = groups
        .into_values()
        .map(|ids| {
            assert_eq!(ids.len(), 2, "every value must appear exactly twice");
            (ids[0], ids[1])
        })
        .collect();
    pairs.sort();
    pairs
}

fn count<F: Fn(&EngineEvent) -> bool>(log: &EventLog, pred: F) -> usize {
    log.borrow().iter().filter(|e| pred(e)).count()
}

fn has_match_resolved(log: &EventLog, matched: bool) -> bool {
    count(log, |e| matches!(e, EngineEvent::MatchResolved { matched: m, .. } if *m == matched)) > 0
}

#[test]
fn test_start_session_deals_face_down_cards() {
    let (mut engine, log) = engine_with_log();
    engine.start_session(2, 3).unwrap();

    assert_eq!(engine.cards().len(), 6);
    assert!(engine.cards().iter().all(|c| !c.is_revealed && !c.is_matched));
    assert_eq!(engine.score(), 0);

    // A new session announces zeroed score and a cleared combo timer.
    assert!(log
        .borrow()
        .contains(&EngineEvent::ScoreChanged { score: 0 }));
    assert!(log
        .borrow()
        .contains(&EngineEvent::ComboTimerChanged { fraction: 0.0 }));
}

#[test]
fn test_start_session_rejects_odd_products() {
    let (mut engine, _log) = engine_with_log();
    assert_eq!(
        engine.start_session(3, 3),
        Err(SessionError::InvalidLayout { rows: 3, columns: 3 })
    );
    assert_eq!(
        engine.start_session(0, 4),
        Err(SessionError::InvalidLayout { rows: 0, columns: 4 })
    );
    assert!(engine.session().is_none());
}

#[test]
fn test_reveal_is_idempotent() {
    let (mut engine, _log) = engine_with_log();
    engine.start_session(2, 2).unwrap();

    engine.on_card_revealed(0);
    engine.on_card_revealed(0);
    engine.on_card_revealed(0);

    let session = engine.session().unwrap();
    assert_eq!(session.revealed_ids(), &[0]);
    assert!(engine.pending_pairs().is_empty());

    // Out-of-range ids are ignored outright.
    engine.on_card_revealed(99);
    assert_eq!(engine.session().unwrap().revealed_ids(), &[0]);
}

#[test]
fn test_pairing_is_fifo_and_exclusive() {
    let (mut engine, _log) = engine_with_log();
    engine.start_session(2, 3).unwrap();

    engine.on_card_revealed(4);
    engine.on_card_revealed(1);
    engine.on_card_revealed(5);
    engine.on_card_revealed(0);

    // Two pairs in flight, FIFO over reveal order, no shared ids.
    let pending = engine.pending_pairs();
    assert_eq!(pending, vec![(4, 1), (5, 0)]);
    assert!(engine.session().unwrap().revealed_ids().is_empty());

    // A card held by a pending resolution cannot be re-revealed.
    engine.on_card_revealed(4);
    assert!(engine.session().unwrap().revealed_ids().is_empty());
    assert_eq!(engine.pending_pairs().len(), 2);
}

#[test]
fn test_mismatch_timeline() {
    let (mut engine, log) = engine_with_log();
    engine.start_session(2, 2).unwrap();
    let pairs = pairs_by_value(&engine);
    let (a, _) = pairs[0];
    let (b, _) = pairs[1];
    log.borrow_mut().clear();

    engine.on_card_revealed(a);
    engine.on_card_revealed(b);

    // Nothing resolves before the reveal delay elapses.
    engine.tick(299);
    assert!(!has_match_resolved(&log, false));

    engine.tick(1);
    assert!(has_match_resolved(&log, false));
    // Still face-up during the mismatch feedback window.
    assert!(engine.cards()[a as usize].is_revealed);
    assert!(engine.cards()[b as usize].is_revealed);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::CardsFlippedBack { .. })), 0);

    engine.tick(399);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::CardsFlippedBack { .. })), 0);

    engine.tick(1);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::CardsFlippedBack { .. })), 1);
    assert!(!engine.cards()[a as usize].is_revealed);
    assert!(!engine.cards()[b as usize].is_revealed);

    // A mismatch never touches the score.
    assert_eq!(engine.score(), 0);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::ScoreChanged { .. })), 0);
}

#[test]
fn test_match_awards_base_points() {
    let (mut engine, log) = engine_with_log();
    engine.start_session(2, 2).unwrap();
    let (a, b) = pairs_by_value(&engine)[0];
    log.borrow_mut().clear();

    engine.on_card_revealed(a);
    engine.on_card_revealed(b);
    engine.tick(300);

    assert!(has_match_resolved(&log, true));
    assert!(log
        .borrow()
        .contains(&EngineEvent::ScoreChanged { score: 10 }));
    assert!(engine.cards()[a as usize].is_matched);
    assert!(engine.cards()[b as usize].is_matched);
    assert_eq!(engine.score(), 10);

    // Matched cards ignore further reveal signals.
    engine.on_card_revealed(a);
    assert!(engine.session().unwrap().revealed_ids().is_empty());
}

#[test]
fn test_match_is_order_independent() {
    for flip in [false, true] {
        let (mut engine, log) = engine_with_log();
        engine.start_session(2, 2).unwrap();
        let (a, b) = pairs_by_value(&engine)[0];
        let (first, second) = if flip { (b, a) } else { (a, b) };
        log.borrow_mut().clear();

        engine.on_card_revealed(first);
        engine.on_card_revealed(second);
        engine.tick(300);

        assert!(has_match_resolved(&log, true));
        assert!(engine.cards()[a as usize].is_matched);
        assert!(engine.cards()[b as usize].is_matched);
        assert_eq!(engine.score(), 10);
    }
}

#[test]
fn test_revealed_and_matched_stay_disjoint() {
    let (mut engine, _log) = engine_with_log();
    engine.start_session(2, 3).unwrap();
    let pairs = pairs_by_value(&engine);

    let mut check = |engine: &MatchEngine| {
        let session = engine.session().unwrap();
        for id in session.revealed_ids() {
            assert!(!session.matched_ids().contains(id));
        }
        let pending = engine.pending_pairs();
        for (i, &(a, b)) in pending.iter().enumerate() {
            assert_ne!(a, b);
            for &(c, d) in &pending[i + 1..] {
                assert!(a != c && a != d && b != c && b != d);
            }
        }
    };

    for (a, b) in pairs {
        engine.on_card_revealed(a);
        check(&engine);
        engine.on_card_revealed(b);
        check(&engine);
        engine.tick(150);
        check(&engine);
    }
    engine.tick(10_000);
    check(&engine);
    assert!(engine.session().unwrap().is_complete());
}

#[test]
fn test_overlapping_pairs_resolve_independently() {
    let (mut engine, log) = engine_with_log();
    engine.start_session(2, 3).unwrap();
    let pairs = pairs_by_value(&engine);
    let (a1, a2) = pairs[0];
    let (b1, b2) = pairs[1];
    log.borrow_mut().clear();

    // First pair launches at t=0, second at t=100; they resolve at their
    // own deadlines without blocking each other.
    engine.on_card_revealed(a1);
    engine.on_card_revealed(a2);
    engine.tick(100);
    engine.on_card_revealed(b1);
    engine.on_card_revealed(b2);

    engine.tick(200);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::MatchResolved { .. })), 1);
    engine.tick(100);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::MatchResolved { .. })), 2);
}

#[test]
fn test_combo_window_applies_across_resolutions() {
    let (mut engine, log) = engine_with_log();
    engine.start_session(2, 3).unwrap();
    let pairs = pairs_by_value(&engine);
    log.borrow_mut().clear();

    // First match at t=300: base points.
    engine.on_card_revealed(pairs[0].0);
    engine.on_card_revealed(pairs[0].1);
    engine.tick(300);
    assert_eq!(engine.score(), 10);

    // Second match at t=600, inside the 3s window: 10 + 10*2*1.
    engine.on_card_revealed(pairs[1].0);
    engine.on_card_revealed(pairs[1].1);
    engine.tick(300);
    assert_eq!(engine.score(), 40);
    assert_eq!(engine.combo_level(), 1);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::ComboBroken)), 0);

    // Third match lands past the window: combo broken, base points only.
    engine.tick(4000);
    engine.on_card_revealed(pairs[2].0);
    engine.on_card_revealed(pairs[2].1);
    engine.tick(300);
    assert_eq!(engine.score(), 50);
    assert_eq!(engine.combo_level(), 0);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::ComboBroken)), 1);
}

#[test]
fn test_win_fires_once_then_restart_countdown() {
    let (mut engine, log) = engine_with_log();
    engine.start_session(2, 2).unwrap();
    let pairs = pairs_by_value(&engine);
    log.borrow_mut().clear();

    engine.on_card_revealed(pairs[0].0);
    engine.on_card_revealed(pairs[0].1);
    engine.tick(300);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::SessionWon)), 0);

    engine.on_card_revealed(pairs[1].0);
    engine.on_card_revealed(pairs[1].1);
    engine.tick(300);

    assert_eq!(count(&log, |e| matches!(e, EngineEvent::SessionWon)), 1);
    assert!(log
        .borrow()
        .contains(&EngineEvent::StartingIn { seconds_remaining: 2 }));

    engine.tick(1000);
    assert!(log
        .borrow()
        .contains(&EngineEvent::StartingIn { seconds_remaining: 1 }));
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::SessionRestarted)), 0);

    engine.tick(1000);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::SessionRestarted)), 1);

    // Fresh board, same layout, zeroed score.
    assert_eq!(engine.cards().len(), 4);
    assert!(engine.cards().iter().all(|c| !c.is_revealed && !c.is_matched));
    assert_eq!(engine.score(), 0);

    // Still exactly one win across the whole timeline.
    engine.tick(5000);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::SessionWon)), 1);
}

#[test]
fn test_reset_invalidates_in_flight_resolutions() {
    let (mut engine, log) = engine_with_log();
    engine.start_session(2, 2).unwrap();
    let (a, b) = pairs_by_value(&engine)[0];

    engine.on_card_revealed(a);
    engine.on_card_revealed(b);
    assert_eq!(engine.pending_pairs().len(), 1);

    // Replace the session while the resolution is still suspended.
    engine.start_session(2, 2).unwrap();
    log.borrow_mut().clear();

    engine.tick(10_000);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::MatchResolved { .. })), 0);
    assert_eq!(engine.score(), 0);
    assert!(engine.cards().iter().all(|c| !c.is_matched));
}

#[test]
fn test_replay_redeals_same_layout() {
    let (mut engine, _log) = engine_with_log();

    // Replay without a session is a no-op.
    engine.replay_session().unwrap();
    assert!(engine.session().is_none());

    engine.start_session(2, 3).unwrap();
    let (a, b) = pairs_by_value(&engine)[0];
    engine.on_card_revealed(a);
    engine.on_card_revealed(b);
    engine.tick(300);
    assert_eq!(engine.score(), 10);

    engine.replay_session().unwrap();
    let session = engine.session().unwrap();
    assert_eq!((session.rows(), session.columns()), (2, 3));
    assert_eq!(engine.score(), 0);
    assert!(engine.cards().iter().all(|c| !c.is_revealed && !c.is_matched));
}

#[test]
fn test_two_by_two_scenario() {
    // The canonical 2x2 walkthrough: one mismatch, then both pairs.
    let (mut engine, log) = engine_with_log();
    engine.start_session(2, 2).unwrap();
    let pairs = pairs_by_value(&engine);
    let (a1, a2) = pairs[0];
    let (b1, b2) = pairs[1];
    log.borrow_mut().clear();

    engine.on_card_revealed(a1);
    engine.on_card_revealed(b1);
    engine.tick(300);
    assert!(log.borrow().contains(&EngineEvent::MatchResolved {
        matched: false,
        first: a1,
        second: b1,
    }));
    engine.tick(400);
    assert!(log.borrow().contains(&EngineEvent::CardsFlippedBack {
        first: a1,
        second: b1,
    }));

    engine.on_card_revealed(a1);
    engine.on_card_revealed(a2);
    engine.tick(300);
    assert!(log.borrow().contains(&EngineEvent::MatchResolved {
        matched: true,
        first: a1,
        second: a2,
    }));
    assert_eq!(engine.score(), 10);

    engine.on_card_revealed(b1);
    engine.on_card_revealed(b2);
    engine.tick(300);
    assert_eq!(count(&log, |e| matches!(e, EngineEvent::SessionWon)), 1);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let mut engine = MatchEngine::new(GameConfig::default(), Box::new(MemoryStore::new()));
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let id = engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    engine.start_session(2, 2).unwrap();
    let seen = log.borrow().len();
    assert!(seen > 0);

    engine.unsubscribe(id);
    engine.start_session(2, 2).unwrap();
    assert_eq!(log.borrow().len(), seen);
}

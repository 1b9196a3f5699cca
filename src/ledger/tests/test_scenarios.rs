//! Call flow scenarios and counter properties
use super::*;
use crate::ledger::{CounterSnapshot, Direction, DirectionCounts, SessionLedger};
use std::sync::Arc;

fn counters(ledger: &SessionLedger) -> (usize, usize) {
    let CounterSnapshot { active, peak } = ledger.snapshot();
    (active, peak)
}

#[test]
fn test_basic_call() {
    let ledger = SessionLedger::new();
    ledger.update(&invite(1));
    assert_eq!(counters(&ledger), (1, 1));
    ledger.update(&ok(1));
    assert_eq!(counters(&ledger), (1, 1));
    ledger.update(&bye(1));
    assert_eq!(counters(&ledger), (0, 1));
    assert_consistent(&ledger);
}

#[test]
fn test_overlapping_calls() {
    let ledger = SessionLedger::new();
    ledger.update(&invite(1));
    assert_eq!(counters(&ledger), (1, 1));
    ledger.update(&invite(2));
    assert_eq!(counters(&ledger), (2, 2));
    ledger.update(&busy(1));
    assert_eq!(counters(&ledger), (1, 2));
    ledger.update(&ok(2));
    ledger.update(&bye(2));
    assert_eq!(counters(&ledger), (0, 2));
    assert_consistent(&ledger);
}

#[test]
fn test_retransmissions() {
    let ledger = SessionLedger::new();
    ledger.update(&invite(1));
    ledger.update(&invite(1));
    assert_eq!(ledger.active(), 1);
    ledger.update(&ok(1));
    ledger.update(&ok(1));
    assert_eq!(ledger.active(), 1);
    ledger.update(&bye(1));
    assert_eq!(ledger.active(), 0);
    ledger.update(&bye(1));
    assert_eq!(counters(&ledger), (0, 1));
    assert_consistent(&ledger);
}

#[test]
fn test_unknown_bye() {
    let ledger = SessionLedger::new();
    ledger.update(&bye(42));
    assert_eq!(counters(&ledger), (0, 0));
}

#[test]
fn test_full_flow_with_ack() {
    let ledger = SessionLedger::new();
    for event in [invite(1), ringing(1), ringing(1), ok(1), ack(1), ok(1), ack(1)] {
        ledger.update(&event);
        assert_eq!(ledger.active(), 1);
        assert_consistent(&ledger);
    }
    ledger.update(&bye(1));
    assert_eq!(counters(&ledger), (0, 1));
}

#[test]
fn test_peak_is_monotonic() {
    let ledger = SessionLedger::new();
    let mut last_peak = 0;
    // open five, close three, open two, close all
    let mut flow = Vec::new();
    flow.extend((1..=5).map(invite));
    flow.extend((1..=3).map(busy));
    flow.extend((6..=7).map(invite));
    flow.extend([4, 5, 6, 7].map(ok));
    flow.extend([4, 5, 6, 7].map(bye));
    for event in flow.iter() {
        let snapshot = ledger.update(event);
        assert!(snapshot.peak >= last_peak);
        assert!(snapshot.peak >= snapshot.active);
        last_peak = snapshot.peak;
        assert_consistent(&ledger);
    }
    assert_eq!(counters(&ledger), (0, 5));
}

#[test]
fn test_reset_starts_new_window() {
    let ledger = SessionLedger::new();
    for n in 1..=3 {
        ledger.update(&invite(n));
    }
    ledger.update(&cancel(1));
    ledger.update(&cancel(2));
    assert_eq!(counters(&ledger), (1, 3));

    ledger.reset();
    assert_eq!(counters(&ledger), (1, 1));
    assert_eq!(ledger.tracked(), 1);

    // the surviving session is still tracked across the reset
    ledger.update(&ok(3));
    ledger.update(&bye(3));
    assert_eq!(counters(&ledger), (0, 1));

    ledger.reset();
    assert_eq!(counters(&ledger), (0, 0));
    ledger.update(&invite(4));
    assert_eq!(counters(&ledger), (1, 1));
    assert_consistent(&ledger);
}

#[test]
fn test_clear() {
    let ledger = SessionLedger::new();
    ledger.update(&invite(1));
    ledger.update(&invite(2));
    ledger.clear();
    assert_eq!(counters(&ledger), (0, 0));
    assert_eq!(ledger.tracked(), 0);
    // late messages for the forgotten dialogs change nothing
    ledger.update(&ok(1));
    ledger.update(&bye(1));
    assert_eq!(counters(&ledger), (0, 0));
}

#[test]
fn test_direction_breakdown() {
    let ledger = SessionLedger::new();
    ledger.update_with_direction(&invite(1), Direction::Inbound);
    ledger.update_with_direction(&invite(2), Direction::Outbound);
    ledger.update_with_direction(&invite(3), Direction::Inbound);
    // the closing direction does not matter, the session keeps its own
    ledger.update_with_direction(&cancel(1), Direction::Outbound);

    assert_eq!(
        ledger.sessions(),
        DirectionCounts {
            inbound: 1,
            outbound: 1,
            unspecified: 0,
        }
    );
    assert_eq!(
        ledger.peak_sessions(),
        DirectionCounts {
            inbound: 2,
            outbound: 1,
            unspecified: 0,
        }
    );
    assert_eq!(ledger.peak_sessions().get(Direction::Inbound), 2);
    assert_consistent(&ledger);
}

#[test]
fn test_concurrent_updates() {
    let ledger = Arc::new(SessionLedger::new());
    let workers = (0..8)
        .map(|worker| {
            let ledger = ledger.clone();
            std::thread::spawn(move || {
                for i in 0..100 {
                    let n = worker * 1000 + i;
                    ledger.update(&invite(n));
                    ledger.update(&invite(n));
                    ledger.update(&ok(n));
                    if i % 4 != 0 {
                        ledger.update(&bye(n));
                    }
                }
            })
        })
        .collect::<Vec<_>>();
    for worker in workers {
        worker.join().expect("worker panicked");
    }
    // every fourth call stays up
    assert_eq!(ledger.active(), 8 * 25);
    assert!(ledger.peak() >= 8 * 25);
    assert!(ledger.peak() <= 8 * 100);
    assert_consistent(&ledger);
}

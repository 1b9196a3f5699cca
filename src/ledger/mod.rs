//! Session ledger
//!
//! The stateful half of the counter. Every [`SessionEvent`] is applied to a
//! per-dialog state machine:
//!
//! ```text
//!   INVITE ──▶ PENDING ──2xx/ACK──▶ CONFIRMED ──BYE──▶ CLOSED
//!                 │                                       ▲
//!                 └──────────── >=300 / CANCEL ───────────┘
//! ```
//!
//! `PENDING` and `CONFIRMED` dialogs are active; a dialog is dropped from the
//! ledger as soon as it reaches `CLOSED`. An event that has no transition from
//! the dialog's current phase, or that matches no dialog at all, is a no-op.
//! This makes retransmissions, duplicate final responses and late messages
//! harmless without any explicit de-duplication.
//!
//! All state sits behind a single mutex so each [`SessionLedger::update`] is
//! atomic for every caller sharing the ledger.
use crate::interpreter::{DialogKey, SessionEvent};
use record::SessionRecord;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, info};

pub mod record;
pub mod sweeper;
pub use record::{Direction, DirectionCounts, SessionPhase};

#[cfg(test)]
mod tests;

/// Counter values observed right after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub active: usize,
    pub peak: usize,
}

/// What an applied event did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerChange {
    Opened,
    Confirmed,
    Closed,
    Unchanged,
}

impl LedgerChange {
    /// The active count moved.
    pub fn counts_changed(&self) -> bool {
        matches!(self, LedgerChange::Opened | LedgerChange::Closed)
    }
}

#[derive(Default)]
struct LedgerInner {
    // Call-ID -> dialogs sharing it (forks, Call-ID reuse)
    dialogs: HashMap<String, Vec<SessionRecord>>,
    active: DirectionCounts,
    peak: DirectionCounts,
    last_seq: u64,
}

#[derive(Default)]
pub struct SessionLedger {
    inner: Mutex<LedgerInner>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `event` and return the counters as they stand afterwards.
    pub fn update(&self, event: &SessionEvent) -> CounterSnapshot {
        self.update_with_direction(event, Direction::Unspecified)
    }

    /// Like [`update`](Self::update), attributing a newly opened session to
    /// `direction`.
    pub fn update_with_direction(
        &self,
        event: &SessionEvent,
        direction: Direction,
    ) -> CounterSnapshot {
        self.apply(event, direction).1
    }

    pub fn apply(
        &self,
        event: &SessionEvent,
        direction: Direction,
    ) -> (LedgerChange, CounterSnapshot) {
        let mut inner = self.lock();
        let change = inner.apply(event, direction, Instant::now());
        (change, inner.snapshot())
    }

    pub fn active(&self) -> usize {
        self.lock().active.total()
    }

    pub fn peak(&self) -> usize {
        self.lock().peak.total()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.lock().snapshot()
    }

    /// Active sessions per direction.
    pub fn sessions(&self) -> DirectionCounts {
        self.lock().active
    }

    /// Per-direction breakdown captured when the peak was last raised.
    pub fn peak_sessions(&self) -> DirectionCounts {
        self.lock().peak
    }

    /// Number of dialogs currently held.
    pub fn tracked(&self) -> usize {
        self.lock().dialogs.values().map(Vec::len).sum()
    }

    /// Phase of the dialog `key` correlates with, if any.
    #[cfg(test)]
    pub(crate) fn phase_of(&self, key: &DialogKey) -> Option<SessionPhase> {
        let inner = self.lock();
        inner
            .dialogs
            .get(&key.call_id)?
            .iter()
            .find(|r| r.correlates(key))
            .map(|r| r.phase)
    }

    /// Start a new peak window at the current active count. Tracked dialogs
    /// are left alone.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.peak = inner.active;
        info!("peak reset to {}", inner.peak.total());
    }

    /// Forget every dialog and zero both counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let dropped: usize = inner.dialogs.values().map(Vec::len).sum();
        *inner = LedgerInner::default();
        info!("ledger cleared, {} dialogs dropped", dropped);
    }

    /// Events that would close every dialog not heard from for `max_idle`,
    /// oldest dialog first.
    pub fn idle_events(&self, max_idle: Duration) -> Vec<SessionEvent> {
        self.lock().idle_events(max_idle, Instant::now())
    }

    /// Close every dialog not heard from for `max_idle`. Selection and closing
    /// happen under one lock, so a dialog refreshed by a concurrent producer is
    /// never closed on a stale reading. Returns how many sessions were closed.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        self.lock().sweep(max_idle, Instant::now())
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerInner {
    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            active: self.active.total(),
            peak: self.peak.total(),
        }
    }

    fn idle_events(&self, max_idle: Duration, now: Instant) -> Vec<SessionEvent> {
        let mut idle = self
            .dialogs
            .values()
            .flatten()
            .filter(|r| now.saturating_duration_since(r.last_seen) >= max_idle)
            .collect::<Vec<_>>();
        idle.sort_by_key(|r| r.created_seq);
        idle.into_iter().map(SessionRecord::closing_event).collect()
    }

    fn sweep(&mut self, max_idle: Duration, now: Instant) -> usize {
        let mut closed = 0;
        for event in self.idle_events(max_idle, now) {
            let change = self.apply(&event, Direction::Unspecified, now);
            debug!("sweep {}: {:?}", event, change);
            if change == LedgerChange::Closed {
                closed += 1;
            }
        }
        closed
    }

    fn apply(&mut self, event: &SessionEvent, direction: Direction, now: Instant) -> LedgerChange {
        let Some(key) = event.key() else {
            return LedgerChange::Unchanged;
        };
        let position = self
            .dialogs
            .get(&key.call_id)
            .and_then(|records| records.iter().position(|r| r.correlates(key)));
        let Some(index) = position else {
            return self.open(event, key, direction, now);
        };
        let Some(records) = self.dialogs.get_mut(&key.call_id) else {
            return LedgerChange::Unchanged;
        };

        let record = &mut records[index];
        record.last_seen = now;
        if matches!(
            event,
            SessionEvent::ProvisionalProgress { .. } | SessionEvent::SessionConfirmed { .. }
        ) {
            record.learn_remote_tag(key);
        }

        match record.phase.next(event) {
            None | Some(SessionPhase::Pending) => {
                debug!("{} in {}: no transition", event, record.phase);
                LedgerChange::Unchanged
            }
            Some(SessionPhase::Closed) => {
                let record = records.remove(index);
                if records.is_empty() {
                    self.dialogs.remove(&key.call_id);
                }
                self.active.decrement(record.direction);
                debug!(
                    "session closed: {} {} -> CLOSED, active {}",
                    record.key,
                    record.phase,
                    self.active.total()
                );
                LedgerChange::Closed
            }
            Some(SessionPhase::Confirmed) => {
                debug!("session {}: {} -> CONFIRMED", record.key, record.phase);
                record.phase = SessionPhase::Confirmed;
                LedgerChange::Confirmed
            }
        }
    }

    fn open(
        &mut self,
        event: &SessionEvent,
        key: &DialogKey,
        direction: Direction,
        now: Instant,
    ) -> LedgerChange {
        if !matches!(event, SessionEvent::SessionInitiating { .. }) {
            debug!("{} matches no session, ignored", event);
            return LedgerChange::Unchanged;
        }
        self.last_seq += 1;
        let record = SessionRecord::new(key.clone(), direction, self.last_seq, now);
        self.dialogs
            .entry(key.call_id.clone())
            .or_default()
            .push(record);
        self.active.increment(direction);
        if self.active.total() > self.peak.total() {
            self.peak = self.active;
        }
        debug!(
            "session opened: {} ({}), active {} peak {}",
            key,
            direction,
            self.active.total(),
            self.peak.total()
        );
        LedgerChange::Opened
    }
}

use crate::interpreter::{interpret, interpret_bytes, SessionEvent};
use crate::ledger::{
    sweeper::{run_sweeper, SweepOption},
    CounterSnapshot, Direction, DirectionCounts, SessionLedger,
};
use rsip::SipMessage;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

const DEFAULT_NAME: &str = "SessionCounter";

/// Builder for [`SessionCounter`].
///
/// ```rust
/// use sipcounter::SessionCounterBuilder;
///
/// let counter = SessionCounterBuilder::new().with_name("trunk-a").build();
/// assert_eq!(counter.name(), "trunk-a");
/// assert_eq!(counter.active(), 0);
/// ```
pub struct SessionCounterBuilder {
    name: String,
    ledger: Option<Arc<SessionLedger>>,
    sweep: Option<SweepOption>,
    cancel_token: Option<CancellationToken>,
}

/// Active and peak SIP session counter for one traffic group.
///
/// The counter does not know where messages come from. Everything fed into
/// one instance is treated as one group (an interface, a peer, a trunk); the
/// caller is responsible for not mixing unrelated traffic.
pub struct SessionCounter {
    name: String,
    ledger: Arc<SessionLedger>,
    sweep: Option<SweepOption>,
    cancel_token: CancellationToken,
}

impl Default for SessionCounterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCounterBuilder {
    pub fn new() -> Self {
        SessionCounterBuilder {
            name: DEFAULT_NAME.to_string(),
            ledger: None,
            sweep: None,
            cancel_token: None,
        }
    }

    pub fn with_name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    /// Count into an existing ledger instead of a fresh one.
    pub fn with_ledger(&mut self, ledger: Arc<SessionLedger>) -> &mut Self {
        self.ledger.replace(ledger);
        self
    }

    /// Close abandoned dialogs while [`SessionCounter::serve`] runs.
    pub fn with_sweep(&mut self, option: SweepOption) -> &mut Self {
        self.sweep.replace(option);
        self
    }

    pub fn with_cancel_token(&mut self, cancel_token: CancellationToken) -> &mut Self {
        self.cancel_token.replace(cancel_token);
        self
    }

    pub fn build(&mut self) -> SessionCounter {
        SessionCounter {
            name: self.name.clone(),
            ledger: self.ledger.take().unwrap_or_default(),
            sweep: self.sweep.take(),
            cancel_token: self.cancel_token.take().unwrap_or_default(),
        }
    }
}

impl SessionCounter {
    pub fn new(name: &str) -> Self {
        SessionCounterBuilder::new().with_name(name).build()
    }

    /// Feed one decoded message. Returns `true` when the active count changed.
    pub fn update(&self, msg: &SipMessage, direction: Direction) -> bool {
        self.apply(&interpret(msg), direction)
    }

    /// Feed one raw message; undecodable input is ignored.
    pub fn update_raw(&self, raw: &[u8], direction: Direction) -> bool {
        self.apply(&interpret_bytes(raw), direction)
    }

    fn apply(&self, event: &SessionEvent, direction: Direction) -> bool {
        if event.is_ignored() {
            return false;
        }
        let (change, _) = self.ledger.apply(event, direction);
        change.counts_changed()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ledger(&self) -> &Arc<SessionLedger> {
        &self.ledger
    }

    pub fn active(&self) -> usize {
        self.ledger.active()
    }

    pub fn peak(&self) -> usize {
        self.ledger.peak()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.ledger.snapshot()
    }

    pub fn sessions(&self) -> DirectionCounts {
        self.ledger.sessions()
    }

    pub fn peak_sessions(&self) -> DirectionCounts {
        self.ledger.peak_sessions()
    }

    pub fn reset(&self) {
        self.ledger.reset();
    }

    pub fn clear(&self) {
        self.ledger.clear();
    }

    /// Run the idle sweeper, if one was configured, until
    /// [`shutdown`](Self::shutdown) is called.
    pub async fn serve(&self) {
        match self.sweep {
            Some(option) => {
                run_sweeper(self.ledger.clone(), option, self.cancel_token.clone()).await;
            }
            None => {
                self.cancel_token.cancelled().await;
            }
        }
        info!("{} shutdown", self.name);
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl std::fmt::Display for SessionCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.ledger.snapshot();
        write!(
            f,
            "SessionCounter {}  Current: {}  Peak: {}",
            self.name, snapshot.active, snapshot.peak
        )
    }
}

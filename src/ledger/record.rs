use crate::interpreter::{DialogKey, SessionEvent};
use tokio::time::Instant;

/// Lifecycle phase of one observed dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// INVITE seen, no final answer yet.
    Pending,
    /// 2xx or ACK seen.
    Confirmed,
    /// Failed, cancelled or hung up; the record is dropped on entry.
    Closed,
}

impl SessionPhase {
    pub fn is_counted(&self) -> bool {
        matches!(self, SessionPhase::Pending | SessionPhase::Confirmed)
    }

    /// Next phase for `event`, or `None` when the event has no effect in this
    /// phase. Retransmissions and late messages all land on `None`.
    pub fn next(&self, event: &SessionEvent) -> Option<SessionPhase> {
        match (self, event) {
            (SessionPhase::Pending, SessionEvent::SessionConfirmed { .. }) => {
                Some(SessionPhase::Confirmed)
            }
            (SessionPhase::Pending, SessionEvent::SessionFailed { .. }) => {
                Some(SessionPhase::Closed)
            }
            (SessionPhase::Confirmed, SessionEvent::SessionTerminating { .. }) => {
                Some(SessionPhase::Closed)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Pending => write!(f, "PENDING"),
            SessionPhase::Confirmed => write!(f, "CONFIRMED"),
            SessionPhase::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Which way the initiating INVITE travelled, as told by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    Inbound,
    Outbound,
    #[default]
    Unspecified,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Inbound => write!(f, "IN"),
            Direction::Outbound => write!(f, "OUT"),
            Direction::Unspecified => write!(f, "IN&OUT"),
        }
    }
}

/// Session counts broken down by direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionCounts {
    pub inbound: usize,
    pub outbound: usize,
    pub unspecified: usize,
}

impl DirectionCounts {
    pub fn get(&self, direction: Direction) -> usize {
        match direction {
            Direction::Inbound => self.inbound,
            Direction::Outbound => self.outbound,
            Direction::Unspecified => self.unspecified,
        }
    }

    pub fn total(&self) -> usize {
        self.inbound + self.outbound + self.unspecified
    }

    pub(super) fn increment(&mut self, direction: Direction) {
        *self.slot(direction) += 1;
    }

    pub(super) fn decrement(&mut self, direction: Direction) {
        let slot = self.slot(direction);
        *slot = slot.saturating_sub(1);
    }

    fn slot(&mut self, direction: Direction) -> &mut usize {
        match direction {
            Direction::Inbound => &mut self.inbound,
            Direction::Outbound => &mut self.outbound,
            Direction::Unspecified => &mut self.unspecified,
        }
    }
}

pub(super) struct SessionRecord {
    /// From-tag of the INVITE is the local tag, the answering To-tag the
    /// remote one; the branch is the initiating transaction's.
    pub key: DialogKey,
    pub phase: SessionPhase,
    pub direction: Direction,
    pub created_seq: u64,
    pub last_seen: Instant,
}

impl SessionRecord {
    pub fn new(key: DialogKey, direction: Direction, created_seq: u64, now: Instant) -> Self {
        Self {
            key,
            phase: SessionPhase::Pending,
            direction,
            created_seq,
            last_seen: now,
        }
    }

    /// Whether a message keyed `key` belongs to this record's dialog.
    pub fn correlates(&self, key: &DialogKey) -> bool {
        if self.key.call_id != key.call_id {
            return false;
        }
        if &self.key == key || (self.key.branch.is_none() && self.key.from_tag.is_none()) {
            return true;
        }
        if key.branch.is_some() && key.branch == self.key.branch {
            return true;
        }
        match (self.key.from_tag.as_deref(), self.phase, self.key.to_tag.as_deref()) {
            (Some(local), SessionPhase::Confirmed, Some(remote)) => key.has_tag_pair(local, remote),
            (Some(local), _, _) => key.from_tag.as_deref() == Some(local) && key.to_tag.is_some(),
            // untagged caller: the answering tag alone names the dialog
            (None, SessionPhase::Confirmed, Some(remote)) => {
                key.from_tag.as_deref() == Some(remote) || key.to_tag.as_deref() == Some(remote)
            }
            (None, _, _) => false,
        }
    }

    /// Adopt the remote tag carried by `key` while the dialog is still early.
    /// A confirmed dialog keeps the tag it was confirmed with.
    pub fn learn_remote_tag(&mut self, key: &DialogKey) {
        if self.phase == SessionPhase::Confirmed {
            return;
        }
        let remote = match self.key.from_tag.as_deref() {
            Some(local) => key.peer_tag_of(local),
            None => key.to_tag.as_deref(),
        };
        if let Some(remote) = remote {
            self.key.to_tag = Some(remote.to_string());
        }
    }

    /// The event that closes this record from its current phase.
    pub fn closing_event(&self) -> SessionEvent {
        let key = self.key.clone();
        match self.phase {
            SessionPhase::Confirmed => SessionEvent::SessionTerminating { key },
            _ => SessionEvent::SessionFailed { key },
        }
    }
}

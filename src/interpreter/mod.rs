//! Message interpreter
//!
//! Turns a decoded SIP message into the [`SessionEvent`] the ledger
//! understands. The interpreter holds no state: the same message always yields
//! the same event, and a message it cannot make sense of yields
//! [`SessionEvent::Ignored`] instead of an error.
use crate::rsip_ext::{parse_sip_message, RsipDialogExt};
use crate::Result;
use rsip::{Method, SipMessage};
use tracing::debug;

pub mod key;
pub use key::DialogKey;

#[cfg(test)]
mod tests;

/// Session-relevant meaning of one SIP message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// An INVITE request, initial or re-INVITE.
    SessionInitiating { key: DialogKey },
    /// A 1xx response to INVITE other than 100 Trying.
    ProvisionalProgress { key: DialogKey },
    /// A 2xx response to INVITE, or an ACK.
    SessionConfirmed { key: DialogKey },
    /// A final failure (>= 300) to INVITE, or a CANCEL.
    SessionFailed { key: DialogKey },
    /// A BYE.
    SessionTerminating { key: DialogKey },
    Ignored,
}

impl SessionEvent {
    pub fn key(&self) -> Option<&DialogKey> {
        match self {
            SessionEvent::SessionInitiating { key }
            | SessionEvent::ProvisionalProgress { key }
            | SessionEvent::SessionConfirmed { key }
            | SessionEvent::SessionFailed { key }
            | SessionEvent::SessionTerminating { key } => Some(key),
            SessionEvent::Ignored => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, SessionEvent::Ignored)
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::SessionInitiating { key } => write!(f, "Initiating {}", key),
            SessionEvent::ProvisionalProgress { key } => write!(f, "Progress {}", key),
            SessionEvent::SessionConfirmed { key } => write!(f, "Confirmed {}", key),
            SessionEvent::SessionFailed { key } => write!(f, "Failed {}", key),
            SessionEvent::SessionTerminating { key } => write!(f, "Terminating {}", key),
            SessionEvent::Ignored => write!(f, "Ignored"),
        }
    }
}

type EventBuilder = fn(DialogKey) -> SessionEvent;

/// Classify a decoded SIP message.
pub fn interpret(msg: &SipMessage) -> SessionEvent {
    match classify(msg) {
        Ok(event) => event,
        Err(e) => {
            debug!("ignoring message: {}", e);
            SessionEvent::Ignored
        }
    }
}

/// Classify a raw SIP message; anything `rsip` cannot decode is ignored.
pub fn interpret_bytes(raw: &[u8]) -> SessionEvent {
    match parse_sip_message(raw) {
        Ok(msg) => interpret(&msg),
        Err(e) => {
            debug!("ignoring undecodable message: {}", e);
            SessionEvent::Ignored
        }
    }
}

fn classify(msg: &SipMessage) -> Result<SessionEvent> {
    let build: EventBuilder = match msg {
        SipMessage::Request(req) => match req.method {
            Method::Invite => |key| SessionEvent::SessionInitiating { key },
            Method::Ack => |key| SessionEvent::SessionConfirmed { key },
            Method::Cancel => |key| SessionEvent::SessionFailed { key },
            Method::Bye => |key| SessionEvent::SessionTerminating { key },
            _ => return Ok(SessionEvent::Ignored),
        },
        SipMessage::Response(resp) => {
            if resp.cseq_method()? != Method::Invite {
                return Ok(SessionEvent::Ignored);
            }
            match resp.status_code.code() {
                101..=199 => |key| SessionEvent::ProvisionalProgress { key },
                200..=299 => |key| SessionEvent::SessionConfirmed { key },
                300..=699 => |key| SessionEvent::SessionFailed { key },
                _ => return Ok(SessionEvent::Ignored),
            }
        }
    };
    let event = build(DialogKey::try_from(msg)?);
    debug!("classified {}", event);
    Ok(event)
}

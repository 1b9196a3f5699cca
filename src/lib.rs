// Concurrent and peak SIP session counting

//! # sipcounter
//!
//! Counts the SIP sessions that are active right now and the most that were
//! ever active at once, by watching the signalling messages of one traffic
//! group go by. Nothing here touches the network: the caller decodes messages
//! (or hands over raw text) and reads two numbers back.
//!
//! ```text
//!  SIP message ──▶ interpreter ──▶ SessionEvent ──▶ ledger ──▶ (active, peak)
//! ```
//!
//! * [`interpreter`] classifies a message as starting, progressing, confirming,
//!   failing or ending a session, or as noise.
//! * [`ledger`] runs the per-dialog state machine and keeps the counters.
//! * [`SessionCounter`] puts both together behind a named instance.
//!
//! ```rust
//! use sipcounter::{Direction, SessionCounter};
//!
//! let counter = SessionCounter::new("trunk-a");
//! let invite = "INVITE sip:bob@biloxi.example.com SIP/2.0\r\n\
//!               Via: SIP/2.0/UDP pc33.atlanta.example.com;branch=z9hG4bK776asdhds\r\n\
//!               To: Bob <sip:bob@biloxi.example.com>\r\n\
//!               From: Alice <sip:alice@atlanta.example.com>;tag=1928301774\r\n\
//!               Call-ID: a84b4c76e66710@pc33.atlanta.example.com\r\n\
//!               CSeq: 314159 INVITE\r\n\
//!               Content-Length: 0\r\n\r\n";
//! assert!(counter.update_raw(invite.as_bytes(), Direction::Inbound));
//! assert_eq!((counter.active(), counter.peak()), (1, 1));
//! ```

pub type Result<T> = std::result::Result<T, crate::error::Error>;
pub use crate::error::Error;
pub mod counter;
pub mod error;
pub mod interpreter;
pub mod ledger;
pub mod rsip_ext;
pub use counter::{SessionCounter, SessionCounterBuilder};
pub use interpreter::{interpret, interpret_bytes, DialogKey, SessionEvent};
pub use ledger::{CounterSnapshot, Direction, DirectionCounts, SessionLedger};

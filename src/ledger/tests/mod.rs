use crate::interpreter::{DialogKey, SessionEvent};
use crate::ledger::SessionLedger;

mod test_scenarios;

/// Key of the INVITE transaction of call `n`, before the callee answered.
pub(super) fn invite_key(n: usize) -> DialogKey {
    DialogKey::new(format!("call-{}@atlanta.example.com", n))
        .with_from_tag(format!("caller-{}", n))
        .with_branch(format!("z9hG4bKinvite{}", n))
}

/// Key of a response to call `n`'s INVITE, carrying the callee tag.
pub(super) fn answer_key(n: usize) -> DialogKey {
    invite_key(n).with_to_tag(format!("callee-{}", n))
}

/// Key of an in-dialog request of call `n` on a fresh transaction.
pub(super) fn in_dialog_key(n: usize, branch: &str) -> DialogKey {
    answer_key(n).with_branch(branch)
}

pub(super) fn invite(n: usize) -> SessionEvent {
    SessionEvent::SessionInitiating { key: invite_key(n) }
}

pub(super) fn ringing(n: usize) -> SessionEvent {
    SessionEvent::ProvisionalProgress { key: answer_key(n) }
}

pub(super) fn ok(n: usize) -> SessionEvent {
    SessionEvent::SessionConfirmed { key: answer_key(n) }
}

pub(super) fn ack(n: usize) -> SessionEvent {
    SessionEvent::SessionConfirmed {
        key: in_dialog_key(n, &format!("z9hG4bKack{}", n)),
    }
}

pub(super) fn busy(n: usize) -> SessionEvent {
    SessionEvent::SessionFailed { key: answer_key(n) }
}

pub(super) fn cancel(n: usize) -> SessionEvent {
    SessionEvent::SessionFailed { key: invite_key(n) }
}

pub(super) fn bye(n: usize) -> SessionEvent {
    SessionEvent::SessionTerminating {
        key: in_dialog_key(n, &format!("z9hG4bKbye{}", n)),
    }
}

/// Both counter invariants hold for `ledger`.
pub(super) fn assert_consistent(ledger: &SessionLedger) {
    let snapshot = ledger.snapshot();
    assert!(snapshot.peak >= snapshot.active, "{:?}", snapshot);
    assert_eq!(snapshot.active, ledger.tracked());
    assert_eq!(ledger.sessions().total(), snapshot.active);
    assert_eq!(ledger.peak_sessions().total(), snapshot.peak);
}

//! The transaction layer (RFC 3261 §17): per-exchange state machines built
//! on the generic engine in [`crate::fsm`], distinct for client/server roles
//! and for INVITE/non-INVITE methods.

pub mod client;
pub mod key;
pub mod manager;
pub mod server;

mod core;
mod tables;

pub(crate) use tables::{Effect, Input, Timer, TxCtx};

/// Whether a transaction represents the side that sent the request (UAC)
/// or the side that received it (UAS) — determines which of the
/// manager's two tables it is removed from on termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Client,
    Server,
}

use std::time::Duration;

/// Initial retransmit interval.
pub const T1: Duration = Duration::from_millis(500);
/// Cap on the doubled retransmit interval for non-INVITE/INVITE-server
/// retransmits.
pub const T2: Duration = Duration::from_secs(4);
/// Timer I / Timer K duration: how long a server transaction absorbs
/// retransmitted ACKs/requests after going final, on an unreliable
/// transport.
pub const T4: Duration = Duration::from_secs(5);
/// Overall client transaction timeout (Timer B / Timer F): `64 * T1`.
pub const TIMER_B: Duration = Duration::from_millis(500 * 64);
/// Timer D: how long a client INVITE transaction waits in `Completed` to
/// absorb retransmitted final responses, at minimum, on an unreliable
/// transport. Reused as the non-INVITE client's Timer K.
pub const TIMER_D: Duration = Duration::from_secs(32);

/// The transaction's position in the state machines of §4.4. Not every
/// variant is reachable from every transaction kind's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Client INVITE / client non-INVITE: request sent, no response yet.
    Calling,
    /// Client non-INVITE: request sent, no response yet.
    Trying,
    /// A provisional response has been seen (client) or sent (server).
    Proceeding,
    /// A final response has been sent/received; retransmissions absorbed.
    Completed,
    /// Server INVITE only: the ACK for a non-2xx final response arrived.
    Confirmed,
    /// No further transitions occur; the transaction is removed from the
    /// manager's table.
    Terminated,
}

impl TransactionState {
    pub(crate) fn from_name(name: &str) -> Self {
        match name {
            "Calling" => TransactionState::Calling,
            "Trying" => TransactionState::Trying,
            "Proceeding" => TransactionState::Proceeding,
            "Completed" => TransactionState::Completed,
            "Confirmed" => TransactionState::Confirmed,
            "Terminated" => TransactionState::Terminated,
            other => unreachable!("fsm table used an unmapped state name: {other}"),
        }
    }

    fn name(self) -> &'static str {
        match self {
            TransactionState::Calling => "Calling",
            TransactionState::Trying => "Trying",
            TransactionState::Proceeding => "Proceeding",
            TransactionState::Completed => "Completed",
            TransactionState::Confirmed => "Confirmed",
            TransactionState::Terminated => "Terminated",
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classifies a response's status code into the `Input` the FSM tables
/// expect (1xx / 2xx / 3xx-6xx), per RFC 3261 §17.
pub(crate) fn classify(status: crate::message::StatusCode) -> Input {
    if status.is_provisional() {
        Input::Provisional
    } else if status.class() == crate::message::CodeClass::Success {
        Input::Success
    } else {
        Input::Failure
    }
}

//! Client transaction handles (RFC 3261 §17.1): thin wrappers around a
//! shared [`super::core::Core`] that translate this crate's public API
//! into FSM inputs.

pub mod invite;
pub mod non_invite;

pub use invite::ClientInviteTx;
pub use non_invite::ClientNonInviteTx;

use crate::error::Result;
use crate::message::Message;

use super::TransactionState;

/// A client transaction, INVITE or non-INVITE. Both report the same
/// `state()`, but only `Invite` exposes `ack()`/`cancel()`.
pub enum ClientTx {
    /// A client INVITE transaction.
    Invite(ClientInviteTx),
    /// A client non-INVITE transaction.
    NonInvite(ClientNonInviteTx),
}

impl ClientTx {
    /// The transaction's current state.
    pub fn state(&self) -> TransactionState {
        match self {
            ClientTx::Invite(tx) => tx.state(),
            ClientTx::NonInvite(tx) => tx.state(),
        }
    }

    /// Responses received on this transaction, in arrival order.
    pub fn responses(&self) -> tokio::sync::mpsc::Receiver<Message> {
        match self {
            ClientTx::Invite(tx) => tx.responses(),
            ClientTx::NonInvite(tx) => tx.responses(),
        }
    }

    /// Errors this transaction has surfaced (timeout, transport failure).
    pub fn errors(&self) -> tokio::sync::mpsc::Receiver<crate::Error> {
        match self {
            ClientTx::Invite(tx) => tx.errors(),
            ClientTx::NonInvite(tx) => tx.errors(),
        }
    }
}

pub(crate) fn taken_once<T>(slot: &std::sync::Mutex<Option<T>>, what: &'static str) -> T {
    slot.lock().expect("lock poisoned").take().unwrap_or_else(|| panic!("{what} already taken"))
}

/// Errors returned by the manual `ack`/`cancel` operations when the
/// transaction's state no longer permits them.
pub(crate) fn wrong_state(state: TransactionState) -> crate::Error {
    crate::Error::InvalidTransactionState { state: state.to_string() }
}

pub(crate) type OpResult = Result<()>;

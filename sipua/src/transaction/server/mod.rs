//! Server transaction handles (RFC 3261 §17.2): created by the
//! [`super::manager::TransactionManager`] and delivered on its
//! `requests()` stream.

pub mod invite;
pub mod non_invite;

pub use invite::ServerInviteTx;
pub use non_invite::ServerNonInviteTx;

use crate::error::Result;
use crate::message::Message;

use super::TransactionState;

/// A server transaction, INVITE or non-INVITE. The request that created
/// it is on `request()`; `respond()` feeds the user's next response into
/// the FSM.
pub enum ServerTx {
    /// A server INVITE transaction.
    Invite(ServerInviteTx),
    /// A server non-INVITE transaction.
    NonInvite(ServerNonInviteTx),
}

impl ServerTx {
    /// The transaction's current state.
    pub fn state(&self) -> TransactionState {
        match self {
            ServerTx::Invite(tx) => tx.state(),
            ServerTx::NonInvite(tx) => tx.state(),
        }
    }

    /// The request this transaction was created for.
    pub fn request(&self) -> Message {
        match self {
            ServerTx::Invite(tx) => tx.request(),
            ServerTx::NonInvite(tx) => tx.request(),
        }
    }

    /// Sends `response`, classifying it into the right FSM input.
    pub async fn respond(&self, response: Message) -> Result<()> {
        match self {
            ServerTx::Invite(tx) => tx.respond(response).await,
            ServerTx::NonInvite(tx) => tx.respond(response).await,
        }
    }
}

impl From<ServerInviteTx> for ServerTx {
    fn from(tx: ServerInviteTx) -> Self {
        ServerTx::Invite(tx)
    }
}

impl From<ServerNonInviteTx> for ServerTx {
    fn from(tx: ServerNonInviteTx) -> Self {
        ServerTx::NonInvite(tx)
    }
}

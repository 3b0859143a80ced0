//! The `Transport` abstraction the transaction layer sends through and
//! receives from. No socket implementation ships in this crate — UDP/TCP
//! framing, connection pooling, and TLS are external collaborators (see
//! [`mock`] for the in-process stand-in used by tests).

pub mod mock;

use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::message::Message;

/// A message delivered off the wire, paired with where it came from.
#[derive(Debug, Clone)]
pub struct Incoming {
    /// The parsed message.
    pub message: Message,
    /// The peer that sent it.
    pub source: SocketAddr,
}

/// The interface the transaction layer requires of a transport. UDP/TCP
/// specifics, connection pooling, and TLS handshakes live outside this
/// crate; an implementation need only satisfy this contract.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends `message` to `destination`.
    async fn send(&self, destination: SocketAddr, message: &Message) -> Result<()>;

    /// Binds and starts accepting traffic on `address`. A transport that
    /// only originates outbound requests (no inbound listener) may treat
    /// this as a no-op.
    async fn listen(&self, address: SocketAddr) -> Result<()>;

    /// Takes ownership of the inbound message stream. May only be called
    /// once; implementations should panic on a second call, the same way a
    /// `oneshot::Receiver` can only be awaited once.
    fn get_channel(&self) -> mpsc::Receiver<Incoming>;

    /// Stops the transport: closes listeners, drains and closes the
    /// inbound channel, and fails subsequent `send` calls.
    async fn stop(&self);
}

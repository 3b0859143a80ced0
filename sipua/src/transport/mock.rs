//! An in-process [`Transport`] for tests: records every sent message and
//! can be told to fail a specific send, so retransmission and timeout
//! behavior can be asserted without real sockets.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;

use super::{Incoming, Transport};
use crate::error::{Error, Result};
use crate::message::Message;

/// A mock transport for tests, grounded in the same one-send-call, record-
/// everything shape as the teacher's UDP/TCP/TLS mock transports.
pub struct MockTransport {
    sent: Mutex<Vec<(SocketAddr, Message)>>,
    send_count: AtomicUsize,
    fail_at: Mutex<Option<usize>>,
    inbound_tx: mpsc::Sender<Incoming>,
    inbound_rx: Mutex<Option<mpsc::Receiver<Incoming>>>,
}

impl MockTransport {
    /// Creates a mock transport with no sends recorded yet.
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(32);
        Self {
            sent: Mutex::new(Vec::new()),
            send_count: AtomicUsize::new(0),
            fail_at: Mutex::new(None),
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
        }
    }

    /// A loopback address suitable for destination/source fields in tests.
    pub fn loopback(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    /// Every message sent so far, oldest first.
    pub fn sent_messages(&self) -> Vec<(SocketAddr, Message)> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    /// How many `send` calls have been made, regardless of success.
    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Makes the `n`th call (1-indexed) to `send` fail with a
    /// `TransportError`, instead of recording the message.
    pub fn fail_at(&self, n: usize) {
        *self.fail_at.lock().expect("lock poisoned") = Some(n);
    }

    /// Delivers `message` to whoever holds the receiver from
    /// `get_channel`, as if it had just arrived from `source`.
    pub async fn deliver(&self, message: Message, source: SocketAddr) {
        self.inbound_tx
            .send(Incoming { message, source })
            .await
            .expect("inbound channel closed");
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        panic!("MockTransport is shared via Arc, not cloned");
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, destination: SocketAddr, message: &Message) -> Result<()> {
        let n = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_at.lock().expect("lock poisoned") == Some(n) {
            return Err(Error::TransportError("simulated send failure".into()));
        }
        self.sent.lock().expect("lock poisoned").push((destination, message.clone()));
        Ok(())
    }

    async fn listen(&self, _address: SocketAddr) -> Result<()> {
        Ok(())
    }

    fn get_channel(&self) -> mpsc::Receiver<Incoming> {
        self.inbound_rx.lock().expect("lock poisoned").take().expect("inbound channel already taken")
    }

    async fn stop(&self) {
        *self.fail_at.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, Method};

    #[tokio::test]
    async fn records_sent_messages_and_can_fail_on_demand() {
        let transport = MockTransport::new();
        let dest = MockTransport::loopback(5060);
        let req = Message::request(Method::Options, "sip:bob@biloxi.com".parse().unwrap());

        transport.send(dest, &req).await.unwrap();
        assert_eq!(transport.sent_messages().len(), 1);

        transport.fail_at(2);
        let err = transport.send(dest, &req).await.unwrap_err();
        assert!(matches!(err, Error::TransportError(_)));
        assert_eq!(transport.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn delivered_messages_arrive_on_the_taken_channel() {
        let transport = MockTransport::new();
        let mut rx = transport.get_channel();
        let source = MockTransport::loopback(5061);
        let req = Message::request(Method::Invite, "sip:bob@biloxi.com".parse().unwrap());

        transport.deliver(req.clone(), source).await;

        let incoming = rx.recv().await.unwrap();
        assert_eq!(incoming.source, source);
        assert_eq!(incoming.message, req);
    }
}

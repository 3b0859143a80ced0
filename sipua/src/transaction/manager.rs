//! The transaction manager (RFC 3261 §17 demultiplexer): owns the
//! transaction table, correlates inbound messages, spawns server
//! transactions, and is the only public entry point into the transaction
//! layer.
//!
//! Grounded in the teacher's `transaction::manager::TransactionLayer`
//! (the two-map, client/server-keyed shape) and `transaction::key` (the
//! branch+method primary key and Call-ID fallback it sets up but never
//! wires into a manager loop).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::fsm::Fsm;
use crate::headers::Header;
use crate::message::{Message, StatusCode};
use crate::transport::Transport;

use super::client::{ClientInviteTx, ClientNonInviteTx, ClientTx};
use super::core::Core;
use super::key::TransactionKey;
use super::server::{ServerInviteTx, ServerNonInviteTx, ServerTx};
use super::{classify, tables, Input, Role, Timer, T1, TIMER_B};

/// The shared transaction table. A new transaction is always added to
/// exactly one of `client` / `server`, keyed the same way the message that
/// created it would be correlated. `call_id_fallback` is a deliberately
/// partial secondary index — see the module docs of [`super::key`] — that
/// only ever points at server transactions, and only helps when a
/// subsequent in-dialog request (typically BYE) fails primary
/// correlation but carries a `Call-Id` this manager has already seen.
pub(crate) struct Tables {
    client: Mutex<HashMap<TransactionKey, Arc<Core>>>,
    server: Mutex<HashMap<TransactionKey, Arc<Core>>>,
    call_id_fallback: Mutex<HashMap<String, TransactionKey>>,
}

impl Tables {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            client: Mutex::new(HashMap::new()),
            server: Mutex::new(HashMap::new()),
            call_id_fallback: Mutex::new(HashMap::new()),
        })
    }

    fn insert_client(&self, key: TransactionKey, core: Arc<Core>) {
        self.client.lock().expect("lock poisoned").insert(key, core);
    }

    fn insert_server(&self, key: TransactionKey, core: Arc<Core>) {
        if let Some(call_id) = key.call_id() {
            self.call_id_fallback.lock().expect("lock poisoned").insert(call_id.to_owned(), key.clone());
        }
        self.server.lock().expect("lock poisoned").insert(key, core);
    }

    fn lookup_client(&self, key: &TransactionKey) -> Option<Arc<Core>> {
        self.client.lock().expect("lock poisoned").get(key).cloned()
    }

    fn lookup_server(&self, key: &TransactionKey) -> Option<Arc<Core>> {
        self.server.lock().expect("lock poisoned").get(key).cloned()
    }

    /// Falls back to the `Call-Id` a request carries when primary
    /// correlation by branch/CSeq finds nothing.
    fn lookup_server_by_call_id(&self, call_id: &str) -> Option<Arc<Core>> {
        let key = self.call_id_fallback.lock().expect("lock poisoned").get(call_id).cloned()?;
        self.lookup_server(&key)
    }

    pub(crate) fn remove_client(&self, key: &TransactionKey) {
        self.client.lock().expect("lock poisoned").remove(key);
    }

    pub(crate) fn remove_server(&self, key: &TransactionKey) {
        self.server.lock().expect("lock poisoned").remove(key);
        if let Some(call_id) = key.call_id() {
            self.call_id_fallback.lock().expect("lock poisoned").remove(call_id);
        }
    }
}

fn header_of<'a>(message: &'a Message, pick: impl Fn(&Header) -> bool) -> Option<&'a Header> {
    message.headers().all_headers().find(|h| pick(h))
}

/// Builds the automatic `100 Trying` for a new server transaction by
/// copying exactly the five headers RFC 3261 §17.2.1 (and this crate's
/// spec) requires.
fn build_trying(request: &Message) -> Message {
    let mut trying = Message::response(StatusCode::TRYING, StatusCode::TRYING.reason());
    let picks: [fn(&Header) -> bool; 5] = [
        |h| matches!(h, Header::Via(_)),
        |h| matches!(h, Header::From(_)),
        |h| matches!(h, Header::To(_)),
        |h| matches!(h, Header::CallId(_)),
        |h| matches!(h, Header::CSeq(_)),
    ];
    for pick in picks {
        if let Some(header) = header_of(request, pick) {
            trying.headers_mut().add_header(header.clone());
        }
    }
    trying
}

/// The demultiplexer every transaction is created through. Spawns one
/// background task that owns the transport's inbound channel and
/// dispatches every message it reads to the right transaction (or creates
/// a new server one).
pub struct TransactionManager {
    transport: Arc<dyn Transport>,
    tables: Arc<Tables>,
    requests_tx: mpsc::Sender<ServerTx>,
    requests_rx: Mutex<Option<mpsc::Receiver<ServerTx>>>,
}

impl TransactionManager {
    /// Starts the manager: spawns the demultiplexing loop reading from
    /// `transport.get_channel()`.
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        let (requests_tx, requests_rx) = mpsc::channel(32);
        let manager = Arc::new(Self {
            transport,
            tables: Tables::new(),
            requests_tx,
            requests_rx: Mutex::new(Some(requests_rx)),
        });
        Arc::clone(&manager).spawn_dispatch_loop();
        manager
    }

    fn spawn_dispatch_loop(self: Arc<Self>) {
        let mut inbound = self.transport.get_channel();
        tokio::spawn(async move {
            while let Some(incoming) = inbound.recv().await {
                self.dispatch(incoming.message).await;
            }
        });
    }

    async fn dispatch(&self, message: Message) {
        match &message {
            Message::Response { .. } => self.dispatch_response(message).await,
            Message::Request { .. } => self.dispatch_request(message).await,
        }
    }

    async fn dispatch_response(&self, response: Message) {
        let Some(key) = TransactionKey::for_response(&response) else {
            tracing::warn!("dropping response with unparseable correlation headers");
            return;
        };
        let Some(core) = self.tables.lookup_client(&key) else {
            tracing::warn!(?key, "no matching client transaction for response");
            return;
        };
        let status = match &response {
            Message::Response { status_code, .. } => *status_code,
            Message::Request { .. } => unreachable!(),
        };
        if let Err(err) = core.spin(classify(status), Some(response)).await {
            tracing::warn!(error = %err, "response delivered to a transaction with no matching transition");
        }
    }

    async fn dispatch_request(&self, request: Message) {
        let Message::Request { method, .. } = &request else {
            unreachable!()
        };
        let method = method.clone();
        let Some(key) = TransactionKey::for_request(&request) else {
            tracing::warn!("dropping request with unparseable correlation headers");
            return;
        };

        if let Some(core) = self.tables.lookup_server(&key) {
            if let Err(err) = core.spin(Input::RequestRetransmit, Some(request)).await {
                tracing::warn!(error = %err, "retransmitted request delivered to a transaction with no matching transition");
            }
            return;
        }

        if method.is_ack() {
            let fallback = key.call_id().and_then(|id| self.tables.lookup_server_by_call_id(id));
            let Some(core) = fallback else {
                tracing::debug!("dropping ACK with no matching INVITE server transaction");
                return;
            };
            if let Err(err) = core.spin(Input::Ack, Some(request)).await {
                tracing::warn!(error = %err, "ACK delivered to a transaction with no matching transition");
            }
            return;
        }

        let destination = match self.peer_of(&request) {
            Some(addr) => addr,
            None => {
                tracing::warn!("dropping request with no usable return address");
                return;
            }
        };
        let trying = build_trying(&request);
        if let Err(err) = self.transport.send(destination, &trying).await {
            tracing::warn!(error = %err, "failed to send automatic 100 Trying");
        }

        let table_result = if method.is_invite() { tables::server_invite_table() } else { tables::server_non_invite_table() };
        let table = match table_result {
            Ok(table) => table,
            Err(err) => {
                tracing::warn!(error = %err, "failed to build server transaction table");
                return;
            }
        };
        let fsm = Fsm::new(table, 0);
        let core = Core::new(
            key.clone(),
            fsm,
            request,
            Arc::clone(&self.transport),
            destination,
            Arc::clone(&self.tables),
            None,
            None,
            Role::Server,
        );
        self.tables.insert_server(key, Arc::clone(&core));

        let server_tx = if method.is_invite() {
            ServerTx::Invite(ServerInviteTx::new(core))
        } else {
            ServerTx::NonInvite(ServerNonInviteTx::new(core))
        };
        if self.requests_tx.send(server_tx).await.is_err() {
            tracing::debug!("requests stream has no consumer, dropping new server transaction handle");
        }
    }

    /// Requests don't carry their own origin address in this crate's
    /// model (no `Received`/`rport` rewriting — see [`crate::headers::Via`]);
    /// the topmost `Via`'s `sent-by` is the best-effort return address.
    fn peer_of(&self, request: &Message) -> Option<SocketAddr> {
        let via = header_of(request, |h| matches!(h, Header::Via(_))).and_then(|h| match h {
            Header::Via(via) => via.first(),
            _ => None,
        })?;
        via.sent_by.socket_addr()
    }

    /// Wraps `request` in a client transaction, registers it, arms Timer A
    /// (at T1) and Timer B (at `64 * T1`), dispatches it via `Transport`,
    /// and returns the handle.
    pub async fn send(self: &Arc<Self>, request: Message, destination: SocketAddr) -> Result<ClientTx> {
        let method = match &request {
            Message::Request { method, .. } => method.clone(),
            Message::Response { .. } => return Err(Error::MissingRequiredHeader("request")),
        };
        let key = TransactionKey::for_request(&request).ok_or(Error::MissingRequiredHeader("Via/Call-ID/CSeq"))?;

        let table = if method.is_invite() { tables::client_invite_table() } else { tables::client_non_invite_table() }?;
        let fsm = Fsm::new(table, 0);
        let (responses_tx, responses_rx) = mpsc::channel(32);
        let (errors_tx, errors_rx) = mpsc::channel(8);
        let core = Core::new(
            key.clone(),
            fsm,
            request.clone(),
            Arc::clone(&self.transport),
            destination,
            Arc::clone(&self.tables),
            Some(responses_tx),
            Some(errors_tx),
            Role::Client,
        );
        self.tables.insert_client(key, Arc::clone(&core));

        if let Err(err) = self.transport.send(destination, &request).await {
            core.spin(Input::TransportError, None).await?;
            return Err(err);
        }
        core.arm_timer(Timer::A, T1);
        core.arm_timer(Timer::B, TIMER_B);

        Ok(if method.is_invite() {
            ClientTx::Invite(ClientInviteTx::new(core, responses_rx, errors_rx))
        } else {
            ClientTx::NonInvite(ClientNonInviteTx::new(core, responses_rx, errors_rx))
        })
    }

    /// The stream of inbound requests that created new server
    /// transactions. May only be taken once.
    pub fn requests(&self) -> mpsc::Receiver<ServerTx> {
        self.requests_rx.lock().expect("lock poisoned").take().expect("requests stream already taken")
    }

    /// Tears down every transaction by stopping the transport; in-flight
    /// sends fail, timers race against (and lose to) the transport's
    /// shutdown, and pending channels close as their `Core`s drop.
    pub async fn stop(&self) {
        self.transport.stop().await;
    }
}

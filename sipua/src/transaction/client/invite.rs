//! A client INVITE transaction handle.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::headers::{CSeq, Header, MaxForwards};
use crate::message::{Message, Method};
use crate::transaction::core::Core;
use crate::transaction::tables::build_ack;
use crate::transaction::TransactionState;

use super::wrong_state;

/// A client INVITE transaction (RFC 3261 §17.1.1): `Calling → Proceeding →
/// Completed → Terminated`.
pub struct ClientInviteTx {
    core: Arc<Core>,
    responses_rx: Mutex<Option<mpsc::Receiver<Message>>>,
    errors_rx: Mutex<Option<mpsc::Receiver<Error>>>,
}

impl ClientInviteTx {
    pub(crate) fn new(core: Arc<Core>, responses_rx: mpsc::Receiver<Message>, errors_rx: mpsc::Receiver<Error>) -> Self {
        Self {
            core,
            responses_rx: Mutex::new(Some(responses_rx)),
            errors_rx: Mutex::new(Some(errors_rx)),
        }
    }

    /// The transaction's current state.
    pub fn state(&self) -> TransactionState {
        self.core.state()
    }

    /// Responses received on this transaction, in arrival order. The FSM
    /// already ACKs non-2xx finals automatically; a 2xx arrives here too,
    /// since RFC 3261 leaves ACKing it to the layer above (see [`Self::ack`]).
    pub fn responses(&self) -> mpsc::Receiver<Message> {
        super::taken_once(&self.responses_rx, "responses() stream")
    }

    /// Errors this transaction has surfaced (timeout, transport failure).
    pub fn errors(&self) -> mpsc::Receiver<Error> {
        super::taken_once(&self.errors_rx, "errors() stream")
    }

    /// Sends the ACK for a 2xx final response. The FSM builds and sends
    /// the ACK for a non-2xx final automatically (RFC 3261 §17.1.1.3); a
    /// 2xx ACK is this crate's caller's responsibility, since it belongs
    /// to the dialog the 2xx established rather than to this transaction.
    pub async fn ack(&self) -> Result<()> {
        let response = self.core.last_response().ok_or(Error::MissingRequiredHeader("final response"))?;
        let ack = build_ack(&self.core.request(), &response);
        self.core.send_direct(&ack).await
    }

    /// Sends a CANCEL for the request this transaction carries, while
    /// it's still waiting on a final response (RFC 3261 §9.1). The CANCEL
    /// reuses the INVITE's branch, as the RFC requires, but — since a
    /// CANCEL is itself a new non-INVITE transaction — is sent directly
    /// rather than tracked by this transaction's own state machine.
    pub async fn cancel(&self) -> Result<()> {
        match self.state() {
            TransactionState::Calling | TransactionState::Proceeding => {}
            other => return Err(wrong_state(other)),
        }
        let request = self.core.request();
        let recipient = match &request {
            Message::Request { recipient, .. } => recipient.clone(),
            Message::Response { .. } => unreachable!("client transactions only wrap requests"),
        };
        let mut cancel = Message::request(Method::Cancel, recipient);
        let picks: [fn(&Header) -> bool; 3] = [
            |h| matches!(h, Header::Via(_)),
            |h| matches!(h, Header::From(_)),
            |h| matches!(h, Header::To(_)),
        ];
        for pick in picks {
            if let Some(header) = request.headers().all_headers().find(|h| pick(h)) {
                cancel.headers_mut().add_header(header.clone());
            }
        }
        if let Some(header) = request.headers().all_headers().find(|h| matches!(h, Header::CallId(_))) {
            cancel.headers_mut().add_header(header.clone());
        }
        let seq = request
            .headers()
            .all_headers()
            .find_map(|h| if let Header::CSeq(c) = h { Some(c.seq()) } else { None })
            .unwrap_or(1);
        cancel.headers_mut().add_header(Header::CSeq(CSeq::new(seq, Method::Cancel)));
        cancel.headers_mut().add_header(Header::MaxForwards(MaxForwards::new(70)));
        self.core.send_direct(&cancel).await
    }
}

#[cfg(test)]
mod tests {
    use crate::fsm::Fsm;
    use crate::headers::{CallId, CSeq as CSeqHeader, From, To, Via, ViaHop};
    use crate::message::{HostPort, NameAddr, TransportProtocol, Uri};
    use crate::transaction::{key::TransactionKey, manager::Tables, tables as tx_tables, Role};
    use crate::transport::mock::MockTransport;

    use super::*;

    fn addr(uri: &str) -> NameAddr {
        NameAddr {
            display: None,
            uri: uri.parse::<Uri>().unwrap(),
        }
    }

    fn invite() -> Message {
        let mut req = Message::request(Method::Invite, "sip:bob@biloxi.com".parse::<Uri>().unwrap());
        let mut hop = ViaHop::new(TransportProtocol::Udp, HostPort::new("127.0.0.1", Some(5060)));
        hop.set_branch("z9hG4bKnashds8");
        req.headers_mut().add_header(Header::Via(Via::new([hop])));
        req.headers_mut().add_header(Header::From(From::new(addr("sip:alice@atlanta.com"))));
        req.headers_mut().add_header(Header::To(To::new(addr("sip:bob@biloxi.com"))));
        req.headers_mut().add_header(Header::CallId(CallId::new("a84b4c76e66710")));
        req.headers_mut().add_header(Header::CSeq(CSeqHeader::new(1, Method::Invite)));
        req
    }

    fn make_tx(request: Message) -> (ClientInviteTx, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let table = tx_tables::client_invite_table().unwrap();
        let fsm = Fsm::new(table, 0);
        let (responses_tx, responses_rx) = mpsc::channel(8);
        let (errors_tx, errors_rx) = mpsc::channel(8);
        let key = TransactionKey::for_request(&request).unwrap();
        let core = Core::new(
            key,
            fsm,
            request,
            transport.clone() as Arc<dyn crate::transport::Transport>,
            MockTransport::loopback(5060),
            Tables::new(),
            Some(responses_tx),
            Some(errors_tx),
            Role::Client,
        );
        (ClientInviteTx::new(core, responses_rx, errors_rx), transport)
    }

    #[tokio::test]
    async fn ack_fails_before_any_final_response() {
        let (tx, _transport) = make_tx(invite());
        assert_eq!(tx.state(), TransactionState::Calling);
        assert!(tx.ack().await.is_err());
    }

    #[tokio::test]
    async fn cancel_is_rejected_once_completed() {
        let (tx, transport) = make_tx(invite());
        tx.core.spin(crate::transaction::Input::Failure, Some(Message::response(crate::message::StatusCode::new(486), "Busy Here"))).await.unwrap();

        assert_eq!(tx.state(), TransactionState::Completed);
        assert!(tx.cancel().await.is_err());
        // the failure response triggered an automatic ACK.
        assert_eq!(transport.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn cancel_succeeds_while_calling() {
        let (tx, transport) = make_tx(invite());
        tx.cancel().await.unwrap();
        assert_eq!(transport.sent_messages().len(), 1);
        let (_, sent) = &transport.sent_messages()[0];
        assert!(matches!(sent, Message::Request { method: Method::Cancel, .. }));
    }
}

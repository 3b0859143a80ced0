//! A client non-INVITE transaction handle.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::Error;
use crate::message::Message;
use crate::transaction::core::Core;
use crate::transaction::TransactionState;

/// A client non-INVITE transaction (RFC 3261 §17.1.2): `Trying →
/// Proceeding → Completed → Terminated`. No ACK is ever generated.
pub struct ClientNonInviteTx {
    core: Arc<Core>,
    responses_rx: Mutex<Option<mpsc::Receiver<Message>>>,
    errors_rx: Mutex<Option<mpsc::Receiver<Error>>>,
}

impl ClientNonInviteTx {
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

    /// Responses received on this transaction, in arrival order.
    pub fn responses(&self) -> mpsc::Receiver<Message> {
        super::taken_once(&self.responses_rx, "responses() stream")
    }

    /// Errors this transaction has surfaced (timeout, transport failure).
    pub fn errors(&self) -> mpsc::Receiver<Error> {
        super::taken_once(&self.errors_rx, "errors() stream")
    }
}

#[cfg(test)]
mod tests {
    use crate::fsm::Fsm;
    use crate::headers::{CallId, CSeq, Header, Via, ViaHop};
    use crate::message::{HostPort, Method, StatusCode, TransportProtocol, Uri};
    use crate::transaction::{key::TransactionKey, manager::Tables, tables as tx_tables, Input, Role};
    use crate::transport::mock::MockTransport;

    use super::*;

    fn options() -> Message {
        let mut req = Message::request(Method::Options, "sip:bob@biloxi.com".parse::<Uri>().unwrap());
        let mut hop = ViaHop::new(TransportProtocol::Udp, HostPort::new("127.0.0.1", Some(5060)));
        hop.set_branch("z9hG4bKoptions1");
        req.headers_mut().add_header(Header::Via(Via::new([hop])));
        req.headers_mut().add_header(Header::CallId(CallId::new("optionscallid")));
        req.headers_mut().add_header(Header::CSeq(CSeq::new(1, Method::Options)));
        req
    }

    fn make_tx(request: Message) -> (ClientNonInviteTx, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let table = tx_tables::client_non_invite_table().unwrap();
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
        (ClientNonInviteTx::new(core, responses_rx, errors_rx), transport)
    }

    #[tokio::test]
    async fn final_response_notifies_and_completes() {
        let (tx, _transport) = make_tx(options());
        let mut responses = tx.responses();

        tx.core.spin(Input::Success, Some(Message::response(StatusCode::OK, "OK"))).await.unwrap();

        assert_eq!(tx.state(), TransactionState::Completed);
        let received = responses.recv().await.unwrap();
        assert!(matches!(received, Message::Response { status_code, .. } if status_code == StatusCode::OK));
    }
}

//! A server INVITE transaction handle.

use std::sync::Arc;

use crate::error::Result;
use crate::message::Message;
use crate::transaction::core::Core;
use crate::transaction::{classify, TransactionState};

/// A server INVITE transaction (RFC 3261 §17.2.1): `Proceeding → Completed
/// → Confirmed → Terminated`. The automatic `100 Trying` has already been
/// sent by the manager before this handle is constructed.
pub struct ServerInviteTx {
    core: Arc<Core>,
}

impl ServerInviteTx {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self { core }
    }

    /// The transaction's current state.
    pub fn state(&self) -> TransactionState {
        self.core.state()
    }

    /// The INVITE that created this transaction.
    pub fn request(&self) -> Message {
        self.core.request()
    }

    /// Sends `response`, classifying it into the 1xx/2xx/3xx-6xx FSM input
    /// RFC 3261 §17.2.1 expects.
    pub async fn respond(&self, response: Message) -> Result<()> {
        let status = match &response {
            Message::Response { status_code, .. } => *status_code,
            Message::Request { .. } => return Err(crate::error::Error::MissingRequiredHeader("response")),
        };
        self.core.spin(classify(status), Some(response)).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::{self, Duration};

    use crate::fsm::Fsm;
    use crate::headers::{CallId, CSeq, From, Header, To, Via, ViaHop};
    use crate::message::{HostPort, Method, NameAddr, StatusCode, TransportProtocol, Uri};
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
        hop.set_branch("z9hG4bKserverinv");
        req.headers_mut().add_header(Header::Via(Via::new([hop])));
        req.headers_mut().add_header(Header::From(From::new(addr("sip:alice@atlanta.com"))));
        req.headers_mut().add_header(Header::To(To::new(addr("sip:bob@biloxi.com"))));
        req.headers_mut().add_header(Header::CallId(CallId::new("serverinvcallid")));
        req.headers_mut().add_header(Header::CSeq(CSeq::new(1, Method::Invite)));
        req
    }

    fn make_tx(request: Message) -> (ServerInviteTx, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let table = tx_tables::server_invite_table().unwrap();
        let fsm = Fsm::new(table, 0);
        let key = TransactionKey::for_request(&request).unwrap();
        let core = Core::new(
            key,
            fsm,
            request,
            transport.clone() as Arc<dyn crate::transport::Transport>,
            MockTransport::loopback(5061),
            Tables::new(),
            None,
            None,
            Role::Server,
        );
        (ServerInviteTx::new(core), transport)
    }

    #[tokio::test]
    async fn two_hundred_terminates_immediately() {
        let (tx, transport) = make_tx(invite());
        tx.respond(Message::response(StatusCode::OK, "OK")).await.unwrap();

        assert_eq!(tx.state(), TransactionState::Terminated);
        assert_eq!(transport.sent_messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_then_ack_then_timer_i_terminates() {
        let (tx, transport) = make_tx(invite());
        tx.respond(Message::response(StatusCode::new(486), "Busy Here")).await.unwrap();
        assert_eq!(tx.state(), TransactionState::Completed);

        tx.core.spin(crate::transaction::Input::Ack, None).await.unwrap();
        assert_eq!(tx.state(), TransactionState::Confirmed);

        time::advance(Duration::from_secs(6)).await;
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(tx.state(), TransactionState::Terminated);
        assert_eq!(transport.sent_messages().len(), 1);
    }
}

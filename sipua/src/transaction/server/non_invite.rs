//! A server non-INVITE transaction handle.

use std::sync::Arc;

use crate::error::Result;
use crate::message::Message;
use crate::transaction::core::Core;
use crate::transaction::{classify, TransactionState};

/// A server non-INVITE transaction (RFC 3261 §17.2.2): `Trying →
/// Proceeding → Completed → Terminated`.
pub struct ServerNonInviteTx {
    core: Arc<Core>,
}

impl ServerNonInviteTx {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self { core }
    }

    /// The transaction's current state.
    pub fn state(&self) -> TransactionState {
        self.core.state()
    }

    /// The request that created this transaction.
    pub fn request(&self) -> Message {
        self.core.request()
    }

    /// Sends `response`, classifying it into the 1xx/2xx-6xx FSM input
    /// RFC 3261 §17.2.2 expects.
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
    use crate::fsm::Fsm;
    use crate::headers::{CallId, CSeq, Header, Via, ViaHop};
    use crate::message::{HostPort, Method, StatusCode, TransportProtocol, Uri};
    use crate::transaction::{key::TransactionKey, manager::Tables, tables as tx_tables, Role};
    use crate::transport::mock::MockTransport;

    use super::*;

    fn options() -> Message {
        let mut req = Message::request(Method::Options, "sip:bob@biloxi.com".parse::<Uri>().unwrap());
        let mut hop = ViaHop::new(TransportProtocol::Udp, HostPort::new("127.0.0.1", Some(5060)));
        hop.set_branch("z9hG4bKserveropts");
        req.headers_mut().add_header(Header::Via(Via::new([hop])));
        req.headers_mut().add_header(Header::CallId(CallId::new("serveroptscallid")));
        req.headers_mut().add_header(Header::CSeq(CSeq::new(1, Method::Options)));
        req
    }

    fn make_tx(request: Message) -> (ServerNonInviteTx, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let table = tx_tables::server_non_invite_table().unwrap();
        let fsm = Fsm::new(table, 0);
        let key = TransactionKey::for_request(&request).unwrap();
        let core = Core::new(
            key,
            fsm,
            request,
            transport.clone() as Arc<dyn crate::transport::Transport>,
            MockTransport::loopback(5062),
            Tables::new(),
            None,
            None,
            Role::Server,
        );
        (ServerNonInviteTx::new(core), transport)
    }

    #[tokio::test]
    async fn ok_completes_and_can_be_resent_on_retransmit() {
        let (tx, transport) = make_tx(options());
        tx.respond(Message::response(StatusCode::OK, "OK")).await.unwrap();
        assert_eq!(tx.state(), TransactionState::Completed);

        tx.core.spin(crate::transaction::Input::RequestRetransmit, Some(tx.request())).await.unwrap();
        assert_eq!(transport.sent_messages().len(), 2);
    }
}

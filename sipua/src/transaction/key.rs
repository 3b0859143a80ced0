//! Transaction keys: how the [`super::manager::TransactionManager`]
//! correlates an inbound message to a live transaction (RFC 3261 §17.1.3,
//! §17.2.3).
//!
//! The primary key is the topmost `Via` branch plus the method — with ACK
//! canonicalized to `INVITE` so it pairs with the transaction of the
//! request it acknowledges. A branch that doesn't start with the RFC 3261
//! magic cookie `z9hG4bK` falls back to the older RFC 2543 key, built from
//! CSeq, tags, Call-ID, and the Via sent-by. The secondary `Call-Id`
//! fallback table used to route in-dialog BYE is a separate, deliberately
//! partial mechanism — see [`super::manager`].

use crate::headers::Header;
use crate::message::{HostPort, Message, Method};

/// The RFC 3261 magic cookie that marks a branch as usable for transaction
/// matching.
pub const BRANCH_MAGIC_COOKIE: &str = "z9hG4bK";

/// Identifies a transaction in the manager's table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionKey {
    /// RFC 3261 §17.1.3 branch-based key.
    Rfc3261 {
        /// The topmost `Via` branch parameter.
        branch: String,
        /// The method, with ACK canonicalized to INVITE.
        method: Method,
    },
    /// The RFC 2543 fallback key, used when a branch lacks the magic
    /// cookie (or is absent).
    Rfc2543 {
        /// The CSeq number.
        cseq: u32,
        /// The method, with ACK canonicalized to INVITE.
        method: Method,
        /// The `Call-ID` value.
        call_id: String,
        /// The topmost `Via` sent-by.
        via_sent_by: HostPort,
    },
}

/// Canonicalizes a method for transaction-matching purposes: an ACK
/// correlates to the INVITE transaction it acknowledges.
fn canonical_method(method: &Method) -> Method {
    if method.is_ack() {
        Method::Invite
    } else {
        method.clone()
    }
}

impl TransactionKey {
    /// Builds the key a client transaction registers itself under, from
    /// the request it is sending. The branch is taken from the request's
    /// own (already-built) topmost `Via`.
    pub fn for_request(request: &Message) -> Option<Self> {
        let method = match request {
            Message::Request { method, .. } => method,
            Message::Response { .. } => return None,
        };
        let via = request.headers().all_headers().find_map(|h| match h {
            Header::Via(via) => via.first(),
            _ => None,
        })?;
        let call_id = request.headers().all_headers().find_map(|h| match h {
            Header::CallId(id) => Some(id.id().to_owned()),
            _ => None,
        })?;
        let cseq = request.headers().all_headers().find_map(|h| match h {
            Header::CSeq(c) => Some(c.seq()),
            _ => None,
        })?;

        Some(match via.branch() {
            Some(branch) if branch.starts_with(BRANCH_MAGIC_COOKIE) => TransactionKey::Rfc3261 {
                branch: branch.to_owned(),
                method: canonical_method(method),
            },
            _ => TransactionKey::Rfc2543 {
                cseq,
                method: canonical_method(method),
                call_id,
                via_sent_by: via.sent_by.clone(),
            },
        })
    }

    /// Builds the key that would correlate an inbound response to the
    /// client transaction that sent the request it answers, from the
    /// response's own topmost `Via` and `CSeq`.
    pub fn for_response(response: &Message) -> Option<Self> {
        let via = response.headers().all_headers().find_map(|h| match h {
            Header::Via(via) => via.first(),
            _ => None,
        })?;
        let (cseq, method) = response.headers().all_headers().find_map(|h| match h {
            Header::CSeq(c) => Some((c.seq(), c.method().clone())),
            _ => None,
        })?;
        let call_id = response.headers().all_headers().find_map(|h| match h {
            Header::CallId(id) => Some(id.id().to_owned()),
            _ => None,
        })?;

        Some(match via.branch() {
            Some(branch) if branch.starts_with(BRANCH_MAGIC_COOKIE) => TransactionKey::Rfc3261 {
                branch: branch.to_owned(),
                method: canonical_method(&method),
            },
            _ => TransactionKey::Rfc2543 {
                cseq,
                method: canonical_method(&method),
                call_id,
                via_sent_by: via.sent_by.clone(),
            },
        })
    }

    /// The `Call-Id` this key's request/response carried, if recoverable
    /// from the key alone (only the RFC 2543 variant stores it).
    pub fn call_id(&self) -> Option<&str> {
        match self {
            TransactionKey::Rfc2543 { call_id, .. } => Some(call_id),
            TransactionKey::Rfc3261 { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{CallId, CSeq, Header, Via, ViaHop};
    use crate::message::{HostPort, TransportProtocol};

    fn via_hop(branch: &str) -> Header {
        let mut hop = ViaHop::new(TransportProtocol::Udp, HostPort::new("pc33.atlanta.com", Some(5060)));
        hop.set_branch(branch);
        Header::Via(Via::new([hop]))
    }

    #[test]
    fn request_and_response_with_same_via_and_cseq_key_alike() {
        let mut req = Message::request(Method::Invite, "sip:bob@biloxi.com".parse().unwrap());
        req.headers_mut().add_header(via_hop("z9hG4bKnashds8"));
        req.headers_mut().add_header(Header::CallId(CallId::new("a84b4c76e66710")));
        req.headers_mut().add_header(Header::CSeq(CSeq::new(1, Method::Invite)));

        let mut resp = Message::response(crate::message::StatusCode::RINGING, "Ringing");
        resp.headers_mut().add_header(via_hop("z9hG4bKnashds8"));
        resp.headers_mut().add_header(Header::CallId(CallId::new("a84b4c76e66710")));
        resp.headers_mut().add_header(Header::CSeq(CSeq::new(1, Method::Invite)));

        assert_eq!(TransactionKey::for_request(&req), TransactionKey::for_response(&resp));
    }

    #[test]
    fn ack_canonicalizes_to_invite_for_matching() {
        let mut ack = Message::request(Method::Ack, "sip:bob@biloxi.com".parse().unwrap());
        ack.headers_mut().add_header(via_hop("z9hG4bKnashds8"));
        ack.headers_mut().add_header(Header::CallId(CallId::new("a84b4c76e66710")));
        ack.headers_mut().add_header(Header::CSeq(CSeq::new(1, Method::Ack)));

        let key = TransactionKey::for_request(&ack).unwrap();
        assert_eq!(key, TransactionKey::Rfc3261 {
            branch: "z9hG4bKnashds8".into(),
            method: Method::Invite,
        });
    }

    #[test]
    fn missing_magic_cookie_falls_back_to_rfc2543() {
        let mut req = Message::request(Method::Invite, "sip:bob@biloxi.com".parse().unwrap());
        req.headers_mut().add_header(via_hop("not-a-cookie-branch"));
        req.headers_mut().add_header(Header::CallId(CallId::new("abc")));
        req.headers_mut().add_header(Header::CSeq(CSeq::new(1, Method::Invite)));

        assert!(matches!(TransactionKey::for_request(&req), Some(TransactionKey::Rfc2543 { .. })));
    }
}

#![deny(missing_docs)]
//! SIP message types.
//!
//! Provides the [`Message`] sum type, which is either a [`Message::Request`]
//! or a [`Message::Response`].

use crate::headers::Headers;

mod code;
mod method;
mod params;
mod protocol;
mod uri;

pub use code::*;
pub use method::*;
pub use params::*;
pub use protocol::*;
pub use uri::*;

/// A parsed SIP request or response.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A request, e.g. `INVITE sip:bob@biloxi.com SIP/2.0`.
    Request {
        /// The request method.
        method: Method,
        /// The Request-URI: the target of the request.
        recipient: Uri,
        /// The SIP version on the Request-Line, normally [`SIPV2`].
        sip_version: String,
        /// The parsed headers.
        headers: Headers,
        /// The message body, if any.
        body: Vec<u8>,
    },
    /// A response, e.g. `SIP/2.0 200 OK`.
    Response {
        /// The SIP version on the Status-Line, normally [`SIPV2`].
        sip_version: String,
        /// The response status code.
        status_code: StatusCode,
        /// The reason phrase.
        reason: String,
        /// The parsed headers.
        headers: Headers,
        /// The message body, if any.
        body: Vec<u8>,
    },
}

impl Message {
    /// Creates a new request with no headers or body.
    pub fn request(method: Method, recipient: Uri) -> Self {
        Message::Request {
            method,
            recipient,
            sip_version: SIPV2.to_owned(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Creates a new response with no headers or body.
    pub fn response(status_code: StatusCode, reason: impl Into<String>) -> Self {
        Message::Response {
            sip_version: SIPV2.to_owned(),
            status_code,
            reason: reason.into(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// `true` if this is a [`Message::Request`].
    pub const fn is_request(&self) -> bool {
        matches!(self, Message::Request { .. })
    }

    /// `true` if this is a [`Message::Response`].
    pub const fn is_response(&self) -> bool {
        matches!(self, Message::Response { .. })
    }

    /// The headers, regardless of request/response.
    pub fn headers(&self) -> &Headers {
        match self {
            Message::Request { headers, .. } => headers,
            Message::Response { headers, .. } => headers,
        }
    }

    /// A mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        match self {
            Message::Request { headers, .. } => headers,
            Message::Response { headers, .. } => headers,
        }
    }

    /// The header name sequence in wire order — derived from [`Headers`]
    /// rather than stored separately, since the single ordered `Vec<Header>`
    /// is already the one source of truth for wire order.
    pub fn header_order(&self) -> Vec<&str> {
        self.headers().header_order()
    }

    /// The message body.
    pub fn body(&self) -> &[u8] {
        match self {
            Message::Request { body, .. } => body,
            Message::Response { body, .. } => body,
        }
    }

    /// Replaces the message body, updating or inserting the `Content-Length`
    /// header to match the new length.
    pub fn set_body(&mut self, new_body: Vec<u8>) {
        let len = new_body.len() as u32;
        match self {
            Message::Request { body, .. } => *body = new_body,
            Message::Response { body, .. } => *body = new_body,
        }
        self.headers_mut().set_content_length(len);
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Request {
                method,
                recipient,
                sip_version,
                headers,
                body,
            } => {
                write!(f, "{method} {recipient} {sip_version}\r\n{headers}\r\n")?;
                f.write_str(&String::from_utf8_lossy(body))
            }
            Message::Response {
                sip_version,
                status_code,
                reason,
                headers,
                body,
            } => {
                write!(f, "{sip_version} {} {reason}\r\n{headers}\r\n", status_code.as_u16())?;
                f.write_str(&String::from_utf8_lossy(body))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{CallId, Header};

    #[test]
    fn request_displays_request_line_then_headers_then_body() {
        let mut req = Message::request(Method::Options, "sip:localhost".parse().unwrap());
        req.headers_mut().add_header(Header::CallId(CallId::new("abc")));
        assert_eq!(req.to_string(), "OPTIONS sip:localhost SIP/2.0\r\nCall-ID: abc\r\n\r\n");
    }

    #[test]
    fn header_order_reflects_insertion() {
        let mut res = Message::response(StatusCode::OK, "OK");
        res.headers_mut().add_header(Header::CallId(CallId::new("abc")));
        assert_eq!(res.header_order(), vec!["Call-ID"]);
    }
}

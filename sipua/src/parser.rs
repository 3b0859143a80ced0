//! The message-level parser: turns raw bytes into a [`Message`].
//!
//! Two entry points, grounded in how a real SIP listener actually receives
//! bytes:
//!
//! - [`parse_message`] is the unstreamed, one-shot path: one call gets
//!   exactly one complete message (the shape a UDP datagram arrives in).
//!   The body is whatever follows the blank line that ends the headers.
//! - [`StreamingParser`] is the streamed path for a byte-oriented transport
//!   (TCP, WebSocket): bytes trickle in through `write`, and `Content-Length`
//!   is the only thing that tells the parser where one message ends and the
//!   next begins. A message with zero or more than one `Content-Length`
//!   header can never be framed unambiguously, so that's a terminal error
//!   for the streaming instance rather than a dropped header.
//!
//! Both paths share the same header-block handling: lines are read until a
//! blank line, continuation lines (leading whitespace) are folded into the
//! previous header with a single joining space, and each logical line is
//! dispatched to the matching header type's [`HeaderParse::parse`] by name.
//! An individual header that fails to parse is logged and dropped; the
//! header block and the line it came from are all that's lost. A malformed
//! start line, or a message-level framing problem, fails the whole message.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sipua_util::Scanner;
use tokio::sync::mpsc;

use crate::error::{Error, Result, SipParserError};
use crate::headers::{
    Allow, CallId, Contact, ContentLength, ContentType, CSeq, Expires, From, GenericHeader, Header, HeaderParse,
    Headers, MaxForwards, ProxyRequire, Require, Supported, To, Unsupported, UserAgent, Via,
};
use crate::message::{Message, Method, StatusCode, Uri};

use elastic_buffer::ElasticBuffer;

fn parse_err(message: impl Into<String>) -> Error {
    Error::Parse(SipParserError::new(message.into()))
}

fn eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

enum StartLine {
    Request { method: Method, recipient: Uri, version: String },
    Response { version: String, code: u16, reason: String },
}

/// Classifies and parses a start line per the same heuristic a real
/// listener uses when it doesn't yet know if it's looking at a request or a
/// response: a request line has exactly two spaces and a third field that
/// starts with `SIP` (the version); a status line has at least two spaces
/// (the reason phrase may itself contain spaces) and a first field that
/// starts with `SIP`.
fn parse_start_line(line: &str) -> Result<StartLine> {
    let space_count = line.bytes().filter(|&b| b == b' ').count();
    let fields: Vec<&str> = line.splitn(3, ' ').collect();
    let first = fields.first().copied().unwrap_or("");

    if space_count >= 2 && first.starts_with("SIP") {
        let code_str = fields.get(1).copied().unwrap_or("");
        let reason = fields.get(2).copied().unwrap_or("").to_owned();
        let code: u16 = code_str.parse().map_err(|_| parse_err(format!("invalid status code: {code_str:?}")))?;
        return Ok(StartLine::Response {
            version: first.to_owned(),
            code,
            reason,
        });
    }

    if space_count == 2 {
        let second = fields.get(1).copied().unwrap_or("");
        let third = fields.get(2).copied().unwrap_or("");
        if third.starts_with("SIP") {
            let recipient: Uri = second.parse()?;
            if recipient.is_wildcard() {
                return Err(parse_err("Request-URI must not be the wildcard '*'"));
            }
            return Ok(StartLine::Request {
                method: Method::from(first),
                recipient,
                version: third.to_owned(),
            });
        }
    }

    Err(parse_err(format!("unrecognized start line: {line:?}")))
}

fn build_message(start: StartLine, headers: Headers, body: Vec<u8>) -> Message {
    match start {
        StartLine::Request { method, recipient, version } => Message::Request {
            method,
            recipient,
            sip_version: version,
            headers,
            body,
        },
        StartLine::Response { version, code, reason } => Message::Response {
            sip_version: version,
            status_code: StatusCode::new(code),
            reason,
            headers,
            body,
        },
    }
}

/// Folds continuation lines (leading whitespace) into the preceding logical
/// header line, joined by a single space after trimming. A continuation
/// with no preceding header line — the very first line of the block starts
/// with whitespace — has nothing to attach to and is discarded.
fn join_header_lines(raw_lines: Vec<Vec<u8>>) -> Vec<String> {
    let mut logical: Vec<String> = Vec::with_capacity(raw_lines.len());
    for raw in raw_lines {
        let is_continuation = matches!(raw.first(), Some(b' ') | Some(b'\t'));
        if is_continuation {
            let text = String::from_utf8_lossy(&raw);
            let text = text.trim();
            match logical.last_mut() {
                Some(last) => {
                    last.push(' ');
                    last.push_str(text);
                }
                None => tracing::warn!(line = %text, "discarding header continuation with no preceding header"),
            }
        } else {
            logical.push(String::from_utf8_lossy(&raw).into_owned());
        }
    }
    logical
}

/// A per-name override installed via [`StreamingParser::set_header_parser`],
/// replacing the built-in dispatch for that header name.
pub type HeaderParserFn = Arc<dyn Fn(&str) -> Result<Header> + Send + Sync>;

/// Splits each logical header line into name/value and dispatches it to the
/// matching header type, falling back to [`Header::Generic`] for anything
/// unrecognized. A header that fails to parse is logged and skipped rather
/// than failing the whole message.
fn parse_header_block(logical_lines: Vec<String>, overrides: Option<&HashMap<String, HeaderParserFn>>) -> Headers {
    let mut headers = Headers::with_capacity(logical_lines.len());
    for line in logical_lines {
        let Some(colon) = line.find(':') else {
            tracing::warn!(line = %line, "discarding malformed header line with no colon");
            continue;
        };
        let name = line[..colon].trim();
        let value = line[colon + 1..].trim();

        let overridden = overrides.and_then(|map| map.iter().find(|(n, _)| eq(n, name)).map(|(_, f)| f(value)));
        let parsed = overridden.unwrap_or_else(|| dispatch_header(name, value));

        match parsed {
            Ok(header) => headers.add_header(header),
            Err(err) => tracing::warn!(name, %err, "discarding unparseable header"),
        }
    }
    headers
}

/// The built-in name-to-type dispatch. `SHORT_NAME` is only ever referenced
/// for headers that actually override it — [`HeaderParse::SHORT_NAME`]'s
/// default panics at compile time for any type that doesn't.
fn dispatch_header(name: &str, value: &str) -> Result<Header> {
    let mut scanner = Scanner::new(value.as_bytes());
    if eq(name, To::NAME) || eq(name, To::SHORT_NAME) {
        Ok(Header::To(To::parse(&mut scanner)?))
    } else if eq(name, From::NAME) || eq(name, From::SHORT_NAME) {
        Ok(Header::From(From::parse(&mut scanner)?))
    } else if eq(name, Contact::NAME) || eq(name, Contact::SHORT_NAME) {
        Ok(Header::Contact(Contact::parse(&mut scanner)?))
    } else if eq(name, CallId::NAME) || eq(name, CallId::SHORT_NAME) {
        Ok(Header::CallId(CallId::parse(&mut scanner)?))
    } else if eq(name, CSeq::NAME) {
        Ok(Header::CSeq(CSeq::parse(&mut scanner)?))
    } else if eq(name, MaxForwards::NAME) {
        Ok(Header::MaxForwards(MaxForwards::parse(&mut scanner)?))
    } else if eq(name, ContentLength::NAME) || eq(name, ContentLength::SHORT_NAME) {
        Ok(Header::ContentLength(ContentLength::parse(&mut scanner)?))
    } else if eq(name, Via::NAME) || eq(name, Via::SHORT_NAME) {
        Ok(Header::Via(Via::parse(&mut scanner)?))
    } else if eq(name, Require::NAME) {
        Ok(Header::Require(Require::parse(&mut scanner)?))
    } else if eq(name, Supported::NAME) || eq(name, Supported::SHORT_NAME) {
        Ok(Header::Supported(Supported::parse(&mut scanner)?))
    } else if eq(name, ProxyRequire::NAME) {
        Ok(Header::ProxyRequire(ProxyRequire::parse(&mut scanner)?))
    } else if eq(name, Unsupported::NAME) {
        Ok(Header::Unsupported(Unsupported::parse(&mut scanner)?))
    } else if eq(name, Expires::NAME) {
        Ok(Header::Expires(Expires::parse(&mut scanner)?))
    } else if eq(name, ContentType::NAME) || eq(name, ContentType::SHORT_NAME) {
        Ok(Header::ContentType(ContentType::parse(&mut scanner)?))
    } else if eq(name, Allow::NAME) {
        Ok(Header::Allow(Allow::parse(&mut scanner)?))
    } else if eq(name, UserAgent::NAME) {
        Ok(Header::UserAgent(UserAgent::parse(&mut scanner)?))
    } else {
        Ok(Header::Generic(GenericHeader {
            name: name.to_owned(),
            value: value.to_owned(),
        }))
    }
}

/// `To`, `From`, and `Content-Length` may each appear at most once; RFC 3261
/// never defines a comma-joined meaning for them the way it does for most
/// other headers.
fn check_singleton_headers(headers: &Headers) -> Result<()> {
    for name in [To::NAME, From::NAME, ContentLength::NAME] {
        if headers.headers(name).count() > 1 {
            return Err(parse_err(format!("message has more than one '{name}' header")));
        }
    }
    Ok(())
}

fn content_length(headers: &Headers) -> Option<u32> {
    headers.all_headers().find_map(|h| match h {
        Header::ContentLength(cl) => Some(cl.value()),
        _ => None,
    })
}

/// Parses exactly one complete message out of `input`: a start line, a
/// header block terminated by a blank line, and a body that is whatever
/// bytes remain (truncated to `Content-Length`, if present). Suited to a
/// transport where one read already delivers one whole message, e.g. a UDP
/// datagram.
pub fn parse_message(input: &[u8]) -> Result<Message> {
    let mut scanner = Scanner::new(input);
    let start_line = std::str::from_utf8(scanner.read_line()?)?;
    let start = parse_start_line(start_line)?;

    let mut raw_lines = Vec::new();
    loop {
        let line = scanner.read_line()?;
        if line.is_empty() {
            break;
        }
        raw_lines.push(line.to_vec());
    }
    let headers = parse_header_block(join_header_lines(raw_lines), None);
    check_singleton_headers(&headers)?;

    let body = match content_length(&headers) {
        Some(len) => {
            let remaining = scanner.remaining();
            if len as usize > remaining.len() {
                return Err(parse_err("Content-Length exceeds the bytes available to parse_message"));
            }
            remaining[..len as usize].to_vec()
        }
        None => scanner.remaining().to_vec(),
    };

    Ok(build_message(start, headers, body))
}

/// A streamed parser for a byte-oriented transport. Bytes arrive through
/// [`write`](StreamingParser::write) in whatever chunks the transport
/// happens to hand over; parsed messages and parse errors are delivered on
/// two independent channels so a caller can drain one without blocking on
/// the other.
///
/// Internally this is an elastic buffer plus a parsing loop, each running
/// as its own task and talking over channels — the same one-task-per-job
/// shape the transaction layer uses for its retransmit timers, rather than
/// a parser object callers drive by hand.
pub struct StreamingParser {
    buffer: Arc<ElasticBuffer>,
    messages_rx: Mutex<Option<mpsc::Receiver<Message>>>,
    errors_rx: Mutex<Option<mpsc::Receiver<Error>>>,
    overrides: Arc<Mutex<HashMap<String, HeaderParserFn>>>,
}

impl StreamingParser {
    /// Creates a streaming parser and starts its background parsing loop.
    pub fn new() -> Self {
        let buffer = Arc::new(ElasticBuffer::new());
        let (messages_tx, messages_rx) = mpsc::channel(32);
        let (errors_tx, errors_rx) = mpsc::channel(8);
        let overrides: Arc<Mutex<HashMap<String, HeaderParserFn>>> = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(Self::run(buffer.clone(), messages_tx, errors_tx, overrides.clone()));

        Self {
            buffer,
            messages_rx: Mutex::new(Some(messages_rx)),
            errors_rx: Mutex::new(Some(errors_rx)),
            overrides,
        }
    }

    /// Queues `bytes` for parsing. Returns the number of bytes accepted and,
    /// if the parser has already hit a terminal framing error, that same
    /// error again — once set, it's sticky, and no further bytes are
    /// accepted.
    pub async fn write(&self, bytes: &[u8]) -> (usize, Option<Error>) {
        match self.buffer.write(bytes.to_vec()).await {
            Ok(()) => (bytes.len(), None),
            Err(err) => (0, Some(err)),
        }
    }

    /// Takes the channel parsed messages are delivered on. Can only be taken
    /// once; a second call panics.
    pub fn messages(&self) -> mpsc::Receiver<Message> {
        self.messages_rx.lock().expect("lock poisoned").take().expect("messages channel already taken")
    }

    /// Takes the channel terminal parse errors are delivered on. Can only be
    /// taken once; a second call panics.
    pub fn errors(&self) -> mpsc::Receiver<Error> {
        self.errors_rx.lock().expect("lock poisoned").take().expect("errors channel already taken")
    }

    /// Installs a parser for `name` that bypasses the built-in dispatch,
    /// e.g. to keep a vendor extension header structured instead of falling
    /// back to [`Header::Generic`].
    pub fn set_header_parser(&self, name: impl Into<String>, parser: HeaderParserFn) {
        self.overrides.lock().expect("lock poisoned").insert(name.into(), parser);
    }

    /// Stops the background tasks and unblocks any pending read, which
    /// fails with [`Error::BufferStopped`].
    pub fn stop(&self) {
        self.buffer.stop();
    }

    async fn run(
        buffer: Arc<ElasticBuffer>,
        messages_tx: mpsc::Sender<Message>,
        errors_tx: mpsc::Sender<Error>,
        overrides: Arc<Mutex<HashMap<String, HeaderParserFn>>>,
    ) {
        loop {
            match Self::read_one_message(&buffer, &overrides).await {
                Ok(message) => {
                    if messages_tx.send(message).await.is_err() {
                        return;
                    }
                }
                Err(Error::BufferStopped) => return,
                Err(err) => {
                    let _ = errors_tx.send(err).await;
                    buffer.stop();
                    return;
                }
            }
        }
    }

    async fn read_one_message(buffer: &ElasticBuffer, overrides: &Mutex<HashMap<String, HeaderParserFn>>) -> Result<Message> {
        let start_bytes = buffer.next_line().await?;
        let start_line = std::str::from_utf8(&start_bytes)?;
        let start = parse_start_line(start_line)?;

        let mut raw_lines = Vec::new();
        loop {
            let line = buffer.next_line().await?;
            if line.is_empty() {
                break;
            }
            raw_lines.push(line);
        }

        let headers = {
            let guard = overrides.lock().expect("lock poisoned");
            parse_header_block(join_header_lines(raw_lines), Some(&guard))
        };
        check_singleton_headers(&headers)?;

        let len = content_length(&headers).ok_or_else(|| parse_err("streamed message has no Content-Length header"))?;
        let body = buffer.next_chunk(len as usize).await?;

        Ok(build_message(start, headers, body))
    }
}

impl Default for StreamingParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A line/chunk-oriented byte queue: `write` appends, `next_line`/
/// `next_chunk` each block until enough bytes have arrived or the buffer is
/// stopped. Owns a background task so multiple concurrent readers never
/// race on the same lock by hand — each request is a single message round
/// trip over a channel.
mod elastic_buffer {
    use std::collections::VecDeque;

    use tokio::sync::{mpsc, oneshot, watch};

    use crate::error::{Error, Result};

    enum Request {
        Line(oneshot::Sender<Result<Vec<u8>>>),
        Chunk(usize, oneshot::Sender<Result<Vec<u8>>>),
    }

    pub(super) struct ElasticBuffer {
        writes: mpsc::Sender<Vec<u8>>,
        requests: mpsc::Sender<Request>,
        stop: watch::Sender<bool>,
    }

    impl ElasticBuffer {
        pub(super) fn new() -> Self {
            let (writes_tx, writes_rx) = mpsc::channel(64);
            let (requests_tx, requests_rx) = mpsc::channel(64);
            let (stop_tx, stop_rx) = watch::channel(false);
            tokio::spawn(run(writes_rx, requests_rx, stop_rx));
            Self {
                writes: writes_tx,
                requests: requests_tx,
                stop: stop_tx,
            }
        }

        pub(super) async fn write(&self, bytes: Vec<u8>) -> Result<()> {
            self.writes.send(bytes).await.map_err(|_| Error::BufferStopped)
        }

        pub(super) async fn next_line(&self) -> Result<Vec<u8>> {
            let (tx, rx) = oneshot::channel();
            self.requests.send(Request::Line(tx)).await.map_err(|_| Error::BufferStopped)?;
            rx.await.map_err(|_| Error::BufferStopped)?
        }

        pub(super) async fn next_chunk(&self, n: usize) -> Result<Vec<u8>> {
            if n == 0 {
                return Ok(Vec::new());
            }
            let (tx, rx) = oneshot::channel();
            self.requests.send(Request::Chunk(n, tx)).await.map_err(|_| Error::BufferStopped)?;
            rx.await.map_err(|_| Error::BufferStopped)?
        }

        pub(super) fn stop(&self) {
            let _ = self.stop.send(true);
        }
    }

    fn find_crlf(data: &mut VecDeque<u8>) -> Option<usize> {
        data.make_contiguous().windows(2).position(|w| w == b"\r\n")
    }

    /// Tries to answer `req` from `data`. Returns the request back if there
    /// isn't enough data yet and the buffer hasn't been stopped — the
    /// caller re-queues it and waits for more bytes.
    fn try_resolve(data: &mut VecDeque<u8>, req: Request, stopped: bool) -> Option<Request> {
        match req {
            Request::Line(tx) => match find_crlf(data) {
                Some(pos) => {
                    let line: Vec<u8> = data.drain(..pos).collect();
                    data.drain(..2);
                    let _ = tx.send(Ok(line));
                    None
                }
                None if stopped => {
                    let _ = tx.send(Err(Error::BufferStopped));
                    None
                }
                None => Some(Request::Line(tx)),
            },
            Request::Chunk(n, tx) => {
                if data.len() >= n {
                    let chunk: Vec<u8> = data.drain(..n).collect();
                    let _ = tx.send(Ok(chunk));
                    None
                } else if stopped {
                    let _ = tx.send(Err(Error::BufferStopped));
                    None
                } else {
                    Some(Request::Chunk(n, tx))
                }
            }
        }
    }

    async fn run(mut writes_rx: mpsc::Receiver<Vec<u8>>, mut requests_rx: mpsc::Receiver<Request>, mut stop_rx: watch::Receiver<bool>) {
        let mut data: VecDeque<u8> = VecDeque::new();
        let mut pending: VecDeque<Request> = VecDeque::new();
        let mut stopped = false;

        loop {
            while let Some(req) = pending.pop_front() {
                match try_resolve(&mut data, req, stopped) {
                    Some(unresolved) => {
                        pending.push_front(unresolved);
                        break;
                    }
                    None => continue,
                }
            }

            if stopped && pending.is_empty() {
                return;
            }

            tokio::select! {
                changed = stop_rx.changed() => {
                    match changed {
                        Ok(()) if *stop_rx.borrow() => stopped = true,
                        Ok(()) => {}
                        Err(_) => return,
                    }
                }
                chunk = writes_rx.recv() => {
                    match chunk {
                        Some(bytes) => data.extend(bytes),
                        None => stopped = true,
                    }
                }
                req = requests_rx.recv() => {
                    match req {
                        Some(req) => pending.push_back(req),
                        None => return,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::ContactValue;
    use crate::message::NameAddr;

    const INVITE: &[u8] = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
Max-Forwards: 70\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
Content-Type: application/sdp\r\n\
Content-Length: 3\r\n\
\r\n\
v=0";

    #[test]
    fn parses_request_line_headers_and_body() {
        let msg = parse_message(INVITE).unwrap();
        let Message::Request { method, recipient, headers, body, .. } = &msg else {
            panic!("expected a request");
        };
        assert_eq!(*method, Method::Invite);
        assert_eq!(recipient.to_string(), "sip:bob@biloxi.com");
        assert_eq!(body, b"v=0");
        assert!(matches!(headers.headers("Via").next(), Some(Header::Via(_))));
        assert!(matches!(headers.headers("t").next(), Some(Header::To(_))));
    }

    #[test]
    fn rejects_wildcard_request_uri() {
        let bytes = b"INVITE * SIP/2.0\r\nContent-Length: 0\r\n\r\n";
        let err = parse_message(bytes).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn parses_status_line_with_multiword_reason() {
        let bytes = b"SIP/2.0 488 Not Acceptable Here\r\nContent-Length: 0\r\n\r\n";
        let msg = parse_message(bytes).unwrap();
        let Message::Response { status_code, reason, .. } = &msg else {
            panic!("expected a response");
        };
        assert_eq!(status_code.as_u16(), 488);
        assert_eq!(reason, "Not Acceptable Here");
    }

    #[test]
    fn joins_header_continuation_lines() {
        let bytes = b"SIP/2.0 200 OK\r\nSubject: I know\r\n  you're there,\r\n pick up the phone\r\nContent-Length: 0\r\n\r\n";
        let msg = parse_message(bytes).unwrap();
        let subject = msg.headers().headers("Subject").next().unwrap();
        assert_eq!(subject.to_string(), "Subject: I know you're there, pick up the phone");
    }

    #[test]
    fn discards_leading_continuation_with_nothing_to_attach_to() {
        let bytes = b"SIP/2.0 200 OK\r\n orphaned continuation\r\nContent-Length: 0\r\n\r\n";
        let msg = parse_message(bytes).unwrap();
        assert_eq!(msg.headers().len(), 1);
    }

    #[test]
    fn drops_an_individually_unparseable_header_but_keeps_the_rest() {
        let bytes = b"SIP/2.0 200 OK\r\nCSeq: not-a-number INVITE\r\nContent-Length: 0\r\n\r\n";
        let msg = parse_message(bytes).unwrap();
        assert!(msg.headers().headers("CSeq").next().is_none());
    }

    #[test]
    fn unknown_headers_become_generic() {
        let bytes = b"SIP/2.0 200 OK\r\nX-Custom: value\r\nContent-Length: 0\r\n\r\n";
        let msg = parse_message(bytes).unwrap();
        let header = msg.headers().headers("X-Custom").next().unwrap();
        assert!(matches!(header, Header::Generic(_)));
    }

    #[test]
    fn rejects_duplicate_to_headers() {
        let bytes = b"SIP/2.0 200 OK\r\nTo: <sip:a@b.com>\r\nTo: <sip:c@d.com>\r\nContent-Length: 0\r\n\r\n";
        let err = parse_message(bytes).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn contact_wildcard_round_trips() {
        let bytes = b"REGISTER sip:registrar.biloxi.com SIP/2.0\r\nContact: *\r\nContent-Length: 0\r\n\r\n";
        let msg = parse_message(bytes).unwrap();
        let contact = msg.headers().headers("Contact").next().unwrap();
        assert!(matches!(contact, Header::Contact(Contact::Star)));
    }

    #[test]
    fn body_is_truncated_to_content_length_when_extra_bytes_trail() {
        let bytes = b"SIP/2.0 200 OK\r\nContent-Length: 2\r\n\r\nhiextragarbage";
        let msg = parse_message(bytes).unwrap();
        assert_eq!(msg.body(), b"hi");
    }

    #[test]
    fn missing_crlf_crlf_is_a_parse_error() {
        let bytes = b"SIP/2.0 200 OK\r\nContent-Length: 0\r\n";
        assert!(parse_message(bytes).is_err());
    }

    #[tokio::test]
    async fn streamed_parser_delivers_a_message_written_in_one_shot() {
        let parser = StreamingParser::new();
        let mut messages = parser.messages();

        let (n, err) = parser.write(INVITE).await;
        assert_eq!(n, INVITE.len());
        assert!(err.is_none());

        let msg = messages.recv().await.unwrap();
        assert!(msg.is_request());
        assert_eq!(msg.body(), b"v=0");
    }

    #[tokio::test]
    async fn streamed_parser_reassembles_a_message_split_across_writes() {
        let parser = StreamingParser::new();
        let mut messages = parser.messages();

        for chunk in INVITE.chunks(7) {
            parser.write(chunk).await;
        }

        let msg = messages.recv().await.unwrap();
        assert!(msg.is_request());
    }

    #[tokio::test]
    async fn streamed_parser_raises_a_terminal_error_without_content_length() {
        let parser = StreamingParser::new();
        let mut errors = parser.errors();

        parser.write(b"SIP/2.0 200 OK\r\nTo: <sip:a@b.com>\r\n\r\n").await;

        let err = errors.recv().await.unwrap();
        assert!(matches!(err, Error::Parse(_)));

        let (_, sticky) = parser.write(b"more bytes after the stop").await;
        assert!(matches!(sticky, Some(Error::BufferStopped)));
    }

    #[tokio::test]
    async fn set_header_parser_overrides_the_built_in_dispatch() {
        let parser = StreamingParser::new();
        let mut messages = parser.messages();
        parser.set_header_parser(
            "X-Trace",
            Arc::new(|value: &str| {
                Ok(Header::Generic(GenericHeader {
                    name: "X-Trace".to_owned(),
                    value: format!("seen:{value}"),
                }))
            }),
        );

        parser.write(b"SIP/2.0 200 OK\r\nX-Trace: abc\r\nContent-Length: 0\r\n\r\n").await;

        let msg = messages.recv().await.unwrap();
        let header = msg.headers().headers("X-Trace").next().unwrap();
        assert_eq!(header.to_string(), "X-Trace: seen:abc");
    }

    #[test]
    fn name_addr_uri_round_trip_sanity() {
        let addr: NameAddr = NameAddr {
            display: None,
            uri: "sip:bob@biloxi.com".parse().unwrap(),
        };
        assert_eq!(addr.uri.to_string(), "sip:bob@biloxi.com");
        let _ = ContactValue {
            addr,
            q: None,
            expires: None,
            params: Default::default(),
        };
    }
}

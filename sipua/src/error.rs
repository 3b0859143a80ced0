use std::fmt;
use std::str::Utf8Error;

use thiserror::Error;

/// The crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A parse failure, carrying a message and the position it occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipParserError {
    /// Description of what went wrong.
    pub message: String,
}

impl SipParserError {
    /// Builds a new parse error from anything stringlike.
    pub fn new(s: impl AsRef<str>) -> Self {
        Self {
            message: s.as_ref().to_owned(),
        }
    }
}

impl fmt::Display for SipParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SipParserError {}

impl From<&str> for SipParserError {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SipParserError {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Utf8Error> for SipParserError {
    fn from(value: Utf8Error) -> Self {
        SipParserError {
            message: format!("invalid utf-8: {value}"),
        }
    }
}

impl From<sipua_util::ScanError> for SipParserError {
    fn from(err: sipua_util::ScanError) -> Self {
        SipParserError {
            message: format!("{err}"),
        }
    }
}

/// The crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A message, header, or URI failed to parse.
    #[error(transparent)]
    Parse(#[from] SipParserError),

    /// A request/response was missing a header required by RFC 3261 §8.1.1.
    #[error("missing required '{0}' header")]
    MissingRequiredHeader(&'static str),

    /// Transport I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An internal channel (elastic buffer, transaction completion signal,
    /// ...) was closed while a send/receive was in flight.
    #[error("channel closed")]
    ChannelClosed,

    /// A streamed parser's elastic buffer was stopped while a `NextLine`/
    /// `NextChunk` read was still blocked waiting for more bytes.
    #[error("elastic buffer stopped while a read was pending")]
    BufferStopped,

    /// `Transport::send` failed to deliver a message.
    #[error("transport send failed: {0}")]
    TransportError(String),

    /// No transaction matched an incoming response or ACK.
    #[error("no matching transaction for incoming message")]
    NoMatchingTransaction,

    /// A state referenced a successor state index that doesn't exist.
    #[error("fsm state '{0}' has an out-of-range successor index")]
    FsmDefine(&'static str),

    /// `Fsm::spin` was called with an input that has no transition defined
    /// for the current state.
    #[error("no transition defined for state '{state}' on this input")]
    FsmNoTransition {
        /// The state that had no matching outcome.
        state: &'static str,
    },

    /// A user-driven operation (`Ack`, `Cancel`) was attempted outside the
    /// transaction states RFC 3261 permits it in.
    #[error("operation not permitted while the transaction is {state}")]
    InvalidTransactionState {
        /// The transaction's state at the time of the call, rendered via
        /// its `Display` impl.
        state: String,
    },
}

impl From<sipua_util::ScanError> for Error {
    fn from(err: sipua_util::ScanError) -> Self {
        Error::Parse(err.into())
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Error::Parse(err.into())
    }
}

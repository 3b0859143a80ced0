//! # sipua
//!
//! A SIP (RFC 3261) user-agent library: message codec, a generic
//! finite-state-machine engine, and the client/server transaction layer
//! built on top of it.
//!
//! The transport layer (actual UDP/TCP sockets), the dialog layer,
//! authentication, the registrar, and SDP are out of scope — this crate
//! consumes a [`transport::Transport`] abstraction and goes no higher than
//! transactions.

pub mod error;
pub mod fsm;
pub mod headers;
pub mod macros;
pub mod message;
pub mod parser;
pub mod transaction;
pub mod transport;

pub use error::{Error, Result};

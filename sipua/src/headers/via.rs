use core::fmt;

use itertools::Itertools;
use sipua_util::Scanner;

use super::{parse_params, HeaderParse};
use crate::error::Result;
use crate::message::{parse_host_port, HostPort, MaybeString, Params, TransportProtocol};

/// One `via-parm` of a `Via` header: `sent-protocol LWS sent-by *(SEMI via-params)`.
///
/// `branch`/`received`/`maddr`/`ttl`/`rport` are the well-known parameters
/// singled out by RFC 3261 §20.42; anything else stays in `params`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ViaHop {
    /// The protocol name, normally `"SIP"`.
    pub protocol_name: String,
    /// The protocol version, normally `"2.0"`.
    pub protocol_version: String,
    /// The transport this hop was sent over.
    pub transport: TransportProtocol,
    /// The host (and optional port) the response should be routed back to.
    pub sent_by: HostPort,
    /// Every `;name[=value]` parameter on this hop, including the
    /// well-known ones exposed by the accessors below.
    pub params: Params,
}

impl ViaHop {
    /// Creates a new `SIP/2.0` hop with no parameters.
    pub fn new(transport: TransportProtocol, sent_by: HostPort) -> Self {
        Self {
            protocol_name: "SIP".to_owned(),
            protocol_version: "2.0".to_owned(),
            transport,
            sent_by,
            params: Params::new(),
        }
    }

    /// The `branch` parameter, which correlates requests to transactions.
    pub fn branch(&self) -> Option<&str> {
        self.params.get("branch").and_then(MaybeString::as_str)
    }

    /// Sets the `branch` parameter.
    pub fn set_branch(&mut self, branch: impl Into<String>) {
        self.params.set("branch", MaybeString::from(branch.into()));
    }

    /// The `received` parameter, set by the last server that received the
    /// request over an unreliable transport.
    pub fn received(&self) -> Option<&str> {
        self.params.get("received").and_then(MaybeString::as_str)
    }

    /// The `maddr` parameter (multicast address).
    pub fn maddr(&self) -> Option<&str> {
        self.params.get("maddr").and_then(MaybeString::as_str)
    }

    /// The `ttl` parameter.
    pub fn ttl(&self) -> Option<u8> {
        self.params.get("ttl").and_then(MaybeString::as_str).and_then(|s| s.parse().ok())
    }

    /// The `rport` parameter, present (possibly empty) when the client
    /// requested symmetric response routing (RFC 3581).
    pub fn rport(&self) -> Option<u16> {
        self.params.get("rport").and_then(MaybeString::as_str).and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for ViaHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} {}{}",
            self.protocol_name, self.protocol_version, self.transport, self.sent_by, self.params
        )
    }
}

/// The `Via` header: the path a request took, used to route responses back
/// along the same path (RFC 3261 §20.42). A single header line may carry
/// more than one hop, comma-separated.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Via(pub Vec<ViaHop>);

impl Via {
    /// Creates a `Via` header from a list of hops.
    pub fn new(hops: impl IntoIterator<Item = ViaHop>) -> Self {
        Self(hops.into_iter().collect())
    }

    /// The topmost hop — the one closest to the sender.
    pub fn first(&self) -> Option<&ViaHop> {
        self.0.first()
    }

    /// All hops, in wire order.
    pub fn hops(&self) -> &[ViaHop] {
        &self.0
    }
}

impl<'a> HeaderParse<'a> for Via {
    const NAME: &'static str = "Via";
    const SHORT_NAME: &'static str = "v";

    /// `Via = ( "Via" / "v" ) HCOLON via-parm *(COMMA via-parm)`
    /// `via-parm = sent-protocol LWS sent-by *( SEMI via-params )`
    /// `sent-protocol = protocol-name SLASH protocol-version SLASH transport`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        let mut hops = Vec::new();
        loop {
            scanner.skip_ws();
            let protocol_name = scanner.take_while(|b| b.is_ascii_alphabetic());
            if protocol_name.is_empty() {
                return Err(scanner.err("expected a protocol name").into());
            }
            if !scanner.take(b'/') {
                return Err(scanner.err("expected '/' after the protocol name").into());
            }
            let protocol_version = scanner.take_while(|b| b.is_ascii_digit() || b == b'.');
            if protocol_version.is_empty() {
                return Err(scanner.err("expected a protocol version").into());
            }
            if !scanner.take(b'/') {
                return Err(scanner.err("expected '/' before transport").into());
            }
            let transport_tok = scanner.take_while(|b| b.is_ascii_alphabetic());
            if transport_tok.is_empty() {
                return Err(scanner.err("expected a non-empty transport").into());
            }
            let transport = TransportProtocol::from(transport_tok);

            scanner.skip_ws();
            let sent_by = parse_host_port(scanner)?;
            let params = parse_params(scanner)?;

            hops.push(ViaHop {
                protocol_name: std::str::from_utf8(protocol_name)?.to_owned(),
                protocol_version: std::str::from_utf8(protocol_version)?.to_owned(),
                transport,
                sent_by,
                params,
            });

            scanner.skip_ws();
            if !scanner.take(b',') {
                break;
            }
        }
        Ok(Via(hops))
    }
}

impl fmt::Display for Via {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", Via::NAME, self.0.iter().format(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_hop_with_received() {
        let mut scanner = Scanner::new(b"SIP/2.0/UDP bobspc.biloxi.com:5060;received=192.0.2.4");
        let via = Via::parse(&mut scanner).unwrap();

        let hop = via.first().unwrap();
        assert_eq!(hop.transport, TransportProtocol::Udp);
        assert_eq!(hop.sent_by, HostPort::new("bobspc.biloxi.com", Some(5060)));
        assert_eq!(hop.received(), Some("192.0.2.4"));
        assert_eq!(hop.protocol_name, "SIP");
        assert_eq!(hop.protocol_version, "2.0");
    }

    #[test]
    fn rejects_empty_transport() {
        let mut scanner = Scanner::new(b"SIP/2.0/ bobspc.biloxi.com:5060");
        assert!(Via::parse(&mut scanner).is_err());
    }

    #[test]
    fn preserves_a_nonstandard_protocol_version() {
        let mut scanner = Scanner::new(b"SIP/2.1/UDP bobspc.biloxi.com:5060");
        let via = Via::parse(&mut scanner).unwrap();
        let hop = via.first().unwrap();
        assert_eq!(hop.protocol_version, "2.1");
        assert_eq!(hop.to_string(), "SIP/2.1/UDP bobspc.biloxi.com:5060");
    }

    #[test]
    fn parses_branch_and_ipv4_sent_by() {
        let mut scanner = Scanner::new(b"SIP/2.0/UDP 192.0.2.1:5060;received=192.0.2.207;branch=z9hG4bK77asjd");
        let via = Via::parse(&mut scanner).unwrap();

        let hop = via.first().unwrap();
        assert_eq!(hop.sent_by, HostPort::new("192.0.2.1", Some(5060)));
        assert_eq!(hop.branch(), Some("z9hG4bK77asjd"));
    }
}

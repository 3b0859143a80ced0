use core::fmt;

use sipua_util::Scanner;

use super::{parse_params, HeaderParse, TAG_PARAM};
use crate::error::Result;
use crate::message::{parse_name_addr_or_uri, MaybeString, NameAddr, Params};

/// The `From` header: the logical initiator of the request (RFC 3261 §20.20).
///
/// # Examples
/// ```
/// # use sipua::headers::From;
/// # use sipua::message::{NameAddr, Uri, SipUri};
/// let addr = NameAddr { display: None, uri: Uri::Sip(SipUri::new("client.atlanta.example.com", None).with_user("alice")) };
/// assert_eq!(From::new(addr).to_string(), "From: <sip:alice@client.atlanta.example.com>");
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct From {
    addr: NameAddr,
    params: Params,
}

impl From {
    /// Creates a new `From` header with no parameters.
    pub fn new(addr: NameAddr) -> Self {
        Self {
            addr,
            params: Params::new(),
        }
    }

    /// The addressed URI (and optional display name).
    pub fn addr(&self) -> &NameAddr {
        &self.addr
    }

    /// The `tag` parameter, which identifies this leg of a dialog.
    pub fn tag(&self) -> Option<&str> {
        self.params.get(TAG_PARAM).and_then(MaybeString::as_str)
    }

    /// Sets the `tag` parameter.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.params.set(TAG_PARAM, MaybeString::from(tag.into()));
    }

    /// Every other parameter besides `tag`.
    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl<'a> HeaderParse<'a> for From {
    const NAME: &'static str = "From";
    const SHORT_NAME: &'static str = "f";

    /// `From = ( "From" / "f" ) HCOLON ( name-addr / addr-spec ) *( SEMI from-param )`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        let addr = parse_name_addr_or_uri(scanner)?;
        if addr.uri.is_wildcard() {
            return Err(scanner.err("From must not be the wildcard '*'").into());
        }
        let params = parse_params(scanner)?;
        Ok(From { addr, params })
    }
}

impl fmt::Display for From {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}{}", From::NAME, self.addr, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_display_name() {
        let mut scanner = Scanner::new(b"\"A. G. Bell\" <sip:agb@bell-telephone.com>;tag=a48s");
        let from = From::parse(&mut scanner).unwrap();

        assert_eq!(from.addr().display.as_deref(), Some("A. G. Bell"));
        assert_eq!(from.addr().uri.as_sip_uri().unwrap().host_port.host, "bell-telephone.com");
        assert_eq!(from.tag(), Some("a48s"));
    }

    #[test]
    fn parses_bare_uri_with_tag() {
        let mut scanner = Scanner::new(b"sip:+12125551212@server.phone2net.com;tag=887s");
        let from = From::parse(&mut scanner).unwrap();
        assert!(from.addr().display.is_none());
        assert_eq!(from.tag(), Some("887s"));
    }

    #[test]
    fn rejects_wildcard() {
        let mut scanner = Scanner::new(b"*");
        assert!(From::parse(&mut scanner).is_err());
    }
}

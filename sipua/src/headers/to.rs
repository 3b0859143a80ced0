use core::fmt;

use sipua_util::Scanner;

use super::{parse_params, HeaderParse, TAG_PARAM};
use crate::error::Result;
use crate::message::{parse_name_addr_or_uri, MaybeString, NameAddr, Params};

/// The `To` header: the logical recipient of the request (RFC 3261 §20.39).
///
/// # Examples
/// ```
/// # use sipua::headers::To;
/// # use sipua::message::{NameAddr, Uri, SipUri};
/// let addr = NameAddr { display: None, uri: Uri::Sip(SipUri::new("client.atlanta.example.com", None).with_user("alice")) };
/// assert_eq!(To::new(addr).to_string(), "To: <sip:alice@client.atlanta.example.com>");
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct To {
    addr: NameAddr,
    params: Params,
}

impl To {
    /// Creates a new `To` header with no parameters.
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

impl<'a> HeaderParse<'a> for To {
    const NAME: &'static str = "To";
    const SHORT_NAME: &'static str = "t";

    /// `To = ( "To" / "t" ) HCOLON ( name-addr / addr-spec ) *( SEMI to-param )`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        let addr = parse_name_addr_or_uri(scanner)?;
        if addr.uri.is_wildcard() {
            return Err(scanner.err("To must not be the wildcard '*'").into());
        }
        let params = parse_params(scanner)?;
        Ok(To { addr, params })
    }
}

impl fmt::Display for To {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}{}", To::NAME, self.addr, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_addr_with_tag() {
        let mut scanner = Scanner::new(b"Bob <sip:bob@biloxi.com>;tag=a6c85cf");
        let to = To::parse(&mut scanner).unwrap();

        assert_eq!(to.addr().display.as_deref(), Some("Bob"));
        assert_eq!(to.addr().uri.as_sip_uri().unwrap().host_port.host, "biloxi.com");
        assert_eq!(to.tag(), Some("a6c85cf"));
    }

    #[test]
    fn parses_bare_addr_spec() {
        let mut scanner = Scanner::new(b"sip:bob@biloxi.com");
        let to = To::parse(&mut scanner).unwrap();
        assert!(to.addr().display.is_none());
        assert!(to.tag().is_none());
    }

    #[test]
    fn rejects_wildcard() {
        let mut scanner = Scanner::new(b"*");
        assert!(To::parse(&mut scanner).is_err());
    }
}

use core::fmt;

use itertools::Itertools;
use sipua_util::Scanner;

use super::{parse_params, HeaderParse};
use crate::error::Result;
use crate::message::{parse_name_addr_or_uri, NameAddr, Params};

/// One entry of a `Contact` header's comma-separated address list.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ContactValue {
    /// The contact URI (and optional display name).
    pub addr: NameAddr,
    /// The `q` (preference) parameter, if present.
    pub q: Option<String>,
    /// The `expires` parameter, if present.
    pub expires: Option<u32>,
    /// Any other parameters.
    pub params: Params,
}

impl fmt::Display for ContactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)?;
        if let Some(q) = &self.q {
            write!(f, ";q={q}")?;
        }
        if let Some(expires) = self.expires {
            write!(f, ";expires={expires}")?;
        }
        write!(f, "{}", self.params)
    }
}

/// The `Contact` header: a URI the caller can be reached at, or the `*`
/// wildcard used in a `REGISTER` to remove all bindings (RFC 3261 §20.10).
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Contact {
    /// `Contact: *`
    Star,
    /// One or more contact addresses.
    Addrs(Vec<ContactValue>),
}

impl Contact {
    /// Creates a `Contact` with a single address and no parameters.
    pub fn new(addr: NameAddr) -> Self {
        Contact::Addrs(vec![ContactValue {
            addr,
            q: None,
            expires: None,
            params: Params::new(),
        }])
    }
}

impl<'a> HeaderParse<'a> for Contact {
    const NAME: &'static str = "Contact";
    const SHORT_NAME: &'static str = "m";

    /// `Contact = ("Contact" / "m") HCOLON (STAR / (contact-param *(COMMA contact-param)))`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        scanner.skip_ws();
        if scanner.peek() == Some(b'*') {
            scanner.advance();
            scanner.skip_ws();
            if !scanner.is_eof() {
                return Err(scanner.err("unexpected characters after Contact wildcard").into());
            }
            return Ok(Contact::Star);
        }

        let mut values = Vec::new();
        loop {
            let addr = parse_name_addr_or_uri(scanner)?;
            let mut params = parse_params(scanner)?;
            let q = params.remove("q").and_then(|v| v.as_str().map(str::to_owned));
            let expires = params
                .remove("expires")
                .and_then(|v| v.as_str().and_then(|s| s.parse().ok()));
            values.push(ContactValue { addr, q, expires, params });

            scanner.skip_ws();
            if !scanner.take(b',') {
                break;
            }
            scanner.skip_ws();
        }
        Ok(Contact::Addrs(values))
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", Contact::NAME)?;
        match self {
            Contact::Star => f.write_str("*"),
            Contact::Addrs(values) => write!(f, "{}", values.iter().format(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_contact_with_q_and_expires() {
        let mut scanner = Scanner::new(b"\"Mr. Watson\" <sip:watson@worcester.bell-telephone.com>;q=0.7;expires=3600");
        let contact = Contact::parse(&mut scanner).unwrap();

        match contact {
            Contact::Addrs(values) => {
                assert_eq!(values.len(), 1);
                assert_eq!(values[0].addr.display.as_deref(), Some("Mr. Watson"));
                assert_eq!(values[0].q.as_deref(), Some("0.7"));
                assert_eq!(values[0].expires, Some(3600));
            }
            Contact::Star => panic!("expected addresses"),
        }
    }

    #[test]
    fn parses_wildcard() {
        let mut scanner = Scanner::new(b"*");
        assert_eq!(Contact::parse(&mut scanner).unwrap(), Contact::Star);
    }

    #[test]
    fn parses_comma_separated_list() {
        let mut scanner = Scanner::new(b"<sip:alice@a.com>, <sip:bob@b.com>");
        match Contact::parse(&mut scanner).unwrap() {
            Contact::Addrs(values) => assert_eq!(values.len(), 2),
            Contact::Star => panic!("expected addresses"),
        }
    }

    #[test]
    fn rejects_params_trailing_the_wildcard() {
        let mut scanner = Scanner::new(b"*;foo=bar");
        assert!(Contact::parse(&mut scanner).is_err());
    }
}

use core::fmt;

use sipua_util::{is_token_char, Scanner};

use super::HeaderParse;
use crate::error::Result;

/// The `Call-ID` header: uniquely identifies a particular invitation or all
/// registrations of a particular client (RFC 3261 §20.8).
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct CallId(String);

impl CallId {
    /// Creates a new `CallId` from its identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier, without header name or surrounding whitespace.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'a> HeaderParse<'a> for CallId {
    const NAME: &'static str = "Call-ID";
    const SHORT_NAME: &'static str = "i";

    /// `Call-ID = ( "Call-ID" / "i" ) HCOLON callid`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        let id = scanner.take_while(is_token_char);
        if id.is_empty() {
            return Err(scanner.err("Call-ID must not be empty").into());
        }
        if !scanner.is_eof() {
            return Err(scanner.err("unexpected characters after Call-ID token").into());
        }
        Ok(CallId(std::str::from_utf8(id)?.to_owned()))
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", CallId::NAME, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_whole_value() {
        let mut scanner = Scanner::new(b"bs9ki9iqbee8k5kal8mpqb");
        let cid = CallId::parse(&mut scanner).unwrap();
        assert_eq!(cid.id(), "bs9ki9iqbee8k5kal8mpqb");
    }

    #[test]
    fn rejects_empty_body() {
        let mut scanner = Scanner::new(b"");
        assert!(CallId::parse(&mut scanner).is_err());
    }

    #[test]
    fn rejects_internal_whitespace() {
        let mut scanner = Scanner::new(b"abc def");
        assert!(CallId::parse(&mut scanner).is_err());
    }

    #[test]
    fn rejects_semicolon() {
        let mut scanner = Scanner::new(b"abc;def");
        assert!(CallId::parse(&mut scanner).is_err());
    }
}

use core::fmt;

use itertools::Itertools;
use sipua_util::{is_token_char, Scanner};

use super::HeaderParse;
use crate::error::Result;
use crate::message::Method;

/// The `Allow` header: the set of methods supported by the UA
/// (RFC 3261 §20.5).
///
/// # Examples
/// ```
/// # use sipua::headers::Allow;
/// # use sipua::message::Method;
/// let mut allow = Allow::new();
/// allow.push(Method::Invite);
/// allow.push(Method::Register);
/// assert_eq!(allow.to_string(), "Allow: INVITE, REGISTER");
/// ```
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct Allow(Vec<Method>);

impl Allow {
    /// Creates an empty `Allow` header.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a method.
    pub fn push(&mut self, method: Method) {
        self.0.push(method);
    }

    /// The method at `index`.
    pub fn get(&self, index: usize) -> Option<&Method> {
        self.0.get(index)
    }

    /// Number of methods listed.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if no methods are listed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> HeaderParse<'a> for Allow {
    const NAME: &'static str = "Allow";

    /// `Allow = "Allow" HCOLON [Method *(COMMA Method)]`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        let mut methods = Vec::new();
        scanner.skip_ws();
        if scanner.is_eof() {
            return Ok(Allow(methods));
        }
        loop {
            let tok = scanner.take_while(is_token_char);
            if tok.is_empty() {
                return Err(scanner.err("expected a method token").into());
            }
            methods.push(Method::from(std::str::from_utf8(tok)?));
            scanner.skip_ws();
            if !scanner.take(b',') {
                break;
            }
            scanner.skip_ws();
        }
        Ok(Allow(methods))
    }
}

impl fmt::Display for Allow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", Allow::NAME, self.0.iter().format(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_list() {
        let mut scanner = Scanner::new(b"INVITE, ACK, OPTIONS, CANCEL, BYE");
        let allow = Allow::parse(&mut scanner).unwrap();

        assert_eq!(allow.get(0), Some(&Method::Invite));
        assert_eq!(allow.get(1), Some(&Method::Ack));
        assert_eq!(allow.get(2), Some(&Method::Options));
        assert_eq!(allow.get(3), Some(&Method::Cancel));
        assert_eq!(allow.get(4), Some(&Method::Bye));
        assert_eq!(allow.get(5), None);
    }
}

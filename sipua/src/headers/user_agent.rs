use core::fmt;

use sipua_util::Scanner;

use super::HeaderParse;
use crate::error::Result;

/// The `User-Agent` header: information about the software originating a
/// request (RFC 3261 §20.41).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct UserAgent(String);

impl UserAgent {
    /// Creates a `UserAgent` header from its value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The server-val value, unparsed.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl<'a> HeaderParse<'a> for UserAgent {
    const NAME: &'static str = "User-Agent";

    /// `User-Agent = "User-Agent" HCOLON server-val *(LWS server-val)`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        let value = std::str::from_utf8(scanner.remaining())?.trim();
        Ok(UserAgent(value.to_owned()))
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", UserAgent::NAME, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_whole_value() {
        let mut scanner = Scanner::new(b"Softphone Beta1.5");
        let ua = UserAgent::parse(&mut scanner).unwrap();
        assert_eq!(ua.value(), "Softphone Beta1.5");
    }
}

use core::fmt;

use sipua_util::Scanner;

use super::HeaderParse;
use crate::error::Result;

/// The `Content-Length` header: the size, in bytes, of the message body
/// (RFC 3261 §20.14).
///
/// # Examples
/// ```
/// # use sipua::headers::ContentLength;
/// assert_eq!(ContentLength::new(3600).to_string(), "Content-Length: 3600");
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct ContentLength(u32);

impl ContentLength {
    /// Creates a new `ContentLength` from a byte count.
    pub const fn new(len: u32) -> Self {
        Self(len)
    }

    /// The body length in bytes.
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl<'a> HeaderParse<'a> for ContentLength {
    const NAME: &'static str = "Content-Length";
    const SHORT_NAME: &'static str = "l";

    /// `Content-Length = ( "Content-Length" / "l" ) HCOLON 1*DIGIT`
    fn parse(scanner: &mut Scanner<'a>) -> Result<ContentLength> {
        Ok(ContentLength(scanner.parse_u32()?))
    }
}

impl fmt::Display for ContentLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", ContentLength::NAME, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_digits() {
        let mut scanner = Scanner::new(b"349");
        assert_eq!(ContentLength::parse(&mut scanner).unwrap().value(), 349);
    }
}

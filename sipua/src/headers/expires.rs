use core::fmt;

use sipua_util::Scanner;

use super::HeaderParse;
use crate::error::Result;

/// The `Expires` header: a relative time, in seconds, after which a
/// registration, subscription, or the containing message is no longer valid
/// (RFC 3261 §20.19).
///
/// # Examples
/// ```
/// # use sipua::headers::Expires;
/// assert_eq!(Expires::new(3600).to_string(), "Expires: 3600");
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Expires(u32);

impl Expires {
    /// Creates a new `Expires` with the given delta-seconds.
    pub const fn new(expires: u32) -> Self {
        Self(expires)
    }

    /// The expiration delta in seconds.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl<'a> HeaderParse<'a> for Expires {
    const NAME: &'static str = "Expires";

    /// `Expires = "Expires" HCOLON delta-seconds`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Expires> {
        Ok(Expires(scanner.parse_u32()?))
    }
}

impl fmt::Display for Expires {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", Expires::NAME, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_digits() {
        let mut scanner = Scanner::new(b"5");
        assert_eq!(Expires::parse(&mut scanner).unwrap().as_u32(), 5);
    }
}

use std::fmt;

use sipua_util::Scanner;

use super::HeaderParse;
use crate::error::Result;

/// The `Max-Forwards` header: limits the number of proxies/gateways that may
/// forward the request (RFC 3261 §20.22).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MaxForwards(u32);

impl MaxForwards {
    /// Creates a new `MaxForwards` with the given hop count.
    pub const fn new(forwards: u32) -> Self {
        Self(forwards)
    }

    /// The remaining hop count.
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Returns a copy decremented by one, or `None` if already zero — a
    /// proxy must reject forwarding (`483 Too Many Hops`) rather than wrap.
    pub const fn decremented(&self) -> Option<Self> {
        self.0.checked_sub(1).map(MaxForwards)
    }
}

impl<'a> HeaderParse<'a> for MaxForwards {
    const NAME: &'static str = "Max-Forwards";

    /// `Max-Forwards = "Max-Forwards" HCOLON 1*DIGIT`
    fn parse(scanner: &mut Scanner<'a>) -> Result<MaxForwards> {
        Ok(MaxForwards(scanner.parse_u32()?))
    }
}

impl fmt::Display for MaxForwards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", MaxForwards::NAME, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_digits() {
        let mut scanner = Scanner::new(b"70");
        assert_eq!(MaxForwards::parse(&mut scanner).unwrap().value(), 70);
    }

    #[test]
    fn decrements_but_not_below_zero() {
        assert_eq!(MaxForwards::new(0).decremented(), None);
        assert_eq!(MaxForwards::new(1).decremented(), Some(MaxForwards::new(0)));
    }
}

use core::fmt;

use sipua_util::{is_token_char, Scanner};

use super::HeaderParse;
use crate::error::Result;
use crate::message::Method;

/// The `CSeq` header: orders transactions within a dialog and distinguishes
/// retransmissions from new requests (RFC 3261 §20.16).
///
/// # Examples
/// ```
/// # use sipua::headers::CSeq;
/// # use sipua::message::Method;
/// assert_eq!(CSeq::new(1, Method::Options).to_string(), "CSeq: 1 OPTIONS");
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CSeq {
    seq: u32,
    method: Method,
}

impl CSeq {
    /// Creates a new `CSeq`.
    pub fn new(seq: u32, method: Method) -> Self {
        Self { seq, method }
    }

    /// The sequence number.
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// The method this sequence number was issued for.
    pub fn method(&self) -> &Method {
        &self.method
    }
}

impl<'a> HeaderParse<'a> for CSeq {
    const NAME: &'static str = "CSeq";

    /// `CSeq = "CSeq" HCOLON 1*DIGIT LWS Method`
    fn parse(scanner: &mut Scanner<'a>) -> Result<CSeq> {
        let seq = scanner.parse_u32()?;
        if seq > i32::MAX as u32 {
            return Err(scanner.err("CSeq sequence number exceeds 2^31-1").into());
        }
        scanner.skip_ws();
        let method = scanner.take_while(is_token_char);
        Ok(CSeq {
            seq,
            method: Method::from(std::str::from_utf8(method)?),
        })
    }
}

impl fmt::Display for CSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", CSeq::NAME, self.seq, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seq_and_method() {
        let mut scanner = Scanner::new(b"4711 INVITE");
        let cseq = CSeq::parse(&mut scanner).unwrap();
        assert_eq!(cseq.method(), &Method::Invite);
        assert_eq!(cseq.seq(), 4711);
    }

    #[test]
    fn rejects_seq_above_2_31_minus_1() {
        let mut scanner = Scanner::new(b"4294967295 INVITE");
        assert!(CSeq::parse(&mut scanner).is_err());
    }
}

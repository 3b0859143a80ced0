//! Text scanning with the `Scanner` type.
//!
//! A small byte-cursor used by `sipua`'s header and URI grammars. It only
//! tracks a position into a borrowed buffer; every `read_*` method that
//! yields parsed data copies it out into an owned `String`, so the cursor's
//! own lifetime never leaks into the data model it feeds.

use std::fmt;

/// A line/column position inside a scanned buffer, used in parse error
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the start of the buffer.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub col: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

/// A cursor over a byte slice with one-byte lookahead.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

/// Error returned when a scan operation runs past the end of the buffer or
/// fails a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// Human-readable description.
    pub message: String,
    /// Where in the buffer the error occurred.
    pub at: Position,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.at)
    }
}

impl std::error::Error for ScanError {}

type ScanResult<T> = Result<T, ScanError>;

impl<'a> Scanner<'a> {
    /// Creates a scanner over `src`, positioned at the start.
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Current line/column, for error reporting.
    pub fn position(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    /// The unconsumed remainder of the buffer.
    pub fn remaining(&self) -> &'a [u8] {
        &self.src[self.pos.min(self.src.len())..]
    }

    /// `true` if there is nothing left to scan.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Looks at the current byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    /// Looks `n` bytes ahead without consuming.
    pub fn peek_n(&self, n: usize) -> Option<u8> {
        self.src.get(self.pos + n).copied()
    }

    /// Consumes and returns the current byte.
    pub fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    /// Consumes `n` bytes unconditionally (caller must know they exist).
    pub fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Consumes the current byte if it equals `b`.
    pub fn take(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes bytes while `pred` holds, returning the consumed slice.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.advance();
        }
        &self.src[start..self.pos]
    }

    /// Consumes bytes until `pred` holds (or EOF), returning the consumed
    /// slice; the matching byte itself is not consumed.
    pub fn read_until(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        self.take_while(|b| !pred(b))
    }

    /// Consumes up to and including the next CRLF, returning the line's
    /// content without the terminator.
    pub fn read_line(&mut self) -> ScanResult<&'a [u8]> {
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(self.err("unexpected end of input while reading a line"));
                }
                Some(b'\r') if self.peek_n(1) == Some(b'\n') => {
                    let line = &self.src[start..self.pos];
                    self.advance_n(2);
                    return Ok(line);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Skips ASCII space/tab.
    pub fn skip_ws(&mut self) {
        self.take_while(|b| b == b' ' || b == b'\t');
    }

    /// Parses an unsigned decimal integer.
    pub fn parse_u32(&mut self) -> ScanResult<u32> {
        let digits = self.take_while(|b| b.is_ascii_digit());
        if digits.is_empty() {
            return Err(self.err("expected digits"));
        }
        std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.err("digit sequence does not fit in u32"))
    }

    /// Constructs an error at the current position.
    pub fn err(&self, message: impl Into<String>) -> ScanError {
        ScanError {
            message: message.into(),
            at: self.position(),
        }
    }
}

/// Byte classification used by SIP's `token`/`word` grammars, mirroring the
/// RFC 3261 ABNF. Implemented as small match-based predicates rather than a
/// lookup table, since the size of the input alphabet never drives a
/// measurable hot path in this parser.
pub fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'!' | b'%' | b'*' | b'_' | b'+' | b'`' | b'\'' | b'~')
}

/// `true` for bytes allowed unescaped in a URI `user` component.
pub fn is_user_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' | b'&' | b'=' | b'+' | b'$' | b',' | b';' | b'?' | b'/' | b'%')
}

/// `true` for bytes allowed unescaped in a host component (domain label or
/// IP literal, including `[`/`]`/`:` for IPv6 literals).
pub fn is_host_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'[' | b']' | b':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_line_without_terminator() {
        let mut s = Scanner::new(b"INVITE sip:bob@example.com SIP/2.0\r\nTo: bob\r\n");
        assert_eq!(s.read_line().unwrap(), b"INVITE sip:bob@example.com SIP/2.0");
        assert_eq!(s.read_line().unwrap(), b"To: bob");
        assert!(s.is_eof());
    }

    #[test]
    fn parses_u32() {
        let mut s = Scanner::new(b"349rest");
        assert_eq!(s.parse_u32().unwrap(), 349);
        assert_eq!(s.remaining(), b"rest");
    }

    #[test]
    fn take_while_collects_token() {
        let mut s = Scanner::new(b"INVITE sip:bob");
        let tok = s.take_while(is_token_char);
        assert_eq!(tok, b"INVITE");
    }
}

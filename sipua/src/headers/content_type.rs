use core::fmt;

use sipua_util::{is_token_char, Scanner};

use super::{parse_params, HeaderParse};
use crate::error::Result;
use crate::message::Params;

/// A MIME media type, as used by the `Content-Type` header: `m-type SLASH
/// m-subtype *(SEMI m-parameter)`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MediaType {
    mtype: String,
    subtype: String,
    params: Params,
}

impl MediaType {
    /// Creates a new media type with no parameters.
    pub fn new(mtype: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            mtype: mtype.into(),
            subtype: subtype.into(),
            params: Params::new(),
        }
    }

    /// `application/sdp`, used to tag SDP bodies.
    pub fn sdp() -> Self {
        Self::new("application", "sdp")
    }

    /// The top-level type (`"application"`, `"text"`, ...).
    pub fn mtype(&self) -> &str {
        &self.mtype
    }

    /// The subtype (`"sdp"`, `"html"`, ...).
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The media-type parameters (e.g. `charset`).
    pub fn params(&self) -> &Params {
        &self.params
    }

    fn parse(scanner: &mut Scanner) -> Result<Self> {
        let mtype = scanner.take_while(is_token_char);
        if mtype.is_empty() {
            return Err(scanner.err("expected a media type").into());
        }
        if !scanner.take(b'/') {
            return Err(scanner.err("expected '/' in media type").into());
        }
        let subtype = scanner.take_while(is_token_char);
        if subtype.is_empty() {
            return Err(scanner.err("expected a media subtype").into());
        }
        Ok(MediaType {
            mtype: std::str::from_utf8(mtype)?.to_owned(),
            subtype: std::str::from_utf8(subtype)?.to_owned(),
            params: parse_params(scanner)?,
        })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}", self.mtype, self.subtype, self.params)
    }
}

/// The `Content-Type` header: the media type of the message body
/// (RFC 3261 §20.15).
///
/// # Examples
/// ```
/// # use sipua::headers::{ContentType, MediaType};
/// assert_eq!(ContentType::new(MediaType::sdp()).to_string(), "Content-Type: application/sdp");
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ContentType(MediaType);

impl ContentType {
    /// Creates a new `ContentType`.
    pub fn new(media_type: MediaType) -> Self {
        Self(media_type)
    }

    /// The wrapped media type.
    pub fn media_type(&self) -> &MediaType {
        &self.0
    }
}

impl<'a> HeaderParse<'a> for ContentType {
    const NAME: &'static str = "Content-Type";
    const SHORT_NAME: &'static str = "c";

    /// `Content-Type = ( "Content-Type" / "c" ) HCOLON media-type`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        Ok(ContentType(MediaType::parse(scanner)?))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", ContentType::NAME, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_media_type() {
        let mut scanner = Scanner::new(b"application/sdp");
        let ctype = ContentType::parse(&mut scanner).unwrap();
        assert_eq!(ctype.media_type().mtype(), "application");
        assert_eq!(ctype.media_type().subtype(), "sdp");
    }

    #[test]
    fn parses_with_parameter() {
        let mut scanner = Scanner::new(b"text/html; charset=ISO-8859-4");
        let ctype = ContentType::parse(&mut scanner).unwrap();
        assert_eq!(ctype.media_type().subtype(), "html");
        assert_eq!(ctype.media_type().params().get("charset").unwrap().as_str(), Some("ISO-8859-4"));
    }
}

use core::fmt;

use itertools::Itertools;
use sipua_util::Scanner;

use super::{parse_token_list, HeaderParse};
use crate::error::Result;

/// The `Supported` header: extensions supported by the UAC or UAS
/// (RFC 3261 §20.37).
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Supported(Vec<String>);

impl Supported {
    /// Creates a `Supported` header from a list of option tags.
    pub fn new(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(tags.into_iter().map(Into::into).collect())
    }

    /// Adds a tag to the list of supported tags.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.0.push(tag.into());
    }

    /// The option tags, in the order they appeared.
    pub fn tags(&self) -> &[String] {
        &self.0
    }
}

impl<'a> HeaderParse<'a> for Supported {
    const NAME: &'static str = "Supported";
    const SHORT_NAME: &'static str = "k";

    /// `Supported = ( "Supported" / "k" ) HCOLON [option-tag *(COMMA option-tag)]`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        Ok(Supported(parse_token_list(scanner)?))
    }
}

impl fmt::Display for Supported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", Supported::NAME, self.0.iter().format(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_tags() {
        let mut scanner = Scanner::new(b"100rel, other");
        let supported = Supported::parse(&mut scanner).unwrap();
        assert_eq!(supported.tags(), &["100rel".to_string(), "other".to_string()]);
    }

    #[test]
    fn empty_list_parses() {
        let mut scanner = Scanner::new(b"");
        assert!(Supported::parse(&mut scanner).unwrap().tags().is_empty());
    }
}

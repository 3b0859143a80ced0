use core::fmt;

use itertools::Itertools;
use sipua_util::Scanner;

use super::{parse_token_list, HeaderParse};
use crate::error::Result;

/// The `Require` header: option tags the UAC expects the UAS to support in
/// order to process the request (RFC 3261 §20.32).
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Require(Vec<String>);

impl Require {
    /// Creates a `Require` header from a list of option tags.
    pub fn new(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(tags.into_iter().map(Into::into).collect())
    }

    /// The option tags, in the order they appeared.
    pub fn tags(&self) -> &[String] {
        &self.0
    }

    /// `true` if `tag` is present among the required extensions.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl<'a> HeaderParse<'a> for Require {
    const NAME: &'static str = "Require";

    /// `Require = "Require" HCOLON option-tag *(COMMA option-tag)`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        Ok(Require(parse_token_list(scanner)?))
    }
}

impl fmt::Display for Require {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", Require::NAME, self.0.iter().format(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_tag() {
        let mut scanner = Scanner::new(b"100rel");
        let require = Require::parse(&mut scanner).unwrap();
        assert_eq!(require.tags(), &["100rel".to_string()]);
    }

    #[test]
    fn parses_multiple_tags() {
        let mut scanner = Scanner::new(b"100rel, timer");
        let require = Require::parse(&mut scanner).unwrap();
        assert!(require.contains("timer"));
    }
}

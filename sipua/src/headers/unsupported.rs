use core::fmt;

use itertools::Itertools;
use sipua_util::Scanner;

use super::{parse_token_list, HeaderParse};
use crate::error::Result;

/// The `Unsupported` header: features the UAS does not support, sent in a
/// `420 Bad Extension` response (RFC 3261 §20.40).
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Unsupported(Vec<String>);

impl Unsupported {
    /// Creates an `Unsupported` header from a list of option tags.
    pub fn new(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(tags.into_iter().map(Into::into).collect())
    }

    /// The option tags, in the order they appeared.
    pub fn tags(&self) -> &[String] {
        &self.0
    }
}

impl<'a> HeaderParse<'a> for Unsupported {
    const NAME: &'static str = "Unsupported";

    /// `Unsupported = "Unsupported" HCOLON option-tag *(COMMA option-tag)`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        Ok(Unsupported(parse_token_list(scanner)?))
    }
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", Unsupported::NAME, self.0.iter().format(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_tags() {
        let mut scanner = Scanner::new(b"foo, bar");
        let unsupported = Unsupported::parse(&mut scanner).unwrap();
        assert_eq!(unsupported.tags(), &["foo".to_string(), "bar".to_string()]);
    }
}

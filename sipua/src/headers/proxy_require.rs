use core::fmt;

use itertools::Itertools;
use sipua_util::Scanner;

use super::{parse_token_list, HeaderParse};
use crate::error::Result;

/// The `Proxy-Require` header: proxy-sensitive features the request requires
/// support for (RFC 3261 §20.29).
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ProxyRequire(Vec<String>);

impl ProxyRequire {
    /// Creates a `Proxy-Require` header from a list of option tags.
    pub fn new(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(tags.into_iter().map(Into::into).collect())
    }

    /// The option tags, in the order they appeared.
    pub fn tags(&self) -> &[String] {
        &self.0
    }
}

impl<'a> HeaderParse<'a> for ProxyRequire {
    const NAME: &'static str = "Proxy-Require";

    /// `Proxy-Require = "Proxy-Require" HCOLON option-tag *(COMMA option-tag)`
    fn parse(scanner: &mut Scanner<'a>) -> Result<Self> {
        Ok(ProxyRequire(parse_token_list(scanner)?))
    }
}

impl fmt::Display for ProxyRequire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", ProxyRequire::NAME, self.0.iter().format(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_tags() {
        let mut scanner = Scanner::new(b"foo, bar");
        let proxy_require = ProxyRequire::parse(&mut scanner).unwrap();
        assert_eq!(proxy_require.tags(), &["foo".to_string(), "bar".to_string()]);
    }
}

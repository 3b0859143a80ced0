use enum_as_inner::EnumAsInner;
use std::fmt;

use crate::headers::*;

/// A parsed SIP header.
///
/// Covers the header set named in the data model plus a small, deliberately
/// narrow set of additional single-value headers (`Expires`, `ContentType`,
/// `Allow`, `UserAgent`). Anything else recognized-but-unmodeled falls back
/// to [`Header::Generic`].
#[derive(Debug, PartialEq, Eq, EnumAsInner, Clone)]
pub enum Header {
    To(To),
    From(From),
    Contact(Contact),
    CallId(CallId),
    CSeq(CSeq),
    MaxForwards(MaxForwards),
    ContentLength(ContentLength),
    Via(Via),
    Require(Require),
    Supported(Supported),
    ProxyRequire(ProxyRequire),
    Unsupported(Unsupported),
    Expires(Expires),
    ContentType(ContentType),
    Allow(Allow),
    UserAgent(UserAgent),
    /// Any header not named above, kept verbatim.
    Generic(GenericHeader),
}

impl Header {
    /// The canonical (long-form) header name, as it would appear on the
    /// wire if re-serialized.
    pub fn name(&self) -> &str {
        match self {
            Header::To(_) => To::NAME,
            Header::From(_) => From::NAME,
            Header::Contact(_) => Contact::NAME,
            Header::CallId(_) => CallId::NAME,
            Header::CSeq(_) => CSeq::NAME,
            Header::MaxForwards(_) => MaxForwards::NAME,
            Header::ContentLength(_) => ContentLength::NAME,
            Header::Via(_) => Via::NAME,
            Header::Require(_) => Require::NAME,
            Header::Supported(_) => Supported::NAME,
            Header::ProxyRequire(_) => ProxyRequire::NAME,
            Header::Unsupported(_) => Unsupported::NAME,
            Header::Expires(_) => Expires::NAME,
            Header::ContentType(_) => ContentType::NAME,
            Header::Allow(_) => Allow::NAME,
            Header::UserAgent(_) => UserAgent::NAME,
            Header::Generic(g) => &g.name,
        }
    }

    /// The compact form of the name (e.g. `"f"` for `From`), if this header
    /// has one (RFC 3261 §7.3.3).
    pub fn short_name(&self) -> Option<&'static str> {
        match self {
            Header::To(_) => Some(To::SHORT_NAME),
            Header::From(_) => Some(From::SHORT_NAME),
            Header::Contact(_) => Some(Contact::SHORT_NAME),
            Header::CallId(_) => Some(CallId::SHORT_NAME),
            Header::ContentLength(_) => Some(ContentLength::SHORT_NAME),
            Header::Via(_) => Some(Via::SHORT_NAME),
            Header::Supported(_) => Some(Supported::SHORT_NAME),
            Header::ContentType(_) => Some(ContentType::SHORT_NAME),
            _ => None,
        }
    }

    /// `true` if `name` (case-insensitively) matches this header's long or
    /// short form.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name) || self.short_name().is_some_and(|s| s.eq_ignore_ascii_case(name))
    }
}

/// A recognized-but-unmodeled header, or an extension header, carried
/// verbatim as `name: value`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GenericHeader {
    /// Header name exactly as it appeared on the wire.
    pub name: String,
    /// Raw header value, unparsed.
    pub value: String,
}

impl fmt::Display for GenericHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

macro_rules! impl_header_display {
    ( $($variant:ident),* $(,)? ) => {
        impl fmt::Display for Header {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Header::$variant(inner) => inner.fmt(f), )*
                }
            }
        }
    };
}

impl_header_display!(
    To,
    From,
    Contact,
    CallId,
    CSeq,
    MaxForwards,
    ContentLength,
    Via,
    Require,
    Supported,
    ProxyRequire,
    Unsupported,
    Expires,
    ContentType,
    Allow,
    UserAgent,
    Generic,
);

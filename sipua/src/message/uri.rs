use std::fmt;
use std::str::FromStr;

use sipua_util::{is_host_char, is_token_char, is_user_char, Scanner};

use super::{parse_params, parse_quoted_string, MaybeString, Method, Params};
use crate::error::Result;

/// The host part of a `HostPort`, either a domain name or a literal IP
/// address. Kept as a thin wrapper over `String` rather than parsing into
/// `std::net::IpAddr` eagerly, since URI equality in this crate is ordinal
/// (RFC 3261 §19.1.4's full comparison algorithm is out of scope) and the
/// literal text is what gets compared and re-serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPort {
    /// Domain name or IP literal, exactly as parsed.
    pub host: String,
    /// Optional port.
    pub port: Option<u16>,
}

impl HostPort {
    /// Creates a new `HostPort`.
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Resolves to a [`std::net::SocketAddr`] when `host` is an IP literal,
    /// defaulting the port to 5060. Domain names return `None`: DNS
    /// resolution is outside this crate's scope (see [`crate::transport`]).
    pub fn socket_addr(&self) -> Option<std::net::SocketAddr> {
        let trimmed = self.host.strip_prefix('[').and_then(|s| s.strip_suffix(']')).unwrap_or(&self.host);
        let ip: std::net::IpAddr = trimmed.parse().ok()?;
        Some(std::net::SocketAddr::new(ip, self.port.unwrap_or(5060)))
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

impl FromStr for HostPort {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_host_port(&mut Scanner::new(s.as_bytes()))
    }
}

/// Parses a host literal: either a bracketed IPv6 literal (`[::1]`) or a
/// run of domain/IPv4 characters, stopping before a port-separating `:`.
pub(crate) fn parse_host(scanner: &mut Scanner) -> Result<String> {
    if scanner.peek() == Some(b'[') {
        scanner.advance();
        let inner = scanner.take_while(|b| b != b']');
        if !scanner.take(b']') {
            return Err(scanner.err("unterminated IPv6 literal").into());
        }
        Ok(format!("[{}]", std::str::from_utf8(inner)?))
    } else {
        let host = scanner.take_while(|b| is_host_char(b) && b != b':');
        if host.is_empty() {
            return Err(scanner.err("expected a host").into());
        }
        Ok(std::str::from_utf8(host)?.to_owned())
    }
}

/// Parses `host [ COLON port ]`.
pub(crate) fn parse_host_port(scanner: &mut Scanner) -> Result<HostPort> {
    let host = parse_host(scanner)?;
    let port = if scanner.take(b':') {
        Some(scanner.parse_u32()? as u16)
    } else {
        None
    };
    Ok(HostPort::new(host, port))
}

/// A SIP URI, either a concrete address (`SipUri`) or the bare `*` wildcard
/// used in a Contact header to mean "all registrations".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Uri {
    /// A `sip:`/`sips:` URI.
    Sip(SipUri),
    /// The literal `*` wildcard (Contact: *).
    Wildcard,
}

impl Uri {
    /// Returns the inner `SipUri`, if this isn't the wildcard.
    pub fn as_sip_uri(&self) -> Option<&SipUri> {
        match self {
            Uri::Sip(uri) => Some(uri),
            Uri::Wildcard => None,
        }
    }

    /// Returns `true` for the `*` wildcard form.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Uri::Wildcard)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uri::Sip(uri) => write!(f, "{uri}"),
            Uri::Wildcard => f.write_str("*"),
        }
    }
}

impl FromStr for Uri {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim() == "*" {
            return Ok(Uri::Wildcard);
        }
        Ok(Uri::Sip(s.parse()?))
    }
}

/// Parses a bare `Uri` (`addr-spec`, i.e. `SIP-URI` or the `*` wildcard),
/// not wrapped in `< >`.
pub(crate) fn parse_uri(scanner: &mut Scanner) -> Result<Uri> {
    if scanner.peek() == Some(b'*') {
        scanner.advance();
        return Ok(Uri::Wildcard);
    }
    Ok(Uri::Sip(parse_sip_uri(scanner)?))
}

/// A concrete `sip:`/`sips:` URI.
///
/// `user`/`password` use [`MaybeString`] so that `sip:host` (no user part at
/// all) is distinguishable from a present-but-empty user. The invariant
/// `password.is_present() implies user.is_present()` is enforced by the
/// constructors: a URI cannot carry a password without a user part, per
/// RFC 3261's `userinfo = user [ ":" password ] "@"` grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipUri {
    /// `true` for `sips:`, `false` for `sip:`.
    pub is_encrypted: bool,
    /// The `user` part, if any.
    pub user: MaybeString,
    /// The `password` part, if any. Only meaningful when `user` is present.
    pub password: MaybeString,
    /// Host and optional port.
    pub host_port: HostPort,
    /// URI parameters (`;transport=tcp`, `;lr`, ...).
    pub uri_params: Params,
    /// Header parameters (`?subject=foo`).
    pub headers: Params,
}

impl SipUri {
    /// Creates a new URI with no user/password/params, enforcing the
    /// password/user invariant.
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            is_encrypted: false,
            user: MaybeString::Absent,
            password: MaybeString::Absent,
            host_port: HostPort::new(host, port),
            uri_params: Params::new(),
            headers: Params::new(),
        }
    }

    /// Sets the user part.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = MaybeString::from(user.into());
        self
    }

    /// Sets the password part. No-op if `user` is not already present,
    /// since a password without a user is not representable.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        if self.user.is_present() {
            self.password = MaybeString::from(password.into());
        }
        self
    }

    /// Returns the `transport` URI parameter, if set.
    pub fn transport(&self) -> Option<&str> {
        self.uri_params.get("transport").and_then(MaybeString::as_str)
    }

    /// Returns `true` if the `lr` (loose-routing) parameter is present.
    pub fn is_loose_routing(&self) -> bool {
        self.uri_params.get("lr").is_some()
    }

    /// Returns the `method` URI parameter parsed as a [`Method`], if set.
    pub fn method_param(&self) -> Option<Method> {
        self.uri_params
            .get("method")
            .and_then(MaybeString::as_str)
            .map(Method::from)
    }
}

impl fmt::Display for SipUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_encrypted { "sips:" } else { "sip:" })?;

        if let MaybeString::Present(user) = &self.user {
            f.write_str(user)?;
            if let MaybeString::Present(pass) = &self.password {
                write!(f, ":{pass}")?;
            }
            f.write_str("@")?;
        }

        write!(f, "{}", self.host_port)?;
        write!(f, "{}", self.uri_params)?;

        if !self.headers.is_empty() {
            f.write_str("?")?;
            for (i, (name, value)) in self.headers.iter().enumerate() {
                if i > 0 {
                    f.write_str("&")?;
                }
                write!(f, "{name}{value}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for SipUri {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_sip_uri(&mut Scanner::new(s.as_bytes()))
    }
}

/// Attempts to consume `user [ ":" password ] "@"`, backtracking (and
/// returning `None`) if no `@` is found — the userinfo part is optional and
/// the lookahead needed to tell it apart from a bare host is unbounded.
fn try_parse_userinfo(scanner: &mut Scanner) -> Result<Option<(MaybeString, MaybeString)>> {
    let checkpoint = scanner.clone();
    let user = scanner.take_while(is_user_char);
    if user.is_empty() {
        *scanner = checkpoint;
        return Ok(None);
    }
    let user = std::str::from_utf8(user)?.to_owned();
    let password = if scanner.take(b':') {
        let pass = scanner.take_while(is_user_char);
        Some(std::str::from_utf8(pass)?.to_owned())
    } else {
        None
    };
    if scanner.take(b'@') {
        Ok(Some((
            MaybeString::Present(user),
            password.map(MaybeString::Present).unwrap_or(MaybeString::Absent),
        )))
    } else {
        *scanner = checkpoint;
        Ok(None)
    }
}

/// Parses `SIP-URI / SIPS-URI`.
pub(crate) fn parse_sip_uri(scanner: &mut Scanner) -> Result<SipUri> {
    let scheme = scanner.take_while(is_token_char);
    let is_encrypted = match scheme {
        b"sip" | b"SIP" => false,
        b"sips" | b"SIPS" => true,
        _ => return Err(scanner.err("expected a sip: or sips: scheme").into()),
    };
    if !scanner.take(b':') {
        return Err(scanner.err("expected ':' after the URI scheme").into());
    }
    let (user, password) = try_parse_userinfo(scanner)?.unwrap_or((MaybeString::Absent, MaybeString::Absent));
    let host_port = parse_host_port(scanner)?;
    let uri_params = parse_params(scanner)?;
    let mut headers = Params::new();
    if scanner.take(b'?') {
        loop {
            let name = scanner.take_while(is_token_char);
            if name.is_empty() {
                return Err(scanner.err("expected a header parameter name").into());
            }
            let name = std::str::from_utf8(name)?.to_owned();
            if !scanner.take(b'=') {
                return Err(scanner.err("URI header parameter requires '=value'").into());
            }
            let value = MaybeString::Present(std::str::from_utf8(scanner.take_while(is_token_char))?.to_owned());
            headers.push(name, value);
            if !scanner.take(b'&') {
                break;
            }
        }
    }
    Ok(SipUri {
        is_encrypted,
        user,
        password,
        host_port,
        uri_params,
        headers,
    })
}

/// A display-name + URI pair, as used in `To`/`From`/`Contact`:
/// `"Alice" <sip:alice@example.com>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAddr {
    /// The optional display name.
    pub display: Option<String>,
    /// The addressed URI.
    pub uri: Uri,
}

impl fmt::Display for NameAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(display) = &self.display {
            write!(f, "\"{display}\" ")?;
        }
        write!(f, "<{}>", self.uri)
    }
}

/// Parses `( name-addr / addr-spec )`, the common `To`/`From`/`Contact`
/// prefix, leaving any trailing `*(SEMI param)` for the caller to handle.
pub(crate) fn parse_name_addr_or_uri(scanner: &mut Scanner) -> Result<NameAddr> {
    scanner.skip_ws();

    if scanner.peek() == Some(b'"') {
        let display = parse_quoted_string(scanner)?;
        scanner.skip_ws();
        if !scanner.take(b'<') {
            return Err(scanner.err("expected '<' after display name").into());
        }
        let uri = parse_uri(scanner)?;
        if !scanner.take(b'>') {
            return Err(scanner.err("expected '>' to close the URI").into());
        }
        return Ok(NameAddr { display: Some(display), uri });
    }

    if scanner.peek() == Some(b'<') {
        scanner.advance();
        let uri = parse_uri(scanner)?;
        if !scanner.take(b'>') {
            return Err(scanner.err("expected '>' to close the URI").into());
        }
        return Ok(NameAddr { display: None, uri });
    }

    // Either `token *(LWS token) <addr-spec>` or a bare `addr-spec`; we
    // won't know which until we either hit `<` or run out of tokens.
    let checkpoint = scanner.clone();
    let mut display_tokens = Vec::new();
    loop {
        let tok = scanner.take_while(is_token_char);
        if tok.is_empty() {
            break;
        }
        display_tokens.push(std::str::from_utf8(tok)?.to_owned());
        scanner.skip_ws();
        if scanner.peek() == Some(b'<') || !scanner.peek().is_some_and(is_token_char) {
            break;
        }
    }

    if scanner.take(b'<') {
        let uri = parse_uri(scanner)?;
        if !scanner.take(b'>') {
            return Err(scanner.err("expected '>' to close the URI").into());
        }
        let display = (!display_tokens.is_empty()).then(|| display_tokens.join(" "));
        return Ok(NameAddr { display, uri });
    }

    *scanner = checkpoint;
    let uri = parse_uri(scanner)?;
    Ok(NameAddr { display: None, uri })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_requires_user() {
        let uri = SipUri::new("example.com", None).with_password("secret");
        assert!(!uri.password.is_present());
    }

    #[test]
    fn display_round_trips_basic_uri() {
        let uri = SipUri::new("example.com", Some(5060)).with_user("alice");
        assert_eq!(uri.to_string(), "sip:alice@example.com:5060");
    }

    #[test]
    fn wildcard_parses_and_displays() {
        let uri: Uri = "*".parse().unwrap();
        assert!(uri.is_wildcard());
        assert_eq!(uri.to_string(), "*");
    }

    #[test]
    fn uri_headers_require_a_value() {
        let result: Result<SipUri> = "sip:a@b.com?subject".parse();
        assert!(result.is_err());
    }

    #[test]
    fn uri_headers_with_a_value_parse() {
        let uri: SipUri = "sip:a@b.com?subject=hello".parse().unwrap();
        assert_eq!(uri.headers.get("subject").and_then(MaybeString::as_str), Some("hello"));
    }
}

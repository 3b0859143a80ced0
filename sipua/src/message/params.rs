use std::fmt;

use sipua_util::{is_token_char, Scanner};

use crate::error::Result;

/// A header or URI parameter value that distinguishes "absent" from
/// "present but empty" (`;tag` vs `;tag=`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaybeString {
    /// The parameter has no `=value` part at all.
    Absent,
    /// The parameter has a (possibly empty) value.
    Present(String),
}

impl MaybeString {
    /// Returns `true` if a value is present (including an empty one).
    pub fn is_present(&self) -> bool {
        matches!(self, MaybeString::Present(_))
    }

    /// Borrows the value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MaybeString::Absent => None,
            MaybeString::Present(s) => Some(s.as_str()),
        }
    }
}

impl fmt::Display for MaybeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeString::Absent => Ok(()),
            MaybeString::Present(s) => write!(f, "={s}"),
        }
    }
}

impl From<&str> for MaybeString {
    fn from(s: &str) -> Self {
        MaybeString::Present(s.to_owned())
    }
}

impl From<String> for MaybeString {
    fn from(s: String) -> Self {
        MaybeString::Present(s)
    }
}

/// An ordered, case-preserving collection of `name[=value]` parameters.
///
/// Names are compared case-insensitively (RFC 3261 parameter names are
/// tokens and are not case sensitive), but the original casing is kept for
/// serialization. Insertion order is preserved and is part of `Display`
/// output; equality is set-equality, matching the relaxed comparison rules
/// SIP uses for URI and header parameters.
#[derive(Debug, Clone, Default)]
pub struct Params(Vec<(String, MaybeString)>);

impl Params {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up a parameter by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&MaybeString> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Inserts or replaces a parameter, preserving the position of an
    /// existing entry with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: MaybeString) {
        let name = name.into();
        if let Some(entry) = self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            entry.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    /// Appends a parameter without checking for an existing entry.
    pub fn push(&mut self, name: impl Into<String>, value: MaybeString) {
        self.0.push((name.into(), value));
    }

    /// Removes a parameter by name, returning its value if it existed.
    pub fn remove(&mut self, name: &str) -> Option<MaybeString> {
        let idx = self.0.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(idx).1)
    }

    /// Iterates parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaybeString)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.0.iter().all(|(name, value)| {
            other
                .0
                .iter()
                .any(|(n2, v2)| n2.eq_ignore_ascii_case(name) && v2 == value)
        })
    }
}

impl Eq for Params {}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.0 {
            write!(f, ";{name}{value}")?;
        }
        Ok(())
    }
}

impl<const N: usize> From<[(&str, MaybeString); N]> for Params {
    fn from(params: [(&str, MaybeString); N]) -> Self {
        let mut p = Params::new();
        for (name, value) in params {
            p.push(name, value);
        }
        p
    }
}

/// Parses `*(SEMI generic-param)`, where `generic-param = token [EQUAL
/// (token / quoted-string)]`. Shared by every header and URI whose grammar
/// ends in a trailing parameter list (`To`, `From`, `Via`, `Contact`,
/// `Content-Type`, `SipUri`).
pub(crate) fn parse_params<'a>(scanner: &mut Scanner<'a>) -> Result<Params> {
    let mut params = Params::new();
    loop {
        scanner.skip_ws();
        if !scanner.take(b';') {
            break;
        }
        scanner.skip_ws();
        let name = scanner.take_while(is_token_char);
        if name.is_empty() {
            return Err(scanner.err("expected a parameter name").into());
        }
        let name = std::str::from_utf8(name)?.to_owned();
        scanner.skip_ws();
        if scanner.take(b'=') {
            scanner.skip_ws();
            let value = if scanner.peek() == Some(b'"') {
                parse_quoted_string(scanner)?
            } else {
                std::str::from_utf8(scanner.take_while(is_token_char))?.to_owned()
            };
            params.push(name, MaybeString::Present(value));
        } else {
            params.push(name, MaybeString::Absent);
        }
    }
    Ok(params)
}

/// Parses a `quoted-string`, consuming the surrounding `"` and unescaping
/// `\x` pairs.
pub(crate) fn parse_quoted_string<'a>(scanner: &mut Scanner<'a>) -> Result<String> {
    if !scanner.take(b'"') {
        return Err(scanner.err("expected opening quote").into());
    }
    let mut value = String::new();
    loop {
        match scanner.advance() {
            None => return Err(scanner.err("unterminated quoted string").into()),
            Some(b'"') => break,
            Some(b'\\') => match scanner.advance() {
                Some(b) => value.push(b as char),
                None => return Err(scanner.err("unterminated quoted string").into()),
            },
            Some(b) => value.push(b as char),
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order_on_display() {
        let mut p = Params::new();
        p.push("transport", MaybeString::from("tcp"));
        p.push("lr", MaybeString::Absent);
        assert_eq!(p.to_string(), ";transport=tcp;lr");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut p = Params::new();
        p.push("Transport", MaybeString::from("tcp"));
        assert_eq!(p.get("transport").unwrap().as_str(), Some("tcp"));
    }

    #[test]
    fn equality_is_set_equality() {
        let mut a = Params::new();
        a.push("ttl", MaybeString::from("1"));
        a.push("lr", MaybeString::Absent);

        let mut b = Params::new();
        b.push("lr", MaybeString::Absent);
        b.push("ttl", MaybeString::from("1"));

        assert_eq!(a, b);
    }
}

use std::fmt;

/// A SIP request method (RFC 3261 §7.1 and extensions).
///
/// Case-insensitive on parse, canonical on display. Unrecognized tokens are
/// kept verbatim in `Other` rather than rejected, since a user agent must be
/// able to relay methods it doesn't itself implement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Invite,
    Ack,
    Bye,
    Cancel,
    Register,
    Options,
    Info,
    Notify,
    Subscribe,
    Update,
    Refer,
    Prack,
    Message,
    Publish,
    /// Any method not listed above, carried verbatim.
    Other(String),
}

impl Method {
    /// Returns the canonical token for this method.
    pub fn as_str(&self) -> &str {
        match self {
            Method::Invite => "INVITE",
            Method::Ack => "ACK",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Register => "REGISTER",
            Method::Options => "OPTIONS",
            Method::Info => "INFO",
            Method::Notify => "NOTIFY",
            Method::Subscribe => "SUBSCRIBE",
            Method::Update => "UPDATE",
            Method::Refer => "REFER",
            Method::Prack => "PRACK",
            Method::Message => "MESSAGE",
            Method::Publish => "PUBLISH",
            Method::Other(s) => s,
        }
    }

    /// Returns `true` for INVITE, the only method with its own transaction
    /// type (RFC 3261 §17 splits "INVITE" from "non-INVITE" transactions).
    pub fn is_invite(&self) -> bool {
        matches!(self, Method::Invite)
    }

    /// Returns `true` for ACK, which never has its own transaction.
    pub fn is_ack(&self) -> bool {
        matches!(self, Method::Ack)
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "INVITE" => Method::Invite,
            "ACK" => Method::Ack,
            "BYE" => Method::Bye,
            "CANCEL" => Method::Cancel,
            "REGISTER" => Method::Register,
            "OPTIONS" => Method::Options,
            "INFO" => Method::Info,
            "NOTIFY" => Method::Notify,
            "SUBSCRIBE" => Method::Subscribe,
            "UPDATE" => Method::Update,
            "REFER" => Method::Refer,
            "PRACK" => Method::Prack,
            "MESSAGE" => Method::Message,
            "PUBLISH" => Method::Publish,
            _ => Method::Other(s.to_owned()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Method::from("invite"), Method::Invite);
        assert_eq!(Method::from("InViTe"), Method::Invite);
    }

    #[test]
    fn unknown_method_round_trips() {
        let m = Method::from("PING");
        assert_eq!(m, Method::Other("PING".to_owned()));
        assert_eq!(m.to_string(), "PING");
    }
}

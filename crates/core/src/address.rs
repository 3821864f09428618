use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Matches `Display Name <local@domain>`.
static NAMED_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^<]*)<([^>]+)>$").expect("static address pattern"));

/// A structured mailbox: an email address with an optional display name.
///
/// Deserializes from either `{ "name": ..., "email": ... }` or the alternate
/// `{ "name": ..., "address": ... }` convention; always serializes with
/// `email`. Only objects are accepted, never sequences, so a two-element
/// address list is not mistaken for a mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The bare `local@domain` address.
    pub email: String,
}

impl<'de> Deserialize<'de> for Mailbox {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MailboxVisitor)
    }
}

struct MailboxVisitor;

impl<'de> Visitor<'de> for MailboxVisitor {
    type Value = Mailbox;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mailbox object with an `email` or `address` field")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Mailbox, A::Error> {
        let mut name = None;
        let mut email = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "name" => name = map.next_value::<Option<String>>()?,
                "email" | "address" => {
                    if email.is_some() {
                        return Err(de::Error::duplicate_field("email"));
                    }
                    email = Some(map.next_value::<String>()?);
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        let email = email.ok_or_else(|| de::Error::missing_field("email"))?;
        Ok(Mailbox { name, email })
    }
}

impl Mailbox {
    /// Create a mailbox without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse a formatted address string.
    ///
    /// `"Jane <jane@example.com>"` yields a named mailbox. Anything that does
    /// not match the bracketed pattern is taken verbatim as the email.
    pub fn parse(input: &str) -> Self {
        match NAMED_ADDRESS.captures(input) {
            Some(caps) => {
                let name = caps[1].trim();
                Self {
                    name: (!name.is_empty()).then(|| name.to_owned()),
                    email: caps[2].trim().to_owned(),
                }
            }
            None => Self::new(input),
        }
    }

    /// Render as `Name <email>`, or the bare email when there is no name.
    pub fn formatted(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => write!(f, "{name} <{}>", self.email),
            _ => f.write_str(&self.email),
        }
    }
}

/// An address in either of its two equivalent representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Address {
    /// `local@domain` or `Display Name <local@domain>`.
    Formatted(String),
    /// A structured mailbox record.
    Structured(Mailbox),
}

impl Address {
    /// Convert to the structured form. Structured input is returned as-is.
    pub fn to_mailbox(&self) -> Mailbox {
        match self {
            Self::Formatted(s) => Mailbox::parse(s),
            Self::Structured(mailbox) => mailbox.clone(),
        }
    }

    /// Convert to the formatted string form. String input is returned as-is.
    pub fn to_formatted(&self) -> String {
        match self {
            Self::Formatted(s) => s.clone(),
            Self::Structured(mailbox) => mailbox.formatted(),
        }
    }

    /// The bare email address, without any display name.
    pub fn email(&self) -> String {
        match self {
            Self::Formatted(s) => Mailbox::parse(s).email,
            Self::Structured(mailbox) => mailbox.email.clone(),
        }
    }

    /// An address with no characters in its email part counts as absent.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Formatted(s) => s.trim().is_empty(),
            Self::Structured(mailbox) => mailbox.email.trim().is_empty(),
        }
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::Formatted(value.to_owned())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self::Formatted(value)
    }
}

impl From<Mailbox> for Address {
    fn from(value: Mailbox) -> Self {
        Self::Structured(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Formatted(s) => f.write_str(s),
            Self::Structured(mailbox) => mailbox.fmt(f),
        }
    }
}

/// A single value or a list of values, as accepted on the wire.
///
/// Lists are tried first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A list of values.
    Many(Vec<T>),
    /// A single value.
    One(T),
}

impl<T> OneOrMany<T> {
    /// Iterate over the contained values.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::One(item) => std::slice::from_ref(item).iter(),
            Self::Many(items) => items.iter(),
        }
    }

    /// The first value, if any.
    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }

    /// Number of contained values.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    /// `true` for an empty list.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

/// One or more addresses, as found in `to`, `cc`, `bcc` and the reply fields.
pub type Recipients = OneOrMany<Address>;

impl From<Address> for Recipients {
    fn from(value: Address) -> Self {
        Self::One(value)
    }
}

impl From<&str> for Recipients {
    fn from(value: &str) -> Self {
        Self::One(Address::from(value))
    }
}

impl From<Vec<Address>> for Recipients {
    fn from(value: Vec<Address>) -> Self {
        Self::Many(value)
    }
}

impl Recipients {
    /// `true` when no usable address is present.
    pub fn is_blank(&self) -> bool {
        self.iter().all(Address::is_empty)
    }
}

fn present(input: Option<&Recipients>) -> Option<&Recipients> {
    input.filter(|r| !r.is_blank())
}

/// Convert a single address to its structured form.
pub fn to_structured(addr: &Address) -> Mailbox {
    addr.to_mailbox()
}

/// Convert a single address to its formatted string form.
pub fn to_formatted_string(addr: &Address) -> String {
    addr.to_formatted()
}

/// Structured form of every address. Absent or blank input yields `None`.
pub fn to_structured_list(input: Option<&Recipients>) -> Option<Vec<Mailbox>> {
    present(input).map(|r| r.iter().map(Address::to_mailbox).collect())
}

/// Formatted form of every address. Absent or blank input yields `None`.
pub fn to_formatted_list(input: Option<&Recipients>) -> Option<Vec<String>> {
    present(input).map(|r| r.iter().map(Address::to_formatted).collect())
}

/// Structured form of the first address, for single-destination fields.
pub fn to_single_structured(input: Option<&Recipients>) -> Option<Mailbox> {
    present(input).and_then(OneOrMany::first).map(Address::to_mailbox)
}

/// Formatted form of the first address, for single-destination fields.
pub fn to_single_formatted(input: Option<&Recipients>) -> Option<String> {
    present(input).and_then(OneOrMany::first).map(Address::to_formatted)
}

use super::error::{ContactError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Contact Identifier
// ============================================================================

/// Store-assigned contact identifier.
///
/// Identifiers are positive integers. On the wire they are rendered as decimal
/// strings, the way datastore int64 keys travel through JSON. Zero is never a
/// valid id and means "not yet persisted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactId(u64);

impl ContactId {
    /// Wraps a raw id. Returns `None` for zero.
    pub fn new(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContactId {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s
            .trim()
            .parse::<u64>()
            .map_err(|_| ContactError::Validation(format!("invalid contact id '{s}'")))?;
        Self::new(raw).ok_or_else(|| ContactError::Validation(format!("invalid contact id '{s}'")))
    }
}

impl Serialize for ContactId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

/// Accepts `null`, `0`, `""`, a number, or a decimal string.
/// The empty forms all mean "no id yet".
fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<ContactId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(raw)) => Ok(ContactId::new(raw)),
        Some(RawId::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawId::Text(text)) => text
            .trim()
            .parse::<u64>()
            .map(ContactId::new)
            .map_err(|_| serde::de::Error::custom(format!("invalid contact id '{text}'"))),
    }
}

impl<'de> Deserialize<'de> for ContactId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_optional_id(deserializer)?
            .ok_or_else(|| serde::de::Error::custom("contact id must be a positive integer"))
    }
}

fn deserialize_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Contact
// ============================================================================

/// A single contact record.
///
/// `name` is required at persistence time; every other field is optional and
/// serialized as `null` when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<ContactId>,
    #[serde(default, deserialize_with = "deserialize_name")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub favourite: Option<bool>,
}

impl Contact {
    /// Creates a transient contact with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_favourite(mut self, favourite: bool) -> Self {
        self.favourite = Some(favourite);
        self
    }

    pub fn with_id(mut self, id: ContactId) -> Self {
        self.id = Some(id);
        self
    }

    /// Checks the invariants required before the contact may be written.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ContactError::Validation("name is required".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// Bulk request/response envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactList {
    #[serde(default)]
    pub items: Vec<Contact>,
}

/// Opaque continuation cursor for paginated listing.
///
/// Encodes the id of the last contact returned; the next page starts strictly
/// after it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    const WIDTH: usize = 16;

    /// Token resuming after `id`.
    pub fn after(id: ContactId) -> Self {
        Self(format!("{:0width$x}", id.get(), width = Self::WIDTH))
    }

    /// Decodes the cursor position carried by the token.
    pub fn cursor(&self) -> Result<ContactId> {
        let invalid = || ContactError::Validation(format!("invalid page token '{}'", self.0));
        if self.0.len() != Self::WIDTH {
            return Err(invalid());
        }
        let raw = u64::from_str_radix(&self.0, 16).map_err(|_| invalid())?;
        ContactId::new(raw).ok_or_else(invalid)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PageToken {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self> {
        let token = Self(s.trim().to_string());
        token.cursor()?;
        Ok(token)
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a `listContacts` query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPage {
    pub items: Vec<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<PageToken>,
}

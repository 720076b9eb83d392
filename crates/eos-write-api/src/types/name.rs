//! Account name type.
//!
//! Account names are up to 12 characters drawn from `a-z`, `1-5` and `.`,
//! displayed as plain text and packed into a 64-bit integer on the wire.

use crate::error::{WriteApiError, WriteApiResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The maximum length of an account name.
pub const MAX_NAME_LENGTH: usize = 12;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// An on-chain account name.
///
/// Ordering is lexicographic on the text form, which is the order scopes are
/// sorted in.
///
/// # Example
///
/// ```rust
/// use eos_write_api::AccountName;
///
/// let name: AccountName = "alice".parse().unwrap();
/// assert_eq!(name.as_str(), "alice");
/// assert_eq!(AccountName::from_u64(name.to_u64()), name);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountName(String);

impl AccountName {
    /// Parses and validates an account name.
    pub fn new(name: impl Into<String>) -> WriteApiResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(WriteApiError::InvalidName(
                "account name cannot be empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(WriteApiError::InvalidName(format!(
                "'{name}' is longer than {MAX_NAME_LENGTH} characters"
            )));
        }
        if let Some(c) = name.chars().find(|c| symbol(*c).is_none()) {
            return Err(WriteApiError::InvalidName(format!(
                "'{name}' contains invalid character '{c}'"
            )));
        }
        if name.ends_with('.') {
            return Err(WriteApiError::InvalidName(format!(
                "'{name}' cannot end with '.'"
            )));
        }
        Ok(Self(name))
    }

    /// Decodes a packed 64-bit name.
    pub fn from_u64(value: u64) -> Self {
        let mut chars = [b'.'; 13];
        let mut tmp = value;
        for i in 0..=12 {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            chars[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let text: String = chars[..MAX_NAME_LENGTH]
            .iter()
            .map(|b| *b as char)
            .collect();
        Self(text.trim_end_matches('.').to_string())
    }

    /// Packs this name into its 64-bit wire form.
    pub fn to_u64(&self) -> u64 {
        self.0
            .chars()
            .take(MAX_NAME_LENGTH)
            .enumerate()
            .fold(0u64, |value, (i, c)| {
                let sym = u64::from(symbol(c).unwrap_or(0)) & 0x1f;
                value | (sym << (64 - 5 * (i + 1)))
            })
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn symbol(c: char) -> Option<u8> {
    match c {
        'a'..='z' => Some(c as u8 - b'a' + 6),
        '1'..='5' => Some(c as u8 - b'1' + 1),
        '.' => Some(0),
        _ => None,
    }
}

impl fmt::Debug for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountName({})", self.0)
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountName {
    type Err = WriteApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for AccountName {
    type Error = WriteApiError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for AccountName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for AccountName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.0)
        } else {
            serializer.serialize_u64(self.to_u64())
        }
    }
}

impl<'de> Deserialize<'de> for AccountName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::new(s).map_err(serde::de::Error::custom)
        } else {
            let value = u64::deserialize(deserializer)?;
            Ok(Self::from_u64(value))
        }
    }
}

/// An `{account, permission}` pair asserting who must sign for an action.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionLevel {
    /// The authorizing account.
    pub account: AccountName,
    /// The permission of that account, usually `active`.
    pub permission: AccountName,
}

impl PermissionLevel {
    /// The permission derived for the first account-like field of an action.
    pub const ACTIVE: &'static str = "active";

    /// Creates an `active` permission level for the account.
    pub fn active(account: AccountName) -> Self {
        Self {
            account,
            permission: AccountName(Self::ACTIVE.to_string()),
        }
    }
}

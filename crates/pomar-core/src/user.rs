//! Static user directory.
//!
//! The relay hands every client a small numeric id; the client maps it onto a
//! fixed set of users known at startup. Ids travel string-encoded in some
//! frames (`idClient`, `userDesconect`) and as plain numbers in others.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric user id assigned by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl UserId {
    /// The raw numeric value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = UserIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UserIdParseError::Empty);
        }
        trimmed
            .parse::<u32>()
            .map(UserId)
            .map_err(|_| UserIdParseError::NotNumeric(s.to_string()))
    }
}

impl From<u32> for UserId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Error parsing a string-encoded user id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdParseError {
    #[error("user id cannot be empty")]
    Empty,
    #[error("user id must be numeric, got: {0}")]
    NotNumeric(String),
}

/// A directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: &'static str,
    /// Avatar style class, if the user has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<&'static str>,
}

impl User {
    const fn new(id: u32, name: &'static str, avatar: Option<&'static str>) -> Self {
        Self {
            id: UserId(id),
            name,
            avatar,
        }
    }
}

/// Name shown on system bubbles.
pub const SYSTEM_NAME: &str = "Sistema";

/// Every user the relay can assign.
pub static DIRECTORY: [User; 7] = [
    User::new(1, "Cupuaçu", Some("bot01-avatar")),
    User::new(2, "Jabuticaba", Some("bot02-avatar")),
    User::new(3, "Açaí", Some("bot03-avatar")),
    User::new(4, "Bacuri", Some("bot04-avatar")),
    User::new(5, "Uxi", Some("bot05-avatar")),
    User::new(6, SYSTEM_NAME, None),
    User::new(7, "Servidor", None),
];

/// Look up a directory entry by id.
pub fn lookup(id: UserId) -> Option<&'static User> {
    DIRECTORY.iter().find(|user| user.id == id)
}

/// Look up a directory entry by display name.
pub fn lookup_name(name: &str) -> Option<&'static User> {
    DIRECTORY.iter().find(|user| user.name == name)
}

//! User module - read-only profiles served by the user directory

use std::fmt;

/// Unique identifier for a user based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(u128);

impl UserId {
    /// Generate a new UUIDv7-based UserId
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::UserId;
    ///
    /// let id = UserId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a UserId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a UserId from its hyphenated UUID form
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::UserId;
    ///
    /// let id = UserId::new();
    /// let parsed = UserId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid user id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl std::str::FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// A user profile as returned by the user directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique identity
    pub id: UserId,

    /// Contact address (unique, an e-mail address)
    pub contact: String,

    /// Display name, used to order every relationship list
    pub display_name: String,

    /// Avatar reference (URL or storage key)
    pub avatar: Option<String>,

    /// Free-form bio text
    pub bio: Option<String>,
}

impl User {
    /// Create a user with no avatar and no bio
    pub fn new(id: UserId, contact: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            contact: contact.into(),
            display_name: display_name.into(),
            avatar: None,
            bio: None,
        }
    }

    /// Attach an avatar reference
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Attach a bio
    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Round-trip through string representation preserves ID
        #[test]
        fn test_user_id_string_roundtrip(value: u128) {
            let id = UserId::from_value(value);
            match UserId::from_string(&id.to_string()) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}

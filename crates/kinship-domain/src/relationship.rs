//! Relationship module - one record per unordered pair of users

use crate::{FriendState, UserId};
use std::fmt;

/// Store-assigned identity of a relationship record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationshipId(i64);

impl RelationshipId {
    /// Wrap a raw store identifier
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a user inside a relationship record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The `left` user: whoever created (or re-armed by swap) the record
    Initiator,

    /// The `right` user
    Recipient,
}

/// The relationship record between two distinct users
///
/// `left` is the user whose action created the record. The ordering only
/// changes through an explicit swap (see [`crate::transition::plan_add`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Record identity
    pub id: RelationshipId,

    /// The initiating user
    pub left: UserId,

    /// The other user
    pub right: UserId,

    /// Current state; never [`FriendState::None`] for a stored record
    pub state: FriendState,

    /// Creation time (unix seconds)
    pub created_at: u64,

    /// Last mutation time (unix seconds)
    pub updated_at: u64,
}

impl Relationship {
    /// Role of `user` in this record, if they take part in it
    pub fn role_of(&self, user: UserId) -> Option<Role> {
        perspective(self, user)
    }

    /// The participant that is not `user`
    pub fn other_party(&self, user: UserId) -> Option<UserId> {
        match self.role_of(user)? {
            Role::Initiator => Some(self.right),
            Role::Recipient => Some(self.left),
        }
    }

    /// Whether the record links exactly `a` and `b`, in either order
    pub fn connects(&self, a: UserId, b: UserId) -> bool {
        (self.left == a && self.right == b) || (self.left == b && self.right == a)
    }
}

/// Compute `actor`'s role in `record`
///
/// Returns `None` when the actor is not one of the two participants.
pub fn perspective(record: &Relationship, actor: UserId) -> Option<Role> {
    if actor == record.left {
        Some(Role::Initiator)
    } else if actor == record.right {
        Some(Role::Recipient)
    } else {
        None
    }
}

//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the relationship engine and
//! its collaborators. Implementations live in other crates (kinship-store).

use crate::{FriendState, ListKind, Relationship, RelationshipId, StateUpdate, User, UserId};

/// Read-only lookup of user profiles
pub trait UserDirectory {
    /// Error type for directory lookups
    type Error;

    /// Find a user by identity
    fn find_by_identity(&self, id: UserId) -> Result<Option<User>, Self::Error>;

    /// Find a user by contact address
    fn find_by_contact(&self, contact: &str) -> Result<Option<User>, Self::Error>;
}

/// Storage of relationship records
///
/// Only active (not soft-deleted) records are ever returned.
pub trait RelationshipStore {
    /// Error type for store operations
    type Error;

    /// Find the active record for an unordered pair, matching either ordering
    fn find_active_by_pair(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Relationship>, Self::Error>;

    /// Find an active record by identity
    fn find_active_by_id(&self, id: RelationshipId) -> Result<Option<Relationship>, Self::Error>;

    /// Insert a new record with `left` as the initiator
    fn insert_relationship(
        &mut self,
        left: UserId,
        right: UserId,
        state: FriendState,
    ) -> Result<Relationship, Self::Error>;

    /// Apply a compare-and-swap update
    ///
    /// Returns `Ok(false)` without writing when the stored state no longer
    /// equals `update.expected` (or the record is gone).
    fn update_state(&mut self, update: &StateUpdate) -> Result<bool, Self::Error>;

    /// Active records involving `user` that belong in `kind`, each paired with
    /// the other participant's profile, ordered by that profile's display name
    fn list_active(
        &self,
        user: UserId,
        kind: ListKind,
    ) -> Result<Vec<(Relationship, User)>, Self::Error>;
}

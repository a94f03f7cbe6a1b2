//! Kinship Domain Layer
//!
//! This crate contains the friend-relationship state machine and the domain
//! model shared by every other Kinship crate. It performs no I/O and depends
//! only on `uuid` for user identities.
//!
//! ## Key Concepts
//!
//! - **User**: a read-only profile owned by the user directory
//! - **Relationship**: the single record linking an unordered pair of users
//! - **Left / Right**: `left` is the user whose action created the record
//! - **FriendState**: seven states, six of which can be persisted
//! - **Role**: the actor's position in a record, computed on read
//! - **Transitions**: pure functions from (record, actor) to the next state
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Storage and directory access go through the traits in [`traits`]
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod listing;
pub mod relationship;
pub mod state;
pub mod traits;
pub mod transition;
pub mod user;

// Re-exports for convenience
pub use listing::ListKind;
pub use relationship::{perspective, Relationship, RelationshipId, Role};
pub use state::FriendState;
pub use transition::{Refusal, StateUpdate};
pub use user::{User, UserId};

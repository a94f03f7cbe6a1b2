//! Kinship Relationship Engine
//!
//! Applies the friend-relationship state machine from `kinship-domain` to
//! records held by a user directory and relationship store.
//!
//! # Overview
//!
//! The engine is invoked with a verb, the acting user, and a target:
//!
//! | Verb | Target | Mutates |
//! |------|--------|---------|
//! | `add` | user identity | creates or updates the pair's record |
//! | `search` | contact address | no |
//! | `list_*` | none | no |
//! | `reject` / `block` / `unblock` | record identity + other user | updates the record |
//!
//! Each verb returns an [`Outcome`] or [`Listing`] on success and an
//! [`EngineError`] otherwise. Both convert into the [`ActionResult`]
//! envelope that the HTTP layer serializes.
//!
//! # Usage
//!
//! ```no_run
//! use kinship_engine::{ActionResult, RelationshipEngine, RelationshipView};
//! use kinship_store::SqliteStore;
//! use kinship_domain::UserId;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = RelationshipEngine::new(SqliteStore::new("kinship.db")?);
//! let (me, them) = (UserId::new(), UserId::new());
//!
//! let result: ActionResult<RelationshipView> = match engine.add(me, them) {
//!     Ok(outcome) => (&outcome).into(),
//!     Err(e) => (&e).into(),
//! };
//! println!("{}", result.message);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod engine;
mod error;
mod response;

pub use engine::RelationshipEngine;
pub use error::{EngineError, ErrorKind};
pub use response::{ActionResult, Listing, Outcome, RelationshipView};

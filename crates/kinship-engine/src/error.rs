//! Error types for the relationship engine

use kinship_domain::{Refusal, RelationshipId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while handling a relationship verb
///
/// Everything except [`EngineError::Store`] is an expected outcome that the
/// caller renders to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The actor targeted themselves
    #[error("You cannot {0} yourself")]
    SelfReference(&'static str),

    /// A user identity or contact address is unknown
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// No active record with this id links the two users
    #[error("Relationship not found: {0}")]
    RecordNotFound(RelationshipId),

    /// The verb is not legal in the record's current state
    #[error("Invalid state: {0}")]
    InvalidState(Refusal),

    /// The actor already sent a request that is still pending
    #[error("A friend request has already been sent to this user")]
    AlreadyPending,

    /// The actor already blocks the other user
    #[error("This user is already blocked")]
    AlreadyBlocked,

    /// Another writer changed the record between read and write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// User directory or relationship store failure
    #[error("Store error: {0}")]
    Store(String),
}

impl From<Refusal> for EngineError {
    fn from(refusal: Refusal) -> Self {
        match refusal {
            Refusal::AlreadyPending => EngineError::AlreadyPending,
            Refusal::AlreadyBlocked => EngineError::AlreadyBlocked,
            other => EngineError::InvalidState(other),
        }
    }
}

/// Machine-readable failure category sent to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`EngineError::SelfReference`]
    #[serde(rename = "SelfReferenceError")]
    SelfReference,
    /// See [`EngineError::UserNotFound`] and [`EngineError::RecordNotFound`]
    #[serde(rename = "NotFoundError")]
    NotFound,
    /// See [`EngineError::InvalidState`]
    #[serde(rename = "InvalidStateError")]
    InvalidState,
    /// See [`EngineError::AlreadyPending`]
    #[serde(rename = "AlreadyPendingError")]
    AlreadyPending,
    /// See [`EngineError::AlreadyBlocked`]
    #[serde(rename = "AlreadyBlockedError")]
    AlreadyBlocked,
    /// See [`EngineError::Conflict`]
    #[serde(rename = "ConflictError")]
    Conflict,
    /// See [`EngineError::Store`]
    #[serde(rename = "StoreError")]
    Store,
    /// The request itself was malformed (raised by the HTTP layer)
    #[serde(rename = "InvalidRequestError")]
    InvalidRequest,
}

impl EngineError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::SelfReference(_) => ErrorKind::SelfReference,
            EngineError::UserNotFound(_) | EngineError::RecordNotFound(_) => ErrorKind::NotFound,
            EngineError::InvalidState(_) => ErrorKind::InvalidState,
            EngineError::AlreadyPending => ErrorKind::AlreadyPending,
            EngineError::AlreadyBlocked => ErrorKind::AlreadyBlocked,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Store(_) => ErrorKind::Store,
        }
    }

    /// Whether the failure is an expected, user-facing outcome
    pub fn is_expected(&self) -> bool {
        !matches!(self, EngineError::Store(_))
    }
}

//! Outcomes of engine verbs and the envelope they are sent to clients in

use crate::error::{EngineError, ErrorKind};
use kinship_domain::{FriendState, ListKind, Relationship, User};
use serde::{Deserialize, Serialize};

/// Result of a single-pair verb (add, search, reject, block, unblock)
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// State of the pair after the verb
    pub state: FriendState,

    /// The record after the verb, `None` when the pair has no record
    pub record: Option<Relationship>,

    /// Profile of the other user
    pub counterpart: User,

    /// Human-readable description from the actor's viewpoint
    pub message: String,

    /// Whether the verb inserted a new record
    pub created: bool,
}

impl Outcome {
    /// Client-facing view of the outcome
    pub fn view(&self) -> RelationshipView {
        RelationshipView::new(self.record.as_ref(), &self.counterpart, self.state)
    }
}

/// Result of a list verb
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Which list was requested
    pub kind: ListKind,

    /// Records with the other participant's profile, ordered by display name
    pub entries: Vec<(Relationship, User)>,

    /// Human-readable summary
    pub message: String,
}

impl Listing {
    /// Client-facing views of every entry
    pub fn views(&self) -> Vec<RelationshipView> {
        self.entries
            .iter()
            .map(|(record, user)| RelationshipView::new(Some(record), user, record.state))
            .collect()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The other party's profile together with the pair's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipView {
    /// Record identity, absent when the pair has no record
    pub record_id: Option<i64>,

    /// Other user's identity
    pub user_uid: String,

    /// Other user's contact address
    pub contact: String,

    /// Other user's display name
    pub display_name: String,

    /// Other user's avatar reference
    pub avatar: Option<String>,

    /// Other user's bio
    pub bio: Option<String>,

    /// Absolute state code (-1 to 5)
    pub state: i8,

    /// Snake-case state name
    pub state_name: String,
}

impl RelationshipView {
    /// Build a view of `user` for a pair in `state`
    pub fn new(record: Option<&Relationship>, user: &User, state: FriendState) -> Self {
        Self {
            record_id: record.map(|r| r.id.value()),
            user_uid: user.id.to_string(),
            contact: user.contact.clone(),
            display_name: user.display_name.clone(),
            avatar: user.avatar.clone(),
            bio: user.bio.clone(),
            state: state.code(),
            state_name: state.as_str().to_string(),
        }
    }

    /// Decode the state code back into a [`FriendState`]
    pub fn friend_state(&self) -> Option<FriendState> {
        FriendState::from_code(self.state as i64)
    }
}

/// Discriminated result envelope: `{success, data, message, error_kind}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult<T> {
    /// Whether the verb succeeded
    pub success: bool,

    /// Payload on success
    pub data: Option<T>,

    /// Human-readable outcome
    pub message: String,

    /// Failure category, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl<T> ActionResult<T> {
    /// Successful result carrying `data`
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error_kind: None,
        }
    }

    /// Failed result of a given kind
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            error_kind: Some(kind),
        }
    }
}

impl From<&Outcome> for ActionResult<RelationshipView> {
    fn from(outcome: &Outcome) -> Self {
        ActionResult::ok(outcome.view(), outcome.message.clone())
    }
}

impl From<&Listing> for ActionResult<Vec<RelationshipView>> {
    fn from(listing: &Listing) -> Self {
        ActionResult::ok(listing.views(), listing.message.clone())
    }
}

impl<T> From<&EngineError> for ActionResult<T> {
    fn from(err: &EngineError) -> Self {
        ActionResult::failure(err.kind(), err.to_string())
    }
}

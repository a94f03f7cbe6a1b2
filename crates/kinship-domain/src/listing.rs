//! Relationship list categories
//!
//! Each list is a filter over the active records involving one user,
//! keyed on that user's role and the record's state.

use crate::{FriendState, Role};

/// The five relationship lists a user can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Friends, including pairs where the *other* user blocks the viewer
    Friends,

    /// Mutual friends only
    Advisers,

    /// Requests the viewer sent, pending or rejected
    SentRequests,

    /// Requests the viewer received and has not answered
    ReceivedRequests,

    /// Users the viewer blocks
    Blocked,
}

impl ListKind {
    /// Every list kind
    pub const ALL: [ListKind; 5] = [
        ListKind::Friends,
        ListKind::Advisers,
        ListKind::SentRequests,
        ListKind::ReceivedRequests,
        ListKind::Blocked,
    ];

    /// Whether a record in `state`, seen by a viewer holding `role`, belongs in this list
    ///
    /// `Friends` keeps the long-standing behaviour of listing a user who
    /// blocks the viewer (`RightBlocksLeft` for the initiator,
    /// `LeftBlocksRight` for the recipient). See DESIGN.md.
    pub fn includes(&self, role: Role, state: FriendState) -> bool {
        use FriendState::*;

        match self {
            ListKind::Friends => matches!(
                (role, state),
                (_, Mutual)
                    | (Role::Initiator, RightBlocksLeft)
                    | (Role::Recipient, LeftBlocksRight)
            ),
            ListKind::Advisers => state == Mutual,
            ListKind::SentRequests => {
                role == Role::Initiator && matches!(state, Rejected | PendingLeft)
            }
            ListKind::ReceivedRequests => role == Role::Recipient && state == PendingLeft,
            ListKind::Blocked => matches!(
                (role, state),
                (_, MutualBlock)
                    | (Role::Initiator, LeftBlocksRight)
                    | (Role::Recipient, RightBlocksLeft)
            ),
        }
    }

    /// Human-readable name of the list
    pub fn label(&self) -> &'static str {
        match self {
            ListKind::Friends => "friend",
            ListKind::Advisers => "adviser",
            ListKind::SentRequests => "sent friend request",
            ListKind::ReceivedRequests => "received friend request",
            ListKind::Blocked => "blocked user",
        }
    }
}

//! Transition tables for every mutating verb
//!
//! Each `plan_*` function is pure: it takes the record as read from the
//! store and the acting user, and either describes the mutation to apply or
//! explains which rule refused it. Applying the plan is the caller's job.
//!
//! | Verb | Current state | Initiator (left) | Recipient (right) |
//! |------|---------------|------------------|-------------------|
//! | add | no record | create `PendingLeft` | create `PendingLeft` |
//! | add | `Rejected` | `PendingLeft` | swap, `PendingLeft` |
//! | add | `PendingLeft` | already pending | `Mutual` |
//! | add | friends or any block | refused | refused |
//! | reject | `PendingLeft` | own request | `Rejected` |
//! | block | `Mutual` | `LeftBlocksRight` | `RightBlocksLeft` |
//! | block | `LeftBlocksRight` | already blocked | `MutualBlock` |
//! | block | `RightBlocksLeft` | `MutualBlock` | already blocked |
//! | block | `MutualBlock` | already blocked | already blocked |
//! | unblock | `LeftBlocksRight` | `Mutual` | never blocked |
//! | unblock | `RightBlocksLeft` | never blocked | `Mutual` |
//! | unblock | `MutualBlock` | `RightBlocksLeft` | `LeftBlocksRight` |

use crate::{perspective, FriendState, Relationship, RelationshipId, Role};
use std::fmt;

/// A compare-and-swap state change for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateUpdate {
    /// Record to update
    pub id: RelationshipId,

    /// State read before planning; the update only applies if it still holds
    pub expected: FriendState,

    /// State to write
    pub next: FriendState,

    /// Exchange `left` and `right` in the same write
    pub swap: bool,
}

/// What `add` should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPlan {
    /// No active record: insert one with the actor on the left
    Create,

    /// Mutate the existing record
    Update(StateUpdate),
}

/// Rule that refused a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Refusal {
    /// The actor already has an outgoing pending request
    AlreadyPending,

    /// The actor already blocks the other user
    AlreadyBlocked,

    /// The users are already friends or one of them blocks the other
    AlreadyConnected,

    /// The actor tried to reject the request they sent
    OwnRequest,

    /// There is no pending request to reject
    NoPendingRequest,

    /// Block or unblock on a pair that never became friends
    NotFriends,

    /// Unblock on a pair where nobody blocks
    NotBlocked,

    /// Unblock by a user who is blocked but never blocked back
    NeverBlocked,

    /// The actor is not one of the record's two users
    NotParticipant,
}

impl Refusal {
    /// Short human-readable explanation of the rule
    pub fn description(&self) -> &'static str {
        match self {
            Refusal::AlreadyPending => "a friend request has already been sent to this user",
            Refusal::AlreadyBlocked => "this user is already blocked",
            Refusal::AlreadyConnected => "already friends or blocked",
            Refusal::OwnRequest => "cannot reject your own outgoing request",
            Refusal::NoPendingRequest => "this user has not sent you a friend request",
            Refusal::NotFriends => "not friends, cannot block or unblock",
            Refusal::NotBlocked => "this friend is not blocked",
            Refusal::NeverBlocked => "you never blocked this user",
            Refusal::NotParticipant => "the relationship does not involve this user",
        }
    }
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

fn role(record: &Relationship, actor: crate::UserId) -> Result<Role, Refusal> {
    perspective(record, actor).ok_or(Refusal::NotParticipant)
}

fn update(record: &Relationship, next: FriendState, swap: bool) -> StateUpdate {
    StateUpdate {
        id: record.id,
        expected: record.state,
        next,
        swap,
    }
}

/// Plan a friend request (or acceptance) from `actor`
///
/// `current` is the active record for the pair, if any.
pub fn plan_add(current: Option<&Relationship>, actor: crate::UserId) -> Result<AddPlan, Refusal> {
    let Some(record) = current else {
        return Ok(AddPlan::Create);
    };

    let role = role(record, actor)?;
    let plan = match (record.state, role) {
        // A declined (or empty) record is re-armed with the actor as the initiator
        (FriendState::Rejected | FriendState::None, Role::Initiator) => {
            update(record, FriendState::PendingLeft, false)
        }
        (FriendState::Rejected | FriendState::None, Role::Recipient) => {
            update(record, FriendState::PendingLeft, true)
        }
        (FriendState::PendingLeft, Role::Initiator) => return Err(Refusal::AlreadyPending),
        (FriendState::PendingLeft, Role::Recipient) => update(record, FriendState::Mutual, false),
        (
            FriendState::Mutual
            | FriendState::LeftBlocksRight
            | FriendState::RightBlocksLeft
            | FriendState::MutualBlock,
            _,
        ) => return Err(Refusal::AlreadyConnected),
    };

    Ok(AddPlan::Update(plan))
}

/// Plan the rejection of a pending request by `actor`
pub fn plan_reject(record: &Relationship, actor: crate::UserId) -> Result<StateUpdate, Refusal> {
    match (record.state, role(record, actor)?) {
        (FriendState::PendingLeft, Role::Initiator) => Err(Refusal::OwnRequest),
        (FriendState::PendingLeft, Role::Recipient) => {
            Ok(update(record, FriendState::Rejected, false))
        }
        (
            FriendState::None
            | FriendState::Rejected
            | FriendState::Mutual
            | FriendState::LeftBlocksRight
            | FriendState::RightBlocksLeft
            | FriendState::MutualBlock,
            _,
        ) => Err(Refusal::NoPendingRequest),
    }
}

/// Plan a block of the other party by `actor`
pub fn plan_block(record: &Relationship, actor: crate::UserId) -> Result<StateUpdate, Refusal> {
    let next = match (record.state, role(record, actor)?) {
        (FriendState::MutualBlock, _) => return Err(Refusal::AlreadyBlocked),
        (FriendState::None | FriendState::PendingLeft | FriendState::Rejected, _) => {
            return Err(Refusal::NotFriends)
        }
        (FriendState::Mutual, Role::Initiator) => FriendState::LeftBlocksRight,
        (FriendState::Mutual, Role::Recipient) => FriendState::RightBlocksLeft,
        (FriendState::LeftBlocksRight, Role::Initiator) => return Err(Refusal::AlreadyBlocked),
        (FriendState::LeftBlocksRight, Role::Recipient) => FriendState::MutualBlock,
        (FriendState::RightBlocksLeft, Role::Recipient) => return Err(Refusal::AlreadyBlocked),
        (FriendState::RightBlocksLeft, Role::Initiator) => FriendState::MutualBlock,
    };

    Ok(update(record, next, false))
}

/// Plan lifting `actor`'s block on the other party
///
/// From a mutual block only the actor's direction is lifted.
pub fn plan_unblock(record: &Relationship, actor: crate::UserId) -> Result<StateUpdate, Refusal> {
    let next = match (record.state, role(record, actor)?) {
        (FriendState::None | FriendState::PendingLeft | FriendState::Rejected, _) => {
            return Err(Refusal::NotFriends)
        }
        (FriendState::Mutual, _) => return Err(Refusal::NotBlocked),
        (FriendState::LeftBlocksRight, Role::Initiator) => FriendState::Mutual,
        (FriendState::LeftBlocksRight, Role::Recipient) => return Err(Refusal::NeverBlocked),
        (FriendState::RightBlocksLeft, Role::Recipient) => FriendState::Mutual,
        (FriendState::RightBlocksLeft, Role::Initiator) => return Err(Refusal::NeverBlocked),
        (FriendState::MutualBlock, Role::Initiator) => FriendState::RightBlocksLeft,
        (FriendState::MutualBlock, Role::Recipient) => FriendState::LeftBlocksRight,
    };

    Ok(update(record, next, false))
}

/// Apply a planned update to an in-memory copy of the record
///
/// Used to describe the record after its update was written.
pub fn apply(record: &Relationship, update: &StateUpdate) -> Relationship {
    let mut next = record.clone();
    if update.swap {
        std::mem::swap(&mut next.left, &mut next.right);
    }
    next.state = update.next;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;

    fn left() -> UserId {
        UserId::from_value(10)
    }

    fn right() -> UserId {
        UserId::from_value(20)
    }

    fn record(state: FriendState) -> Relationship {
        Relationship {
            id: RelationshipId::new(1),
            left: left(),
            right: right(),
            state,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_add_without_record_creates() {
        assert_eq!(plan_add(None, left()), Ok(AddPlan::Create));
    }

    #[test]
    fn test_add_after_rejection_by_initiator_keeps_order() {
        let rel = record(FriendState::Rejected);
        let AddPlan::Update(update) = plan_add(Some(&rel), left()).unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(update.next, FriendState::PendingLeft);
        assert!(!update.swap);
        assert_eq!(update.expected, FriendState::Rejected);
    }

    #[test]
    fn test_add_after_rejection_by_recipient_swaps() {
        let rel = record(FriendState::Rejected);
        let AddPlan::Update(update) = plan_add(Some(&rel), right()).unwrap() else {
            panic!("expected an update");
        };
        assert!(update.swap);

        let next = apply(&rel, &update);
        assert_eq!(next.left, right());
        assert_eq!(next.right, left());
        assert_eq!(next.state, FriendState::PendingLeft);
    }

    #[test]
    fn test_add_pending() {
        let rel = record(FriendState::PendingLeft);
        assert_eq!(plan_add(Some(&rel), left()), Err(Refusal::AlreadyPending));

        let AddPlan::Update(update) = plan_add(Some(&rel), right()).unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(update.next, FriendState::Mutual);
    }

    #[test]
    fn test_add_refused_once_connected() {
        for state in [
            FriendState::Mutual,
            FriendState::LeftBlocksRight,
            FriendState::RightBlocksLeft,
            FriendState::MutualBlock,
        ] {
            let rel = record(state);
            assert_eq!(plan_add(Some(&rel), left()), Err(Refusal::AlreadyConnected));
            assert_eq!(plan_add(Some(&rel), right()), Err(Refusal::AlreadyConnected));
        }
    }

    #[test]
    fn test_reject_table() {
        let pending = record(FriendState::PendingLeft);
        assert_eq!(plan_reject(&pending, left()), Err(Refusal::OwnRequest));
        assert_eq!(plan_reject(&pending, right()).unwrap().next, FriendState::Rejected);

        for state in [FriendState::Rejected, FriendState::Mutual, FriendState::MutualBlock] {
            assert_eq!(plan_reject(&record(state), right()), Err(Refusal::NoPendingRequest));
        }
    }

    #[test]
    fn test_block_table() {
        let mutual = record(FriendState::Mutual);
        assert_eq!(plan_block(&mutual, left()).unwrap().next, FriendState::LeftBlocksRight);
        assert_eq!(plan_block(&mutual, right()).unwrap().next, FriendState::RightBlocksLeft);

        let lbr = record(FriendState::LeftBlocksRight);
        assert_eq!(plan_block(&lbr, left()), Err(Refusal::AlreadyBlocked));
        assert_eq!(plan_block(&lbr, right()).unwrap().next, FriendState::MutualBlock);

        let rbl = record(FriendState::RightBlocksLeft);
        assert_eq!(plan_block(&rbl, right()), Err(Refusal::AlreadyBlocked));
        assert_eq!(plan_block(&rbl, left()).unwrap().next, FriendState::MutualBlock);

        let both = record(FriendState::MutualBlock);
        assert_eq!(plan_block(&both, left()), Err(Refusal::AlreadyBlocked));
        assert_eq!(plan_block(&both, right()), Err(Refusal::AlreadyBlocked));

        assert_eq!(plan_block(&record(FriendState::PendingLeft), left()), Err(Refusal::NotFriends));
        assert_eq!(plan_block(&record(FriendState::Rejected), right()), Err(Refusal::NotFriends));
    }

    #[test]
    fn test_unblock_table() {
        let pending = record(FriendState::PendingLeft);
        assert_eq!(plan_unblock(&pending, left()), Err(Refusal::NotFriends));
        assert_eq!(plan_unblock(&record(FriendState::Rejected), left()), Err(Refusal::NotFriends));
        assert_eq!(plan_unblock(&record(FriendState::Mutual), left()), Err(Refusal::NotBlocked));

        let lbr = record(FriendState::LeftBlocksRight);
        assert_eq!(plan_unblock(&lbr, left()).unwrap().next, FriendState::Mutual);
        assert_eq!(plan_unblock(&lbr, right()), Err(Refusal::NeverBlocked));

        let rbl = record(FriendState::RightBlocksLeft);
        assert_eq!(plan_unblock(&rbl, right()).unwrap().next, FriendState::Mutual);
        assert_eq!(plan_unblock(&rbl, left()), Err(Refusal::NeverBlocked));

        let both = record(FriendState::MutualBlock);
        assert_eq!(plan_unblock(&both, left()).unwrap().next, FriendState::RightBlocksLeft);
        assert_eq!(plan_unblock(&both, right()).unwrap().next, FriendState::LeftBlocksRight);
    }

    #[test]
    fn test_outsider_is_refused() {
        let outsider = UserId::from_value(99);
        let rel = record(FriendState::Mutual);
        assert_eq!(plan_block(&rel, outsider), Err(Refusal::NotParticipant));
        assert_eq!(plan_unblock(&rel, outsider), Err(Refusal::NotParticipant));
        assert_eq!(plan_reject(&rel, outsider), Err(Refusal::NotParticipant));
        assert_eq!(plan_add(Some(&rel), outsider), Err(Refusal::NotParticipant));
    }
}

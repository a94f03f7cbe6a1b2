//! Friend state module - the seven states a user pair can be in

use std::fmt;

/// State of the relationship between two users
///
/// Codes are stable and shared with storage and API clients:
///
/// | Variant | Code |
/// |---------|------|
/// | `None` | -1 |
/// | `Rejected` | 0 |
/// | `PendingLeft` | 1 |
/// | `Mutual` | 2 |
/// | `LeftBlocksRight` | 3 |
/// | `RightBlocksLeft` | 4 |
/// | `MutualBlock` | 5 |
///
/// `None` only describes the absence of a record and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FriendState {
    /// No record exists for the pair
    None,

    /// The right-hand user declined a request; the record can be re-armed
    Rejected,

    /// The left-hand user asked the right-hand user to be friends
    PendingLeft,

    /// Both users are friends
    Mutual,

    /// The left-hand user blocks the right-hand user
    LeftBlocksRight,

    /// The right-hand user blocks the left-hand user
    RightBlocksLeft,

    /// Both users block each other
    MutualBlock,
}

impl FriendState {
    /// Every state, in code order
    pub const ALL: [FriendState; 7] = [
        FriendState::None,
        FriendState::Rejected,
        FriendState::PendingLeft,
        FriendState::Mutual,
        FriendState::LeftBlocksRight,
        FriendState::RightBlocksLeft,
        FriendState::MutualBlock,
    ];

    /// Numeric code of the state
    pub fn code(&self) -> i8 {
        match self {
            FriendState::None => -1,
            FriendState::Rejected => 0,
            FriendState::PendingLeft => 1,
            FriendState::Mutual => 2,
            FriendState::LeftBlocksRight => 3,
            FriendState::RightBlocksLeft => 4,
            FriendState::MutualBlock => 5,
        }
    }

    /// State for a numeric code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(FriendState::None),
            0 => Some(FriendState::Rejected),
            1 => Some(FriendState::PendingLeft),
            2 => Some(FriendState::Mutual),
            3 => Some(FriendState::LeftBlocksRight),
            4 => Some(FriendState::RightBlocksLeft),
            5 => Some(FriendState::MutualBlock),
            _ => None,
        }
    }

    /// Snake-case name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendState::None => "none",
            FriendState::Rejected => "rejected",
            FriendState::PendingLeft => "pending_left",
            FriendState::Mutual => "mutual",
            FriendState::LeftBlocksRight => "left_blocks_right",
            FriendState::RightBlocksLeft => "right_blocks_left",
            FriendState::MutualBlock => "mutual_block",
        }
    }

    /// Whether a record may hold this state
    pub fn is_persisted(&self) -> bool {
        !matches!(self, FriendState::None)
    }

    /// Whether at least one side blocks the other
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            FriendState::LeftBlocksRight | FriendState::RightBlocksLeft | FriendState::MutualBlock
        )
    }
}

impl fmt::Display for FriendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let codes: Vec<i8> = FriendState::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec![-1, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_from_code_inverts_code() {
        for state in FriendState::ALL {
            assert_eq!(FriendState::from_code(state.code() as i64), Some(state));
        }
        assert_eq!(FriendState::from_code(6), None);
        assert_eq!(FriendState::from_code(-2), None);
    }

    #[test]
    fn test_only_none_is_unpersisted() {
        assert!(!FriendState::None.is_persisted());
        assert!(FriendState::ALL[1..].iter().all(|s| s.is_persisted()));
    }

    #[test]
    fn test_block_states() {
        assert!(FriendState::LeftBlocksRight.is_block());
        assert!(FriendState::RightBlocksLeft.is_block());
        assert!(FriendState::MutualBlock.is_block());
        assert!(!FriendState::Mutual.is_block());
        assert!(!FriendState::PendingLeft.is_block());
    }
}

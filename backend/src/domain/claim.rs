//! Item claim state machine.
//!
//! ```text
//! Unclaimed      --toggle(r)-->  ClaimedBy(r)
//! ClaimedBy(r)   --toggle(r)-->  Unclaimed
//! ClaimedBy(x)   --toggle(r)-->  conflict, state unchanged   (x != r)
//! ```
//!
//! `toggle` is pure; callers persist the returned state with a conditional
//! write keyed on the state they evaluated against.

use super::user::UserId;

/// Claim status of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClaimState {
    #[default]
    Unclaimed,
    ClaimedBy(UserId),
}

/// Raised when a member tries to claim an item someone else holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("item is already claimed by another member")]
pub struct ClaimConflict {
    pub holder: UserId,
}

/// Stored columns that violate `claimed <=> claimant present`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("claim flag and claimant disagree (claimed = {claimed})")]
pub struct InconsistentClaim {
    pub claimed: bool,
}

impl ClaimState {
    /// Apply a toggle by `requester` to this state.
    ///
    /// # Examples
    /// ```
    /// use synclist::domain::{ClaimState, UserId};
    ///
    /// let ada = UserId::random();
    /// let claimed = ClaimState::Unclaimed.toggle(ada).unwrap();
    /// assert_eq!(claimed, ClaimState::ClaimedBy(ada));
    /// assert_eq!(claimed.toggle(ada).unwrap(), ClaimState::Unclaimed);
    /// ```
    pub fn toggle(self, requester: UserId) -> Result<Self, ClaimConflict> {
        match self {
            Self::Unclaimed => Ok(Self::ClaimedBy(requester)),
            Self::ClaimedBy(holder) if holder == requester => Ok(Self::Unclaimed),
            Self::ClaimedBy(holder) => Err(ClaimConflict { holder }),
        }
    }

    pub fn is_claimed(self) -> bool {
        matches!(self, Self::ClaimedBy(_))
    }

    pub fn claimant(self) -> Option<UserId> {
        match self {
            Self::Unclaimed => None,
            Self::ClaimedBy(holder) => Some(holder),
        }
    }

    /// Rebuild a state from the `claimed`/`claimed_by` storage columns.
    pub fn from_columns(
        claimed: bool,
        claimant: Option<UserId>,
    ) -> Result<Self, InconsistentClaim> {
        match (claimed, claimant) {
            (false, None) => Ok(Self::Unclaimed),
            (true, Some(holder)) => Ok(Self::ClaimedBy(holder)),
            _ => Err(InconsistentClaim { claimed }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, Clone, Copy)]
    enum Start {
        Unclaimed,
        HeldByRequester,
        HeldByOther,
    }

    #[rstest]
    #[case(Start::Unclaimed, Some(true))]
    #[case(Start::HeldByRequester, Some(false))]
    #[case(Start::HeldByOther, None)]
    fn toggle_transitions(#[case] start: Start, #[case] claimed_after: Option<bool>) {
        let requester = UserId::random();
        let other = UserId::random();
        let state = match start {
            Start::Unclaimed => ClaimState::Unclaimed,
            Start::HeldByRequester => ClaimState::ClaimedBy(requester),
            Start::HeldByOther => ClaimState::ClaimedBy(other),
        };

        match (state.toggle(requester), claimed_after) {
            (Ok(next), Some(expected)) => {
                assert_eq!(next.is_claimed(), expected);
                assert_eq!(next.claimant().is_some(), next.is_claimed());
                if expected {
                    assert_eq!(next.claimant(), Some(requester));
                }
            }
            (Err(conflict), None) => assert_eq!(conflict.holder, other),
            (result, expected) => panic!("unexpected {result:?} for {expected:?}"),
        }
    }

    #[rstest]
    #[case(true, false)]
    #[case(false, true)]
    fn from_columns_rejects_inconsistent_rows(#[case] claimed: bool, #[case] has_claimant: bool) {
        let claimant = has_claimant.then(UserId::random);
        assert_eq!(
            ClaimState::from_columns(claimed, claimant),
            Err(InconsistentClaim { claimed })
        );
    }

    #[test]
    fn from_columns_accepts_consistent_rows() {
        let holder = UserId::random();
        assert_eq!(
            ClaimState::from_columns(true, Some(holder)),
            Ok(ClaimState::ClaimedBy(holder))
        );
        assert_eq!(
            ClaimState::from_columns(false, None),
            Ok(ClaimState::Unclaimed)
        );
    }
}

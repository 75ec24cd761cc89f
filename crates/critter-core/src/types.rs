//! Core ledger types: accounts, squeaks, sentiment, interactions, pools.
//!
//! All monetary values are in the ledger's base unit. All numeric fields use
//! u64 per protocol convention.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::error::LedgerError;

/// Identifier of a squeak. Assigned sequentially starting at 1.
pub type SqueakId = u64;

/// Lifecycle status of an account.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AccountStatus {
    /// No account has been registered for the address.
    #[default]
    NonExistent,
    /// Normal, fully functional account.
    Active,
    /// Temporarily barred from interacting.
    Suspended,
    /// Permanently barred from interacting.
    Banned,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NonExistent => "non-existent",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Banned => "banned",
        };
        f.write_str(s)
    }
}

impl FromStr for AccountStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "banned" => Ok(Self::Banned),
            _ => Err(LedgerError::InvalidAccountStatus(s.to_string())),
        }
    }
}

/// A registered account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Account address.
    pub account: Address,
    /// Unique, reassignable username.
    pub username: String,
    /// Current status.
    pub status: AccountStatus,
    /// Scout level, `>= 1` and capped at the configured maximum.
    pub scout_level: u64,
}

/// A uniquely owned content record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Squeak {
    /// Squeak identifier.
    pub id: SqueakId,
    /// Original poster. Never changes.
    pub author: Address,
    /// Current owner. Receives the owner share of interaction fees.
    pub owner: Address,
    /// Block number at which the squeak was posted.
    pub block_number: u64,
    /// Message payload.
    pub content: String,
}

impl Squeak {
    /// Number of blocks elapsed since the squeak was posted.
    pub fn block_age(&self, current_block: u64) -> u64 {
        current_block.saturating_sub(self.block_number)
    }
}

/// Aggregate sentiment counts for one squeak.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SentimentCounts {
    /// Accounts currently disliking the squeak.
    pub dislikes: u64,
    /// Accounts currently liking the squeak.
    pub likes: u64,
    /// Accounts currently resqueaking the squeak.
    pub resqueaks: u64,
}

/// One account's sentiment flags on one squeak.
///
/// `liked` and `disliked` are mutually exclusive; `resqueaked` is
/// independent of both.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Sentiment {
    pub liked: bool,
    pub disliked: bool,
    pub resqueaked: bool,
}

impl Sentiment {
    /// Whether the account counts as a scout (likes or resqueaks the squeak).
    pub fn is_positive(&self) -> bool {
        self.liked || self.resqueaked
    }

    /// Whether the account holds no sentiment at all.
    pub fn is_empty(&self) -> bool {
        !self.liked && !self.disliked && !self.resqueaked
    }
}

/// A priced action.
///
/// `Delete` only appears in the fee schedule (as the per-block rate); it is
/// not a valid argument to `interact`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Interaction {
    Delete,
    Dislike,
    Like,
    Resqueak,
    UndoDislike,
    UndoLike,
    UndoResqueak,
}

impl Interaction {
    /// Every interaction kind, in fee-schedule order.
    pub const ALL: [Interaction; 7] = [
        Self::Delete,
        Self::Dislike,
        Self::Like,
        Self::Resqueak,
        Self::UndoDislike,
        Self::UndoLike,
        Self::UndoResqueak,
    ];

    /// Positive interactions make the caller a scout and pay the owner.
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Like | Self::Resqueak)
    }

    /// Canonical lowercase name, used in RPC and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Dislike => "dislike",
            Self::Like => "like",
            Self::Resqueak => "resqueak",
            Self::UndoDislike => "undo_dislike",
            Self::UndoLike => "undo_like",
            Self::UndoResqueak => "undo_resqueak",
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interaction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| LedgerError::InvalidInteraction(s.to_string()))
    }
}

/// Permission roles consulted by the gate.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Configuration updates and role management.
    Admin,
    /// Account status changes and pool ejection.
    Moderator,
    /// Treasury withdrawal and fee schedule.
    Treasurer,
    /// Pausing and unpausing the ledger.
    Operator,
}

impl Role {
    pub const ALL: [Role; 4] = [Self::Admin, Self::Moderator, Self::Treasurer, Self::Operator];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::Treasurer => "treasurer",
            Self::Operator => "operator",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.to_string() == s.to_ascii_lowercase())
            .ok_or_else(|| LedgerError::InvalidRole(s.to_string()))
    }
}

/// A pool member and its share weight.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolPass {
    pub account: Address,
    pub shares: u64,
}

/// Summary of a squeak's scout pool. All zero when no pool exists.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PoolInfo {
    pub amount: u64,
    pub total_shares: u64,
    pub member_count: u64,
}

/// Call context of one transaction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Account submitting the call.
    pub caller: Address,
    /// Value attached to the call, debited from the caller before execution.
    pub value: u64,
    /// Block in which the call executes.
    pub block_number: u64,
}

impl CallContext {
    /// A call with no attached value.
    pub fn new(caller: Address, block_number: u64) -> Self {
        Self {
            caller,
            value: 0,
            block_number,
        }
    }

    /// A payable call carrying `value`.
    pub fn with_value(caller: Address, value: u64, block_number: u64) -> Self {
        Self {
            caller,
            value,
            block_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_names_roundtrip() {
        for kind in Interaction::ALL {
            assert_eq!(kind.as_str().parse::<Interaction>().unwrap(), kind);
        }
    }

    #[test]
    fn interaction_parse_accepts_dashes_and_case() {
        assert_eq!("Undo-Like".parse::<Interaction>().unwrap(), Interaction::UndoLike);
        assert_eq!("RESQUEAK".parse::<Interaction>().unwrap(), Interaction::Resqueak);
    }

    #[test]
    fn interaction_parse_rejects_unknown() {
        let err = "retweet".parse::<Interaction>().unwrap_err();
        assert_eq!(err, LedgerError::InvalidInteraction("retweet".into()));
    }

    #[test]
    fn only_like_and_resqueak_are_positive() {
        let positive: Vec<_> = Interaction::ALL
            .into_iter()
            .filter(Interaction::is_positive)
            .collect();
        assert_eq!(positive, vec![Interaction::Like, Interaction::Resqueak]);
    }

    #[test]
    fn sentiment_flags() {
        let mut s = Sentiment::default();
        assert!(s.is_empty());
        assert!(!s.is_positive());
        s.disliked = true;
        assert!(!s.is_positive());
        s.resqueaked = true;
        assert!(s.is_positive());
        assert!(!s.is_empty());
    }

    #[test]
    fn squeak_block_age_saturates() {
        let squeak = Squeak {
            id: 1,
            author: Address::ZERO,
            owner: Address::ZERO,
            block_number: 10,
            content: "hi".into(),
        };
        assert_eq!(squeak.block_age(15), 5);
        assert_eq!(squeak.block_age(3), 0);
    }

    #[test]
    fn role_and_status_parse() {
        assert_eq!("Treasurer".parse::<Role>().unwrap(), Role::Treasurer);
        assert!("root".parse::<Role>().is_err());
        assert_eq!("banned".parse::<AccountStatus>().unwrap(), AccountStatus::Banned);
        assert!("nonexistent".parse::<AccountStatus>().is_err());
    }

    #[test]
    fn pool_info_default_is_zero() {
        let info = PoolInfo::default();
        assert_eq!((info.amount, info.total_shares, info.member_count), (0, 0, 0));
    }
}

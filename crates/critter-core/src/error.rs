//! Error types for the Critter ledger.
//!
//! Every failure aborts the whole transaction. Variants are grouped by the
//! class of mistake the caller made; [`LedgerError::code`] gives each one a
//! stable numeric identifier for off-chain callers.
use thiserror::Error;

use crate::address::Address;
use crate::types::{AccountStatus, Interaction, Role, SqueakId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address length: {0} hex digits, expected 40")] InvalidLength(usize),
    #[error("invalid hex in address")] InvalidHex,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("logarithm of zero")] LogOfZero,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // Authorization
    #[error("{account} is missing role {role}")] MissingRole { role: Role, account: Address },
    #[error("{account} is not the owner of squeak {squeak_id}")] NotSqueakOwner { squeak_id: SqueakId, account: Address },

    // State
    #[error("ledger is paused")] Paused,
    #[error("ledger is not paused")] NotPaused,
    #[error("account {0} not found")] AccountNotFound(Address),
    #[error("account {0} already exists")] AccountAlreadyExists(Address),
    #[error("account {account} is {status}")] InactiveAccount { account: Address, status: AccountStatus },
    #[error("username already taken: {0}")] UsernameTaken(String),
    #[error("squeak {0} not found")] SqueakNotFound(SqueakId),
    #[error("no scout pool for squeak {0}")] PoolNotFound(SqueakId),
    #[error("already liked squeak {0}")] AlreadyLiked(SqueakId),
    #[error("already disliked squeak {0}")] AlreadyDisliked(SqueakId),
    #[error("already resqueaked squeak {0}")] AlreadyResqueaked(SqueakId),
    #[error("squeak {0} is not liked")] NotLiked(SqueakId),
    #[error("squeak {0} is not disliked")] NotDisliked(SqueakId),
    #[error("squeak {0} is not resqueaked")] NotResqueaked(SqueakId),
    #[error("block {got} is behind the ledger tip {tip}")] StaleBlock { got: u64, tip: u64 },

    // Value
    #[error("insufficient fee for {kind}: paid {paid}, required {required}")] InsufficientFee { kind: Interaction, paid: u64, required: u64 },
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u64, need: u64 },
    #[error("insufficient treasury: have {have}, requested {requested}")] InsufficientTreasury { have: u64, requested: u64 },
    #[error("invalid interaction: {0}")] InvalidInteraction(String),
    #[error("invalid configuration key: {0}")] InvalidConfigKey(String),
    #[error("invalid role: {0}")] InvalidRole(String),
    #[error("invalid account status: {0}")] InvalidAccountStatus(String),
    #[error("invalid username: {0}")] InvalidUsername(String),
    #[error("invalid content: {0}")] InvalidContent(String),
    #[error("invalid recipient: {0}")] InvalidRecipient(Address),
    #[error("call is not payable but carried {0}")] NonPayable(u64),

    // Invariant
    #[error("{account} is not a member of the pool for squeak {squeak_id}")] NotPoolMember { squeak_id: SqueakId, account: Address },
    #[error("pool for squeak {0} has no members")] EmptyPool(SqueakId),
    #[error(transparent)] Math(#[from] MathError),
}

impl LedgerError {
    /// Stable numeric code for this failure.
    ///
    /// Ranges: 1xxx authorization, 2xxx state, 3xxx value, 4xxx invariant.
    pub fn code(&self) -> i32 {
        match self {
            Self::MissingRole { .. } => 1001,
            Self::NotSqueakOwner { .. } => 1002,
            Self::Paused => 2001,
            Self::NotPaused => 2002,
            Self::AccountNotFound(_) => 2003,
            Self::AccountAlreadyExists(_) => 2004,
            Self::InactiveAccount { .. } => 2005,
            Self::UsernameTaken(_) => 2006,
            Self::SqueakNotFound(_) => 2007,
            Self::PoolNotFound(_) => 2008,
            Self::AlreadyLiked(_) => 2009,
            Self::AlreadyDisliked(_) => 2010,
            Self::AlreadyResqueaked(_) => 2011,
            Self::NotLiked(_) => 2012,
            Self::NotDisliked(_) => 2013,
            Self::NotResqueaked(_) => 2014,
            Self::StaleBlock { .. } => 2015,
            Self::InsufficientFee { .. } => 3001,
            Self::InsufficientBalance { .. } => 3002,
            Self::InsufficientTreasury { .. } => 3003,
            Self::InvalidInteraction(_) => 3004,
            Self::InvalidConfigKey(_) => 3005,
            Self::InvalidRole(_) => 3006,
            Self::InvalidAccountStatus(_) => 3007,
            Self::InvalidUsername(_) => 3008,
            Self::InvalidContent(_) => 3009,
            Self::InvalidRecipient(_) => 3010,
            Self::NonPayable(_) => 3011,
            Self::NotPoolMember { .. } => 4001,
            Self::EmptyPool(_) => 4002,
            Self::Math(_) => 4003,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_class() {
        let auth = LedgerError::MissingRole { role: Role::Admin, account: Address::ZERO };
        let state = LedgerError::SqueakNotFound(1);
        let value = LedgerError::InsufficientFee { kind: Interaction::Like, paid: 1, required: 2 };
        let invariant = LedgerError::EmptyPool(1);
        assert_eq!(auth.code() / 1000, 1);
        assert_eq!(state.code() / 1000, 2);
        assert_eq!(value.code() / 1000, 3);
        assert_eq!(invariant.code() / 1000, 4);
    }

    #[test]
    fn math_error_converts() {
        let err: LedgerError = MathError::ArithmeticOverflow.into();
        assert_eq!(err.code(), 4003);
        assert_eq!(err.to_string(), "arithmetic overflow");
    }

    #[test]
    fn messages_are_descriptive() {
        let err = LedgerError::InsufficientFee { kind: Interaction::Resqueak, paid: 5, required: 10 };
        assert_eq!(err.to_string(), "insufficient fee for resqueak: paid 5, required 10");
    }
}

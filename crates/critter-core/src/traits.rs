//! Trait interfaces for the Critter ledger.
//!
//! These traits define the contracts between the engine and its
//! collaborators:
//! - [`PermissionGate`]: role checks before gated operations
//! - [`AccountRegistry`]: account existence, status, and scout level
//! - [`SqueakRegistry`]: unique-asset ownership of squeaks
//! - [`ViralityCalculator`]: virality scoring math (critter-virality implements)

use crate::address::Address;
use crate::error::{LedgerError, MathError};
use crate::types::{AccountStatus, Role, SentimentCounts, SqueakId};

/// Capability check consulted at the top of every gated operation.
pub trait PermissionGate {
    /// Whether `account` holds `role`.
    fn has_role(&self, role: Role, account: &Address) -> bool;

    /// Revert with [`LedgerError::MissingRole`] unless `account` holds `role`.
    fn require_role(&self, role: Role, account: &Address) -> Result<(), LedgerError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(LedgerError::MissingRole {
                role,
                account: *account,
            })
        }
    }
}

/// Read access to registered accounts.
pub trait AccountRegistry {
    /// Status of `account`; [`AccountStatus::NonExistent`] if unregistered.
    fn status(&self, account: &Address) -> AccountStatus;

    /// Current scout level; 0 for unregistered addresses.
    fn scout_level(&self, account: &Address) -> u64;

    /// Whether `account` exists and is active.
    fn is_active_account(&self, account: &Address) -> bool {
        self.status(account) == AccountStatus::Active
    }

    /// Revert unless `account` exists and is active.
    fn require_active_account(&self, account: &Address) -> Result<(), LedgerError> {
        match self.status(account) {
            AccountStatus::Active => Ok(()),
            AccountStatus::NonExistent => Err(LedgerError::AccountNotFound(*account)),
            status => Err(LedgerError::InactiveAccount {
                account: *account,
                status,
            }),
        }
    }
}

/// Read access to squeak ownership.
pub trait SqueakRegistry {
    /// Current owner of `squeak_id`, or `None` if it does not exist.
    fn owner_of(&self, squeak_id: SqueakId) -> Option<Address>;

    /// Whether `squeak_id` exists.
    fn exists(&self, squeak_id: SqueakId) -> bool {
        self.owner_of(squeak_id).is_some()
    }
}

/// Pure computation of virality scores.
///
/// All math uses integer fixed-point arithmetic so every implementation
/// produces bit-identical scores. Implemented by the virality engine
/// (critter-virality).
pub trait ViralityCalculator: Send + Sync {
    /// Virality score for the given sentiment counts and squeak age in blocks.
    fn score(&self, counts: &SentimentCounts, block_age: u64) -> Result<u64, MathError>;

    /// Whether `score` meets `threshold`.
    ///
    /// Default implementation: `score >= threshold`.
    fn is_viral_score(&self, score: u64, threshold: u64) -> bool {
        score >= threshold
    }
}

//! Genesis state of a ledger.
//!
//! The genesis admin receives every role. Genesis balances are credited
//! outside any transaction and emit no events.

use serde::{Deserialize, Serialize};

use critter_core::address::Address;
use critter_core::config::{Configuration, FeeSchedule};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Genesis {
    /// Account granted every role at genesis.
    pub admin: Address,
    /// Initial native balances.
    pub balances: Vec<(Address, u64)>,
    /// Initial protocol parameters.
    pub configuration: Configuration,
    /// Initial interaction fees.
    pub fees: FeeSchedule,
}

impl Genesis {
    /// Default parameters with `admin` as the only privileged account.
    pub fn with_admin(admin: Address) -> Self {
        Self {
            admin,
            ..Self::default()
        }
    }

    /// Sum of all genesis balances, saturating.
    pub fn total_balance(&self) -> u64 {
        self.balances
            .iter()
            .fold(0u64, |acc, (_, amount)| acc.saturating_add(*amount))
    }
}

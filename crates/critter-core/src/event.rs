//! Events emitted by committed ledger operations.
//!
//! Events are buffered while a transaction runs and only surface in its
//! [`Receipt`] once the transaction commits. A reverted transaction emits
//! nothing.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::config::ConfigKey;
use crate::types::{AccountStatus, Interaction, Role, SentimentCounts, SqueakId};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    AccountCreated { account: Address, username: String },
    UsernameUpdated { account: Address, old: String, new: String },
    AccountStatusUpdated { account: Address, status: AccountStatus },
    SqueakCreated { squeak_id: SqueakId, author: Address, block_number: u64 },
    SqueakTransferred { squeak_id: SqueakId, from: Address, to: Address },
    SqueakDeleted { squeak_id: SqueakId, deleted_by: Address, fee: u64 },
    SentimentUpdated {
        squeak_id: SqueakId,
        account: Address,
        interaction: Interaction,
        counts: SentimentCounts,
    },
    /// Funds credited to an account.
    FundsTransferred { to: Address, amount: u64 },
    /// Funds credited to the treasury.
    FundsDeposited { amount: u64 },
    FundsWithdrawn { to: Address, amount: u64 },
    /// Overpayment returned to the caller.
    Refunded { to: Address, amount: u64 },
    ScoutLevelChanged { account: Address, old: u64, new: u64 },
    PoolCreated { squeak_id: SqueakId, virality_score: u64, triggered_by: Address },
    PoolMemberAdded { squeak_id: SqueakId, account: Address, shares: u64 },
    PoolMemberRemoved { squeak_id: SqueakId, account: Address, shares: u64 },
    PoolFunded { squeak_id: SqueakId, amount: u64, pool_amount: u64 },
    PoolPayout { squeak_id: SqueakId, distributed: u64, remaining: u64 },
    /// Pool removed; `swept` went to the treasury.
    PoolDissolved { squeak_id: SqueakId, swept: u64 },
    ConfigurationUpdated { key: ConfigKey, old: u64, new: u64 },
    InteractionFeeUpdated { interaction: Interaction, old: u64, new: u64 },
    RoleGranted { role: Role, account: Address, granted_by: Address },
    RoleRevoked { role: Role, account: Address, revoked_by: Address },
    Paused { by: Address },
    Unpaused { by: Address },
}

/// Outcome of a committed transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Receipt {
    /// Block the transaction executed in.
    pub block_number: u64,
    /// Events in emission order.
    pub events: Vec<LedgerEvent>,
}

impl Receipt {
    /// Iterate over events matching a predicate.
    pub fn find<'a, F>(&'a self, pred: F) -> impl Iterator<Item = &'a LedgerEvent> + 'a
    where
        F: Fn(&LedgerEvent) -> bool + 'a,
    {
        self.events.iter().filter(move |e| pred(*e))
    }

    /// Sum of all amounts credited to `account` in this receipt
    /// (transfers and refunds).
    pub fn credited_to(&self, account: &Address) -> u64 {
        self.events
            .iter()
            .map(|e| match e {
                LedgerEvent::FundsTransferred { to, amount }
                | LedgerEvent::Refunded { to, amount }
                | LedgerEvent::FundsWithdrawn { to, amount }
                    if to == account =>
                {
                    *amount
                }
                _ => 0,
            })
            .sum()
    }
}

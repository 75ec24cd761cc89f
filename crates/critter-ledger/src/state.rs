//! Ledger state tables.
//!
//! Every table is staged: writes made while a transaction runs are only
//! visible to that transaction until [`LedgerState::commit`]. A
//! [`LedgerState::rollback`] leaves the state exactly as it was before the
//! transaction started.

use std::collections::BTreeSet;

use critter_core::address::Address;
use critter_core::config::{Configuration, FeeSchedule};
use critter_core::traits::{AccountRegistry, PermissionGate, SqueakRegistry};
use critter_core::types::{AccountStatus, Role, Squeak, SqueakId, User};

use crate::pool::ScoutPool;
use crate::sentiment::SqueakSentiment;
use crate::staged::{StagedMap, StagedValue};

/// Virality lifecycle of a squeak.
///
/// No entry means the squeak has not gone viral yet. `Dissolved` is
/// terminal: the pool has been emptied and the squeak cannot go viral again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViralStatus {
    Viral,
    Dissolved,
}

#[derive(Debug, Default)]
pub struct LedgerState {
    pub(crate) accounts: StagedMap<Address, User>,
    pub(crate) usernames: StagedMap<String, Address>,
    pub(crate) squeaks: StagedMap<SqueakId, Squeak>,
    pub(crate) next_squeak_id: StagedValue<SqueakId>,
    pub(crate) sentiments: StagedMap<SqueakId, SqueakSentiment>,
    pub(crate) pools: StagedMap<SqueakId, ScoutPool>,
    pub(crate) virality: StagedMap<SqueakId, ViralStatus>,
    pub(crate) roles: StagedMap<Address, BTreeSet<Role>>,
    pub(crate) balances: StagedMap<Address, u64>,
    pub(crate) treasury: StagedValue<u64>,
    pub(crate) config: StagedValue<Configuration>,
    pub(crate) fees: StagedValue<FeeSchedule>,
    pub(crate) paused: StagedValue<bool>,
    /// Highest block a committed transaction executed in.
    pub(crate) tip: u64,
}

impl LedgerState {
    pub fn new(config: Configuration, fees: FeeSchedule) -> Self {
        Self {
            next_squeak_id: StagedValue::new(1),
            config: StagedValue::new(config),
            fees: StagedValue::new(fees),
            ..Self::default()
        }
    }

    pub fn commit(&mut self) {
        self.accounts.commit();
        self.usernames.commit();
        self.squeaks.commit();
        self.next_squeak_id.commit();
        self.sentiments.commit();
        self.pools.commit();
        self.virality.commit();
        self.roles.commit();
        self.balances.commit();
        self.treasury.commit();
        self.config.commit();
        self.fees.commit();
        self.paused.commit();
    }

    pub fn rollback(&mut self) {
        self.accounts.rollback();
        self.usernames.rollback();
        self.squeaks.rollback();
        self.next_squeak_id.rollback();
        self.sentiments.rollback();
        self.pools.rollback();
        self.virality.rollback();
        self.roles.rollback();
        self.balances.rollback();
        self.treasury.rollback();
        self.config.rollback();
        self.fees.rollback();
        self.paused.rollback();
    }

    pub fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn is_viral(&self, squeak_id: SqueakId) -> bool {
        self.virality.get(&squeak_id) == Some(&ViralStatus::Viral)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn squeak_count(&self) -> usize {
        self.squeaks.len()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }
}

impl AccountRegistry for LedgerState {
    fn status(&self, account: &Address) -> AccountStatus {
        self.accounts
            .get(account)
            .map(|u| u.status)
            .unwrap_or_default()
    }

    fn scout_level(&self, account: &Address) -> u64 {
        self.accounts.get(account).map(|u| u.scout_level).unwrap_or(0)
    }
}

impl SqueakRegistry for LedgerState {
    fn owner_of(&self, squeak_id: SqueakId) -> Option<Address> {
        self.squeaks.get(&squeak_id).map(|s| s.owner)
    }
}

impl PermissionGate for LedgerState {
    fn has_role(&self, role: Role, account: &Address) -> bool {
        self.roles
            .get(account)
            .is_some_and(|roles| roles.contains(&role))
    }
}

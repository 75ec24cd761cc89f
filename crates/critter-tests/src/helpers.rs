//! Shared test helpers for scenario and property tests.

use critter_core::address::Address;
use critter_core::config::ConfigKey;
use critter_core::types::{CallContext, Interaction, SqueakId};
use critter_ledger::{Genesis, Ledger};

/// Balance credited to every funded account at genesis.
pub const STARTING_BALANCE: u64 = 1_000_000;

/// Deterministic address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address::from_bytes([seed; 20])
}

/// Genesis administrator used by every helper.
pub fn admin() -> Address {
    addr(0xAD)
}

/// Ledger whose admin holds every role and where each of `funded` starts
/// with [`STARTING_BALANCE`]. Scores come from the production engine.
pub fn ledger_with(funded: &[Address]) -> Ledger {
    let mut genesis = Genesis::with_admin(admin());
    genesis.balances = funded.iter().map(|a| (*a, STARTING_BALANCE)).collect();
    Ledger::from_genesis(&genesis)
}

/// Drives a ledger one block per call, the way a node assigns blocks.
pub struct Harness {
    pub ledger: Ledger,
    block: u64,
}

impl Harness {
    /// Harness with accounts registered for every `users` entry, named
    /// `user<seed>`.
    pub fn with_users(users: &[Address]) -> Self {
        let mut h = Self {
            ledger: ledger_with(users),
            block: 0,
        };
        for u in users {
            let name = format!("user{}", u.as_bytes()[0]);
            let ctx = h.ctx(*u, 0);
            h.ledger.create_account(ctx, &name).unwrap();
        }
        h
    }

    /// Context for the next block.
    pub fn ctx(&mut self, caller: Address, value: u64) -> CallContext {
        self.block += 1;
        CallContext::with_value(caller, value, self.block)
    }

    /// Block the next call will run in.
    pub fn next_block(&self) -> u64 {
        self.block + 1
    }

    /// Post a squeak and return its id.
    pub fn post(&mut self, author: Address, content: &str) -> SqueakId {
        let ctx = self.ctx(author, 0);
        self.ledger.create_squeak(ctx, content).unwrap().0
    }

    /// Interact paying exactly the configured fee.
    pub fn interact(&mut self, caller: Address, squeak_id: SqueakId, kind: Interaction) {
        let fee = self.ledger.interaction_fee(kind);
        let ctx = self.ctx(caller, fee);
        self.ledger.interact(ctx, squeak_id, kind).unwrap();
    }

    /// Set a protocol parameter as the admin.
    pub fn set_config(&mut self, key: ConfigKey, value: u64) {
        let ctx = self.ctx(admin(), 0);
        self.ledger.update_configuration(ctx, key, value).unwrap();
    }

    /// Sum of all account balances plus the treasury and every pool.
    pub fn total_value(&self, accounts: &[Address], squeaks: &[SqueakId]) -> u64 {
        let balances: u64 = accounts.iter().map(|a| self.ledger.balance(a)).sum();
        let pools: u64 = squeaks.iter().map(|id| self.ledger.pool_info(*id).amount).sum();
        balances + self.ledger.treasury() + pools
    }
}

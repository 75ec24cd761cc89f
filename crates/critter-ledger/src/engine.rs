//! The ledger engine.
//!
//! [`Ledger::execute`] is the only write path: it rejects stale blocks,
//! debits the attached value, runs one operation against the staged state
//! and then either commits it and returns a [`Receipt`], or rolls it back
//! and returns the error. Views read committed state only.

use std::sync::Arc;

use critter_core::address::Address;
use critter_core::config::{ConfigKey, Configuration, FeeSchedule};
use critter_core::error::LedgerError;
use critter_core::event::Receipt;
use critter_core::traits::{AccountRegistry, PermissionGate, ViralityCalculator};
use critter_core::types::{
    AccountStatus, CallContext, Interaction, PoolInfo, PoolPass, Role, Sentiment,
    SentimentCounts, Squeak, SqueakId, User,
};
use critter_virality::ViralityEngine;
use tracing::{info, warn};

use crate::fees;
use crate::genesis::Genesis;
use crate::state::LedgerState;
use crate::tx::Transaction;

pub struct Ledger {
    state: LedgerState,
    virality: Arc<dyn ViralityCalculator>,
}

impl Ledger {
    /// Ledger with default parameters, no roles and no balances.
    pub fn new(virality: Arc<dyn ViralityCalculator>) -> Self {
        Self {
            state: LedgerState::new(Configuration::default(), FeeSchedule::default()),
            virality,
        }
    }

    /// Ledger initialised from `genesis`, scored by the fixed-point engine.
    pub fn from_genesis(genesis: &Genesis) -> Self {
        Self::with_calculator(genesis, Arc::new(ViralityEngine::new()))
    }

    pub fn with_calculator(genesis: &Genesis, virality: Arc<dyn ViralityCalculator>) -> Self {
        let mut state = LedgerState::new(genesis.configuration.clone(), genesis.fees.clone());
        state.roles.insert(genesis.admin, Role::ALL.into_iter().collect());
        for (account, amount) in &genesis.balances {
            let balance = state.balances.get_or_insert_with(*account, || 0);
            *balance = balance.saturating_add(*amount);
        }
        state.commit();
        info!(admin = %genesis.admin, accounts = genesis.balances.len(), "ledger initialised from genesis");
        Self { state, virality }
    }

    /// Run `op` as one transaction.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::StaleBlock`] if the block is behind the tip
    /// - [`LedgerError::InsufficientBalance`] if the caller cannot cover the
    ///   attached value
    /// - any error returned by `op`; the state is then left untouched
    fn execute<T, F>(&mut self, ctx: CallContext, op: F) -> Result<(T, Receipt), LedgerError>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, LedgerError>,
    {
        if ctx.block_number < self.state.tip {
            return Err(LedgerError::StaleBlock {
                got: ctx.block_number,
                tip: self.state.tip,
            });
        }

        let mut tx = Transaction::new(&mut self.state, self.virality.as_ref(), ctx);
        let result = tx.debit_value().and_then(|()| op(&mut tx));
        let events = tx.events;

        match result {
            Ok(value) => {
                self.state.commit();
                self.state.tip = ctx.block_number;
                info!(
                    caller = %ctx.caller,
                    block = ctx.block_number,
                    value = ctx.value,
                    events = events.len(),
                    "transaction committed"
                );
                Ok((
                    value,
                    Receipt {
                        block_number: ctx.block_number,
                        events,
                    },
                ))
            }
            Err(e) => {
                self.state.rollback();
                warn!(
                    caller = %ctx.caller,
                    block = ctx.block_number,
                    code = e.code(),
                    "transaction reverted: {e}"
                );
                Err(e)
            }
        }
    }

    // --- accounts and squeaks ---

    pub fn create_account(
        &mut self,
        ctx: CallContext,
        username: &str,
    ) -> Result<(User, Receipt), LedgerError> {
        self.execute(ctx, |tx| tx.create_account(username))
    }

    pub fn update_username(
        &mut self,
        ctx: CallContext,
        username: &str,
    ) -> Result<Receipt, LedgerError> {
        self.execute(ctx, |tx| tx.update_username(username))
            .map(|(_, r)| r)
    }

    /// Change an account's status. Requires [`Role::Moderator`].
    pub fn update_account_status(
        &mut self,
        ctx: CallContext,
        account: Address,
        status: AccountStatus,
    ) -> Result<Receipt, LedgerError> {
        self.execute(ctx, |tx| tx.update_account_status(account, status))
            .map(|(_, r)| r)
    }

    pub fn create_squeak(
        &mut self,
        ctx: CallContext,
        content: &str,
    ) -> Result<(SqueakId, Receipt), LedgerError> {
        self.execute(ctx, |tx| tx.create_squeak(content))
    }

    /// Hand ownership of a squeak to another registered account.
    pub fn transfer_squeak(
        &mut self,
        ctx: CallContext,
        squeak_id: SqueakId,
        to: Address,
    ) -> Result<Receipt, LedgerError> {
        self.execute(ctx, |tx| tx.transfer_squeak(squeak_id, to))
            .map(|(_, r)| r)
    }

    // --- sentiment, pools, deletion ---

    /// Record an interaction paid with `ctx.value`.
    ///
    /// Re-evaluates virality, forms the scout pool on the first crossing of
    /// the threshold and routes the entire paid amount.
    pub fn interact(
        &mut self,
        ctx: CallContext,
        squeak_id: SqueakId,
        kind: Interaction,
    ) -> Result<(SentimentCounts, Receipt), LedgerError> {
        self.execute(ctx, |tx| tx.interact(squeak_id, kind))
    }

    /// Delete a squeak owned by the caller, paying the deletion fee at the
    /// current block. Any excess of `ctx.value` is refunded. Returns the fee.
    pub fn delete_squeak(
        &mut self,
        ctx: CallContext,
        squeak_id: SqueakId,
    ) -> Result<(u64, Receipt), LedgerError> {
        self.execute(ctx, |tx| tx.delete_squeak(squeak_id))
    }

    /// Leave a scout pool. Returns the shares given up.
    pub fn leave_pool(
        &mut self,
        ctx: CallContext,
        squeak_id: SqueakId,
    ) -> Result<(u64, Receipt), LedgerError> {
        self.execute(ctx, |tx| tx.leave_pool(squeak_id))
    }

    /// Remove `member` from a scout pool. Requires [`Role::Moderator`].
    pub fn eject_from_pool(
        &mut self,
        ctx: CallContext,
        squeak_id: SqueakId,
        member: Address,
    ) -> Result<(u64, Receipt), LedgerError> {
        self.execute(ctx, |tx| tx.eject_from_pool(squeak_id, member))
    }

    // --- administration ---

    /// Set a protocol parameter. Requires [`Role::Admin`]. Returns the old value.
    pub fn update_configuration(
        &mut self,
        ctx: CallContext,
        key: ConfigKey,
        value: u64,
    ) -> Result<(u64, Receipt), LedgerError> {
        self.execute(ctx, |tx| tx.update_configuration(key, value))
    }

    /// Set the fee of one interaction kind. Requires [`Role::Treasurer`].
    pub fn update_interaction_fee(
        &mut self,
        ctx: CallContext,
        kind: Interaction,
        amount: u64,
    ) -> Result<(u64, Receipt), LedgerError> {
        self.execute(ctx, |tx| tx.update_interaction_fee(kind, amount))
    }

    /// Move treasury funds to `to`. Requires [`Role::Treasurer`].
    pub fn withdraw(
        &mut self,
        ctx: CallContext,
        to: Address,
        amount: u64,
    ) -> Result<Receipt, LedgerError> {
        self.execute(ctx, |tx| tx.withdraw(to, amount))
            .map(|(_, r)| r)
    }

    pub fn grant_role(
        &mut self,
        ctx: CallContext,
        role: Role,
        account: Address,
    ) -> Result<Receipt, LedgerError> {
        self.execute(ctx, |tx| tx.grant_role(role, account))
            .map(|(_, r)| r)
    }

    pub fn revoke_role(
        &mut self,
        ctx: CallContext,
        role: Role,
        account: Address,
    ) -> Result<Receipt, LedgerError> {
        self.execute(ctx, |tx| tx.revoke_role(role, account))
            .map(|(_, r)| r)
    }

    pub fn pause(&mut self, ctx: CallContext) -> Result<Receipt, LedgerError> {
        self.execute(ctx, |tx| tx.pause()).map(|(_, r)| r)
    }

    pub fn unpause(&mut self, ctx: CallContext) -> Result<Receipt, LedgerError> {
        self.execute(ctx, |tx| tx.unpause()).map(|(_, r)| r)
    }

    // --- views ---

    pub fn config(&self, key: ConfigKey) -> u64 {
        self.state.config.get().get(key)
    }

    pub fn configuration(&self) -> &Configuration {
        self.state.config.get()
    }

    pub fn interaction_fee(&self, kind: Interaction) -> u64 {
        self.state.fees.get().get(kind)
    }

    pub fn fee_schedule(&self) -> &FeeSchedule {
        self.state.fees.get()
    }

    /// Quote the deletion fee at the tip plus `buffer` blocks.
    pub fn delete_fee(&self, squeak_id: SqueakId, buffer: u64) -> Result<u64, LedgerError> {
        let squeak = self
            .state
            .squeaks
            .get(&squeak_id)
            .ok_or(LedgerError::SqueakNotFound(squeak_id))?;
        let rate = self.interaction_fee(Interaction::Delete);
        let current = self.state.tip.max(squeak.block_number);
        Ok(fees::delete_fee(current, buffer, squeak.block_number, rate)?)
    }

    /// Sentiment counts of a squeak; zero if it has none.
    pub fn sentiment_counts(&self, squeak_id: SqueakId) -> SentimentCounts {
        self.state
            .sentiments
            .get(&squeak_id)
            .map(|s| s.counts())
            .unwrap_or_default()
    }

    pub fn user_sentiment(&self, squeak_id: SqueakId, account: &Address) -> Sentiment {
        self.state
            .sentiments
            .get(&squeak_id)
            .map(|s| s.of(account))
            .unwrap_or_default()
    }

    pub fn is_viral(&self, squeak_id: SqueakId) -> bool {
        self.state.is_viral(squeak_id)
    }

    /// Current virality score of a squeak at the tip; 0 if it does not exist.
    pub fn virality_score(&self, squeak_id: SqueakId) -> Result<u64, LedgerError> {
        let Some(squeak) = self.state.squeaks.get(&squeak_id) else {
            return Ok(0);
        };
        let counts = self.sentiment_counts(squeak_id);
        Ok(self
            .virality
            .score(&counts, squeak.block_age(self.state.tip))?)
    }

    /// Pool summary; all zero when the squeak has no pool.
    pub fn pool_info(&self, squeak_id: SqueakId) -> PoolInfo {
        self.state
            .pools
            .get(&squeak_id)
            .map(|p| p.info())
            .unwrap_or_default()
    }

    pub fn pool_passes(&self, squeak_id: SqueakId) -> Vec<PoolPass> {
        self.state
            .pools
            .get(&squeak_id)
            .map(|p| p.passes().to_vec())
            .unwrap_or_default()
    }

    pub fn account(&self, account: &Address) -> Option<User> {
        self.state.accounts.get(account).cloned()
    }

    pub fn account_status(&self, account: &Address) -> AccountStatus {
        self.state.status(account)
    }

    pub fn scout_level(&self, account: &Address) -> u64 {
        self.state.scout_level(account)
    }

    pub fn squeak(&self, squeak_id: SqueakId) -> Option<Squeak> {
        self.state.squeaks.get(&squeak_id).cloned()
    }

    pub fn balance(&self, account: &Address) -> u64 {
        self.state.balance(account)
    }

    pub fn treasury(&self) -> u64 {
        *self.state.treasury.get()
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.state.has_role(role, account)
    }

    pub fn is_paused(&self) -> bool {
        *self.state.paused.get()
    }

    /// Block of the last committed transaction.
    pub fn tip(&self) -> u64 {
        self.state.tip
    }

    pub fn account_count(&self) -> usize {
        self.state.account_count()
    }

    pub fn squeak_count(&self) -> usize {
        self.state.squeak_count()
    }

    pub fn pool_count(&self) -> usize {
        self.state.pool_count()
    }
}

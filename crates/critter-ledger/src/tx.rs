//! Operation bodies executed inside one staged transaction.
//!
//! A [`Transaction`] borrows the ledger state for the duration of one call.
//! Every method writes to the staged overlay and buffers its events; the
//! caller decides whether to commit or roll back once the method returns.

use critter_core::address::Address;
use critter_core::config::ConfigKey;
use critter_core::constants::{
    BASIC_LEVEL_INCREASE, INITIAL_SCOUT_LEVEL, MAX_CONTENT_LEN, MAX_USERNAME_LEN,
};
use critter_core::error::{LedgerError, MathError};
use critter_core::event::LedgerEvent;
use critter_core::traits::{AccountRegistry, PermissionGate, ViralityCalculator};
use critter_core::types::{
    AccountStatus, CallContext, Interaction, Role, SentimentCounts, Squeak, SqueakId, User,
};
use tracing::debug;

use crate::fees;
use crate::levels::raise_level;
use crate::pool::ScoutPool;
use crate::sentiment::SqueakSentiment;
use crate::state::{LedgerState, ViralStatus};

pub(crate) struct Transaction<'a> {
    pub(crate) state: &'a mut LedgerState,
    pub(crate) virality: &'a dyn ViralityCalculator,
    pub(crate) ctx: CallContext,
    pub(crate) events: Vec<LedgerEvent>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(
        state: &'a mut LedgerState,
        virality: &'a dyn ViralityCalculator,
        ctx: CallContext,
    ) -> Self {
        Self {
            state,
            virality,
            ctx,
            events: Vec::new(),
        }
    }

    // --- guards ---

    fn require_not_paused(&self) -> Result<(), LedgerError> {
        if *self.state.paused.get() {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    fn require_no_value(&self) -> Result<(), LedgerError> {
        if self.ctx.value > 0 {
            return Err(LedgerError::NonPayable(self.ctx.value));
        }
        Ok(())
    }

    fn squeak(&self, squeak_id: SqueakId) -> Result<Squeak, LedgerError> {
        self.state
            .squeaks
            .get(&squeak_id)
            .cloned()
            .ok_or(LedgerError::SqueakNotFound(squeak_id))
    }

    fn require_owner(&self, squeak: &Squeak) -> Result<(), LedgerError> {
        if squeak.owner != self.ctx.caller {
            return Err(LedgerError::NotSqueakOwner {
                squeak_id: squeak.id,
                account: self.ctx.caller,
            });
        }
        Ok(())
    }

    // --- funds ---

    /// Debit the attached value from the caller's balance.
    pub(crate) fn debit_value(&mut self) -> Result<(), LedgerError> {
        if self.ctx.value == 0 {
            return Ok(());
        }
        let caller = self.ctx.caller;
        let have = self.state.balance(&caller);
        if have < self.ctx.value {
            return Err(LedgerError::InsufficientBalance {
                have,
                need: self.ctx.value,
            });
        }
        self.state.balances.insert(caller, have - self.ctx.value);
        Ok(())
    }

    fn add_balance(&mut self, to: Address, amount: u64) -> Result<(), LedgerError> {
        let balance = self.state.balances.get_or_insert_with(to, || 0);
        *balance = balance
            .checked_add(amount)
            .ok_or(MathError::ArithmeticOverflow)?;
        Ok(())
    }

    fn transfer(&mut self, to: Address, amount: u64) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        self.add_balance(to, amount)?;
        self.events.push(LedgerEvent::FundsTransferred { to, amount });
        Ok(())
    }

    fn deposit(&mut self, amount: u64) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let treasury = self.state.treasury.get_mut();
        *treasury = treasury
            .checked_add(amount)
            .ok_or(MathError::ArithmeticOverflow)?;
        self.events.push(LedgerEvent::FundsDeposited { amount });
        Ok(())
    }

    fn refund(&mut self, amount: u64) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let to = self.ctx.caller;
        self.add_balance(to, amount)?;
        self.events.push(LedgerEvent::Refunded { to, amount });
        Ok(())
    }

    // --- accounts ---

    fn validate_username(username: &str) -> Result<(), LedgerError> {
        if username.is_empty()
            || username.len() > MAX_USERNAME_LEN
            || username.chars().any(char::is_whitespace)
        {
            return Err(LedgerError::InvalidUsername(username.to_string()));
        }
        Ok(())
    }

    pub(crate) fn create_account(&mut self, username: &str) -> Result<User, LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        let caller = self.ctx.caller;
        if self.state.accounts.contains_key(&caller) {
            return Err(LedgerError::AccountAlreadyExists(caller));
        }
        Self::validate_username(username)?;
        if self.state.usernames.contains_key(&username.to_string()) {
            return Err(LedgerError::UsernameTaken(username.to_string()));
        }

        let user = User {
            account: caller,
            username: username.to_string(),
            status: AccountStatus::Active,
            scout_level: INITIAL_SCOUT_LEVEL,
        };
        self.state.accounts.insert(caller, user.clone());
        self.state.usernames.insert(username.to_string(), caller);
        self.events.push(LedgerEvent::AccountCreated {
            account: caller,
            username: username.to_string(),
        });
        Ok(user)
    }

    pub(crate) fn update_username(&mut self, username: &str) -> Result<(), LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        let caller = self.ctx.caller;
        self.state.require_active_account(&caller)?;
        Self::validate_username(username)?;
        if self.state.usernames.contains_key(&username.to_string()) {
            return Err(LedgerError::UsernameTaken(username.to_string()));
        }

        let user = self
            .state
            .accounts
            .get_mut(&caller)
            .ok_or(LedgerError::AccountNotFound(caller))?;
        let old = std::mem::replace(&mut user.username, username.to_string());
        self.state.usernames.remove(&old);
        self.state.usernames.insert(username.to_string(), caller);
        self.events.push(LedgerEvent::UsernameUpdated {
            account: caller,
            old,
            new: username.to_string(),
        });
        Ok(())
    }

    pub(crate) fn update_account_status(
        &mut self,
        account: Address,
        status: AccountStatus,
    ) -> Result<(), LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        self.state.require_role(Role::Moderator, &self.ctx.caller)?;
        if status == AccountStatus::NonExistent {
            return Err(LedgerError::InvalidAccountStatus(status.to_string()));
        }
        let user = self
            .state
            .accounts
            .get_mut(&account)
            .ok_or(LedgerError::AccountNotFound(account))?;
        user.status = status;
        self.events
            .push(LedgerEvent::AccountStatusUpdated { account, status });
        Ok(())
    }

    // --- squeaks ---

    pub(crate) fn create_squeak(&mut self, content: &str) -> Result<SqueakId, LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        let caller = self.ctx.caller;
        self.state.require_active_account(&caller)?;
        if content.is_empty() || content.len() > MAX_CONTENT_LEN {
            return Err(LedgerError::InvalidContent(format!(
                "{} bytes, expected 1..={MAX_CONTENT_LEN}",
                content.len()
            )));
        }

        let id = *self.state.next_squeak_id.get();
        let next = id.checked_add(1).ok_or(MathError::ArithmeticOverflow)?;
        self.state.next_squeak_id.set(next);
        self.state.squeaks.insert(
            id,
            Squeak {
                id,
                author: caller,
                owner: caller,
                block_number: self.ctx.block_number,
                content: content.to_string(),
            },
        );
        self.events.push(LedgerEvent::SqueakCreated {
            squeak_id: id,
            author: caller,
            block_number: self.ctx.block_number,
        });
        Ok(id)
    }

    pub(crate) fn transfer_squeak(
        &mut self,
        squeak_id: SqueakId,
        to: Address,
    ) -> Result<(), LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        let squeak = self.squeak(squeak_id)?;
        self.require_owner(&squeak)?;
        if self.state.status(&to) == AccountStatus::NonExistent {
            return Err(LedgerError::InvalidRecipient(to));
        }
        if let Some(s) = self.state.squeaks.get_mut(&squeak_id) {
            s.owner = to;
        }
        self.events.push(LedgerEvent::SqueakTransferred {
            squeak_id,
            from: squeak.owner,
            to,
        });
        Ok(())
    }

    // --- sentiment ---

    pub(crate) fn interact(
        &mut self,
        squeak_id: SqueakId,
        kind: Interaction,
    ) -> Result<SentimentCounts, LedgerError> {
        self.require_not_paused()?;
        if kind == Interaction::Delete {
            return Err(LedgerError::InvalidInteraction(kind.to_string()));
        }
        let caller = self.ctx.caller;
        self.state.require_active_account(&caller)?;
        let squeak = self.squeak(squeak_id)?;
        let required = self.state.fees.get().get(kind);
        if self.ctx.value < required {
            return Err(LedgerError::InsufficientFee {
                kind,
                paid: self.ctx.value,
                required,
            });
        }

        let counts = self
            .state
            .sentiments
            .get_or_insert_with(squeak_id, SqueakSentiment::default)
            .apply(squeak_id, caller, kind)?;
        self.events.push(LedgerEvent::SentimentUpdated {
            squeak_id,
            account: caller,
            interaction: kind,
            counts,
        });

        let status = self.state.virality.get(&squeak_id).copied();
        if status.is_none() {
            self.evaluate_virality(&squeak, counts)?;
        }
        self.route_interaction_fee(&squeak, kind, status == Some(ViralStatus::Viral))?;
        Ok(counts)
    }

    /// Form the scout pool if `counts` push the squeak over the threshold.
    fn evaluate_virality(
        &mut self,
        squeak: &Squeak,
        counts: SentimentCounts,
    ) -> Result<(), LedgerError> {
        let score = self
            .virality
            .score(&counts, squeak.block_age(self.ctx.block_number))?;
        let threshold = self.state.config.get().virality_threshold();
        debug!(squeak_id = squeak.id, score, threshold, "virality evaluated");
        if !self.virality.is_viral_score(score, threshold) {
            return Ok(());
        }
        let holders = self
            .state
            .sentiments
            .get(&squeak.id)
            .map(SqueakSentiment::positive_holders)
            .unwrap_or_default();
        // A pool needs at least one member; stay unevaluated until one exists.
        if holders.is_empty() {
            return Ok(());
        }
        self.form_pool(squeak.id, score, holders)
    }

    fn form_pool(
        &mut self,
        squeak_id: SqueakId,
        score: u64,
        holders: Vec<Address>,
    ) -> Result<(), LedgerError> {
        let caller = self.ctx.caller;
        let config = self.state.config.get().clone();
        let max = config.scout_max_level();

        for account in &holders {
            self.bump_level(account, BASIC_LEVEL_INCREASE, max);
        }
        if holders.contains(&caller) {
            self.bump_level(&caller, config.scout_virality_bonus(), max);
        }

        self.events.push(LedgerEvent::PoolCreated {
            squeak_id,
            virality_score: score,
            triggered_by: caller,
        });
        let mut pool = ScoutPool::default();
        for account in holders {
            let shares = self.state.scout_level(&account);
            pool.admit(account, shares)?;
            self.events.push(LedgerEvent::PoolMemberAdded {
                squeak_id,
                account,
                shares,
            });
        }
        debug!(squeak_id, members = pool.passes().len(), "scout pool formed");
        self.state.pools.insert(squeak_id, pool);
        self.state.virality.insert(squeak_id, ViralStatus::Viral);
        Ok(())
    }

    fn bump_level(&mut self, account: &Address, delta: u64, max: u64) {
        let Some(user) = self.state.accounts.get_mut(account) else {
            return;
        };
        let old = user.scout_level;
        let new = raise_level(old, delta, max);
        if new == old {
            return;
        }
        user.scout_level = new;
        self.events.push(LedgerEvent::ScoutLevelChanged {
            account: *account,
            old,
            new,
        });
    }

    /// Route the whole attached value of an interaction.
    ///
    /// Non-positive interactions go to the treasury. Positive ones pay the
    /// platform take to the treasury and the remainder to the owner, split
    /// with the pool when the squeak was already viral before this call.
    fn route_interaction_fee(
        &mut self,
        squeak: &Squeak,
        kind: Interaction,
        pooled: bool,
    ) -> Result<(), LedgerError> {
        let paid = self.ctx.value;
        if !kind.is_positive() {
            return self.deposit(paid);
        }
        let (take, remainder) = fees::split_fee(paid, self.state.config.get().platform_take_rate())?;
        self.deposit(take)?;

        let owner_share = if pooled {
            let (pool_share, owner_share) = fees::split_remainder(remainder);
            self.fund_pool(squeak.id, pool_share)?;
            owner_share
        } else {
            remainder
        };
        self.transfer(squeak.owner, owner_share)
    }

    fn fund_pool(&mut self, squeak_id: SqueakId, amount: u64) -> Result<(), LedgerError> {
        let caller = self.ctx.caller;
        let level = self.state.scout_level(&caller);
        let threshold = self.state.config.get().pool_payout_threshold();
        let pool = self
            .state
            .pools
            .get_mut(&squeak_id)
            .ok_or(LedgerError::PoolNotFound(squeak_id))?;

        if pool.admit(caller, level)? {
            self.events.push(LedgerEvent::PoolMemberAdded {
                squeak_id,
                account: caller,
                shares: level,
            });
        }
        let pool_amount = pool.fund(amount)?;
        self.events.push(LedgerEvent::PoolFunded {
            squeak_id,
            amount,
            pool_amount,
        });
        if pool_amount < threshold {
            return Ok(());
        }

        let payouts = pool.payout(squeak_id)?;
        let remaining = pool.amount;
        let distributed = pool_amount - remaining;
        for (account, value) in payouts {
            self.transfer(account, value)?;
        }
        self.events.push(LedgerEvent::PoolPayout {
            squeak_id,
            distributed,
            remaining,
        });
        debug!(squeak_id, distributed, remaining, "scout pool paid out");
        Ok(())
    }

    // --- pools ---

    pub(crate) fn leave_pool(&mut self, squeak_id: SqueakId) -> Result<u64, LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        let caller = self.ctx.caller;
        self.exit_pool(squeak_id, caller)
    }

    pub(crate) fn eject_from_pool(
        &mut self,
        squeak_id: SqueakId,
        member: Address,
    ) -> Result<u64, LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        self.state.require_role(Role::Moderator, &self.ctx.caller)?;
        self.exit_pool(squeak_id, member)
    }

    fn exit_pool(&mut self, squeak_id: SqueakId, member: Address) -> Result<u64, LedgerError> {
        let pool = self
            .state
            .pools
            .get_mut(&squeak_id)
            .ok_or(LedgerError::PoolNotFound(squeak_id))?;
        let shares = pool.remove(squeak_id, &member)?;
        let now_empty = pool.is_empty();
        self.events.push(LedgerEvent::PoolMemberRemoved {
            squeak_id,
            account: member,
            shares,
        });
        if now_empty {
            self.dissolve_pool(squeak_id)?;
        }
        Ok(shares)
    }

    /// Remove the pool, sweep its remaining amount to the treasury and mark
    /// the squeak as no longer viral.
    fn dissolve_pool(&mut self, squeak_id: SqueakId) -> Result<(), LedgerError> {
        let Some(pool) = self.state.pools.remove(&squeak_id) else {
            return Ok(());
        };
        self.state
            .virality
            .insert(squeak_id, ViralStatus::Dissolved);
        self.deposit(pool.amount)?;
        self.events.push(LedgerEvent::PoolDissolved {
            squeak_id,
            swept: pool.amount,
        });
        debug!(squeak_id, swept = pool.amount, "scout pool dissolved");
        Ok(())
    }

    // --- deletion ---

    pub(crate) fn delete_squeak(&mut self, squeak_id: SqueakId) -> Result<u64, LedgerError> {
        self.require_not_paused()?;
        let squeak = self.squeak(squeak_id)?;
        self.require_owner(&squeak)?;
        self.state.require_active_account(&self.ctx.caller)?;

        let rate = self.state.fees.get().get(Interaction::Delete);
        let fee = fees::delete_fee(self.ctx.block_number, 0, squeak.block_number, rate)?;
        if self.ctx.value < fee {
            return Err(LedgerError::InsufficientFee {
                kind: Interaction::Delete,
                paid: self.ctx.value,
                required: fee,
            });
        }
        self.deposit(fee)?;
        self.refund(self.ctx.value - fee)?;

        self.dissolve_pool(squeak_id)?;
        self.state.sentiments.remove(&squeak_id);
        self.state.virality.remove(&squeak_id);
        self.state.squeaks.remove(&squeak_id);
        self.events.push(LedgerEvent::SqueakDeleted {
            squeak_id,
            deleted_by: self.ctx.caller,
            fee,
        });
        Ok(fee)
    }

    // --- administration ---

    pub(crate) fn update_configuration(
        &mut self,
        key: ConfigKey,
        value: u64,
    ) -> Result<u64, LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        self.state.require_role(Role::Admin, &self.ctx.caller)?;
        let old = self.state.config.get_mut().set(key, value);
        self.events.push(LedgerEvent::ConfigurationUpdated {
            key,
            old,
            new: value,
        });
        Ok(old)
    }

    pub(crate) fn update_interaction_fee(
        &mut self,
        kind: Interaction,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        self.state.require_role(Role::Treasurer, &self.ctx.caller)?;
        let old = self.state.fees.get_mut().set(kind, amount);
        self.events.push(LedgerEvent::InteractionFeeUpdated {
            interaction: kind,
            old,
            new: amount,
        });
        Ok(old)
    }

    pub(crate) fn withdraw(&mut self, to: Address, amount: u64) -> Result<(), LedgerError> {
        self.require_not_paused()?;
        self.require_no_value()?;
        self.state.require_role(Role::Treasurer, &self.ctx.caller)?;
        let have = *self.state.treasury.get();
        if have < amount {
            return Err(LedgerError::InsufficientTreasury {
                have,
                requested: amount,
            });
        }
        self.state.treasury.set(have - amount);
        self.add_balance(to, amount)?;
        self.events.push(LedgerEvent::FundsWithdrawn { to, amount });
        Ok(())
    }

    pub(crate) fn grant_role(&mut self, role: Role, account: Address) -> Result<bool, LedgerError> {
        self.require_no_value()?;
        self.state.require_role(Role::Admin, &self.ctx.caller)?;
        let added = self
            .state
            .roles
            .get_or_insert_with(account, Default::default)
            .insert(role);
        if added {
            self.events.push(LedgerEvent::RoleGranted {
                role,
                account,
                granted_by: self.ctx.caller,
            });
        }
        Ok(added)
    }

    pub(crate) fn revoke_role(&mut self, role: Role, account: Address) -> Result<bool, LedgerError> {
        self.require_no_value()?;
        self.state.require_role(Role::Admin, &self.ctx.caller)?;
        let removed = self
            .state
            .roles
            .get_mut(&account)
            .is_some_and(|roles| roles.remove(&role));
        if removed {
            self.events.push(LedgerEvent::RoleRevoked {
                role,
                account,
                revoked_by: self.ctx.caller,
            });
        }
        Ok(removed)
    }

    pub(crate) fn pause(&mut self) -> Result<(), LedgerError> {
        self.require_no_value()?;
        self.state.require_role(Role::Operator, &self.ctx.caller)?;
        self.require_not_paused()?;
        self.state.paused.set(true);
        self.events.push(LedgerEvent::Paused {
            by: self.ctx.caller,
        });
        Ok(())
    }

    pub(crate) fn unpause(&mut self) -> Result<(), LedgerError> {
        self.require_no_value()?;
        self.state.require_role(Role::Operator, &self.ctx.caller)?;
        if !*self.state.paused.get() {
            return Err(LedgerError::NotPaused);
        }
        self.state.paused.set(false);
        self.events.push(LedgerEvent::Unpaused {
            by: self.ctx.caller,
        });
        Ok(())
    }
}

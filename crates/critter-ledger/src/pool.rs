//! Scout pools.
//!
//! A pool collects a share of the fees of a viral squeak and pays it out to
//! its members in proportion to their shares. Members are kept in admission
//! order so payouts iterate deterministically.

use serde::{Deserialize, Serialize};

use critter_core::address::Address;
use critter_core::error::{LedgerError, MathError};
use critter_core::types::{PoolInfo, PoolPass, SqueakId};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoutPool {
    /// Undistributed funds.
    pub amount: u64,
    /// Sum of all member shares.
    pub total_shares: u64,
    members: Vec<PoolPass>,
}

impl ScoutPool {
    pub fn is_member(&self, account: &Address) -> bool {
        self.members.iter().any(|p| p.account == *account)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn passes(&self) -> &[PoolPass] {
        &self.members
    }

    pub fn info(&self) -> PoolInfo {
        PoolInfo {
            amount: self.amount,
            total_shares: self.total_shares,
            member_count: self.members.len() as u64,
        }
    }

    /// Admit `account` with `shares`. Returns `false` if it is already a
    /// member.
    pub fn admit(&mut self, account: Address, shares: u64) -> Result<bool, MathError> {
        if self.is_member(&account) {
            return Ok(false);
        }
        self.total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or(MathError::ArithmeticOverflow)?;
        self.members.push(PoolPass { account, shares });
        Ok(true)
    }

    /// Remove `account`, returning its shares.
    pub fn remove(&mut self, squeak_id: SqueakId, account: &Address) -> Result<u64, LedgerError> {
        let idx = self
            .members
            .iter()
            .position(|p| p.account == *account)
            .ok_or(LedgerError::NotPoolMember {
                squeak_id,
                account: *account,
            })?;
        let pass = self.members.remove(idx);
        self.total_shares -= pass.shares;
        Ok(pass.shares)
    }

    /// Add `amount` to the pool, returning the new pool amount.
    pub fn fund(&mut self, amount: u64) -> Result<u64, MathError> {
        self.amount = self
            .amount
            .checked_add(amount)
            .ok_or(MathError::ArithmeticOverflow)?;
        Ok(self.amount)
    }

    /// Distribute the pool amount to all members by share.
    ///
    /// Each member receives `amount * shares / total_shares`, rounded down.
    /// The rounding dust stays in the pool. Returns the per-member payouts
    /// in member order.
    pub fn payout(&mut self, squeak_id: SqueakId) -> Result<Vec<(Address, u64)>, LedgerError> {
        if self.total_shares == 0 {
            return Err(LedgerError::EmptyPool(squeak_id));
        }
        let amount = self.amount as u128;
        let total = self.total_shares as u128;
        let payouts: Vec<(Address, u64)> = self
            .members
            .iter()
            .map(|p| (p.account, (amount * p.shares as u128 / total) as u64))
            .collect();
        let distributed: u64 = payouts.iter().map(|(_, v)| v).sum();
        self.amount -= distributed;
        Ok(payouts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(n: u8) -> Address {
        Address([n; 20])
    }

    #[test]
    fn admit_is_idempotent() {
        let mut pool = ScoutPool::default();
        assert!(pool.admit(addr(1), 2).unwrap());
        assert!(!pool.admit(addr(1), 9).unwrap());
        assert_eq!(pool.info(), PoolInfo { amount: 0, total_shares: 2, member_count: 1 });
    }

    #[test]
    fn remove_non_member_fails() {
        let mut pool = ScoutPool::default();
        pool.admit(addr(1), 2).unwrap();
        assert_eq!(
            pool.remove(5, &addr(2)),
            Err(LedgerError::NotPoolMember { squeak_id: 5, account: addr(2) })
        );
        assert_eq!(pool.remove(5, &addr(1)).unwrap(), 2);
        assert!(pool.is_empty());
        assert_eq!(pool.total_shares, 0);
    }

    #[test]
    fn payout_by_share_leaves_dust() {
        let mut pool = ScoutPool::default();
        pool.admit(addr(1), 2).unwrap();
        pool.admit(addr(2), 2).unwrap();
        pool.admit(addr(3), 3).unwrap();
        pool.fund(100).unwrap();
        let payouts = pool.payout(1).unwrap();
        assert_eq!(payouts, vec![(addr(1), 28), (addr(2), 28), (addr(3), 42)]);
        assert_eq!(pool.amount, 2);
    }

    #[test]
    fn payout_of_empty_pool_fails() {
        let mut pool = ScoutPool::default();
        pool.fund(10).unwrap();
        assert_eq!(pool.payout(3), Err(LedgerError::EmptyPool(3)));
    }

    proptest! {
        #[test]
        fn shares_are_conserved(
            ops in proptest::collection::vec((any::<bool>(), 0u8..8, 1u64..10), 0..64),
        ) {
            let mut pool = ScoutPool::default();
            for (admit, who, shares) in ops {
                if admit {
                    pool.admit(addr(who), shares).unwrap();
                } else {
                    let _ = pool.remove(1, &addr(who));
                }
                let sum: u64 = pool.passes().iter().map(|p| p.shares).sum();
                prop_assert_eq!(sum, pool.total_shares);
            }
        }

        #[test]
        fn payout_never_exceeds_amount(
            shares in proptest::collection::vec(1u64..100, 1..10),
            amount in any::<u64>(),
        ) {
            let mut pool = ScoutPool::default();
            for (i, s) in shares.iter().enumerate() {
                pool.admit(addr(i as u8), *s).unwrap();
            }
            pool.fund(amount).unwrap();
            let paid: u128 = pool.payout(1).unwrap().iter().map(|(_, v)| *v as u128).sum();
            prop_assert_eq!(paid + pool.amount as u128, amount as u128);
            prop_assert!((pool.amount as usize) < shares.len().max(1));
        }
    }
}

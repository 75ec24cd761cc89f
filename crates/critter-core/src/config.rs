//! On-ledger configuration registry and fee schedule.
//!
//! Both tables are plain value types; the ledger owns them and gates every
//! write behind a role check. Reads are free.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DELETE_FEE_PER_BLOCK, DEFAULT_DISLIKE_FEE, DEFAULT_LIKE_FEE,
    DEFAULT_PLATFORM_TAKE_RATE, DEFAULT_POOL_PAYOUT_THRESHOLD, DEFAULT_RESQUEAK_FEE,
    DEFAULT_SCOUT_MAX_LEVEL, DEFAULT_SCOUT_VIRALITY_BONUS, DEFAULT_UNDO_DISLIKE_FEE,
    DEFAULT_UNDO_LIKE_FEE, DEFAULT_UNDO_RESQUEAK_FEE, DEFAULT_VIRALITY_THRESHOLD,
};
use crate::error::LedgerError;
use crate::types::Interaction;

/// Tunable protocol parameter.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKey {
    /// Percent of each positive interaction fee kept by the treasury.
    PlatformTakeRate,
    /// Pool amount at which a payout to all members is triggered.
    PoolPayoutThreshold,
    /// Upper bound for scout levels.
    ScoutMaxLevel,
    /// Extra levels granted to the account that triggers virality.
    ScoutViralityBonus,
    /// Minimum virality score for a squeak to become viral.
    ViralityThreshold,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        Self::PlatformTakeRate,
        Self::PoolPayoutThreshold,
        Self::ScoutMaxLevel,
        Self::ScoutViralityBonus,
        Self::ViralityThreshold,
    ];

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlatformTakeRate => "platform_take_rate",
            Self::PoolPayoutThreshold => "pool_payout_threshold",
            Self::ScoutMaxLevel => "scout_max_level",
            Self::ScoutViralityBonus => "scout_virality_bonus",
            Self::ViralityThreshold => "virality_threshold",
        }
    }

    fn default_value(&self) -> u64 {
        match self {
            Self::PlatformTakeRate => DEFAULT_PLATFORM_TAKE_RATE,
            Self::PoolPayoutThreshold => DEFAULT_POOL_PAYOUT_THRESHOLD,
            Self::ScoutMaxLevel => DEFAULT_SCOUT_MAX_LEVEL,
            Self::ScoutViralityBonus => DEFAULT_SCOUT_VIRALITY_BONUS,
            Self::ViralityThreshold => DEFAULT_VIRALITY_THRESHOLD,
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| LedgerError::InvalidConfigKey(s.to_string()))
    }
}

/// Key → value table of protocol parameters.
///
/// Every [`ConfigKey`] always has a value; unknown keys are unrepresentable,
/// so "invalid key" errors only arise when parsing names.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    values: BTreeMap<ConfigKey, u64>,
}

impl Configuration {
    /// Value of `key`.
    pub fn get(&self, key: ConfigKey) -> u64 {
        self.values
            .get(&key)
            .copied()
            .unwrap_or_else(|| key.default_value())
    }

    /// Set `key` to `value`, returning the previous value.
    pub fn set(&mut self, key: ConfigKey, value: u64) -> u64 {
        let old = self.get(key);
        self.values.insert(key, value);
        old
    }

    /// All parameters in key order.
    pub fn entries(&self) -> Vec<(ConfigKey, u64)> {
        ConfigKey::ALL.into_iter().map(|k| (k, self.get(k))).collect()
    }

    pub fn platform_take_rate(&self) -> u64 {
        self.get(ConfigKey::PlatformTakeRate)
    }

    pub fn pool_payout_threshold(&self) -> u64 {
        self.get(ConfigKey::PoolPayoutThreshold)
    }

    pub fn scout_max_level(&self) -> u64 {
        self.get(ConfigKey::ScoutMaxLevel)
    }

    pub fn scout_virality_bonus(&self) -> u64 {
        self.get(ConfigKey::ScoutViralityBonus)
    }

    pub fn virality_threshold(&self) -> u64 {
        self.get(ConfigKey::ViralityThreshold)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            values: ConfigKey::ALL
                .into_iter()
                .map(|k| (k, k.default_value()))
                .collect(),
        }
    }
}

/// Price of each interaction kind.
///
/// The `Delete` entry is a per-block rate, multiplied by the squeak's age.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FeeSchedule {
    fees: BTreeMap<Interaction, u64>,
}

impl FeeSchedule {
    /// Fee for `kind`.
    pub fn get(&self, kind: Interaction) -> u64 {
        self.fees.get(&kind).copied().unwrap_or(0)
    }

    /// Set the fee for `kind`, returning the previous fee.
    pub fn set(&mut self, kind: Interaction, amount: u64) -> u64 {
        self.fees.insert(kind, amount).unwrap_or(0)
    }

    /// All fees in interaction order.
    pub fn entries(&self) -> Vec<(Interaction, u64)> {
        Interaction::ALL
            .into_iter()
            .map(|k| (k, self.get(k)))
            .collect()
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        let fees = BTreeMap::from([
            (Interaction::Delete, DEFAULT_DELETE_FEE_PER_BLOCK),
            (Interaction::Dislike, DEFAULT_DISLIKE_FEE),
            (Interaction::Like, DEFAULT_LIKE_FEE),
            (Interaction::Resqueak, DEFAULT_RESQUEAK_FEE),
            (Interaction::UndoDislike, DEFAULT_UNDO_DISLIKE_FEE),
            (Interaction::UndoLike, DEFAULT_UNDO_LIKE_FEE),
            (Interaction::UndoResqueak, DEFAULT_UNDO_RESQUEAK_FEE),
        ]);
        Self { fees }
    }
}

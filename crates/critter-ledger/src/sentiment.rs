//! Per-squeak sentiment records.
//!
//! Each account holds at most one of {liked, disliked}; the resqueak flag is
//! independent. Counts always equal the number of accounts holding each
//! flag.

use std::collections::HashMap;

use critter_core::address::Address;
use critter_core::error::LedgerError;
use critter_core::types::{Interaction, Sentiment, SentimentCounts, SqueakId};

/// Sentiment state of one squeak.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SqueakSentiment {
    counts: SentimentCounts,
    /// Accounts in order of their first interaction.
    interactors: Vec<Address>,
    flags: HashMap<Address, Sentiment>,
}

impl SqueakSentiment {
    pub fn counts(&self) -> SentimentCounts {
        self.counts
    }

    /// Flags held by `account`; all false if it never interacted.
    pub fn of(&self, account: &Address) -> Sentiment {
        self.flags.get(account).copied().unwrap_or_default()
    }

    /// Accounts currently liking or resqueaking, in first-interaction order.
    pub fn positive_holders(&self) -> Vec<Address> {
        self.interactors
            .iter()
            .filter(|a| self.of(a).is_positive())
            .copied()
            .collect()
    }

    /// Apply `kind` on behalf of `account` and return the new counts.
    ///
    /// Nothing is modified when an error is returned.
    ///
    /// # Errors
    ///
    /// - `AlreadyLiked` / `AlreadyDisliked` / `AlreadyResqueaked` when the
    ///   flag is already set
    /// - `NotLiked` / `NotDisliked` / `NotResqueaked` when undoing a flag
    ///   that is not held
    /// - `InvalidInteraction` for [`Interaction::Delete`]
    pub fn apply(
        &mut self,
        squeak_id: SqueakId,
        account: Address,
        kind: Interaction,
    ) -> Result<SentimentCounts, LedgerError> {
        let mut flags = self.of(&account);
        let mut counts = self.counts;
        match kind {
            Interaction::Like => {
                if flags.liked {
                    return Err(LedgerError::AlreadyLiked(squeak_id));
                }
                if flags.disliked {
                    flags.disliked = false;
                    counts.dislikes -= 1;
                }
                flags.liked = true;
                counts.likes += 1;
            }
            Interaction::Dislike => {
                if flags.disliked {
                    return Err(LedgerError::AlreadyDisliked(squeak_id));
                }
                if flags.liked {
                    flags.liked = false;
                    counts.likes -= 1;
                }
                flags.disliked = true;
                counts.dislikes += 1;
            }
            Interaction::Resqueak => {
                if flags.resqueaked {
                    return Err(LedgerError::AlreadyResqueaked(squeak_id));
                }
                flags.resqueaked = true;
                counts.resqueaks += 1;
            }
            Interaction::UndoLike => {
                if !flags.liked {
                    return Err(LedgerError::NotLiked(squeak_id));
                }
                flags.liked = false;
                counts.likes -= 1;
            }
            Interaction::UndoDislike => {
                if !flags.disliked {
                    return Err(LedgerError::NotDisliked(squeak_id));
                }
                flags.disliked = false;
                counts.dislikes -= 1;
            }
            Interaction::UndoResqueak => {
                if !flags.resqueaked {
                    return Err(LedgerError::NotResqueaked(squeak_id));
                }
                flags.resqueaked = false;
                counts.resqueaks -= 1;
            }
            Interaction::Delete => {
                return Err(LedgerError::InvalidInteraction(kind.to_string()));
            }
        }

        if !self.flags.contains_key(&account) {
            self.interactors.push(account);
        }
        self.flags.insert(account, flags);
        self.counts = counts;
        Ok(counts)
    }
}

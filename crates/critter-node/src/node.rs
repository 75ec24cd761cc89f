//! Node composition.
//!
//! The [`Node`] owns the ledger behind a single mutex, so every submitted
//! transaction runs alone against the whole state. Each transaction is
//! assigned the block after the current tip; the node keeps the most recent
//! committed events in a bounded in-memory log.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use critter_core::address::Address;
use critter_core::error::LedgerError;
use critter_core::event::{LedgerEvent, Receipt};
use critter_core::types::CallContext;
use critter_ledger::Ledger;

use crate::config::NodeConfig;
use crate::error::NodeError;

/// A committed event tagged with its block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub block_number: u64,
    #[serde(flatten)]
    pub event: LedgerEvent,
}

pub struct Node {
    ledger: Mutex<Ledger>,
    events: Mutex<VecDeque<LoggedEvent>>,
    config: NodeConfig,
}

impl Node {
    /// Create a node whose ledger starts from the configured genesis.
    pub fn new(config: NodeConfig) -> Result<Arc<Self>, NodeError> {
        let genesis = config.genesis()?;
        let ledger = Ledger::from_genesis(&genesis);
        info!(
            admin = %genesis.admin,
            supply = genesis.total_balance(),
            "node ledger created"
        );
        Ok(Arc::new(Self {
            ledger: Mutex::new(ledger),
            events: Mutex::new(VecDeque::new()),
            config,
        }))
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Execute `op` in the next block on behalf of `caller`.
    ///
    /// On success the receipt's events are appended to the event log.
    pub fn submit<T, F>(&self, caller: Address, value: u64, op: F) -> Result<(T, Receipt), LedgerError>
    where
        F: FnOnce(&mut Ledger, CallContext) -> Result<(T, Receipt), LedgerError>,
    {
        let mut ledger = self.ledger.lock();
        let block = ledger.tip() + 1;
        let ctx = CallContext::with_value(caller, value, block);
        let (out, receipt) = op(&mut ledger, ctx)?;
        // log under the ledger lock so events stay in block order
        self.record(&receipt);
        drop(ledger);

        debug!(block, events = receipt.events.len(), "receipt recorded");
        Ok((out, receipt))
    }

    /// Like [`Node::submit`] for operations that only return a receipt.
    pub fn submit_receipt<F>(&self, caller: Address, value: u64, op: F) -> Result<Receipt, LedgerError>
    where
        F: FnOnce(&mut Ledger, CallContext) -> Result<Receipt, LedgerError>,
    {
        self.submit(caller, value, |ledger, ctx| op(ledger, ctx).map(|r| ((), r)))
            .map(|(_, r)| r)
    }

    /// Run a read-only query against the committed ledger state.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.ledger.lock())
    }

    /// Up to `limit` most recent events, oldest first.
    pub fn recent_events(&self, limit: usize) -> Vec<LoggedEvent> {
        let log = self.events.lock();
        let skip = log.len().saturating_sub(limit);
        log.iter().skip(skip).cloned().collect()
    }

    fn record(&self, receipt: &Receipt) {
        let capacity = self.config.event_log_capacity;
        if capacity == 0 {
            return;
        }
        let mut log = self.events.lock();
        for event in &receipt.events {
            if log.len() == capacity {
                log.pop_front();
            }
            log.push_back(LoggedEvent {
                block_number: receipt.block_number,
                event: event.clone(),
            });
        }
    }
}

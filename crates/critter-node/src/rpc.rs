//! JSON-RPC server for the Critter node.
//!
//! Uses jsonrpsee 0.24. Mutating methods take the caller address explicitly
//! and, where payable, the attached value. Ledger errors are returned with
//! their stable [`LedgerError::code`] as the JSON-RPC error code.

use std::collections::BTreeMap;
use std::sync::Arc;

use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::types::error::INVALID_PARAMS_CODE;
use serde::{Deserialize, Serialize};

use critter_core::address::Address;
use critter_core::config::ConfigKey;
use critter_core::constants::DEFAULT_DELETE_CONFIRMATION_BUFFER;
use critter_core::error::LedgerError;
use critter_core::event::{LedgerEvent, Receipt};
use critter_core::types::{
    AccountStatus, Interaction, PoolInfo, PoolPass, Role, Sentiment, SentimentCounts, Squeak,
    SqueakId, User,
};

use crate::error::NodeError;
use crate::node::{LoggedEvent, Node};

/// Result of a committed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxJson<T> {
    /// Block the transaction executed in.
    pub block_number: u64,
    /// Operation output.
    pub result: T,
    /// Events emitted, in order.
    pub events: Vec<LedgerEvent>,
}

impl<T> From<(T, Receipt)> for TxJson<T> {
    fn from((result, receipt): (T, Receipt)) -> Self {
        Self {
            block_number: receipt.block_number,
            result,
            events: receipt.events,
        }
    }
}

/// JSON representation of node info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfoJson {
    /// Node software version.
    pub version: String,
    /// Block of the last committed transaction.
    pub tip: u64,
    pub accounts: usize,
    pub squeaks: usize,
    pub pools: usize,
    pub treasury: u64,
    pub paused: bool,
}

/// Sentiment of a squeak, optionally with one account's flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentJson {
    pub counts: SentimentCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Sentiment>,
}

/// Protocol parameters and interaction fees by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigJson {
    pub parameters: BTreeMap<String, u64>,
    pub fees: BTreeMap<String, u64>,
}

/// Parse an address parameter.
pub fn parse_address(s: &str) -> Result<Address, ErrorObjectOwned> {
    s.parse()
        .map_err(|e| rpc_error(INVALID_PARAMS_CODE, &format!("invalid address {s:?}: {e}")))
}

/// Parse a named value, mapping failures to their ledger error code.
fn parse_named<T>(s: &str) -> Result<T, ErrorObjectOwned>
where
    T: std::str::FromStr<Err = LedgerError>,
{
    s.parse().map_err(ledger_error)
}

/// Create a JSON-RPC error.
fn rpc_error(code: i32, msg: &str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code, msg.to_string(), None::<()>)
}

/// Map a ledger error to a JSON-RPC error carrying its stable code.
pub fn ledger_error(e: LedgerError) -> ErrorObjectOwned {
    rpc_error(e.code(), &e.to_string())
}

/// The Critter JSON-RPC interface.
#[rpc(server)]
pub trait CritterRpc {
    /// Returns general node info.
    #[method(name = "getinfo")]
    async fn get_info(&self) -> Result<NodeInfoJson, ErrorObjectOwned>;

    /// Returns the native balance of an address.
    #[method(name = "getbalance")]
    async fn get_balance(&self, address: String) -> Result<u64, ErrorObjectOwned>;

    /// Returns an account, or null if it does not exist.
    #[method(name = "getaccount")]
    async fn get_account(&self, address: String) -> Result<Option<User>, ErrorObjectOwned>;

    /// Returns a squeak, or null if it does not exist.
    #[method(name = "getsqueak")]
    async fn get_squeak(&self, squeak_id: SqueakId) -> Result<Option<Squeak>, ErrorObjectOwned>;

    /// Registers the caller with a username.
    #[method(name = "createaccount")]
    async fn create_account(
        &self,
        caller: String,
        username: String,
    ) -> Result<TxJson<User>, ErrorObjectOwned>;

    /// Changes the caller's username.
    #[method(name = "updateusername")]
    async fn update_username(
        &self,
        caller: String,
        username: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned>;

    /// Sets an account's status (moderator).
    #[method(name = "setaccountstatus")]
    async fn set_account_status(
        &self,
        caller: String,
        account: String,
        status: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned>;

    /// Posts a squeak.
    #[method(name = "createsqueak")]
    async fn create_squeak(
        &self,
        caller: String,
        content: String,
    ) -> Result<TxJson<SqueakId>, ErrorObjectOwned>;

    /// Transfers a squeak to another account.
    #[method(name = "transfersqueak")]
    async fn transfer_squeak(
        &self,
        caller: String,
        squeak_id: SqueakId,
        to: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned>;

    /// Records a paid interaction.
    #[method(name = "interact")]
    async fn interact(
        &self,
        caller: String,
        squeak_id: SqueakId,
        interaction: String,
        value: u64,
    ) -> Result<TxJson<SentimentCounts>, ErrorObjectOwned>;

    /// Deletes a squeak; excess value is refunded.
    #[method(name = "deletesqueak")]
    async fn delete_squeak(
        &self,
        caller: String,
        squeak_id: SqueakId,
        value: u64,
    ) -> Result<TxJson<u64>, ErrorObjectOwned>;

    /// Quotes the deletion fee with a confirmation buffer.
    #[method(name = "getdeletefee")]
    async fn get_delete_fee(
        &self,
        squeak_id: SqueakId,
        buffer: Option<u64>,
    ) -> Result<u64, ErrorObjectOwned>;

    /// Leaves a scout pool.
    #[method(name = "leavepool")]
    async fn leave_pool(
        &self,
        caller: String,
        squeak_id: SqueakId,
    ) -> Result<TxJson<u64>, ErrorObjectOwned>;

    /// Removes a member from a scout pool (moderator).
    #[method(name = "ejectfrompool")]
    async fn eject_from_pool(
        &self,
        caller: String,
        squeak_id: SqueakId,
        member: String,
    ) -> Result<TxJson<u64>, ErrorObjectOwned>;

    #[method(name = "getpoolinfo")]
    async fn get_pool_info(&self, squeak_id: SqueakId) -> Result<PoolInfo, ErrorObjectOwned>;

    #[method(name = "getpoolpasses")]
    async fn get_pool_passes(&self, squeak_id: SqueakId) -> Result<Vec<PoolPass>, ErrorObjectOwned>;

    /// Returns sentiment counts, plus one account's flags if given.
    #[method(name = "getsentiment")]
    async fn get_sentiment(
        &self,
        squeak_id: SqueakId,
        account: Option<String>,
    ) -> Result<SentimentJson, ErrorObjectOwned>;

    #[method(name = "isviral")]
    async fn is_viral(&self, squeak_id: SqueakId) -> Result<bool, ErrorObjectOwned>;

    /// Returns the virality score at the current tip.
    #[method(name = "getviralityscore")]
    async fn get_virality_score(&self, squeak_id: SqueakId) -> Result<u64, ErrorObjectOwned>;

    /// Returns all protocol parameters and fees.
    #[method(name = "getconfig")]
    async fn get_config(&self) -> Result<ConfigJson, ErrorObjectOwned>;

    /// Sets a protocol parameter (admin). Returns the old value.
    #[method(name = "updateconfig")]
    async fn update_config(
        &self,
        caller: String,
        key: String,
        value: u64,
    ) -> Result<TxJson<u64>, ErrorObjectOwned>;

    /// Sets an interaction fee (treasurer). Returns the old fee.
    #[method(name = "updatefee")]
    async fn update_fee(
        &self,
        caller: String,
        interaction: String,
        amount: u64,
    ) -> Result<TxJson<u64>, ErrorObjectOwned>;

    /// Moves treasury funds to an address (treasurer).
    #[method(name = "withdraw")]
    async fn withdraw(
        &self,
        caller: String,
        to: String,
        amount: u64,
    ) -> Result<TxJson<()>, ErrorObjectOwned>;

    #[method(name = "grantrole")]
    async fn grant_role(
        &self,
        caller: String,
        role: String,
        account: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned>;

    #[method(name = "revokerole")]
    async fn revoke_role(
        &self,
        caller: String,
        role: String,
        account: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned>;

    #[method(name = "pause")]
    async fn pause(&self, caller: String) -> Result<TxJson<()>, ErrorObjectOwned>;

    #[method(name = "unpause")]
    async fn unpause(&self, caller: String) -> Result<TxJson<()>, ErrorObjectOwned>;

    /// Returns up to `limit` most recent committed events.
    #[method(name = "getevents")]
    async fn get_events(&self, limit: Option<usize>) -> Result<Vec<LoggedEvent>, ErrorObjectOwned>;
}

/// Implementation of the Critter JSON-RPC server.
pub struct RpcServerImpl {
    node: Arc<Node>,
}

impl RpcServerImpl {
    /// Create a new RPC server implementation wrapping the given node.
    pub fn new(node: Arc<Node>) -> Self {
        Self { node }
    }

    fn receipt_only(receipt: Result<Receipt, LedgerError>) -> Result<TxJson<()>, ErrorObjectOwned> {
        receipt.map(|r| TxJson::from(((), r))).map_err(ledger_error)
    }
}

#[async_trait]
impl CritterRpcServer for RpcServerImpl {
    async fn get_info(&self) -> Result<NodeInfoJson, ErrorObjectOwned> {
        Ok(self.node.read(|l| NodeInfoJson {
            version: env!("CARGO_PKG_VERSION").to_string(),
            tip: l.tip(),
            accounts: l.account_count(),
            squeaks: l.squeak_count(),
            pools: l.pool_count(),
            treasury: l.treasury(),
            paused: l.is_paused(),
        }))
    }

    async fn get_balance(&self, address: String) -> Result<u64, ErrorObjectOwned> {
        let address = parse_address(&address)?;
        Ok(self.node.read(|l| l.balance(&address)))
    }

    async fn get_account(&self, address: String) -> Result<Option<User>, ErrorObjectOwned> {
        let address = parse_address(&address)?;
        Ok(self.node.read(|l| l.account(&address)))
    }

    async fn get_squeak(&self, squeak_id: SqueakId) -> Result<Option<Squeak>, ErrorObjectOwned> {
        Ok(self.node.read(|l| l.squeak(squeak_id)))
    }

    async fn create_account(
        &self,
        caller: String,
        username: String,
    ) -> Result<TxJson<User>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        self.node
            .submit(caller, 0, |l, ctx| l.create_account(ctx, &username))
            .map(TxJson::from)
            .map_err(ledger_error)
    }

    async fn update_username(
        &self,
        caller: String,
        username: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        Self::receipt_only(
            self.node
                .submit_receipt(caller, 0, |l, ctx| l.update_username(ctx, &username)),
        )
    }

    async fn set_account_status(
        &self,
        caller: String,
        account: String,
        status: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        let account = parse_address(&account)?;
        let status: AccountStatus = parse_named(&status)?;
        Self::receipt_only(self.node.submit_receipt(caller, 0, |l, ctx| {
            l.update_account_status(ctx, account, status)
        }))
    }

    async fn create_squeak(
        &self,
        caller: String,
        content: String,
    ) -> Result<TxJson<SqueakId>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        self.node
            .submit(caller, 0, |l, ctx| l.create_squeak(ctx, &content))
            .map(TxJson::from)
            .map_err(ledger_error)
    }

    async fn transfer_squeak(
        &self,
        caller: String,
        squeak_id: SqueakId,
        to: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        let to = parse_address(&to)?;
        Self::receipt_only(
            self.node
                .submit_receipt(caller, 0, |l, ctx| l.transfer_squeak(ctx, squeak_id, to)),
        )
    }

    async fn interact(
        &self,
        caller: String,
        squeak_id: SqueakId,
        interaction: String,
        value: u64,
    ) -> Result<TxJson<SentimentCounts>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        let kind: Interaction = parse_named(&interaction)?;
        self.node
            .submit(caller, value, |l, ctx| l.interact(ctx, squeak_id, kind))
            .map(TxJson::from)
            .map_err(ledger_error)
    }

    async fn delete_squeak(
        &self,
        caller: String,
        squeak_id: SqueakId,
        value: u64,
    ) -> Result<TxJson<u64>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        self.node
            .submit(caller, value, |l, ctx| l.delete_squeak(ctx, squeak_id))
            .map(TxJson::from)
            .map_err(ledger_error)
    }

    async fn get_delete_fee(
        &self,
        squeak_id: SqueakId,
        buffer: Option<u64>,
    ) -> Result<u64, ErrorObjectOwned> {
        let buffer = buffer.unwrap_or(DEFAULT_DELETE_CONFIRMATION_BUFFER);
        self.node
            .read(|l| l.delete_fee(squeak_id, buffer))
            .map_err(ledger_error)
    }

    async fn leave_pool(
        &self,
        caller: String,
        squeak_id: SqueakId,
    ) -> Result<TxJson<u64>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        self.node
            .submit(caller, 0, |l, ctx| l.leave_pool(ctx, squeak_id))
            .map(TxJson::from)
            .map_err(ledger_error)
    }

    async fn eject_from_pool(
        &self,
        caller: String,
        squeak_id: SqueakId,
        member: String,
    ) -> Result<TxJson<u64>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        let member = parse_address(&member)?;
        self.node
            .submit(caller, 0, |l, ctx| l.eject_from_pool(ctx, squeak_id, member))
            .map(TxJson::from)
            .map_err(ledger_error)
    }

    async fn get_pool_info(&self, squeak_id: SqueakId) -> Result<PoolInfo, ErrorObjectOwned> {
        Ok(self.node.read(|l| l.pool_info(squeak_id)))
    }

    async fn get_pool_passes(&self, squeak_id: SqueakId) -> Result<Vec<PoolPass>, ErrorObjectOwned> {
        Ok(self.node.read(|l| l.pool_passes(squeak_id)))
    }

    async fn get_sentiment(
        &self,
        squeak_id: SqueakId,
        account: Option<String>,
    ) -> Result<SentimentJson, ErrorObjectOwned> {
        let account = account.as_deref().map(parse_address).transpose()?;
        Ok(self.node.read(|l| SentimentJson {
            counts: l.sentiment_counts(squeak_id),
            account: account.map(|a| l.user_sentiment(squeak_id, &a)),
        }))
    }

    async fn is_viral(&self, squeak_id: SqueakId) -> Result<bool, ErrorObjectOwned> {
        Ok(self.node.read(|l| l.is_viral(squeak_id)))
    }

    async fn get_virality_score(&self, squeak_id: SqueakId) -> Result<u64, ErrorObjectOwned> {
        self.node
            .read(|l| l.virality_score(squeak_id))
            .map_err(ledger_error)
    }

    async fn get_config(&self) -> Result<ConfigJson, ErrorObjectOwned> {
        Ok(self.node.read(|l| ConfigJson {
            parameters: l
                .configuration()
                .entries()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            fees: l
                .fee_schedule()
                .entries()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }))
    }

    async fn update_config(
        &self,
        caller: String,
        key: String,
        value: u64,
    ) -> Result<TxJson<u64>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        let key: ConfigKey = parse_named(&key)?;
        self.node
            .submit(caller, 0, |l, ctx| l.update_configuration(ctx, key, value))
            .map(TxJson::from)
            .map_err(ledger_error)
    }

    async fn update_fee(
        &self,
        caller: String,
        interaction: String,
        amount: u64,
    ) -> Result<TxJson<u64>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        let kind: Interaction = parse_named(&interaction)?;
        self.node
            .submit(caller, 0, |l, ctx| l.update_interaction_fee(ctx, kind, amount))
            .map(TxJson::from)
            .map_err(ledger_error)
    }

    async fn withdraw(
        &self,
        caller: String,
        to: String,
        amount: u64,
    ) -> Result<TxJson<()>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        let to = parse_address(&to)?;
        Self::receipt_only(
            self.node
                .submit_receipt(caller, 0, |l, ctx| l.withdraw(ctx, to, amount)),
        )
    }

    async fn grant_role(
        &self,
        caller: String,
        role: String,
        account: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        let role: Role = parse_named(&role)?;
        let account = parse_address(&account)?;
        Self::receipt_only(
            self.node
                .submit_receipt(caller, 0, |l, ctx| l.grant_role(ctx, role, account)),
        )
    }

    async fn revoke_role(
        &self,
        caller: String,
        role: String,
        account: String,
    ) -> Result<TxJson<()>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        let role: Role = parse_named(&role)?;
        let account = parse_address(&account)?;
        Self::receipt_only(
            self.node
                .submit_receipt(caller, 0, |l, ctx| l.revoke_role(ctx, role, account)),
        )
    }

    async fn pause(&self, caller: String) -> Result<TxJson<()>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        Self::receipt_only(self.node.submit_receipt(caller, 0, |l, ctx| l.pause(ctx)))
    }

    async fn unpause(&self, caller: String) -> Result<TxJson<()>, ErrorObjectOwned> {
        let caller = parse_address(&caller)?;
        Self::receipt_only(self.node.submit_receipt(caller, 0, |l, ctx| l.unpause(ctx)))
    }

    async fn get_events(&self, limit: Option<usize>) -> Result<Vec<LoggedEvent>, ErrorObjectOwned> {
        Ok(self.node.recent_events(limit.unwrap_or(100)))
    }
}

/// Start the JSON-RPC server on `addr`.
///
/// Returns the server handle and the bound address; binding to port 0 picks
/// a free port.
pub async fn start_rpc_server(
    addr: &str,
    node: Arc<Node>,
) -> Result<(ServerHandle, std::net::SocketAddr), NodeError> {
    let server = Server::builder()
        .build(addr)
        .await
        .map_err(|e| NodeError::Rpc(e.to_string()))?;
    let local_addr = server
        .local_addr()
        .map_err(|e| NodeError::Rpc(e.to_string()))?;

    let rpc_impl = RpcServerImpl::new(node);
    let handle = server.start(rpc_impl.into_rpc());

    Ok((handle, local_addr))
}

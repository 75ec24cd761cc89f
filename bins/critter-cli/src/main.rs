//! critter-cli: command-line client for a Critter node.
//!
//! Every subcommand maps onto one JSON-RPC method. Addresses are given as
//! 40-character hex strings and parsed locally before anything is sent.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use critter_core::address::Address;
use critter_core::constants::{DEFAULT_DELETE_CONFIRMATION_BUFFER, DEFAULT_RPC_PORT};
use critter_core::types::Interaction;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use tracing::debug;

/// Build an [`ArrayParams`] from a list of serializable values.
macro_rules! params {
    ($($value:expr),* $(,)?) => {{
        let mut params = ArrayParams::new();
        $( params.insert($value).context("Failed to encode RPC parameter")?; )*
        params
    }};
}
/// Critter command-line interface.
#[derive(Parser)]
#[command(name = "critter-cli")]
#[command(version, about = "Talk to a Critter node over JSON-RPC.")]
struct Cli {
    /// RPC endpoint URL.
    #[arg(short, long, global = true, default_value_t = default_endpoint())]
    rpc_endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show node status.
    Info,
    /// Query an account's spendable balance.
    Balance {
        address: Address,
    },
    /// Account management.
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Squeak management.
    Squeak {
        #[command(subcommand)]
        action: SqueakAction,
    },
    /// Like, dislike, resqueak or undo one of those on a squeak.
    Interact(InteractArgs),
    /// Scout pool queries and exits.
    Pool {
        #[command(subcommand)]
        action: PoolAction,
    },
    /// Protocol parameters and fees.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Treasury withdrawal (treasurer only).
    Withdraw {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        to: Address,
        #[arg(long)]
        amount: u64,
    },
    /// Role management (admin only).
    Role {
        #[command(subcommand)]
        action: RoleAction,
    },
    /// Halt state-changing operations (operator only).
    Pause {
        #[arg(long)]
        caller: Address,
    },
    /// Resume state-changing operations (operator only).
    Unpause {
        #[arg(long)]
        caller: Address,
    },
    /// Show the most recent ledger events.
    Events {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Register an account with a unique username.
    Create {
        #[arg(long)]
        caller: Address,
        username: String,
    },
    /// Show an account.
    Show { address: Address },
    /// Change the caller's username.
    Rename {
        #[arg(long)]
        caller: Address,
        username: String,
    },
    /// Set an account's status (moderator only).
    Status {
        #[arg(long)]
        caller: Address,
        account: Address,
        /// active, suspended or banned
        status: String,
    },
}

#[derive(Subcommand)]
enum SqueakAction {
    /// Post a new squeak.
    Post {
        #[arg(long)]
        caller: Address,
        content: String,
    },
    /// Show a squeak with its sentiment and virality.
    Show {
        id: u64,
        /// Also show this account's sentiment flag.
        #[arg(long)]
        account: Option<Address>,
    },
    /// Transfer a squeak to another account.
    Transfer {
        #[arg(long)]
        caller: Address,
        id: u64,
        to: Address,
    },
    /// Quote the deletion fee for a squeak.
    DeleteFee {
        id: u64,
        #[arg(long, default_value_t = DEFAULT_DELETE_CONFIRMATION_BUFFER)]
        buffer: u64,
    },
    /// Delete a squeak, paying the deletion fee.
    Delete {
        #[arg(long)]
        caller: Address,
        id: u64,
        /// Amount attached; the excess over the fee is refunded. Quoted
        /// from the node when omitted.
        #[arg(long)]
        value: Option<u64>,
    },
}

#[derive(Args)]
struct InteractArgs {
    #[arg(long)]
    caller: Address,
    /// Squeak id.
    id: u64,
    /// like, dislike, resqueak, undo-like, undo-dislike or undo-resqueak
    interaction: String,
    /// Amount attached; defaults to the current fee for the interaction.
    #[arg(long)]
    value: Option<u64>,
}

#[derive(Subcommand)]
enum PoolAction {
    /// Show pool amount, shares and members.
    Show { id: u64 },
    /// Leave a squeak's scout pool.
    Leave {
        #[arg(long)]
        caller: Address,
        id: u64,
    },
    /// Remove a member from a scout pool (moderator only).
    Eject {
        #[arg(long)]
        caller: Address,
        id: u64,
        member: Address,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show every parameter and fee.
    Show,
    /// Set a protocol parameter (admin only).
    Set {
        #[arg(long)]
        caller: Address,
        key: String,
        value: u64,
    },
    /// Set an interaction fee (treasurer only).
    Fee {
        #[arg(long)]
        caller: Address,
        interaction: String,
        amount: u64,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// Grant a role to an account.
    Grant {
        #[arg(long)]
        caller: Address,
        role: String,
        account: Address,
    },
    /// Revoke a role from an account.
    Revoke {
        #[arg(long)]
        caller: Address,
        role: String,
        account: Address,
    },
}

fn default_endpoint() -> String {
    format!("http://127.0.0.1:{DEFAULT_RPC_PORT}")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let client = HttpClientBuilder::default()
        .build(&cli.rpc_endpoint)
        .context("Failed to connect to RPC")?;

    let out = match cli.command {
        Commands::Info => call(&client, "getinfo", ArrayParams::new()).await?,
        Commands::Balance { address } => {
            call(&client, "getbalance", params!(address.to_string())).await?
        }
        Commands::Account { action } => account(&client, action).await?,
        Commands::Squeak { action } => squeak(&client, action).await?,
        Commands::Interact(args) => interact(&client, args).await?,
        Commands::Pool { action } => pool(&client, action).await?,
        Commands::Config { action } => config(&client, action).await?,
        Commands::Withdraw { caller, to, amount } => {
            call(
                &client,
                "withdraw",
                params!(caller.to_string(), to.to_string(), amount),
            )
            .await?
        }
        Commands::Role { action } => match action {
            RoleAction::Grant { caller, role, account } => {
                call(
                    &client,
                    "grantrole",
                    params!(caller.to_string(), role, account.to_string()),
                )
                .await?
            }
            RoleAction::Revoke { caller, role, account } => {
                call(
                    &client,
                    "revokerole",
                    params!(caller.to_string(), role, account.to_string()),
                )
                .await?
            }
        },
        Commands::Pause { caller } => call(&client, "pause", params!(caller.to_string())).await?,
        Commands::Unpause { caller } => {
            call(&client, "unpause", params!(caller.to_string())).await?
        }
        Commands::Events { limit } => call(&client, "getevents", params!(limit)).await?,
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Issue a single RPC request and return the raw JSON result.
async fn call(
    client: &HttpClient,
    method: &str,
    params: ArrayParams,
) -> Result<serde_json::Value> {
    debug!(method, "rpc request");
    client
        .request(method, params)
        .await
        .with_context(|| format!("RPC {method} failed"))
}

async fn account(client: &HttpClient, action: AccountAction) -> Result<serde_json::Value> {
    match action {
        AccountAction::Create { caller, username } => {
            call(client, "createaccount", params!(caller.to_string(), username)).await
        }
        AccountAction::Show { address } => {
            let user = call(client, "getaccount", params!(address.to_string())).await?;
            if user.is_null() {
                bail!("No account registered for {address}");
            }
            Ok(user)
        }
        AccountAction::Rename { caller, username } => {
            call(client, "updateusername", params!(caller.to_string(), username)).await
        }
        AccountAction::Status { caller, account, status } => {
            call(
                client,
                "setaccountstatus",
                params!(caller.to_string(), account.to_string(), status),
            )
            .await
        }
    }
}

async fn squeak(client: &HttpClient, action: SqueakAction) -> Result<serde_json::Value> {
    match action {
        SqueakAction::Post { caller, content } => {
            call(client, "createsqueak", params!(caller.to_string(), content)).await
        }
        SqueakAction::Show { id, account } => {
            let squeak = call(client, "getsqueak", params!(id)).await?;
            if squeak.is_null() {
                bail!("Squeak {id} not found");
            }
            let sentiment = call(
                client,
                "getsentiment",
                params!(id, account.map(|a| a.to_string())),
            )
            .await?;
            let viral = call(client, "isviral", params!(id)).await?;
            let score = call(client, "getviralityscore", params!(id)).await?;
            Ok(serde_json::json!({
                "squeak": squeak,
                "sentiment": sentiment,
                "viral": viral,
                "virality_score": score,
            }))
        }
        SqueakAction::Transfer { caller, id, to } => {
            call(
                client,
                "transfersqueak",
                params!(caller.to_string(), id, to.to_string()),
            )
            .await
        }
        SqueakAction::DeleteFee { id, buffer } => {
            call(client, "getdeletefee", params!(id, buffer)).await
        }
        SqueakAction::Delete { caller, id, value } => {
            let value = match value {
                Some(v) => v,
                None => quote_delete_fee(client, id).await?,
            };
            call(client, "deletesqueak", params!(caller.to_string(), id, value)).await
        }
    }
}

async fn quote_delete_fee(client: &HttpClient, id: u64) -> Result<u64> {
    let quote = call(
        client,
        "getdeletefee",
        params!(id, DEFAULT_DELETE_CONFIRMATION_BUFFER),
    )
    .await?;
    quote
        .as_u64()
        .with_context(|| format!("Unexpected delete fee quote: {quote}"))
}

async fn interact(client: &HttpClient, args: InteractArgs) -> Result<serde_json::Value> {
    let value = match args.value {
        Some(v) => v,
        None => {
            let config = call(client, "getconfig", ArrayParams::new()).await?;
            let kind: Interaction = args
                .interaction
                .parse()
                .with_context(|| format!("Unknown interaction '{}'", args.interaction))?;
            config["fees"][kind.as_str()]
                .as_u64()
                .with_context(|| format!("No fee configured for '{kind}'"))?
        }
    };
    call(
        client,
        "interact",
        params!(args.caller.to_string(), args.id, args.interaction, value),
    )
    .await
}

async fn pool(client: &HttpClient, action: PoolAction) -> Result<serde_json::Value> {
    match action {
        PoolAction::Show { id } => {
            let info = call(client, "getpoolinfo", params!(id)).await?;
            let passes = call(client, "getpoolpasses", params!(id)).await?;
            Ok(serde_json::json!({ "pool": info, "members": passes }))
        }
        PoolAction::Leave { caller, id } => {
            call(client, "leavepool", params!(caller.to_string(), id)).await
        }
        PoolAction::Eject { caller, id, member } => {
            call(
                client,
                "ejectfrompool",
                params!(caller.to_string(), id, member.to_string()),
            )
            .await
        }
    }
}

async fn config(client: &HttpClient, action: ConfigAction) -> Result<serde_json::Value> {
    match action {
        ConfigAction::Show => call(client, "getconfig", ArrayParams::new()).await,
        ConfigAction::Set { caller, key, value } => {
            call(client, "updateconfig", params!(caller.to_string(), key, value)).await
        }
        ConfigAction::Fee { caller, interaction, amount } => {
            call(
                client,
                "updatefee",
                params!(caller.to_string(), interaction, amount),
            )
            .await
        }
    }
}

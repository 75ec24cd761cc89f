//! Protocol constants and default parameters.
//!
//! All monetary values are in the ledger's base unit. Defaults here seed the
//! on-ledger configuration registry at genesis; after that the registry is
//! the only source of truth.

/// Denominator for percentage parameters such as the platform take rate.
pub const PERCENT_PRECISION: u64 = 100;

/// Scout level assigned to every newly created account.
pub const INITIAL_SCOUT_LEVEL: u64 = 1;

/// Level increase applied to every scout of a squeak that goes viral.
pub const BASIC_LEVEL_INCREASE: u64 = 1;

/// Default platform take rate, in percent of each positive interaction fee.
pub const DEFAULT_PLATFORM_TAKE_RATE: u64 = 10;

/// Default pool amount that triggers a payout to all members.
pub const DEFAULT_POOL_PAYOUT_THRESHOLD: u64 = 100_000;

/// Default maximum scout level.
pub const DEFAULT_SCOUT_MAX_LEVEL: u64 = 10;

/// Default extra levels granted to the account that triggers virality.
pub const DEFAULT_SCOUT_VIRALITY_BONUS: u64 = 5;

/// Default minimum virality score for a squeak to be considered viral.
pub const DEFAULT_VIRALITY_THRESHOLD: u64 = 60;

/// Default per-block deletion rate.
pub const DEFAULT_DELETE_FEE_PER_BLOCK: u64 = 100;

/// Default fee for a like.
pub const DEFAULT_LIKE_FEE: u64 = 2_000;

/// Default fee for a dislike.
pub const DEFAULT_DISLIKE_FEE: u64 = 2_000;

/// Default fee for a resqueak.
pub const DEFAULT_RESQUEAK_FEE: u64 = 4_000;

/// Default fee for undoing a like.
pub const DEFAULT_UNDO_LIKE_FEE: u64 = 1_000;

/// Default fee for undoing a dislike.
pub const DEFAULT_UNDO_DISLIKE_FEE: u64 = 1_000;

/// Default fee for undoing a resqueak.
pub const DEFAULT_UNDO_RESQUEAK_FEE: u64 = 1_000;

/// Maximum username length in bytes.
pub const MAX_USERNAME_LEN: usize = 32;

/// Maximum squeak content length in bytes.
pub const MAX_CONTENT_LEN: usize = 256;

/// Default number of blocks added to a deletion fee quote.
///
/// Covers the blocks that may be mined between quoting the fee and the
/// deletion transaction landing.
pub const DEFAULT_DELETE_CONFIRMATION_BUFFER: u64 = 10;

/// Default TCP port for the JSON-RPC server.
pub const DEFAULT_RPC_PORT: u16 = 18_545;

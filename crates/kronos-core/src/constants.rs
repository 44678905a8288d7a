//! ─── Protocol Constants ─────────────────────────────────────────────────────
//!
//! A time-denominated unit of account: one base unit corresponds
//! asymptotically to one second of verified temporal presence.

// ── Issuance ─────────────────────────────────────────────────────────────────

/// Total fixed issuance cap in base units. No pre-allocation.
pub const TOTAL_SUPPLY_BASE_UNITS: u128 = 1_260_000_000;

/// Initial block reward in base units.
pub const INITIAL_BLOCK_REWARD: u128 = 3_000;

/// Number of accepted blocks between reward halvings.
pub const HALVING_INTERVAL_BLOCKS: u64 = 210_000;

// ── Temporal proof engine ────────────────────────────────────────────────────

/// Default sequential hash-chain iteration count. Calibrated so evaluation
/// on reference hardware takes close to, but not more than, one finality
/// interval. Raised over time as an operator-triggered upgrade.
pub const VDF_ITERATIONS_DEFAULT: u64 = 1 << 24;

/// Checkpoint interval divisor: checkpoints are emitted every `T / 1000`
/// iterations during proving.
pub const VDF_CHECKPOINT_DIVISOR: u64 = 1_000;

/// Number of randomly sampled segments a verifier recomputes.
pub const VDF_VERIFY_SAMPLES: u32 = 20;

/// Finality interval in seconds. Also the slot-lottery cadence divisor
/// (60 one-second slots per interval).
pub const FINALITY_INTERVAL_SECONDS: i64 = 60;

/// UTC Unix timestamp of window 0's boundary. The genesis block is
/// produced at this instant; every subsequent window is counted from it.
pub const GENESIS_TIMESTAMP: i64 = 1_700_000_000;

/// Clock tolerance in seconds for block/heartbeat timestamps.
pub const CLOCK_TOLERANCE_SECONDS: i64 = 5;

// ── DAG / consensus ──────────────────────────────────────────────────────────

/// Minimum parent references per non-genesis block.
pub const DAG_MIN_PARENTS: usize = 1;

/// Maximum parent references per block.
pub const DAG_MAX_PARENTS: usize = 8;

/// PHANTOM anticone parameter k: a block is blue if at most `k` blocks in
/// its anticone are blue.
pub const PHANTOM_K: usize = 8;

/// Finality tiers, expressed as a count of passed checkpoints.
pub const SOFT_FINALITY_CHECKPOINTS: u32 = 1;
pub const MEDIUM_FINALITY_CHECKPOINTS: u32 = 2;
pub const HARD_FINALITY_CHECKPOINTS: u32 = 3;

// ── Reputation ────────────────────────────────────────────────────────────────

pub const REPUTATION_WEIGHT_UPTIME: f64 = 0.50;
pub const REPUTATION_WEIGHT_INTEGRITY: f64 = 0.20;
pub const REPUTATION_WEIGHT_STORAGE: f64 = 0.15;
pub const REPUTATION_WEIGHT_GEOGRAPHY: f64 = 0.10;
pub const REPUTATION_WEIGHT_HANDSHAKE: f64 = 0.05;

/// Uptime saturation cap: 180 days in seconds.
pub const UPTIME_SATURATION_SECONDS: u64 = 15_552_000;

/// Duration of a quarantine following an equivocation event, in seconds
/// (180 days). Also the new-node probation period.
pub const QUARANTINE_SECONDS: i64 = 180 * 24 * 3600;

/// Maximum mutual-trust bonds counted toward the handshake dimension.
pub const HANDSHAKE_BOND_SATURATION: u32 = 10;

/// Minimum uptime fraction (of saturation) required to form a handshake bond.
pub const HANDSHAKE_MIN_UPTIME_FRACTION: f64 = 0.90;
pub const HANDSHAKE_MIN_INTEGRITY: f64 = 0.80;
pub const HANDSHAKE_MIN_STORAGE: f64 = 0.90;
pub const HANDSHAKE_MIN_GEOGRAPHY: f64 = 0.10;

/// Weighting between the country- and city-level geography sub-scores.
pub const GEOGRAPHY_COUNTRY_WEIGHT: f64 = 0.6;
pub const GEOGRAPHY_CITY_WEIGHT: f64 = 0.4;

/// Per-region score split between peer-density decay and distinct-regions
/// coverage, within each of the country/city sub-scores.
pub const GEOGRAPHY_DENSITY_WEIGHT: f64 = 0.7;
pub const GEOGRAPHY_COVERAGE_WEIGHT: f64 = 0.3;

/// Target distinct-region count the coverage term saturates against. Not
/// specified numerically in source material; chosen as a round target
/// consistent with a globally distributed, not merely multi-national,
/// network.
pub const GEOGRAPHY_REGIONS_TARGET: f64 = 50.0;

/// First-mover bonuses added to the country/city sub-scores.
pub const GEOGRAPHY_FIRST_COUNTRY_BONUS: f64 = 0.25;
pub const GEOGRAPHY_FIRST_CITY_BONUS: f64 = 0.15;

/// Integrity event weights.
pub const INTEGRITY_EVENT_BLOCK_PRODUCED: f64 = 0.05;
pub const INTEGRITY_EVENT_BLOCK_VALIDATED: f64 = 0.02;
pub const INTEGRITY_EVENT_INVALID_BLOCK: f64 = -0.15;
pub const INTEGRITY_EVENT_EQUIVOCATION: f64 = -1.0;

/// New-node probation starting multiplier (at registration).
pub const PROBATION_START_MULTIPLIER: f64 = 0.10;

/// Integrity value a participant's record is reset to once a quarantine
/// expires — a "low positive baseline" rather than the pre-penalty value.
pub const QUARANTINE_INTEGRITY_BASELINE: f64 = 0.2;

/// Influx safeguard: registration rate multiple of trailing median that
/// triggers tightened probation.
pub const INFLUX_SAFEGUARD_MULTIPLE: f64 = 2.0;
pub const INFLUX_SAFEGUARD_TRAILING_WINDOWS: usize = 30;
pub const INFLUX_SAFEGUARD_UNDER_DAYS: i64 = 30;
pub const INFLUX_SAFEGUARD_MULTIPLIER: f64 = 0.1;

// ── Mempool ───────────────────────────────────────────────────────────────────

/// Mempool entry expiry in seconds (24 hours).
pub const MEMPOOL_ENTRY_EXPIRY_SECONDS: i64 = 24 * 3600;

// ── Peer link ─────────────────────────────────────────────────────────────────

pub const PEER_RECV_BPS_DEFAULT: u64 = 5 * 1024 * 1024;
pub const PEER_SEND_BPS_DEFAULT: u64 = 1 * 1024 * 1024;
pub const MIN_OUTBOUND_PEERS_DEFAULT: usize = 8;
pub const INBOUND_RATIO_MAX_DEFAULT: f64 = 0.7;
pub const MAX_CONNECTIONS_PER_IP: usize = 1;
pub const MAX_CONNECTIONS_PER_SUBNET24: usize = 3;
pub const PEER_RPC_TIMEOUT_SECONDS: u64 = 10;
pub const SHUTDOWN_GRACE_SECONDS: u64 = 5;

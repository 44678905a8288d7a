use thiserror::Error;

/// Flat error taxonomy for the protocol, grouped by the subsystem that
/// originates each variant.
#[derive(Debug, Error)]
pub enum KronosError {
    // ── Crypto errors ────────────────────────────────────────────────────────
    #[error("invalid cryptographic input format")]
    InvalidFormat,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("public key does not match expected identity")]
    KeyMismatch,

    // ── Temporal proof errors ────────────────────────────────────────────────
    #[error("delay-function proof is invalid")]
    ProofInvalid,

    #[error("declared window does not match current boundary clock")]
    WindowMismatch,

    #[error("timestamp outside clock tolerance")]
    ClockSkew,

    #[error("iteration count out of configured range")]
    IterationCountOutOfRange,

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("malformed encoding: {0}")]
    BadEncoding(String),

    #[error("unknown parent block: {0}")]
    UnknownParent(String),

    #[error("invalid signature on transaction or block")]
    BadSignature,

    #[error("output overflow: inputs do not cover outputs plus fee")]
    OutputOverflow,

    #[error("output privacy tier is lower than its consuming input's tier")]
    MonotonicPrivacyViolation,

    #[error("participant {0} signed two blocks for the same slot")]
    Equivocation(String),

    #[error("too few parents: need at least {min}, got {got}")]
    TooFewParents { min: usize, got: usize },

    #[error("too many parents: max {max}, got {got}")]
    TooManyParents { max: usize, got: usize },

    #[error("block or transaction already known")]
    AlreadyKnown,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("unknown output referenced: {0}")]
    UnknownOutput(String),

    #[error("output already spent: {0}")]
    DoubleSpend(String),

    // ── Consensus errors ─────────────────────────────────────────────────────
    #[error("participant is not the elected leader for this slot")]
    NotLeader,

    #[error("block queued as orphan awaiting parents")]
    OrphanBlock,

    #[error("reorg depth exceeds the allowed limit above hard finality")]
    ReorgLimitExceeded,

    #[error("no finality checkpoint is available yet")]
    CheckpointAbsent,

    #[error("issuance would exceed the total supply cap")]
    SupplyCapExceeded,

    // ── Storage errors ───────────────────────────────────────────────────────
    #[error("storage corruption detected: {0}")]
    Corruption(String),

    #[error("not found: {0}")]
    NotFound(String),

    // ── Network errors ───────────────────────────────────────────────────────
    #[error("peer operation timed out")]
    Timeout,

    #[error("peer exceeded its rate limit")]
    RateLimited,

    #[error("peer disconnected")]
    Disconnected,

    #[error("peer handshake failed")]
    HandshakeFailed,

    #[error("connection rejected: per-peer or per-subnet limit reached")]
    ConnectionLimitReached,

    // ── Config errors ────────────────────────────────────────────────────────
    #[error("unknown configuration option: {0}")]
    UnknownOption(String),

    #[error("configuration value out of range: {0}")]
    OutOfRange(String),

    // ── Serialization / storage plumbing ─────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── Genesis ──────────────────────────────────────────────────────────────
    #[error("genesis supply mismatch: expected {expected}, got {got}")]
    GenesisSupplyMismatch { expected: u128, got: u128 },

    // ── General ──────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

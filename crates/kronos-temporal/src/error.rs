use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemporalError {
    #[error("delay-function proof is invalid")]
    ProofInvalid,

    #[error("iteration count out of configured range: {0}")]
    IterationCountOutOfRange(u64),

    #[error("checkpoint list is malformed or inconsistent with the claimed iteration count")]
    MalformedCheckpoints,

    #[error("timestamp {timestamp} is outside clock tolerance of local UTC {now}")]
    ClockSkew { timestamp: i64, now: i64 },
}

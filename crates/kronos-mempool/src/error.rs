use thiserror::Error;

#[derive(Debug, Error)]
pub enum MempoolError {
    #[error("transaction already in the pool")]
    AlreadyPresent,

    #[error("transaction has no inputs or outputs")]
    Empty,

    #[error("pool is full and this transaction's fee does not outrank the lowest entry")]
    FeeTooLow,
}

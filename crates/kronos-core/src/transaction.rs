use serde::{Deserialize, Serialize};

use crate::types::{
    Amount, OutputId, ParticipantId, PrivacyTier, SphincsPublicKey, SphincsSignature, Timestamp,
    TxId,
};

// ── TxInput / TxOutput ──────────────────────────────────────────────────────

/// A reference to a previously created, unspent output, plus the signature
/// authorizing its consumption.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TxInput {
    pub output_id: OutputId,
    pub signature: SphincsSignature,
}

/// An unspent output: a fixed amount tagged with a privacy tier, payable to
/// a participant's public key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TxOutput {
    pub owner: ParticipantId,
    pub amount: Amount,
    pub tier: PrivacyTier,
}

// ── Transaction ──────────────────────────────────────────────────────────────

/// A fully-formed, signed transaction consuming zero or more existing
/// outputs and creating one or more new ones.
///
/// `tx_id` is SHA3-256 of the canonical bincode serialization of the body
/// (all fields except `tx_id` and the per-input signatures).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: TxId,

    /// Consumed outputs. Empty only for a coinbase/issuance transaction.
    pub inputs: Vec<TxInput>,

    /// Newly created outputs.
    pub outputs: Vec<TxOutput>,

    /// UTC Unix timestamp when this transaction was assembled.
    pub timestamp: Timestamp,

    /// Transaction fee in base units, paid to the block producer.
    pub fee: Amount,

    /// Public key authorizing the inputs, absent for coinbase transactions.
    pub authorizer: Option<SphincsPublicKey>,
}

/// The body fields that are hashed to produce `tx_id` and covered by each
/// input's signature. Excludes `tx_id` and the signatures themselves, so
/// the body is stable while inputs are being signed one at a time.
#[derive(Serialize)]
pub struct TransactionBody<'a> {
    pub output_ids: Vec<&'a OutputId>,
    pub outputs: &'a Vec<TxOutput>,
    pub timestamp: Timestamp,
    pub fee: Amount,
    pub authorizer: &'a Option<SphincsPublicKey>,
}

impl Transaction {
    /// Extract the body for hashing / signing.
    pub fn body(&self) -> TransactionBody<'_> {
        TransactionBody {
            output_ids: self.inputs.iter().map(|i| &i.output_id).collect(),
            outputs: &self.outputs,
            timestamp: self.timestamp,
            fee: self.fee,
            authorizer: &self.authorizer,
        }
    }

    /// Serialize the body to canonical bytes (bincode).
    pub fn body_bytes(&self) -> Vec<u8> {
        bincode::serialize(&self.body()).expect("body serialization is infallible")
    }

    /// Sum of all output amounts plus the fee.
    pub fn total_out(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(0u128, |acc, o| acc.checked_add(o.amount))
            .and_then(|sum| sum.checked_add(self.fee))
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty() && self.authorizer.is_none()
    }
}

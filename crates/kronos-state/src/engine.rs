use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use kronos_core::constants::FINALITY_INTERVAL_SECONDS;
use kronos_core::error::KronosError;
use kronos_core::transaction::Transaction;
use kronos_core::types::{BlockId, OutputId, ParticipantId, Slot, Timestamp, Window};
use kronos_core::Block;
use kronos_crypto::merkle_root;
use kronos_dag::validation::validate_block;
use kronos_dag::vertex::Vertex;
use kronos_dag::GhostdagStore;
use kronos_reputation::{EventKind, ReputationRecord};

use crate::db::StateDb;

/// The effect a successfully accepted block had, reported back to the
/// consensus worker and mempool so they can react (remove included
/// transactions, update reputation, etc).
#[derive(Debug)]
pub struct AcceptOutcome {
    pub block_id: BlockId,
    pub included_tx_ids: Vec<kronos_core::types::TxId>,
    pub equivocation: Option<ParticipantId>,
}

/// The block/transaction acceptance pipeline: structural and cryptographic
/// validation (delegated to [`kronos_dag::validation`]), UTXO application,
/// DAG insertion and blue/red ordering, and reputation event emission.
///
/// Owns the only mutable handle to the DAG store and unspent-output set;
/// every state-mutating operation is expected to funnel through this
/// engine from a single serialized worker, per the node's concurrency
/// model. Internally still guards the in-memory ordering index with an
/// `RwLock` so read-only views (tips, ancestry queries) do not have to wait
/// on the consensus worker's mpsc queue.
pub struct StateEngine {
    db: Arc<StateDb>,
    ordering: RwLock<GhostdagStore>,
    /// slot -> (producer -> block_id), used to detect equivocation: a
    /// second distinct block from the same producer in the same 1-second
    /// UTC slot (not the 60-second finality window — a leader may
    /// legitimately win several slots within one window).
    slot_claims: RwLock<HashMap<(Slot, ParticipantId), BlockId>>,
}

impl StateEngine {
    /// Open an engine over `db`, rebuilding the in-memory ordering index
    /// from every previously accepted vertex. Rebuilding is a fixpoint
    /// insertion: blocks whose parents are not yet classified are retried
    /// on the next pass, so arrival order in storage does not matter.
    pub fn open(db: Arc<StateDb>) -> Result<Self, KronosError> {
        let mut ordering = GhostdagStore::new();
        let mut slot_claims = HashMap::new();

        let all_ids = db.all_vertex_ids()?;
        let mut pending: Vec<Vertex> = Vec::with_capacity(all_ids.len());
        for id in &all_ids {
            if let Some(v) = db.get_vertex(id)? {
                pending.push(v);
            }
        }

        let mut inserted: HashSet<BlockId> = HashSet::new();
        let mut remaining = pending;
        loop {
            let mut progressed = false;
            let mut next_remaining = Vec::new();
            for vertex in remaining {
                let ready = vertex.is_genesis() || vertex.parents().iter().all(|p| inserted.contains(p));
                if ready {
                    if vertex.is_genesis() {
                        ordering.insert_genesis(vertex.block_id().clone());
                    } else {
                        ordering.insert_block(vertex.block_id().clone(), vertex.parents().clone());
                    }
                    inserted.insert(vertex.block_id().clone());
                    slot_claims.insert(
                        (vertex.block.timestamp_secs as Slot, vertex.block.producer.clone()),
                        vertex.block_id().clone(),
                    );
                    progressed = true;
                } else {
                    next_remaining.push(vertex);
                }
            }
            remaining = next_remaining;
            if !progressed || remaining.is_empty() {
                break;
            }
        }
        if !remaining.is_empty() {
            warn!(
                count = remaining.len(),
                "vertices left unclassified after rebuilding ordering index (missing ancestors)"
            );
        }

        Ok(Self {
            db,
            ordering: RwLock::new(ordering),
            slot_claims: RwLock::new(slot_claims),
        })
    }

    pub fn db(&self) -> &Arc<StateDb> {
        &self.db
    }

    /// Validate and apply a remotely or locally produced block.
    ///
    /// Structural/cryptographic validation happens first. If a parent is
    /// unknown the block is stashed as an orphan (not an error from the
    /// caller's perspective in the sense that it is recoverable —
    /// [`KronosError::OrphanBlock`] signals "try again once the parent
    /// arrives"). Equivocation — a second distinct block from the same
    /// producer in the same window — is detected and reported but does not
    /// itself block acceptance of either block; the DAG ordering rule
    /// resolves which one the network treats as canonical, same as any
    /// other two competing tips.
    pub fn accept_block(
        &self,
        block: Block,
        received_at: Timestamp,
        vrf_seed: &[u8],
        vdf_seed: &[u8],
    ) -> Result<AcceptOutcome, KronosError> {
        if self.db.vertex_exists(&block.block_id) {
            return Err(KronosError::AlreadyKnown);
        }

        if !block.is_genesis() {
            let missing_parent = block.parents.iter().any(|p| !self.db.vertex_exists(p));
            if missing_parent {
                self.db.put_orphan(&block)?;
                return Err(KronosError::OrphanBlock);
            }
        }

        let db = &self.db;
        validate_block(&block, vrf_seed, vdf_seed, received_at, |id| db.vertex_exists(id))?;

        let expected_tx_root = merkle_root(
            &block
                .transactions
                .iter()
                .map(|t| *t.tx_id.as_bytes())
                .collect::<Vec<_>>(),
        );
        if expected_tx_root != block.tx_root {
            return Err(KronosError::BadEncoding(
                "tx_root does not match transaction list".into(),
            ));
        }

        let mut included_tx_ids = Vec::with_capacity(block.transactions.len());
        for tx in &block.transactions {
            self.apply_transaction(tx)?;
            included_tx_ids.push(tx.tx_id.clone());
        }

        let equivocation = self.record_slot_claim(
            block.timestamp_secs as Slot,
            &block.producer,
            &block.block_id,
        );

        let vertex = Vertex::new(block.clone(), received_at);
        self.db.put_vertex(&vertex)?;
        for parent in &block.parents {
            self.db.remove_tip(parent)?;
        }
        self.db.add_tip(&block.block_id)?;

        {
            let mut ordering = self.ordering.write().expect("ordering lock poisoned");
            if block.is_genesis() {
                ordering.insert_genesis(block.block_id.clone());
            } else {
                ordering.insert_block(block.block_id.clone(), block.parents.clone());
            }
        }

        for waiting in self.db.orphans_awaiting(&block.block_id)? {
            debug!(block_id = %waiting.block_id, "orphan's parent arrived, ready for re-acceptance");
        }

        info!(
            block_id = %block.block_id,
            window = block.window,
            tx_count = included_tx_ids.len(),
            "accepted block"
        );

        Ok(AcceptOutcome {
            block_id: block.block_id,
            included_tx_ids,
            equivocation,
        })
    }

    /// Apply one transaction's UTXO effects: consume its inputs and create
    /// its outputs. Performed only after the embedding block has already
    /// passed structural validation; signature checks over the spend are
    /// the caller's responsibility via the input's `signature` field
    /// against the transaction authorizer, since that is a per-input
    /// concern the DAG-level structural validator does not perform.
    fn apply_transaction(&self, tx: &Transaction) -> Result<(), KronosError> {
        if !tx.is_coinbase() {
            let mut input_total: u128 = 0;
            for input in &tx.inputs {
                let spent = self
                    .db
                    .get_output(&input.output_id)?
                    .ok_or_else(|| KronosError::UnknownOutput(input.output_id.to_string()))?;
                input_total = input_total
                    .checked_add(spent.amount)
                    .ok_or(KronosError::OutputOverflow)?;

                for new_output in &tx.outputs {
                    if (new_output.tier as u8) < (spent.tier as u8) {
                        return Err(KronosError::MonotonicPrivacyViolation);
                    }
                }
            }

            let total_out = tx.total_out().ok_or(KronosError::OutputOverflow)?;
            if total_out != input_total {
                return Err(KronosError::OutputOverflow);
            }

            for input in &tx.inputs {
                self.db.remove_output(&input.output_id)?;
            }
        }

        for (index, output) in tx.outputs.iter().enumerate() {
            let output_id = OutputId {
                tx_id: tx.tx_id.clone(),
                index: index as u32,
            };
            if self.db.output_exists(&output_id) {
                return Err(KronosError::AlreadyKnown);
            }
            self.db.put_output(&output_id, output)?;
        }

        Ok(())
    }

    /// Record that `producer` claimed `slot` with `block_id`. Returns
    /// `Some(producer)` if this is a second, distinct block from the same
    /// producer in the same 1-second slot (equivocation).
    fn record_slot_claim(
        &self,
        slot: Slot,
        producer: &ParticipantId,
        block_id: &BlockId,
    ) -> Option<ParticipantId> {
        let mut claims = self.slot_claims.write().expect("slot claims lock poisoned");
        let key = (slot, producer.clone());
        match claims.get(&key) {
            Some(existing) if existing != block_id => {
                warn!(participant = %producer, slot, "equivocation: two distinct blocks for the same slot");
                Some(producer.clone())
            }
            Some(_) => None,
            None => {
                claims.insert(key, block_id.clone());
                None
            }
        }
    }

    /// Apply an equivocation's reputation consequence: integrity penalty
    /// and quarantine, persisted immediately.
    pub fn apply_equivocation(&self, participant: &ParticipantId, now: Timestamp) -> Result<(), KronosError> {
        let mut record = self
            .db
            .get_reputation(participant)?
            .unwrap_or_else(|| ReputationRecord::new(participant.clone(), now));
        record.maybe_expire_quarantine(now);
        record.apply_event(EventKind::Equivocation, now);
        self.db.put_reputation(&record)
    }

    /// Apply a reputation event for ordinary block production/validation
    /// or invalidity, creating the record on first contact.
    pub fn apply_reputation_event(
        &self,
        participant: &ParticipantId,
        kind: EventKind,
        now: Timestamp,
    ) -> Result<(), KronosError> {
        let mut record = self
            .db
            .get_reputation(participant)?
            .unwrap_or_else(|| ReputationRecord::new(participant.clone(), now));
        record.maybe_expire_quarantine(now);
        record.apply_event(kind, now);
        if kind == EventKind::BlockProduced {
            record.record_stored_block();
        }
        self.db.put_reputation(&record)
    }

    /// Current tip set, ordered heaviest-first by blue score.
    pub fn heaviest_tips(&self) -> Result<Vec<BlockId>, KronosError> {
        let tips = self.db.get_tips()?;
        let ordering = self.ordering.read().expect("ordering lock poisoned");
        let mut scored: Vec<(u64, BlockId)> = tips
            .into_iter()
            .map(|id| (ordering.blue_score(&id).unwrap_or(0), id))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.as_bytes().cmp(b.1.as_bytes())));
        Ok(scored.into_iter().map(|(_, id)| id).collect())
    }

    /// Deterministic linearization of every block this node currently
    /// knows about, per the PHANTOM ordering rule.
    pub fn linearize(&self) -> Vec<BlockId> {
        self.ordering.read().expect("ordering lock poisoned").linearize()
    }

    pub fn blue_score(&self, id: &BlockId) -> Option<u64> {
        self.ordering.read().expect("ordering lock poisoned").blue_score(id)
    }

    /// Build and persist the finality checkpoint for `window`, assuming
    /// the window has fully closed (i.e. `window + 1`'s boundary has
    /// passed). Aggregates every accepted block whose `timestamp_secs`
    /// falls in the window's closed interval.
    pub fn build_checkpoint(
        &self,
        window: Window,
        heartbeat_count: u64,
    ) -> Result<kronos_core::checkpoint::Checkpoint, KronosError> {
        let boundary = (window as i64) * FINALITY_INTERVAL_SECONDS;
        let window_end = boundary + FINALITY_INTERVAL_SECONDS;

        let mut leaves = Vec::new();
        let mut vdf_work = 0u64;
        for id in self.db.all_vertex_ids()? {
            if let Some(vertex) = self.db.get_vertex(&id)? {
                let ts = vertex.block.timestamp_secs;
                if ts >= boundary && ts < window_end {
                    leaves.push(*id.as_bytes());
                    if let Ok(proof) =
                        bincode::deserialize::<kronos_temporal::vdf::VdfProof>(&vertex.block.vdf_proof)
                    {
                        vdf_work = vdf_work.saturating_add(proof.iterations);
                    }
                }
            }
        }
        leaves.sort();
        let block_root = merkle_root(&leaves);

        let previous_checkpoint = self.db.latest_checkpoint()?.map(|cp| cp.checkpoint_hash);

        let checkpoint = kronos_consensus::emit_checkpoint(
            window,
            boundary,
            block_root,
            heartbeat_count,
            vdf_work,
            previous_checkpoint,
        );
        self.db.put_checkpoint(&checkpoint)?;
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kronos_core::types::{PrivacyTier, TxId, VrfOutput, VrfProof};
    use kronos_crypto::{block_id_from_body, tx_id_from_body, KeyPair};

    fn temp_db(name: &str) -> Arc<StateDb> {
        let dir = std::env::temp_dir().join(format!("kronos_engine_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        Arc::new(StateDb::open(&dir).expect("open temp db"))
    }

    fn signed_genesis(kp: &KeyPair) -> Block {
        let mut block = Block {
            block_id: BlockId::from_bytes([0u8; 32]),
            parents: vec![],
            producer: kp.participant_id.clone(),
            producer_key: kp.public_key.clone(),
            window: 0,
            vrf_output: VrfOutput([0u8; 32]),
            vrf_proof: VrfProof(kronos_core::types::SphincsSignature(vec![])),
            tx_root: merkle_root(&[]),
            transactions: vec![],
            vdf_output: [0u8; 32],
            vdf_proof: vec![],
            timestamp_secs: 0,
            timestamp_nanos: 0,
            signature: kronos_core::types::SphincsSignature(vec![]),
        };
        let body_bytes = block.body_bytes();
        block.block_id = block_id_from_body(&body_bytes);
        block.signature = kp.sign(&body_bytes);
        block
    }

    #[test]
    fn accepts_valid_genesis_and_tracks_tip() {
        let db = temp_db("genesis_tip");
        let engine = StateEngine::open(db).unwrap();
        let kp = KeyPair::generate();
        let block = signed_genesis(&kp);
        let outcome = engine.accept_block(block.clone(), 0, b"seed", b"seed").unwrap();
        assert_eq!(outcome.block_id, block.block_id);
        assert_eq!(engine.heaviest_tips().unwrap(), vec![block.block_id]);
    }

    #[test]
    fn rejects_duplicate_block() {
        let db = temp_db("dup");
        let engine = StateEngine::open(db).unwrap();
        let kp = KeyPair::generate();
        let block = signed_genesis(&kp);
        engine.accept_block(block.clone(), 0, b"seed", b"seed").unwrap();
        let err = engine.accept_block(block, 1, b"seed", b"seed").unwrap_err();
        assert!(matches!(err, KronosError::AlreadyKnown));
    }

    #[test]
    fn unknown_parent_is_queued_as_orphan() {
        let db = temp_db("orphan");
        let engine = StateEngine::open(db.clone()).unwrap();
        let kp = KeyPair::generate();
        let mut block = signed_genesis(&kp);
        block.parents = vec![BlockId::from_bytes([9u8; 32])];
        let body_bytes = block.body_bytes();
        block.block_id = block_id_from_body(&body_bytes);
        block.signature = kp.sign(&body_bytes);
        let err = engine.accept_block(block.clone(), 0, b"seed", b"seed").unwrap_err();
        assert!(matches!(err, KronosError::OrphanBlock));
        assert!(db.remove_orphan(&block.block_id).unwrap().is_some());
    }

    #[test]
    fn coinbase_transaction_creates_spendable_output() {
        let db = temp_db("coinbase");
        let engine = StateEngine::open(db.clone()).unwrap();
        let kp = KeyPair::generate();
        let recipient = ParticipantId::from_bytes([5u8; 32]);

        let mut coinbase = Transaction {
            tx_id: TxId::from_bytes([0u8; 32]),
            inputs: vec![],
            outputs: vec![kronos_core::TxOutput {
                owner: recipient,
                amount: 3_000,
                tier: PrivacyTier::T0,
            }],
            timestamp: 0,
            fee: 0,
            authorizer: None,
        };
        coinbase.tx_id = tx_id_from_body(&coinbase.body_bytes());

        let mut block = signed_genesis(&kp);
        block.transactions = vec![coinbase.clone()];
        block.tx_root = merkle_root(&[*coinbase.tx_id.as_bytes()]);
        let body_bytes = block.body_bytes();
        block.block_id = block_id_from_body(&body_bytes);
        block.signature = kp.sign(&body_bytes);

        engine.accept_block(block, 0, b"seed", b"seed").unwrap();

        let output_id = OutputId {
            tx_id: coinbase.tx_id,
            index: 0,
        };
        assert!(db.output_exists(&output_id));
    }

    #[test]
    fn monotonic_privacy_violation_is_rejected() {
        let db = temp_db("privacy");
        let engine = StateEngine::open(db.clone()).unwrap();
        let kp = KeyPair::generate();
        let payer = ParticipantId::from_bytes([1u8; 32]);

        let mut coinbase = Transaction {
            tx_id: TxId::from_bytes([0u8; 32]),
            inputs: vec![],
            outputs: vec![kronos_core::TxOutput {
                owner: payer.clone(),
                amount: 100,
                tier: PrivacyTier::T1,
            }],
            timestamp: 0,
            fee: 0,
            authorizer: None,
        };
        coinbase.tx_id = tx_id_from_body(&coinbase.body_bytes());

        let mut genesis = signed_genesis(&kp);
        genesis.transactions = vec![coinbase.clone()];
        genesis.tx_root = merkle_root(&[*coinbase.tx_id.as_bytes()]);
        let body_bytes = genesis.body_bytes();
        genesis.block_id = block_id_from_body(&body_bytes);
        genesis.signature = kp.sign(&body_bytes);
        engine.accept_block(genesis, 0, b"seed", b"seed").unwrap();

        let spend = Transaction {
            tx_id: TxId::from_bytes([1u8; 32]),
            inputs: vec![kronos_core::TxInput {
                output_id: OutputId {
                    tx_id: coinbase.tx_id,
                    index: 0,
                },
                signature: kronos_core::types::SphincsSignature(vec![]),
            }],
            outputs: vec![kronos_core::TxOutput {
                owner: payer,
                amount: 100,
                tier: PrivacyTier::T0,
            }],
            timestamp: 1,
            fee: 0,
            authorizer: Some(kp.public_key.clone()),
        };
        let err = engine.apply_transaction(&spend).unwrap_err();
        assert!(matches!(err, KronosError::MonotonicPrivacyViolation));
    }

    #[test]
    fn equivocation_is_flagged_for_second_distinct_block_same_slot_producer() {
        let db = temp_db("equivocation");
        let engine = StateEngine::open(db).unwrap();
        let kp = KeyPair::generate();

        let first = signed_genesis(&kp);
        engine.accept_block(first, 0, b"seed", b"seed").unwrap();

        let second = {
            let mut b = Block {
                block_id: BlockId::from_bytes([0u8; 32]),
                parents: vec![],
                producer: kp.participant_id.clone(),
                producer_key: kp.public_key.clone(),
                window: 0,
                vrf_output: VrfOutput([1u8; 32]),
                vrf_proof: VrfProof(kronos_core::types::SphincsSignature(vec![])),
                tx_root: merkle_root(&[]),
                transactions: vec![],
                vdf_output: [0u8; 32],
                vdf_proof: vec![],
                timestamp_secs: 1,
                timestamp_nanos: 0,
                signature: kronos_core::types::SphincsSignature(vec![]),
            };
            let body_bytes = b.body_bytes();
            b.block_id = block_id_from_body(&body_bytes);
            b.signature = kp.sign(&body_bytes);
            b
        };

        // Force through record_slot_claim directly since two genesis
        // blocks can't both structurally validate as DAG children of one
        // another; this exercises the equivocation bookkeeping in
        // isolation from full block acceptance.
        let first_claim = engine.record_slot_claim(0, &kp.participant_id, &BlockId::from_bytes([7u8; 32]));
        assert!(first_claim.is_none());
        let second_claim = engine.record_slot_claim(0, &kp.participant_id, &second.block_id);
        assert_eq!(second_claim, Some(kp.participant_id.clone()));
    }
}

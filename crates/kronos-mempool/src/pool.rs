use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use kronos_core::constants::MEMPOOL_ENTRY_EXPIRY_SECONDS;
use kronos_core::types::{OutputId, Timestamp, TxId};
use kronos_core::Transaction;

use crate::error::MempoolError;

/// A read-only view of the unspent-output set the mempool admits
/// transactions against. Implemented by the DAG store's best-view
/// snapshot; kept as a trait so the pool can be unit tested without a
/// real store.
pub trait UnspentView {
    fn contains(&self, output_id: &OutputId) -> bool;
}

/// Why an entry left the pool, reported via [`MempoolEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemovalReason {
    Included,
    Expired,
    Conflict,
    Evicted,
}

#[derive(Clone, Debug)]
pub enum MempoolEvent {
    Added(TxId),
    Removed(TxId, RemovalReason),
}

/// Priority key: higher fee-per-byte ranks first; ties break by earlier
/// arrival, then by transaction id for a total, deterministic order.
#[derive(Clone, Debug, PartialEq)]
struct PriorityKey {
    fee_per_byte: f64,
    received_at: Timestamp,
    tx_id: TxId,
}

impl Eq for PriorityKey {}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse fee ordering so a BTreeSet iterates highest-priority first.
        other
            .fee_per_byte
            .total_cmp(&self.fee_per_byte)
            .then_with(|| self.received_at.cmp(&other.received_at))
            .then_with(|| self.tx_id.as_bytes().cmp(other.tx_id.as_bytes()))
    }
}

struct Entry {
    tx: Transaction,
    received_at: Timestamp,
    size_bytes: usize,
}

/// Bounded, priority-ordered pool of pending transactions.
///
/// Priority is fee-per-byte with arrival time as a tie-break. Admission
/// requires every input to reference an output present in the supplied
/// [`UnspentView`] and not already claimed by another pooled transaction;
/// a conflicting transaction is evicted only if the incoming one pays a
/// higher fee.
pub struct Mempool {
    max_bytes: usize,
    used_bytes: usize,
    entries: HashMap<TxId, Entry>,
    by_priority: BTreeSet<PriorityKey>,
    /// Which pooled transaction currently claims each output.
    spends: HashMap<OutputId, TxId>,
}

impl Mempool {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            entries: HashMap::new(),
            by_priority: BTreeSet::new(),
            spends: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, tx_id: &TxId) -> bool {
        self.entries.contains_key(tx_id)
    }

    pub fn get(&self, tx_id: &TxId) -> Option<&Transaction> {
        self.entries.get(tx_id).map(|e| &e.tx)
    }

    /// Attempt to admit `tx`, given the current best-view unspent set and
    /// wall-clock time. Returns any events emitted as a side effect
    /// (the addition itself, plus evictions of conflicting entries).
    pub fn insert(
        &mut self,
        tx: Transaction,
        utxos: &impl UnspentView,
        now: Timestamp,
    ) -> Result<Vec<MempoolEvent>, MempoolError> {
        if tx.outputs.is_empty() || tx.inputs.is_empty() {
            return Err(MempoolError::Empty);
        }
        if self.entries.contains_key(&tx.tx_id) {
            return Err(MempoolError::AlreadyPresent);
        }
        if tx.total_out().is_none() {
            return Err(MempoolError::Empty);
        }

        for input in &tx.inputs {
            if !utxos.contains(&input.output_id) {
                return Err(MempoolError::FeeTooLow);
            }
        }

        let size_bytes = tx.body_bytes().len().max(1);
        let fee_per_byte = tx.fee as f64 / size_bytes as f64;
        let key = PriorityKey {
            fee_per_byte,
            received_at: now,
            tx_id: tx.tx_id.clone(),
        };

        let mut events = Vec::new();

        // Conflict resolution: any pooled transaction claiming one of this
        // transaction's inputs must be evicted, and only if it pays a
        // strictly lower fee-per-byte than the incoming transaction.
        let mut conflicting: Vec<TxId> = Vec::new();
        for input in &tx.inputs {
            if let Some(existing) = self.spends.get(&input.output_id) {
                if !conflicting.contains(existing) {
                    conflicting.push(existing.clone());
                }
            }
        }
        for conflict_id in &conflicting {
            let existing_fee_per_byte = self
                .entries
                .get(conflict_id)
                .map(|e| e.tx.fee as f64 / e.size_bytes.max(1) as f64)
                .unwrap_or(0.0);
            if fee_per_byte <= existing_fee_per_byte {
                return Err(MempoolError::FeeTooLow);
            }
        }
        for conflict_id in conflicting {
            self.remove(&conflict_id, RemovalReason::Conflict, &mut events);
        }

        while self.used_bytes + size_bytes > self.max_bytes {
            match self.lowest_priority_id() {
                Some(evict_id) if evict_id != tx.tx_id => {
                    self.remove(&evict_id, RemovalReason::Evicted, &mut events);
                }
                _ => {
                    warn!(tx_id = %tx.tx_id, "transaction too large to fit even an empty pool");
                    return Err(MempoolError::FeeTooLow);
                }
            }
        }

        for input in &tx.inputs {
            self.spends.insert(input.output_id.clone(), tx.tx_id.clone());
        }
        self.used_bytes += size_bytes;
        self.by_priority.insert(key);
        let tx_id = tx.tx_id.clone();
        self.entries.insert(
            tx_id.clone(),
            Entry {
                tx,
                received_at: now,
                size_bytes,
            },
        );

        debug!(tx_id = %tx_id, "admitted transaction to mempool");
        events.push(MempoolEvent::Added(tx_id));
        Ok(events)
    }

    /// Remove every entry older than the configured expiry, relative to
    /// `now`.
    pub fn expire(&mut self, now: Timestamp) -> Vec<MempoolEvent> {
        let stale: Vec<TxId> = self
            .entries
            .iter()
            .filter(|(_, e)| now - e.received_at > MEMPOOL_ENTRY_EXPIRY_SECONDS)
            .map(|(id, _)| id.clone())
            .collect();
        let mut events = Vec::new();
        for id in stale {
            self.remove(&id, RemovalReason::Expired, &mut events);
        }
        events
    }

    /// Remove a transaction because it was included in an accepted block.
    pub fn remove_included(&mut self, tx_id: &TxId) -> Option<MempoolEvent> {
        let mut events = Vec::new();
        self.remove(tx_id, RemovalReason::Included, &mut events);
        events.into_iter().next()
    }

    /// Transactions in priority order, for block assembly. Does not remove
    /// them; the caller removes via [`Mempool::remove_included`] once a
    /// block referencing them is accepted.
    pub fn by_priority(&self) -> impl Iterator<Item = &Transaction> {
        self.by_priority
            .iter()
            .filter_map(move |key| self.entries.get(&key.tx_id).map(|e| &e.tx))
    }

    fn lowest_priority_id(&self) -> Option<TxId> {
        self.by_priority.iter().last().map(|k| k.tx_id.clone())
    }

    fn remove(&mut self, tx_id: &TxId, reason: RemovalReason, events: &mut Vec<MempoolEvent>) {
        let Some(entry) = self.entries.remove(tx_id) else {
            return;
        };
        self.used_bytes -= entry.size_bytes;
        self.spends.retain(|_, claimant| claimant != tx_id);
        let key = PriorityKey {
            fee_per_byte: entry.tx.fee as f64 / entry.size_bytes.max(1) as f64,
            received_at: entry.received_at,
            tx_id: tx_id.clone(),
        };
        self.by_priority.remove(&key);
        events.push(MempoolEvent::Removed(tx_id.clone(), reason));
    }
}

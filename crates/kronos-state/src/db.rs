use std::path::Path;

use kronos_core::checkpoint::Checkpoint;
use kronos_core::error::KronosError;
use kronos_core::transaction::TxOutput;
use kronos_core::types::{BlockId, OutputId, ParticipantId, Window};
use kronos_core::Block;
use kronos_dag::vertex::Vertex;
use kronos_reputation::ReputationRecord;

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   vertices    — BlockId bytes       → bincode(Vertex)
///   orphans     — BlockId bytes       → bincode(Block)   (awaiting parents)
///   utxos       — bincode(OutputId)   → bincode(TxOutput)
///   tips        — BlockId bytes       → [] (membership set)
///   checkpoints — Window be bytes     → bincode(Checkpoint)
///   reputation  — ParticipantId bytes → bincode(ReputationRecord)
///   meta        — utf8 key bytes      → raw bytes
pub struct StateDb {
    _db: sled::Db,
    vertices: sled::Tree,
    orphans: sled::Tree,
    utxos: sled::Tree,
    tips: sled::Tree,
    checkpoints: sled::Tree,
    reputation: sled::Tree,
    meta: sled::Tree,
}

fn storage_err(e: sled::Error) -> KronosError {
    KronosError::Storage(e.to_string())
}

fn ser<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, KronosError> {
    bincode::serialize(value).map_err(|e| KronosError::Serialization(e.to_string()))
}

fn de<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, KronosError> {
    bincode::deserialize(bytes).map_err(|e| KronosError::Serialization(e.to_string()))
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KronosError> {
        let db = sled::open(path).map_err(storage_err)?;
        let vertices = db.open_tree("vertices").map_err(storage_err)?;
        let orphans = db.open_tree("orphans").map_err(storage_err)?;
        let utxos = db.open_tree("utxos").map_err(storage_err)?;
        let tips = db.open_tree("tips").map_err(storage_err)?;
        let checkpoints = db.open_tree("checkpoints").map_err(storage_err)?;
        let reputation = db.open_tree("reputation").map_err(storage_err)?;
        let meta = db.open_tree("meta").map_err(storage_err)?;
        Ok(Self {
            _db: db,
            vertices,
            orphans,
            utxos,
            tips,
            checkpoints,
            reputation,
            meta,
        })
    }

    // ── Vertices ─────────────────────────────────────────────────────────────

    pub fn get_vertex(&self, id: &BlockId) -> Result<Option<Vertex>, KronosError> {
        match self.vertices.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_vertex(&self, vertex: &Vertex) -> Result<(), KronosError> {
        let bytes = ser(vertex)?;
        self.vertices
            .insert(vertex.block_id().as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn vertex_exists(&self, id: &BlockId) -> bool {
        self.vertices.contains_key(id.as_bytes()).unwrap_or(false)
    }

    pub fn count_vertices(&self) -> u64 {
        self.vertices.len() as u64
    }

    /// Every vertex id currently persisted, in no particular order.
    pub fn all_vertex_ids(&self) -> Result<Vec<BlockId>, KronosError> {
        let mut out = Vec::with_capacity(self.vertices.len());
        for item in self.vertices.iter() {
            let (key, _) = item.map_err(storage_err)?;
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&key);
            out.push(BlockId::from_bytes(arr));
        }
        Ok(out)
    }

    // ── Orphans ──────────────────────────────────────────────────────────────

    /// Stash a structurally-unresolvable block (unknown parent) for later
    /// reconsideration once its missing parent arrives.
    pub fn put_orphan(&self, block: &Block) -> Result<(), KronosError> {
        let bytes = ser(block)?;
        self.orphans
            .insert(block.block_id.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn remove_orphan(&self, id: &BlockId) -> Result<Option<Block>, KronosError> {
        match self.orphans.remove(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every orphan currently waiting on `parent_id`.
    pub fn orphans_awaiting(&self, parent_id: &BlockId) -> Result<Vec<Block>, KronosError> {
        let mut out = Vec::new();
        for item in self.orphans.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            let block: Block = de(&bytes)?;
            if block.parents.iter().any(|p| p == parent_id) {
                out.push(block);
            }
        }
        Ok(out)
    }

    // ── UTXOs ────────────────────────────────────────────────────────────────

    pub fn get_output(&self, id: &OutputId) -> Result<Option<TxOutput>, KronosError> {
        let key = ser(id)?;
        match self.utxos.get(key).map_err(storage_err)? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn output_exists(&self, id: &OutputId) -> bool {
        ser(id)
            .ok()
            .and_then(|key| self.utxos.contains_key(key).ok())
            .unwrap_or(false)
    }

    pub fn put_output(&self, id: &OutputId, output: &TxOutput) -> Result<(), KronosError> {
        let key = ser(id)?;
        let value = ser(output)?;
        self.utxos.insert(key, value).map_err(storage_err)?;
        Ok(())
    }

    pub fn remove_output(&self, id: &OutputId) -> Result<(), KronosError> {
        let key = ser(id)?;
        self.utxos.remove(key).map_err(storage_err)?;
        Ok(())
    }

    /// Every currently-unspent output, for aggregate balance queries.
    pub fn iter_outputs(&self) -> Result<Vec<(OutputId, TxOutput)>, KronosError> {
        let mut out = Vec::new();
        for item in self.utxos.iter() {
            let (key, value) = item.map_err(storage_err)?;
            out.push((de(&key)?, de(&value)?));
        }
        Ok(out)
    }

    // ── Tips ─────────────────────────────────────────────────────────────────

    pub fn add_tip(&self, id: &BlockId) -> Result<(), KronosError> {
        self.tips
            .insert(id.as_bytes(), b"".as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn remove_tip(&self, id: &BlockId) -> Result<(), KronosError> {
        self.tips.remove(id.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_tips(&self) -> Result<Vec<BlockId>, KronosError> {
        let mut tips = Vec::new();
        for item in self.tips.iter() {
            let (key, _) = item.map_err(storage_err)?;
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&key);
            tips.push(BlockId::from_bytes(arr));
        }
        Ok(tips)
    }

    // ── Checkpoints ──────────────────────────────────────────────────────────

    pub fn get_checkpoint(&self, window: Window) -> Result<Option<Checkpoint>, KronosError> {
        match self
            .checkpoints
            .get(window.to_be_bytes())
            .map_err(storage_err)?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), KronosError> {
        let bytes = ser(checkpoint)?;
        self.checkpoints
            .insert(checkpoint.window.to_be_bytes(), bytes)
            .map_err(storage_err)?;
        self.put_meta("latest_checkpoint_window", &checkpoint.window.to_be_bytes())?;
        Ok(())
    }

    pub fn latest_checkpoint(&self) -> Result<Option<Checkpoint>, KronosError> {
        match self.get_meta("latest_checkpoint_window")? {
            Some(bytes) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                self.get_checkpoint(Window::from_be_bytes(arr))
            }
            None => Ok(None),
        }
    }

    // ── Reputation ───────────────────────────────────────────────────────────

    pub fn get_reputation(&self, id: &ParticipantId) -> Result<Option<ReputationRecord>, KronosError> {
        match self.reputation.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_reputation(&self, record: &ReputationRecord) -> Result<(), KronosError> {
        let bytes = ser(record)?;
        self.reputation
            .insert(record.participant.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_reputation(&self) -> Result<Vec<ReputationRecord>, KronosError> {
        let mut out = Vec::new();
        for item in self.reputation.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), KronosError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, KronosError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage_err)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), KronosError> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }
}

/// Adapts [`StateDb`]'s UTXO tree to the mempool's admission-check trait.
impl kronos_mempool::UnspentView for StateDb {
    fn contains(&self, output_id: &OutputId) -> bool {
        self.output_exists(output_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kronos_core::types::{PrivacyTier, TxId};

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("kronos_state_db_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn sample_output() -> (OutputId, TxOutput) {
        let id = OutputId {
            tx_id: TxId::from_bytes([1u8; 32]),
            index: 0,
        };
        let output = TxOutput {
            owner: ParticipantId::from_bytes([2u8; 32]),
            amount: 10,
            tier: PrivacyTier::T0,
        };
        (id, output)
    }

    #[test]
    fn utxo_round_trips() {
        let db = temp_db("utxo");
        let (id, output) = sample_output();
        assert!(!db.output_exists(&id));
        db.put_output(&id, &output).unwrap();
        assert!(db.output_exists(&id));
        let fetched = db.get_output(&id).unwrap().unwrap();
        assert_eq!(fetched.amount, output.amount);
        db.remove_output(&id).unwrap();
        assert!(!db.output_exists(&id));
    }

    #[test]
    fn tips_track_membership() {
        let db = temp_db("tips");
        let a = BlockId::from_bytes([1u8; 32]);
        db.add_tip(&a).unwrap();
        assert_eq!(db.get_tips().unwrap(), vec![a.clone()]);
        db.remove_tip(&a).unwrap();
        assert!(db.get_tips().unwrap().is_empty());
    }

    #[test]
    fn reputation_round_trips() {
        let db = temp_db("reputation");
        let record = ReputationRecord::new(ParticipantId::from_bytes([3u8; 32]), 0);
        db.put_reputation(&record).unwrap();
        let fetched = db.get_reputation(&record.participant).unwrap().unwrap();
        assert_eq!(fetched.participant, record.participant);
    }

    #[test]
    fn unspent_view_delegates_to_output_table() {
        let db = temp_db("unspent_view");
        let (id, output) = sample_output();
        db.put_output(&id, &output).unwrap();
        assert!(kronos_mempool::UnspentView::contains(&db, &id));
    }
}

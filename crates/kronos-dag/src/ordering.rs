use std::collections::{HashMap, HashSet};

use kronos_core::constants::PHANTOM_K;
use kronos_core::types::BlockId;

/// Per-block bookkeeping the PHANTOM algorithm needs to classify blocks as
/// blue (part of the agreed-upon honest history) or red (excluded, e.g.
/// withheld or equivocating branches), and to assign a total order.
#[derive(Clone, Debug)]
struct BlockMeta {
    parents: Vec<BlockId>,
    selected_parent: Option<BlockId>,
    /// The set of blocks classified blue in this block's own past, used to
    /// approximate anticone membership against later candidates. Does not
    /// include the block itself.
    blue_past: HashSet<BlockId>,
    blue_score: u64,
}

/// Maintains the running PHANTOM blue/red classification and blue-score
/// accounting over a block-DAG as vertices are added in arrival order.
///
/// Each block's selected parent is the parent with the highest blue score
/// (ties broken by block id, so every honest participant converges on the
/// same selection). The anticone parameter `k` bounds how many red blocks
/// a block may have in its merged-in history before being excluded.
pub struct GhostdagStore {
    k: usize,
    metas: HashMap<BlockId, BlockMeta>,
}

impl Default for GhostdagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GhostdagStore {
    pub fn new() -> Self {
        Self {
            k: PHANTOM_K,
            metas: HashMap::new(),
        }
    }

    pub fn insert_genesis(&mut self, id: BlockId) {
        self.metas.insert(
            id,
            BlockMeta {
                parents: vec![],
                selected_parent: None,
                blue_past: HashSet::new(),
                blue_score: 0,
            },
        );
    }

    /// Classify and insert a non-genesis block. Panics if a parent is
    /// unknown or `parents` is empty — callers are expected to have run
    /// structural validation first.
    pub fn insert_block(&mut self, id: BlockId, parents: Vec<BlockId>) {
        assert!(!parents.is_empty(), "non-genesis block needs parents");

        let selected = parents
            .iter()
            .max_by(|a, b| {
                let sa = self.blue_score(a).unwrap_or(0);
                let sb = self.blue_score(b).unwrap_or(0);
                // Tie-break on the smaller id so every node picks the same
                // selected parent regardless of arrival order.
                sa.cmp(&sb).then_with(|| b.as_bytes().cmp(a.as_bytes()))
            })
            .cloned()
            .expect("parents non-empty");

        let selected_meta = self.metas.get(&selected).cloned().unwrap_or(BlockMeta {
            parents: vec![],
            selected_parent: None,
            blue_past: HashSet::new(),
            blue_score: 0,
        });

        let mut blue_past = selected_meta.blue_past.clone();
        blue_past.insert(selected.clone());

        let mut mergeset: Vec<BlockId> = parents
            .iter()
            .filter(|p| **p != selected && !blue_past.contains(*p))
            .cloned()
            .collect();
        mergeset.sort_by(|a, b| {
            let sa = self.blue_score(a).unwrap_or(0);
            let sb = self.blue_score(b).unwrap_or(0);
            sb.cmp(&sa).then_with(|| a.as_bytes().cmp(b.as_bytes()))
        });

        let mut added_blue = 0u64;
        for cand in mergeset {
            let cand_past = self.metas.get(&cand).map(|m| &m.blue_past);
            // Anticone size of `cand` w.r.t. the blue set accumulated so
            // far: how many already-blue blocks are not in cand's own
            // blue past (i.e. neither causally precedes the other).
            let anticone_size = blue_past
                .iter()
                .filter(|b| !cand_past.map(|p| p.contains(*b)).unwrap_or(false))
                .count();
            if anticone_size <= self.k {
                blue_past.insert(cand);
                added_blue += 1;
            }
        }

        let blue_score = selected_meta.blue_score + added_blue + 1;
        self.metas.insert(
            id,
            BlockMeta {
                parents,
                selected_parent: Some(selected),
                blue_past,
                blue_score,
            },
        );
    }

    pub fn blue_score(&self, id: &BlockId) -> Option<u64> {
        self.metas.get(id).map(|m| m.blue_score)
    }

    pub fn selected_parent(&self, id: &BlockId) -> Option<BlockId> {
        self.metas.get(id).and_then(|m| m.selected_parent.clone())
    }

    /// Whether `candidate` is classified blue in `of_block`'s past.
    pub fn is_blue_in(&self, candidate: &BlockId, of_block: &BlockId) -> bool {
        self.metas
            .get(of_block)
            .map(|m| m.blue_past.contains(candidate))
            .unwrap_or(false)
    }

    /// A deterministic total order over every known block: ascending by
    /// blue score, ties broken by block id. This is the canonical
    /// transaction-application order for finality purposes.
    pub fn linearize(&self) -> Vec<BlockId> {
        let mut ids: Vec<BlockId> = self.metas.keys().cloned().collect();
        ids.sort_by(|a, b| {
            let sa = self.metas[a].blue_score;
            let sb = self.metas[b].blue_score;
            sa.cmp(&sb).then_with(|| a.as_bytes().cmp(b.as_bytes()))
        });
        ids
    }

    /// The tip with the highest blue score (ties broken by id); this is the
    /// block a new block should select as its sole "virtual" parent if the
    /// caller wants a single-parent fast path.
    pub fn heaviest_tip<'a>(&self, candidates: impl Iterator<Item = &'a BlockId>) -> Option<BlockId> {
        candidates
            .max_by(|a, b| {
                let sa = self.blue_score(a).unwrap_or(0);
                let sb = self.blue_score(b).unwrap_or(0);
                sa.cmp(&sb).then_with(|| b.as_bytes().cmp(a.as_bytes()))
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(b: u8) -> BlockId {
        BlockId::from_bytes([b; 32])
    }

    #[test]
    fn linear_chain_has_increasing_blue_score() {
        let mut store = GhostdagStore::new();
        store.insert_genesis(id(0));
        store.insert_block(id(1), vec![id(0)]);
        store.insert_block(id(2), vec![id(1)]);
        assert_eq!(store.blue_score(&id(0)), Some(0));
        assert_eq!(store.blue_score(&id(1)), Some(1));
        assert_eq!(store.blue_score(&id(2)), Some(2));
    }

    #[test]
    fn parallel_branch_merges_as_blue_within_k() {
        let mut store = GhostdagStore::new();
        store.insert_genesis(id(0));
        store.insert_block(id(1), vec![id(0)]);
        store.insert_block(id(2), vec![id(0)]);
        store.insert_block(id(3), vec![id(1), id(2)]);
        assert!(store.blue_score(&id(3)).unwrap() >= 2);
    }

    #[test]
    fn linearize_is_deterministic_by_score_then_id() {
        let mut store = GhostdagStore::new();
        store.insert_genesis(id(0));
        store.insert_block(id(1), vec![id(0)]);
        let order = store.linearize();
        assert_eq!(order[0], id(0));
        assert_eq!(order[1], id(1));
    }
}

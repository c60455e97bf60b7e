//! Block store: a synchronous, canonical-CID-keyed lookup table for the
//! blocks that travel with a [`Delegation`][super::Delegation].
//!
//! Lookup is the only operation the core needs to be synchronous about;
//! fetching a proof that isn't locally present is the caller's concern
//! (the proof resolver's), not this store's.

use crate::block::Block;
use ipld_core::cid::Cid;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// An in-memory, reference-counted table of [`Block`]s keyed by the
/// canonical string form of their [`Cid`].
///
/// Cheap to clone: clones share the same underlying table, so every
/// [`Delegation`][super::Delegation] view derived from one `view()` call
/// (and its proofs, and their proofs) sees the same blocks.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: Arc<Mutex<HashMap<String, Block>>>,
}

impl BlockStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `blocks`. Later insertions of a
    /// block with the same CID overwrite the earlier one.
    #[must_use]
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let store = Self::new();
        for block in blocks {
            store.insert(block);
        }
        store
    }

    /// Insert (or replace) a block, keyed by its CID's canonical string form.
    pub fn insert(&self, block: Block) {
        let key = block.cid().to_string();
        self.blocks
            .lock()
            .expect("block store lock poisoned")
            .insert(key, block);
    }

    /// Look up a block by CID.
    #[must_use]
    pub fn get(&self, cid: &Cid) -> Option<Block> {
        self.blocks
            .lock()
            .expect("block store lock poisoned")
            .get(&cid.to_string())
            .cloned()
    }

    /// Whether a block for `cid` is present.
    #[must_use]
    pub fn contains(&self, cid: &Cid) -> bool {
        self.blocks
            .lock()
            .expect("block store lock poisoned")
            .contains_key(&cid.to_string())
    }

    /// Number of distinct blocks held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.lock().expect("block store lock poisoned").len()
    }

    /// Whether the store holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_blocks_resolve_by_cid() {
        let store = BlockStore::new();
        let block = Block::encode(&"hello").unwrap();
        store.insert(block.clone());

        assert_eq!(store.get(block.cid()), Some(block));
    }

    #[test]
    fn missing_cid_resolves_to_none() {
        let store = BlockStore::new();
        let block = Block::encode(&"hello").unwrap();
        assert_eq!(store.get(block.cid()), None);
    }

    #[test]
    fn clones_share_the_same_table() {
        let store = BlockStore::new();
        let clone = store.clone();
        let block = Block::encode(&"shared").unwrap();

        store.insert(block.clone());

        assert!(clone.contains(block.cid()));
    }

    #[test]
    fn from_blocks_prepopulates_the_store() {
        let a = Block::encode(&"a").unwrap();
        let b = Block::encode(&"b").unwrap();
        let store = BlockStore::from_blocks([a.clone(), b.clone()]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a.cid()), Some(a));
        assert_eq!(store.get(b.cid()), Some(b));
    }
}

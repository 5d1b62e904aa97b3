//! ChainIndex: the index layer. Separate chaining from interned keys to slots.
//!
//! Chain nodes live in a generational arena and link to each other by arena
//! key, so a rehash only rewrites `next` links and bucket heads; no node is
//! copied or reallocated. Each node keeps the hash computed at insertion,
//! and every placement decision uses that stored hash.

use crate::error::{MapError, Result};
use crate::hash::bucket_for;
use crate::interner::InternedStr;
use crate::slots::Slot;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub(crate) struct NodeKey;
}

#[derive(Debug)]
struct ChainNode {
    key: InternedStr,
    hash: u64,
    slot: Slot,
    next: Option<NodeKey>,
}

/// Outcome of `ChainIndex::upsert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Upsert {
    /// A new chain node was linked at the head of its bucket.
    Inserted,
    /// An existing node now points at the new slot; `previous` is orphaned.
    Updated { previous: Slot },
}

#[derive(Debug)]
pub(crate) struct ChainIndex {
    buckets: Vec<Option<NodeKey>>,
    nodes: SlotMap<NodeKey, ChainNode>,
}

fn alloc_buckets(count: usize) -> Result<Vec<Option<NodeKey>>> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(count)
        .map_err(|_| MapError::oom("bucket table"))?;
    buckets.resize(count, None);
    Ok(buckets)
}

impl ChainIndex {
    pub(crate) fn with_buckets(count: usize) -> Result<Self> {
        Ok(Self {
            buckets: alloc_buckets(count)?,
            nodes: SlotMap::with_key(),
        })
    }

    /// Number of live chain nodes (the map's entry count).
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn load_factor(&self) -> f64 {
        self.nodes.len() as f64 / self.buckets.len() as f64
    }

    fn find_node<F>(&self, hash: u64, eq: F) -> Option<NodeKey>
    where
        F: Fn(&InternedStr) -> bool,
    {
        let mut cur = self.buckets[bucket_for(hash, self.buckets.len())];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if node.hash == hash && eq(&node.key) {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    /// Slot bound to the key equal to `key`, compared by content.
    pub(crate) fn find(&self, hash: u64, key: &str) -> Option<Slot> {
        self.find_node(hash, |k| k.as_str() == key)
            .map(|k| self.nodes[k].slot)
    }

    /// Slot bound to an interned key; canonical pointers short-circuit the
    /// content comparison.
    pub(crate) fn find_interned(&self, hash: u64, key: &InternedStr) -> Option<Slot> {
        self.find_node(hash, |k| k == key).map(|k| self.nodes[k].slot)
    }

    /// Bind `key` to `slot`, replacing the slot of an existing equal key.
    pub(crate) fn upsert(&mut self, key: InternedStr, hash: u64, slot: Slot) -> Upsert {
        if let Some(k) = self.find_node(hash, |existing| *existing == key) {
            let node = &mut self.nodes[k];
            let previous = node.slot;
            node.slot = slot;
            return Upsert::Updated { previous };
        }

        let b = bucket_for(hash, self.buckets.len());
        let next = self.buckets[b];
        let k = self.nodes.insert(ChainNode {
            key,
            hash,
            slot,
            next,
        });
        self.buckets[b] = Some(k);
        Upsert::Inserted
    }

    /// Unlink and drop the node for `key`, returning the slot it pointed at.
    pub(crate) fn remove(&mut self, hash: u64, key: &InternedStr) -> Option<Slot> {
        let b = bucket_for(hash, self.buckets.len());
        let mut prev: Option<NodeKey> = None;
        let mut cur = self.buckets[b];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if node.hash == hash && node.key == *key {
                let next = node.next;
                match prev {
                    Some(p) => self.nodes[p].next = next,
                    None => self.buckets[b] = next,
                }
                return self.nodes.remove(k).map(|n| n.slot);
            }
            prev = cur;
            cur = node.next;
        }
        None
    }

    /// Replace the bucket table with one of `new_count` heads and relink
    /// every node by its stored hash. On allocation failure nothing moves.
    pub(crate) fn rehash(&mut self, new_count: usize) -> Result<()> {
        let mut fresh = alloc_buckets(new_count)?;
        let ChainIndex { buckets, nodes } = self;
        for head in buckets.iter() {
            let mut cur = *head;
            while let Some(k) = cur {
                let node = &mut nodes[k];
                cur = node.next;
                let b = bucket_for(node.hash, new_count);
                node.next = fresh[b];
                fresh[b] = Some(k);
            }
        }
        *buckets = fresh;
        Ok(())
    }

    /// Walk every chain and check placement, node count and slot bounds.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self, slot_count: usize) {
        let mut seen = 0usize;
        for (i, head) in self.buckets.iter().enumerate() {
            let mut cur = *head;
            while let Some(k) = cur {
                let node = self.nodes.get(k).expect("chain links to a live node");
                assert_eq!(
                    bucket_for(node.hash, self.buckets.len()),
                    i,
                    "node {:?} chained in the wrong bucket",
                    node.key
                );
                assert_eq!(node.hash, crate::hash::hash_str(&node.key));
                assert!(node.slot.index() < slot_count, "slot out of range");
                seen += 1;
                cur = node.next;
            }
        }
        assert_eq!(seen, self.nodes.len(), "unreachable nodes in arena");
    }
}

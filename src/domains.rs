//! Per-slot candidate sets, with cheap snapshot/restore for backtracking.
//!
//! Each slot's domain is a `BitSet` over `WordId`s, so iterating a domain always visits words in
//! vocabulary order. Every removal is also pushed onto a trail; a snapshot is just the trail's
//! length at the time it was taken, and restoring pops the trail back down to that length,
//! re-inserting each removed word. Words never come back any other way.

use bit_set::BitSet;

use crate::structure::{SlotId, Structure};
use crate::word_list::{Vocabulary, WordId};

/// An opaque restore point returned by [`Domains::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainSnapshot {
    trail_len: usize,
}

#[derive(Debug, Clone)]
pub struct Domains {
    domains: Vec<BitSet>,

    /// `BitSet::len` is a linear scan, so we keep our own count of remaining options per slot.
    counts: Vec<usize>,

    /// Every (slot, word) removal since construction, oldest first.
    trail: Vec<(SlotId, WordId)>,
}

impl Domains {
    /// Give every slot a domain of all vocabulary words whose length matches the slot's length.
    /// Length is the only unary constraint, so this is node consistency.
    pub fn new(structure: &Structure, vocabulary: &Vocabulary) -> Domains {
        let domains: Vec<BitSet> = structure
            .slots()
            .map(|slot| {
                let mut domain = BitSet::with_capacity(vocabulary.len());
                for (word_id, word) in vocabulary.iter() {
                    if word.len() == slot.length {
                        domain.insert(word_id);
                    }
                }
                domain
            })
            .collect();

        let counts = domains.iter().map(|domain| domain.len()).collect();

        Domains { domains, counts, trail: vec![] }
    }

    pub fn slot_count(&self) -> usize {
        self.domains.len()
    }

    /// How many options are still available for this slot?
    pub fn len(&self, slot_id: SlotId) -> usize {
        self.counts[slot_id]
    }

    /// An empty domain means the slot can't be filled from here; it never means "solved".
    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.counts[slot_id] == 0
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].contains(word_id)
    }

    /// The remaining options for a slot, in vocabulary order.
    pub fn words(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        self.domains[slot_id].iter()
    }

    /// Domain sizes for every slot, in slot id order.
    pub fn sizes(&self) -> Vec<usize> {
        self.counts.clone()
    }

    /// Remove every word for which `keep` returns false. Returns whether anything was removed.
    pub fn prune<F>(&mut self, slot_id: SlotId, mut keep: F) -> bool
    where
        F: FnMut(WordId) -> bool,
    {
        let removals: Vec<WordId> =
            self.domains[slot_id].iter().filter(|&word_id| !keep(word_id)).collect();

        for &word_id in &removals {
            self.domains[slot_id].remove(word_id);
            self.trail.push((slot_id, word_id));
        }
        self.counts[slot_id] -= removals.len();

        !removals.is_empty()
    }

    /// Remove a single word, if present. Returns whether it was present.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        if !self.domains[slot_id].remove(word_id) {
            return false;
        }
        self.trail.push((slot_id, word_id));
        self.counts[slot_id] -= 1;

        true
    }

    pub fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot { trail_len: self.trail.len() }
    }

    /// Undo every removal made since `snapshot` was taken.
    ///
    /// Snapshots must be restored in LIFO order; restoring an older snapshot also discards any
    /// newer ones. Restoring a snapshot that is already gone is a programming error.
    pub fn restore(&mut self, snapshot: DomainSnapshot) {
        if snapshot.trail_len > self.trail.len() {
            panic!(
                "Restoring a stale domain snapshot ({} > {})",
                snapshot.trail_len,
                self.trail.len()
            );
        }

        while self.trail.len() > snapshot.trail_len {
            if let Some((slot_id, word_id)) = self.trail.pop() {
                self.domains[slot_id].insert(word_id);
                self.counts[slot_id] += 1;
            }
        }
    }
}

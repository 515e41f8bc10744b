//! This module implements grid-filling using a recursive backtracking search. Before searching we
//! establish arc consistency with AC-3; during the search we pick slots by minimum remaining
//! values (breaking ties by degree, then by grid position), try words in least-constraining-value
//! order, and optionally prune the remaining domains after each choice.

use bit_set::BitSet;
use instant::{Duration, Instant};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use crate::arc_consistency::{establish_arc_consistency, establish_arc_consistency_from, revise};
use crate::domains::Domains;
use crate::structure::{Overlap, Slot, SlotId, Structure};
use crate::word_list::{Vocabulary, WordId};
use crate::CHECK_INVARIANTS;

/// How many states do we visit between checks of the time limit?
pub const INTERRUPT_FREQUENCY: u64 = 16;

/// What kind of pruning should happen after each choice?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inference {
    /// Plain backtracking: choices are only checked against the slots that are already filled.
    None,
    /// Remove the chosen word from every other unfilled slot and revise each unfilled neighbor
    /// against the choice.
    #[default]
    ForwardChecking,
    /// Forward checking, followed by AC-3 over the unfilled part of the grid.
    MaintainArcConsistency,
}

/// Settings for a fill attempt.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    pub inference: Inference,
    /// Give up after visiting this many search states.
    pub max_states: Option<u64>,
    /// Give up after this much time has passed.
    pub time_limit: Option<Duration>,
}

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub revisions: u64,
    pub initial_arc_consistency_time: Duration,
    pub duration: Duration,
}

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A complete fill: one word per slot, ordered by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    words: BTreeMap<Slot, String>,
}

impl Assignment {
    pub fn get(&self, slot: &Slot) -> Option<&str> {
        self.words.get(slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Slot, &str)> {
        self.words.iter().map(|(slot, word)| (slot, word.as_str()))
    }

    pub fn insert(&mut self, slot: Slot, word: String) -> Option<String> {
        self.words.insert(slot, word)
    }

    /// Does this assignment fill every slot of `structure` with distinct words of the right
    /// lengths that agree wherever two slots cross?
    pub fn is_valid_for(&self, structure: &Structure) -> bool {
        let letters = |slot_id: SlotId| -> Option<Vec<char>> {
            self.get(structure.slot(slot_id)).map(|word| word.chars().collect())
        };

        let mut seen = std::collections::HashSet::new();
        if self.len() != structure.slot_count() || !self.words.values().all(|w| seen.insert(w)) {
            return false;
        }

        (0..structure.slot_count()).all(|slot_id| {
            let Some(word) = letters(slot_id) else {
                return false;
            };
            word.len() == structure.slot(slot_id).length
                && structure.neighbors(slot_id).iter().all(|&other_slot_id| {
                    let Some(other_word) = letters(other_slot_id) else {
                        return false;
                    };
                    structure.overlap(slot_id, other_slot_id).map_or(true, |overlap| {
                        word.get(overlap.index) == other_word.get(overlap.other_index)
                    })
                })
        })
    }
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub assignment: Assignment,
    /// The choices that make up the fill, in the order they were made.
    pub choices: Vec<Choice>,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FillFailure {
    #[error("No solution.")]
    Unsatisfiable,

    #[error("Gave up after visiting {states} states")]
    StateLimitExceeded { states: u64 },

    #[error("Timed out after {elapsed:?}")]
    TimedOut { elapsed: Duration },
}

/// The live state of a fill attempt. Domains are shared by every level of the recursion; each
/// level snapshots them before pruning and restores the snapshot before returning.
struct Search<'a> {
    structure: &'a Structure,
    vocabulary: &'a Vocabulary,
    options: &'a FillOptions,
    domains: Domains,
    assigned: Vec<Option<WordId>>,
    unfilled_slot_ids: BitSet,
    used_word_ids: BitSet,
    choices: Vec<Choice>,
    statistics: Statistics,
    start: Instant,
}

impl<'a> Search<'a> {
    fn new(
        structure: &'a Structure,
        vocabulary: &'a Vocabulary,
        options: &'a FillOptions,
        domains: Domains,
        statistics: Statistics,
        start: Instant,
    ) -> Search<'a> {
        let slot_count = structure.slot_count();

        Search {
            structure,
            vocabulary,
            options,
            domains,
            assigned: vec![None; slot_count],
            unfilled_slot_ids: BitSet::from_iter(0..slot_count),
            used_word_ids: BitSet::with_capacity(vocabulary.len()),
            choices: Vec::with_capacity(slot_count),
            statistics,
            start,
        }
    }

    /// Pick the unfilled slot with the fewest remaining options. Ties go to the slot with the most
    /// crossings, then to the slot that comes first in grid order.
    fn select_unassigned_slot(&self) -> Option<SlotId> {
        self.unfilled_slot_ids.iter().min_by_key(|&slot_id| {
            (self.domains.len(slot_id), Reverse(self.structure.degree(slot_id)), slot_id)
        })
    }

    /// Return the options for `slot_id` ordered by how many options they would rule out in the
    /// unfilled crossing slots, fewest first. Ties keep their domain order.
    fn order_domain_values(&self, slot_id: SlotId) -> Vec<WordId> {
        // For each unfilled neighbor, how many of its options put each letter in the shared cell?
        let neighbor_letter_counts: Vec<(Overlap, HashMap<char, usize>, usize)> = self
            .structure
            .neighbors(slot_id)
            .iter()
            .filter(|&&neighbor_id| self.unfilled_slot_ids.contains(neighbor_id))
            .filter_map(|&neighbor_id| {
                let overlap = self.structure.overlap(slot_id, neighbor_id)?;
                let mut counts: HashMap<char, usize> = HashMap::new();
                for word_id in self.domains.words(neighbor_id) {
                    *counts
                        .entry(self.vocabulary.word(word_id).glyphs[overlap.other_index])
                        .or_insert(0) += 1;
                }
                Some((overlap, counts, self.domains.len(neighbor_id)))
            })
            .collect();

        let mut options: Vec<(WordId, usize)> = self
            .domains
            .words(slot_id)
            .map(|word_id| {
                let glyphs = &self.vocabulary.word(word_id).glyphs;
                let eliminated: usize = neighbor_letter_counts
                    .iter()
                    .map(|(overlap, counts, total)| {
                        total - counts.get(&glyphs[overlap.index]).copied().unwrap_or(0)
                    })
                    .sum();
                (word_id, eliminated)
            })
            .collect();

        options.sort_by_key(|&(_, eliminated)| eliminated);

        options.into_iter().map(|(word_id, _)| word_id).collect()
    }

    /// Can `word_id` go in `slot_id` given the slots that are already filled?
    fn is_consistent(&self, slot_id: SlotId, word_id: WordId) -> bool {
        if self.used_word_ids.contains(word_id) {
            return false;
        }

        let glyphs = &self.vocabulary.word(word_id).glyphs;
        if glyphs.len() != self.structure.slot(slot_id).length {
            return false;
        }

        self.structure.neighbors(slot_id).iter().all(|&neighbor_id| {
            let Some(neighbor_word_id) = self.assigned[neighbor_id] else {
                return true;
            };
            let overlap = self
                .structure
                .overlap(slot_id, neighbor_id)
                .expect("Neighboring slots must overlap");

            glyphs[overlap.index] == self.vocabulary.word(neighbor_word_id).glyphs[overlap.other_index]
        })
    }

    fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        self.assigned[slot_id] = Some(word_id);
        self.unfilled_slot_ids.remove(slot_id);
        self.used_word_ids.insert(word_id);
        self.choices.push(Choice { slot_id, word_id });
    }

    fn unassign(&mut self, slot_id: SlotId, word_id: WordId) {
        self.assigned[slot_id] = None;
        self.unfilled_slot_ids.insert(slot_id);
        self.used_word_ids.remove(word_id);
        self.choices.pop();
    }

    /// Prune the unfilled domains to reflect the choice just made for `slot_id`. Returns false if
    /// some unfilled slot ran out of options, in which case the choice can't lead to a fill.
    fn infer(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        if self.options.inference == Inference::None {
            return true;
        }

        let structure = self.structure;
        let vocabulary = self.vocabulary;
        let mut changed_slot_ids = vec![slot_id];

        self.domains.prune(slot_id, |option| option == word_id);

        // Each word can only be used once.
        let length = structure.slot(slot_id).length;
        let unfilled: Vec<SlotId> = self.unfilled_slot_ids.iter().collect();
        for &other_slot_id in &unfilled {
            if structure.slot(other_slot_id).length != length {
                continue;
            }
            if self.domains.remove(other_slot_id, word_id) {
                if self.domains.is_empty(other_slot_id) {
                    return false;
                }
                changed_slot_ids.push(other_slot_id);
            }
        }

        for &neighbor_id in structure.neighbors(slot_id) {
            if !self.unfilled_slot_ids.contains(neighbor_id) {
                continue;
            }
            self.statistics.revisions += 1;
            if revise(structure, vocabulary, &mut self.domains, neighbor_id, slot_id) {
                if self.domains.is_empty(neighbor_id) {
                    return false;
                }
                changed_slot_ids.push(neighbor_id);
            }
        }

        if self.options.inference == Inference::MaintainArcConsistency {
            let arcs: Vec<(SlotId, SlotId)> = changed_slot_ids
                .iter()
                .flat_map(move |&changed_id| {
                    structure.neighbors(changed_id).iter().map(move |&z| (z, changed_id))
                })
                .collect();

            match establish_arc_consistency_from(
                structure,
                vocabulary,
                &mut self.domains,
                arcs,
                Some(&self.unfilled_slot_ids),
            ) {
                Ok(success) => self.statistics.revisions += success.revisions as u64,
                Err(failure) => {
                    self.statistics.revisions += 1;
                    log::trace!("Arc consistency emptied slot {}", failure.slot_id);
                    return false;
                }
            }
        }

        true
    }

    fn check_budget(&self) -> Result<(), FillFailure> {
        if let Some(max_states) = self.options.max_states {
            if self.statistics.states >= max_states {
                return Err(FillFailure::StateLimitExceeded { states: self.statistics.states });
            }
        }

        if let Some(time_limit) = self.options.time_limit {
            if self.statistics.states % INTERRUPT_FREQUENCY == 0 {
                let elapsed = self.start.elapsed();
                if elapsed >= time_limit {
                    return Err(FillFailure::TimedOut { elapsed });
                }
            }
        }

        Ok(())
    }

    /// Extend the current partial assignment to a complete one. `Ok(true)` means the assignment
    /// is complete; `Ok(false)` means every option for the selected slot failed and the caller
    /// should try its next option. The domains are always left as they were found.
    fn backtrack(&mut self) -> Result<bool, FillFailure> {
        self.check_budget()?;
        self.statistics.states += 1;

        let Some(slot_id) = self.select_unassigned_slot() else {
            return Ok(true);
        };

        for word_id in self.order_domain_values(slot_id) {
            if !self.is_consistent(slot_id, word_id) {
                continue;
            }

            log::trace!(
                "Trying {} for {:?}",
                self.vocabulary.word(word_id).string,
                self.structure.slot(slot_id)
            );

            self.assign(slot_id, word_id);
            let snapshot = self.domains.snapshot();

            let result = if self.infer(slot_id, word_id) {
                self.backtrack()
            } else {
                Ok(false)
            };

            self.domains.restore(snapshot);

            match result {
                Ok(true) => return Ok(true),
                Ok(false) => {
                    log::trace!("Backtracking from {:?}", self.structure.slot(slot_id));
                    self.unassign(slot_id, word_id);
                    self.statistics.backtracks += 1;
                }
                Err(failure) => {
                    self.unassign(slot_id, word_id);
                    return Err(failure);
                }
            }
        }

        Ok(false)
    }

    fn build_assignment(&self) -> Assignment {
        let mut assignment = Assignment::default();

        for (slot_id, word_id) in self.assigned.iter().enumerate() {
            if let Some(word_id) = word_id {
                assignment.insert(
                    *self.structure.slot(slot_id),
                    self.vocabulary.word(*word_id).string.clone(),
                );
            }
        }

        assignment
    }
}

/// Search for a valid fill for the given structure and vocabulary.
pub fn find_fill(
    structure: &Structure,
    vocabulary: &Vocabulary,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let mut statistics = Statistics::default();

    log::info!(
        "Filling {} slots from {} words ({:?})",
        structure.slot_count(),
        vocabulary.len(),
        options.inference,
    );

    let mut domains = Domains::new(structure, vocabulary);

    if let Some(slot_id) = (0..structure.slot_count()).find(|&slot_id| domains.is_empty(slot_id)) {
        log::info!("No words fit {:?}", structure.slot(slot_id));
        return Err(FillFailure::Unsatisfiable);
    }

    let arc_consistency_start = Instant::now();
    let initial_result = establish_arc_consistency(structure, vocabulary, &mut domains);
    statistics.initial_arc_consistency_time = arc_consistency_start.elapsed();

    match initial_result {
        Ok(success) => statistics.revisions += success.revisions as u64,
        Err(_) => {
            log::info!("No solution: arc consistency emptied a domain before searching");
            return Err(FillFailure::Unsatisfiable);
        }
    }

    let mut search = Search::new(structure, vocabulary, options, domains, statistics, start);
    let outcome = search.backtrack();
    search.statistics.duration = start.elapsed();

    match outcome {
        Ok(true) => {
            let assignment = search.build_assignment();

            if CHECK_INVARIANTS && !assignment.is_valid_for(structure) {
                panic!("Search produced an invalid fill: {:?}", assignment);
            }

            log::info!("Found a fill: {:?}", search.statistics);

            Ok(FillSuccess {
                assignment,
                choices: search.choices,
                statistics: search.statistics,
            })
        }
        Ok(false) => {
            log::info!("No solution: {:?}", search.statistics);
            Err(FillFailure::Unsatisfiable)
        }
        Err(failure) => {
            log::info!("{}: {:?}", failure, search.statistics);
            Err(failure)
        }
    }
}

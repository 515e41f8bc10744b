//! This module implements the consistency side of filling: single-arc revision and AC-3
//! propagation over the crossings of a grid. Node consistency (the length constraint) is already
//! established by `Domains::new`, so everything here deals with binary constraints only.

use bit_set::BitSet;
use std::collections::{HashSet, VecDeque};

use crate::domains::Domains;
use crate::structure::{SlotId, Structure};
use crate::word_list::Vocabulary;

/// An ordered pair of crossing slots (x, y); revising it makes x consistent with y.
pub type Arc = (SlotId, SlotId);

/// Results from a successful propagation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many times `revise` was called.
    pub revisions: usize,
    /// How many options were removed across all slots.
    pub eliminations: usize,
}

/// Propagation emptied the domain of `slot_id`, so the grid can't be filled from this state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make `x` arc consistent with `y`: remove every option for `x` whose letter at the shared cell
/// doesn't appear at that cell in any of `y`'s options. Slots that don't cross are trivially
/// consistent. Returns whether `x`'s domain changed.
pub fn revise(
    structure: &Structure,
    vocabulary: &Vocabulary,
    domains: &mut Domains,
    x: SlotId,
    y: SlotId,
) -> bool {
    let Some(overlap) = structure.overlap(x, y) else {
        return false;
    };

    // Every letter that some option for `y` places in the shared cell.
    let supported: HashSet<char> = domains
        .words(y)
        .map(|word_id| vocabulary.word(word_id).glyphs[overlap.other_index])
        .collect();

    domains.prune(x, |word_id| {
        supported.contains(&vocabulary.word(word_id).glyphs[overlap.index])
    })
}

/// Data structure used by AC-3 to track which arcs we still need to revise. An arc that is
/// already waiting in the queue is not added a second time.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<Arc>,
    queued: BitSet,
    slot_count: usize,
}

impl ArcQueue {
    fn new(slot_count: usize) -> ArcQueue {
        ArcQueue {
            queue: VecDeque::new(),
            queued: BitSet::with_capacity(slot_count * slot_count),
            slot_count,
        }
    }

    fn enqueue(&mut self, (x, y): Arc) {
        if self.queued.insert(x * self.slot_count + y) {
            self.queue.push_back((x, y));
        }
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let (x, y) = self.queue.pop_front()?;
        self.queued.remove(x * self.slot_count + y);
        Some((x, y))
    }
}

/// Every ordered pair of crossing slots in the grid.
pub fn all_arcs(structure: &Structure) -> Vec<Arc> {
    (0..structure.slot_count())
        .flat_map(move |x| structure.neighbors(x).iter().map(move |&y| (x, y)))
        .collect()
}

/// Run AC-3 over the whole grid until no domain changes or some domain becomes empty.
pub fn establish_arc_consistency(
    structure: &Structure,
    vocabulary: &Vocabulary,
    domains: &mut Domains,
) -> ArcConsistencyResult {
    let before: usize = domains.sizes().iter().sum();

    let result =
        establish_arc_consistency_from(structure, vocabulary, domains, all_arcs(structure), None);

    match &result {
        Ok(success) => log::debug!(
            "Arc consistency reached after {} revisions; {} of {} options remain",
            success.revisions,
            before - success.eliminations,
            before,
        ),
        Err(failure) => log::debug!(
            "Arc consistency emptied the domain of {:?}",
            structure.slot(failure.slot_id)
        ),
    }

    result
}

/// AC-3 seeded with a specific set of arcs, for when only part of the grid has changed.
///
/// If `unfilled_slot_ids` is given, arcs are only ever added for slots in that set; slots outside
/// it are treated as fixed and are never revised, though they still constrain their neighbors.
pub fn establish_arc_consistency_from<I>(
    structure: &Structure,
    vocabulary: &Vocabulary,
    domains: &mut Domains,
    arcs: I,
    unfilled_slot_ids: Option<&BitSet>,
) -> ArcConsistencyResult
where
    I: IntoIterator<Item = Arc>,
{
    let is_unfilled =
        |slot_id: SlotId| unfilled_slot_ids.map_or(true, |unfilled| unfilled.contains(slot_id));

    let mut queue = ArcQueue::new(structure.slot_count());
    for (x, y) in arcs {
        if is_unfilled(x) {
            queue.enqueue((x, y));
        }
    }

    let mut success = ArcConsistencySuccess::default();

    while let Some((x, y)) = queue.pop_front() {
        let before = domains.len(x);
        success.revisions += 1;

        if !revise(structure, vocabulary, domains, x, y) {
            continue;
        }
        success.eliminations += before - domains.len(x);

        if domains.is_empty(x) {
            return Err(ArcConsistencyFailure { slot_id: x });
        }

        // `x` lost options, so anything that was consistent with it may not be anymore.
        for &z in structure.neighbors(x) {
            if z != y && is_unfilled(z) {
                queue.enqueue((z, x));
            }
        }
    }

    Ok(success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word_list::WordId;

    fn cross_structure() -> Structure {
        Structure::from_template(
            "
            ___
            #_#
            #_#
            ",
        )
        .unwrap()
    }

    fn strings(vocabulary: &Vocabulary, domains: &Domains, slot_id: SlotId) -> Vec<String> {
        domains
            .words(slot_id)
            .map(|word_id| vocabulary.word(word_id).string.clone())
            .collect()
    }

    fn all_words(domains: &Domains) -> Vec<Vec<WordId>> {
        (0..domains.slot_count()).map(|slot_id| domains.words(slot_id).collect()).collect()
    }

    #[test]
    fn test_revise_removes_unsupported_words() {
        let structure = cross_structure();
        let vocabulary = Vocabulary::new(["AGE", "RAT", "TEA"]);
        let mut domains = Domains::new(&structure, &vocabulary);

        // Across middle letters are G, A, E; down first letters are A, R, T.
        assert!(revise(&structure, &vocabulary, &mut domains, 0, 1));
        assert_eq!(strings(&vocabulary, &domains, 0), vec!["RAT"]);
        assert!(!revise(&structure, &vocabulary, &mut domains, 0, 1));

        assert!(revise(&structure, &vocabulary, &mut domains, 1, 0));
        assert_eq!(strings(&vocabulary, &domains, 1), vec!["AGE"]);
    }

    #[test]
    fn test_revise_without_overlap_is_noop() {
        let structure = Structure::from_template(
            "
            ___
            ###
            ___
            ",
        )
        .unwrap();
        let vocabulary = Vocabulary::new(["AGE", "SKY"]);
        let mut domains = Domains::new(&structure, &vocabulary);

        assert!(!revise(&structure, &vocabulary, &mut domains, 0, 1));
        assert_eq!(domains.sizes(), vec![2, 2]);
    }

    #[test]
    fn test_revise_is_sound() {
        let structure = Structure::from_template(
            "
            ____
            _##_
            ____
            ",
        )
        .unwrap();
        let vocabulary =
            Vocabulary::new(["BATS", "CART", "BOA", "SEA", "TOE", "SLOT", "ACE", "TEN"]);
        let mut domains = Domains::new(&structure, &vocabulary);

        for (x, y) in all_arcs(&structure) {
            revise(&structure, &vocabulary, &mut domains, x, y);

            let overlap = structure.overlap(x, y).unwrap();
            for word_x in domains.words(x) {
                let letter = vocabulary.word(word_x).glyphs[overlap.index];
                assert!(domains.words(y).any(|word_y| {
                    vocabulary.word(word_y).glyphs[overlap.other_index] == letter
                }));
            }
        }
    }

    #[test]
    fn test_ac3_shrinks_monotonically_and_is_idempotent() {
        let structure = Structure::from_template(
            "
            ____
            _##_
            ____
            ",
        )
        .unwrap();
        let vocabulary = Vocabulary::new([
            "BATS", "CART", "SLOT", "TOTE", "BOA", "SEA", "TOE", "ACE", "TEN", "CAT",
        ]);
        let mut domains = Domains::new(&structure, &vocabulary);
        let before = domains.sizes();

        establish_arc_consistency(&structure, &vocabulary, &mut domains).unwrap();
        let once = all_words(&domains);
        for (slot_id, &size) in before.iter().enumerate() {
            assert!(domains.len(slot_id) <= size);
        }

        let second = establish_arc_consistency(&structure, &vocabulary, &mut domains).unwrap();
        assert_eq!(second.eliminations, 0);
        assert_eq!(all_words(&domains), once);
    }

    #[test]
    fn test_ac3_reaches_fixed_point() {
        let structure = cross_structure();
        let vocabulary = Vocabulary::new(["AGE", "RAT", "TEA"]);
        let mut domains = Domains::new(&structure, &vocabulary);

        let success = establish_arc_consistency(&structure, &vocabulary, &mut domains).unwrap();

        assert_eq!(strings(&vocabulary, &domains, 0), vec!["RAT"]);
        assert_eq!(strings(&vocabulary, &domains, 1), vec!["AGE"]);
        assert_eq!(success.eliminations, 4);
    }

    #[test]
    fn test_ac3_fails_on_empty_domain() {
        let structure = cross_structure();
        let vocabulary = Vocabulary::new(["AGE", "SKY"]);
        let mut domains = Domains::new(&structure, &vocabulary);

        let failure = establish_arc_consistency(&structure, &vocabulary, &mut domains).unwrap_err();

        assert_eq!(failure, ArcConsistencyFailure { slot_id: 0 });
    }

    #[test]
    fn test_seeded_ac3_skips_filled_slots() {
        let structure = cross_structure();
        let vocabulary = Vocabulary::new(["AGE", "RAT", "TEA"]);
        let mut domains = Domains::new(&structure, &vocabulary);

        // Pretend slot 0 is filled with TEA; only slot 1 may be revised.
        domains.prune(0, |word_id| word_id == 2);
        let unfilled = BitSet::from_iter([1]);

        let success = establish_arc_consistency_from(
            &structure,
            &vocabulary,
            &mut domains,
            all_arcs(&structure),
            Some(&unfilled),
        );

        // Nothing down starts with E, so slot 1 empties.
        assert_eq!(success, Err(ArcConsistencyFailure { slot_id: 1 }));
        assert_eq!(strings(&vocabulary, &domains, 0), vec!["TEA"]);
    }
}

//! Crossword filling as constraint satisfaction.
//!
//! A [`Structure`] describes the grid and the slots in it; a [`Vocabulary`] holds the words that
//! may go in those slots. [`find_fill`] narrows every slot's domain with AC-3 and then runs a
//! backtracking search to pick one distinct word per slot so that crossing slots agree on their
//! shared letters.

pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod errors;
pub mod logging;
pub mod render;
pub mod structure;
pub mod word_list;

pub use backtracking_search::{
    find_fill, Assignment, Choice, FillFailure, FillOptions, FillSuccess, Inference, Statistics,
};
pub use errors::FillError;
pub use render::render_grid;
pub use structure::{load_structure, Direction, Overlap, Slot, SlotId, Structure};
pub use word_list::{load_word_list, Vocabulary, WordId};

/// The expected maximum length for a single slot. Longer slots still work; their per-cell data
/// just spills onto the heap.
pub const MAX_SLOT_LENGTH: usize = 21;

/// Should we run extra (slow) checks of internal invariants while filling?
pub const CHECK_INVARIANTS: bool = cfg!(debug_assertions);

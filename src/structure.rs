//! The static shape of a puzzle: which cells are open, which slots they form, and how those slots
//! cross. Everything here is computed once at construction time and only read afterwards.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use crate::errors::FillError;
use crate::{CHECK_INVARIANTS, MAX_SLOT_LENGTH};

/// An identifier for a given slot, based on its index in the Structure's `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed (row, column) coords for a cell in the grid, where row = 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A maximal run of open cells in one direction; the unit that gets filled with one word. The
/// derived ordering (row, then column, then direction, then length) is the grid-position order
/// used for slot ids and for breaking ties between otherwise equivalent slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub row: usize,
    pub column: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Slot {
    pub fn new(row: usize, column: usize, direction: Direction, length: usize) -> Slot {
        Slot { row, column, direction, length }
    }

    /// The coords of the cell at `cell_idx` within this slot.
    pub fn cell(&self, cell_idx: usize) -> GridCoord {
        match self.direction {
            Direction::Across => (self.row, self.column + cell_idx),
            Direction::Down => (self.row + cell_idx, self.column),
        }
    }

    /// Generate the coords for each cell of this slot.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| self.cell(cell_idx))
    }
}

/// The shared cell between two crossing slots, as an index into each of them: the first slot's
/// letter at `index` must equal the second slot's letter at `other_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub index: usize,
    pub other_index: usize,
}

impl Overlap {
    /// The same overlap seen from the other slot.
    pub fn swapped(self) -> Overlap {
        Overlap {
            index: self.other_index,
            other_index: self.index,
        }
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot that never change.
pub struct SlotConfig {
    pub id: SlotId,
    pub slot: Slot,
    /// Indexed by cell; `Some` where another slot crosses this one.
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
    /// Ids of every crossing slot, ascending.
    pub neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]>,
}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("neighbors", &self.neighbors)
            .finish()
    }
}

/// An immutable description of a puzzle grid and the slots derived from it.
pub struct Structure {
    width: usize,
    height: usize,
    cells: Vec<Vec<bool>>,
    slot_configs: Vec<SlotConfig>,
    ids_by_slot: HashMap<Slot, SlotId>,
}

impl Debug for Structure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Structure")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .finish()
    }
}

/// Find every maximal run of open cells (of length at least 2) along one direction.
fn find_runs(cells: &[Vec<bool>], width: usize, direction: Direction) -> Vec<Slot> {
    let height = cells.len();
    let (outer, inner) = match direction {
        Direction::Across => (height, width),
        Direction::Down => (width, height),
    };
    let is_open = |line: usize, pos: usize| match direction {
        Direction::Across => cells[line][pos],
        Direction::Down => cells[pos][line],
    };

    let mut result = vec![];

    for line in 0..outer {
        let mut pos = 0;
        while pos < inner {
            if !is_open(line, pos) {
                pos += 1;
                continue;
            }

            let start = pos;
            while pos < inner && is_open(line, pos) {
                pos += 1;
            }

            let length = pos - start;
            if length > 1 {
                result.push(match direction {
                    Direction::Across => Slot::new(line, start, direction, length),
                    Direction::Down => Slot::new(start, line, direction, length),
                });
            }
        }
    }

    result
}

impl Structure {
    /// Build a structure from a matrix of cells, where `true` means open and `false` means
    /// blocked. Every row must have the same length.
    pub fn new(cells: Vec<Vec<bool>>) -> Result<Structure, FillError> {
        let height = cells.len();
        let width = cells.first().map(|row| row.len()).unwrap_or(0);

        if let Some((row, found)) = cells
            .iter()
            .map(|cells_in_row| cells_in_row.len())
            .enumerate()
            .find(|&(_, len)| len != width)
        {
            return Err(FillError::MalformedGrid { row, expected: width, found });
        }

        let mut slots = find_runs(&cells, width, Direction::Across);
        slots.extend(find_runs(&cells, width, Direction::Down));
        slots.sort();

        // Build a map from cell location to the slots passing through it, which we can then use to
        // calculate crossings.
        let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> = HashMap::new();
        for (slot_id, slot) in slots.iter().enumerate() {
            for (cell_idx, loc) in slot.cells().enumerate() {
                entries_by_loc.entry(loc).or_default().push((slot_id, cell_idx));
            }
        }

        let slot_configs: Vec<SlotConfig> = slots
            .iter()
            .enumerate()
            .map(|(slot_id, &slot)| {
                let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = slot
                    .cells()
                    .map(|loc| {
                        let mut others =
                            entries_by_loc[&loc].iter().filter(|&&(id, _)| id != slot_id);
                        let crossing = others.next().map(|&(other_slot_id, other_slot_cell)| {
                            Crossing { other_slot_id, other_slot_cell }
                        });

                        if CHECK_INVARIANTS && others.next().is_some() {
                            panic!("More than two slots crossing in cell {:?}?", loc);
                        }

                        crossing
                    })
                    .collect();

                let mut neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]> = crossings
                    .iter()
                    .flatten()
                    .map(|crossing| crossing.other_slot_id)
                    .collect();
                neighbors.sort_unstable();
                neighbors.dedup();

                SlotConfig { id: slot_id, slot, crossings, neighbors }
            })
            .collect();

        let ids_by_slot = slots.iter().enumerate().map(|(id, &slot)| (slot, id)).collect();

        let structure = Structure { width, height, cells, slot_configs, ids_by_slot };
        log::debug!(
            "Built {}x{} structure with {} slots and {} crossings",
            structure.width,
            structure.height,
            structure.slot_count(),
            structure.crossing_count(),
        );

        Ok(structure)
    }

    /// Parse a structure from a string template, with `_` or `.` representing open cells and `#`
    /// (or `█`) representing blocks. Blank lines and surrounding whitespace are ignored.
    pub fn from_template(template: &str) -> Result<Structure, FillError> {
        let cells = template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(row, line)| {
                line.chars()
                    .enumerate()
                    .map(|(column, cell)| match cell {
                        '_' | '.' => Ok(true),
                        '#' | '█' => Ok(false),
                        _ => Err(FillError::InvalidCell { row, column, cell }),
                    })
                    .collect::<Result<Vec<bool>, FillError>>()
            })
            .collect::<Result<Vec<Vec<bool>>, FillError>>()?;

        Structure::new(cells)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Is the cell at (row, column) open? Cells outside the grid count as blocked.
    pub fn is_open(&self, row: usize, column: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|cells_in_row| cells_in_row.get(column))
            .copied()
            .unwrap_or(false)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    /// All slots, in slot id order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slot_configs.iter().map(|slot_config| &slot_config.slot)
    }

    pub fn slot(&self, slot_id: SlotId) -> &Slot {
        &self.slot_configs[slot_id].slot
    }

    pub fn slot_config(&self, slot_id: SlotId) -> &SlotConfig {
        &self.slot_configs[slot_id]
    }

    pub fn slot_id(&self, slot: &Slot) -> Option<SlotId> {
        self.ids_by_slot.get(slot).copied()
    }

    /// Ids of the slots crossing `slot_id`, ascending.
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.slot_configs[slot_id].neighbors
    }

    /// Number of slots crossing `slot_id`.
    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.slot_configs[slot_id].neighbors.len()
    }

    /// The overlap between two slots, or `None` if they share no cell (or are the same slot).
    pub fn overlap(&self, slot_id: SlotId, other_slot_id: SlotId) -> Option<Overlap> {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(index, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == other_slot_id => Some(Overlap {
                    index,
                    other_index: crossing.other_slot_cell,
                }),
                _ => None,
            })
    }

    /// Number of crossing cells in the grid, i.e. unordered neighbor pairs.
    pub fn crossing_count(&self) -> usize {
        self.slot_configs.iter().map(|slot_config| slot_config.neighbors.len()).sum::<usize>() / 2
    }
}

/// Read and parse a structure file.
pub fn load_structure<P: AsRef<Path>>(path: P) -> Result<Structure, FillError> {
    let path = path.as_ref();
    let template = fs::read_to_string(path).map_err(|source| FillError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Structure::from_template(&template)
}

//! The puzzle model: slots, crossings, and the interned word list.
//!
//! Everything in here is built once before solving and is read-only for the
//! whole solve. Words are interned into glyph-id vectors up front so that
//! the constraint code never compares strings.

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};

use smallvec::{smallvec, SmallVec};
use thiserror::Error;

use crate::{GlyphId, GridCoord, SlotId, MAX_GLYPH_COUNT, MAX_SLOT_COUNT, MAX_SLOT_LENGTH};

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Across,
    Down,
}

/// A word that can be chosen for a slot of the matching length.
#[derive(Debug, Clone)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// A crossing between one slot and another, referencing the other slot's id
/// and the location of the shared cell within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// The static aspects of a single slot in the grid. `crossings` has one entry
/// per cell; `None` means no other slot shares that cell.
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        let (x, y) = self.start_cell;
        (0..self.length).map(move |cell_idx| match self.direction {
            Direction::Across => (x + cell_idx, y),
            Direction::Down => (x, y + cell_idx),
        })
    }
}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("start_cell", &self.start_cell)
            .field("direction", &self.direction)
            .field("length", &self.length)
            .field("crossings", &self.crossings)
            .finish()
    }
}

/// An across or down entry in the input to [`GridConfig::from_entries`].
#[derive(Debug, Clone, Copy)]
pub struct GridEntry {
    pub loc: GridCoord,
    pub len: usize,
    pub dir: Direction,
}

impl GridEntry {
    fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.len)
            .map(|cell_idx| match self.dir {
                Direction::Across => (self.loc.0 + cell_idx, self.loc.1),
                Direction::Down => (self.loc.0, self.loc.1 + cell_idx),
            })
            .collect()
    }
}

/// Errors produced while building a [`GridConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("word list contains no words")]
    EmptyWordList,
    #[error("grid contains no slots")]
    NoSlots,
    #[error("more than two slots share the cell at ({0}, {1})")]
    CrossingConflict(usize, usize),
    #[error("template lines are not all the same length")]
    RaggedTemplate,
    #[error("unexpected character {0:?} in template")]
    UnknownTemplateChar(char),
}

/// The static aspects of a grid: the glyph table, the interned word list,
/// and the slot configurations with their precomputed crossings.
pub struct GridConfig {
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,
    pub words: Vec<Word>,
    pub slot_configs: SmallVec<[SlotConfig; MAX_SLOT_COUNT]>,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("glyphs", &self.glyphs)
            .field("slot_configs", &self.slot_configs)
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl GridConfig {
    /// Build a grid from explicit slot entries and a word list. Words are
    /// lowercased and deduplicated; their order otherwise follows the input,
    /// which keeps word ids deterministic.
    pub fn from_entries(word_list: &[String], entries: &[GridEntry]) -> Result<GridConfig, GridError> {
        if entries.is_empty() {
            return Err(GridError::NoSlots);
        }

        // Record every distinct character we see, in first-appearance order.
        let mut glyphs: SmallVec<[char; MAX_GLYPH_COUNT]> = smallvec![];
        let mut glyph_ids_by_char: HashMap<char, GlyphId> = HashMap::new();
        let mut words: Vec<Word> = Vec::with_capacity(word_list.len());
        let mut seen_words: HashSet<String> = HashSet::with_capacity(word_list.len());

        for raw in word_list {
            let lowered = raw.to_lowercase();
            if lowered.is_empty() || !seen_words.insert(lowered.clone()) {
                continue;
            }

            let glyph_vec: SmallVec<[GlyphId; MAX_SLOT_LENGTH]> = lowered
                .chars()
                .map(|c| {
                    *glyph_ids_by_char.entry(c).or_insert_with(|| {
                        glyphs.push(c);
                        glyphs.len() - 1
                    })
                })
                .collect();

            words.push(Word { string: lowered, glyphs: glyph_vec });
        }

        if words.is_empty() {
            return Err(GridError::EmptyWordList);
        }

        // Build a map from cell location to (entry index, cell index within
        // entry), which we can then use to calculate crossings.
        let mut cell_by_loc: HashMap<GridCoord, Vec<(usize, usize)>> = HashMap::new();
        for (entry_idx, entry) in entries.iter().enumerate() {
            for (cell_idx, loc) in entry.cell_coords().into_iter().enumerate() {
                cell_by_loc.entry(loc).or_default().push((entry_idx, cell_idx));
            }
        }

        let mut slot_configs: SmallVec<[SlotConfig; MAX_SLOT_COUNT]> = smallvec![];
        for (entry_idx, entry) in entries.iter().enumerate() {
            let mut crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = smallvec![];

            for loc in entry.cell_coords() {
                let others: Vec<_> = cell_by_loc[&loc]
                    .iter()
                    .filter(|&&(e, _)| e != entry_idx)
                    .collect();

                crossings.push(match others[..] {
                    [] => None,
                    [&(other_slot_id, other_slot_cell)] => {
                        Some(Crossing { other_slot_id, other_slot_cell })
                    }
                    _ => return Err(GridError::CrossingConflict(loc.0, loc.1)),
                });
            }

            slot_configs.push(SlotConfig {
                id: entry_idx,
                start_cell: entry.loc,
                direction: entry.dir,
                length: entry.len,
                crossings,
            });
        }

        Ok(GridConfig { glyphs, words, slot_configs })
    }

    /// Build a grid from a string template, with `.` representing open cells
    /// and `#` representing blocks. Slots are maximal runs of at least two
    /// open cells, in both orientations.
    pub fn from_template(word_list: &[String], template: &str) -> Result<GridConfig, GridError> {
        let rows: Vec<Vec<char>> = template
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() {
                    None
                } else {
                    Some(line.chars().collect())
                }
            })
            .collect();

        if rows.is_empty() {
            return Err(GridError::NoSlots);
        }
        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(GridError::RaggedTemplate);
        }
        if let Some(&c) = rows.iter().flatten().find(|&&c| c != '.' && c != '#') {
            return Err(GridError::UnknownTemplateChar(c));
        }

        fn runs_in_line(cells: impl Iterator<Item = (usize, char)>) -> Vec<(usize, usize)> {
            let mut runs: Vec<(usize, usize)> = vec![];
            let mut current: Option<(usize, usize)> = None;

            for (idx, cell) in cells {
                if cell == '#' {
                    if let Some(run) = current.take() {
                        if run.1 > 1 {
                            runs.push(run);
                        }
                    }
                } else {
                    current = Some(current.map_or((idx, 1), |(start, len)| (start, len + 1)));
                }
            }
            if let Some(run) = current {
                if run.1 > 1 {
                    runs.push(run);
                }
            }

            runs
        }

        let mut entries: Vec<GridEntry> = vec![];
        for (y, row) in rows.iter().enumerate() {
            for (start, len) in runs_in_line(row.iter().copied().enumerate()) {
                entries.push(GridEntry { loc: (start, y), len, dir: Direction::Across });
            }
        }
        for x in 0..width {
            let column = rows.iter().map(|row| row[x]).enumerate();
            for (start, len) in runs_in_line(column) {
                entries.push(GridEntry { loc: (x, start), len, dir: Direction::Down });
            }
        }

        Self::from_entries(word_list, &entries)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// The distinct slots sharing at least one cell with the given slot.
    pub fn neighbors(&self, slot_id: SlotId) -> SmallVec<[SlotId; MAX_SLOT_LENGTH]> {
        let mut result: SmallVec<[SlotId; MAX_SLOT_LENGTH]> = smallvec![];
        for crossing in self.slot_configs[slot_id].crossings.iter().flatten() {
            if !result.contains(&crossing.other_slot_id) {
                result.push(crossing.other_slot_id);
            }
        }
        result
    }

    /// How many distinct slots cross the given slot.
    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.neighbors(slot_id).len()
    }

    /// If slots `x` and `y` share a cell, the character index of that cell
    /// within each slot's word, as `(index_in_x, index_in_y)`.
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<(usize, usize)> {
        self.slot_configs[x]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(c) if c.other_slot_id == y => Some((cell_idx, c.other_slot_cell)),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_list(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_template_slots_and_crossings() {
        let grid = GridConfig::from_template(
            &word_list(&["cat", "car", "can", "dog"]),
            "
            ...
            .#.
            ...
            ",
        )
        .unwrap();

        // Two across runs (rows 0 and 2), two down runs (cols 0 and 2).
        assert_eq!(grid.slot_count(), 4);
        assert!(grid.slot_configs.iter().all(|s| s.length == 3));

        let across: Vec<_> = grid
            .slot_configs
            .iter()
            .filter(|s| s.direction == Direction::Across)
            .collect();
        assert_eq!(across.len(), 2);

        // Row 0 crosses both downs, at its first and last cell.
        let top = &grid.slot_configs[0];
        assert_eq!(top.start_cell, (0, 0));
        assert!(top.crossings[0].is_some());
        assert!(top.crossings[1].is_none());
        assert!(top.crossings[2].is_some());
        assert_eq!(grid.degree(top.id), 2);
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let grid = GridConfig::from_template(
            &word_list(&["cat"]),
            "
            ...
            ..#
            ..#
            ",
        )
        .unwrap();

        for x in 0..grid.slot_count() {
            for y in 0..grid.slot_count() {
                match grid.overlap(x, y) {
                    Some((i, j)) => assert_eq!(grid.overlap(y, x), Some((j, i))),
                    None => assert_eq!(grid.overlap(y, x), None),
                }
            }
        }
    }

    #[test]
    fn test_words_are_lowercased_and_deduplicated() {
        let grid = GridConfig::from_entries(
            &word_list(&["Cat", "cat", "DOG"]),
            &[GridEntry { loc: (0, 0), len: 3, dir: Direction::Across }],
        )
        .unwrap();

        assert_eq!(grid.word_count(), 2);
        assert_eq!(grid.words[0].string, "cat");
        assert_eq!(grid.words[1].string, "dog");
    }

    #[test]
    fn test_empty_word_list_is_rejected() {
        let result = GridConfig::from_entries(
            &[],
            &[GridEntry { loc: (0, 0), len: 3, dir: Direction::Across }],
        );
        assert_eq!(result.err(), Some(GridError::EmptyWordList));
    }

    #[test]
    fn test_blocked_template_is_rejected() {
        let result = GridConfig::from_template(&word_list(&["cat"]), "##\n##");
        assert_eq!(result.err(), Some(GridError::NoSlots));
    }

    #[test]
    fn test_ragged_template_is_rejected() {
        let result = GridConfig::from_template(&word_list(&["cat"]), "...\n..");
        assert_eq!(result.err(), Some(GridError::RaggedTemplate));
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        assert_eq!(
            GridError::CrossingConflict(2, 5).to_string(),
            "more than two slots share the cell at (2, 5)"
        );
        assert_eq!(GridError::UnknownTemplateChar('x').to_string(), "unexpected character 'x' in template");
    }

    #[test]
    fn test_three_slots_in_one_cell_is_rejected() {
        let result = GridConfig::from_entries(
            &word_list(&["cat"]),
            &[
                GridEntry { loc: (0, 0), len: 2, dir: Direction::Across },
                GridEntry { loc: (0, 0), len: 2, dir: Direction::Down },
                GridEntry { loc: (0, 0), len: 3, dir: Direction::Across },
            ],
        );
        assert_eq!(result.err(), Some(GridError::CrossingConflict(0, 0)));
    }
}

//! Crossword filling as constraint satisfaction.
//!
//! A grid is a set of fixed-length slots, some of which cross each other in
//! shared cells. Filling the grid means choosing one word per slot such that
//! every word has the right length, no word is used twice, and crossing slots
//! agree on the letter in their shared cell.
//!
//! The solve pipeline is: seed each slot's domain with the whole word list,
//! strip wrong-length words (node consistency), propagate crossing
//! constraints until a fixpoint (AC-3), then run depth-first backtracking
//! search with minimum-remaining-values slot selection and
//! least-constraining-value word ordering.

pub mod grid;
pub mod render;
pub mod solve;

pub use grid::{Crossing, Direction, GridConfig, GridEntry, GridError, SlotConfig, Word};
pub use render::render_grid;
pub use solve::{
    consistent, enforce_arc_consistency, enforce_arc_consistency_with, enforce_node_consistency,
    order_domain_values, select_unassigned_slot, solve, Assignment, Domains, SolveFailure,
    SolveOptions, SolveSuccess, Statistics,
};

/// The expected maximum number of distinct characters appearing in a word list.
pub const MAX_GLYPH_COUNT: usize = 256;

/// The expected maximum number of slots appearing in a grid.
pub const MAX_SLOT_COUNT: usize = 256;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// An identifier for a given letter, based on its index in the grid's `glyphs` field.
pub type GlyphId = usize;

/// An identifier for a given slot, based on its index in the grid's `slot_configs` field.
pub type SlotId = usize;

/// An identifier for a given word, based on its index in the grid's `words` field.
pub type WordId = usize;

/// Zero-indexed x and y coords for a cell in the grid, where y = 0 in the top row.
pub type GridCoord = (usize, usize);

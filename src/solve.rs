//! The constraint-satisfaction core: domain store, node consistency, AC-3,
//! the consistency checker, ordering heuristics, and backtracking search.

use std::collections::{HashSet, VecDeque};

use bit_set::BitSet;
use instant::{Duration, Instant};
use log::{debug, info};
use smallvec::SmallVec;

use crate::grid::GridConfig;
use crate::{SlotId, WordId, MAX_GLYPH_COUNT};

/// Count of live words placing each glyph at each cell of a slot. Kept in
/// sync with the domain so that support checks during propagation and value
/// ordering are O(1) per word instead of a scan of the crossing domain.
type GlyphCountsByCell = Vec<SmallVec<[u32; MAX_GLYPH_COUNT]>>;

/// The mutable per-slot candidate sets. Words are only ever removed during
/// filtering; the search reads the store and never grows it back.
#[derive(Debug, Clone)]
pub struct Domains {
    live: Vec<BitSet>,
    glyph_counts_by_cell: Vec<GlyphCountsByCell>,
    remaining: Vec<usize>,
}

impl Domains {
    /// Seed every slot's domain with the entire word list. Wrong-length words
    /// are present until [`enforce_node_consistency`] strips them; the glyph
    /// counts only ever track words of the slot's own length, since no other
    /// word can support or survive anything.
    pub fn new(grid: &GridConfig) -> Domains {
        let word_count = grid.word_count();
        let all_words: BitSet = (0..word_count).collect();

        let glyph_counts_by_cell = grid
            .slot_configs
            .iter()
            .map(|slot_config| {
                let mut counts: GlyphCountsByCell = (0..slot_config.length)
                    .map(|_| (0..grid.glyphs.len()).map(|_| 0).collect())
                    .collect();

                for word in &grid.words {
                    if word.len() == slot_config.length {
                        for (cell_idx, &glyph) in word.glyphs.iter().enumerate() {
                            counts[cell_idx][glyph] += 1;
                        }
                    }
                }

                counts
            })
            .collect();

        Domains {
            live: (0..grid.slot_count()).map(|_| all_words.clone()).collect(),
            glyph_counts_by_cell,
            remaining: vec![word_count; grid.slot_count()],
        }
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.live[slot_id].contains(word_id)
    }

    pub fn remaining(&self, slot_id: SlotId) -> usize {
        self.remaining[slot_id]
    }

    pub fn iter_live(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        self.live[slot_id].iter()
    }

    /// How many live words for `slot_id` place `glyph` at `cell_idx`.
    pub fn glyph_count(&self, slot_id: SlotId, cell_idx: usize, glyph: usize) -> u32 {
        self.glyph_counts_by_cell[slot_id][cell_idx][glyph]
    }

    /// Remove a word from a slot's domain. Returns whether it was present.
    pub fn remove(&mut self, grid: &GridConfig, slot_id: SlotId, word_id: WordId) -> bool {
        if !self.live[slot_id].remove(word_id) {
            return false;
        }
        self.remaining[slot_id] -= 1;

        let word = &grid.words[word_id];
        if word.len() == grid.slot_configs[slot_id].length {
            for (cell_idx, &glyph) in word.glyphs.iter().enumerate() {
                self.glyph_counts_by_cell[slot_id][cell_idx][glyph] -= 1;
            }
        }

        true
    }

    /// Narrow a slot's domain to a single word, for propagating the effects
    /// of a tentative assignment through a branch-local copy of the store.
    pub fn restrict_to(&mut self, grid: &GridConfig, slot_id: SlotId, word_id: WordId) {
        let doomed: Vec<WordId> = self.iter_live(slot_id).filter(|&w| w != word_id).collect();
        for w in doomed {
            self.remove(grid, slot_id, w);
        }
    }
}

/// Remove from every slot's domain the words whose length doesn't match the
/// slot. Runs once, before any propagation; afterward a domain may be empty,
/// which makes the puzzle trivially unsolvable.
pub fn enforce_node_consistency(grid: &GridConfig, domains: &mut Domains) {
    for slot_config in &grid.slot_configs {
        let doomed: Vec<WordId> = domains
            .iter_live(slot_config.id)
            .filter(|&word_id| grid.words[word_id].len() != slot_config.length)
            .collect();

        for word_id in doomed {
            domains.remove(grid, slot_config.id, word_id);
        }
    }
}

/// Make the whole grid arc-consistent: every live word is compatible with at
/// least one live word in each crossing slot. Returns `false` if any domain
/// empties, which proves the puzzle unsolvable.
pub fn enforce_arc_consistency(grid: &GridConfig, domains: &mut Domains) -> bool {
    let arcs = (0..grid.slot_count())
        .flat_map(|x| (0..grid.slot_count()).map(move |y| (x, y)))
        .filter(|&(x, y)| x != y);

    enforce_arc_consistency_with(grid, domains, arcs)
}

/// AC-3 over a caller-supplied initial worklist, for incremental
/// re-propagation after a subset of domains has changed.
pub fn enforce_arc_consistency_with(
    grid: &GridConfig,
    domains: &mut Domains,
    arcs: impl IntoIterator<Item = (SlotId, SlotId)>,
) -> bool {
    let mut queue: VecDeque<(SlotId, SlotId)> = arcs.into_iter().collect();

    // Arcs already processed in this run. An arc that gets re-enqueued after
    // a revision is dropped from the set again: the target's domain has
    // changed since we last looked, so it counts as new work.
    let mut visited: HashSet<(SlotId, SlotId)> = HashSet::with_capacity(queue.len());

    while let Some((x, y)) = queue.pop_front() {
        if !visited.insert((x, y)) {
            continue;
        }

        if revise(grid, domains, x, y) {
            if domains.remaining(x) == 0 {
                debug!("arc consistency emptied the domain of slot {}", x);
                return false;
            }

            for z in grid.neighbors(x) {
                if z != y {
                    visited.remove(&(z, x));
                    queue.push_back((z, x));
                }
            }
        }
    }

    true
}

/// Make slot `x` arc-consistent with slot `y`: remove every word of `x` that
/// no live word of `y` agrees with at the shared cell. Word uniqueness is
/// deliberately not considered here; it's a global constraint handled by
/// [`consistent`]. Returns whether anything was removed.
fn revise(grid: &GridConfig, domains: &mut Domains, x: SlotId, y: SlotId) -> bool {
    let Some((i, j)) = grid.overlap(x, y) else {
        return false;
    };

    let doomed: Vec<WordId> = domains
        .iter_live(x)
        .filter(|&word_id| match grid.words[word_id].glyphs.get(i) {
            Some(&glyph) => domains.glyph_count(y, j, glyph) == 0,
            // Too short to reach the shared cell; node consistency removes
            // these anyway, but they certainly have no support.
            None => true,
        })
        .collect();

    let revised = !doomed.is_empty();
    for word_id in doomed {
        domains.remove(grid, x, word_id);
    }

    revised
}

/// A partial mapping from slot to chosen word. The search extends and undoes
/// entries in exact pairs, so one assignment value serves a whole branch of
/// the search tree.
#[derive(Debug, Clone)]
pub struct Assignment {
    words_by_slot: Vec<Option<WordId>>,
    used_words: BitSet,
    assigned_count: usize,
}

impl Assignment {
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words_by_slot: vec![None; slot_count],
            used_words: BitSet::default(),
            assigned_count: 0,
        }
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words_by_slot[slot_id]
    }

    pub fn uses(&self, word_id: WordId) -> bool {
        self.used_words.contains(word_id)
    }

    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words_by_slot.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words_by_slot
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word)| word.map(|word_id| (slot_id, word_id)))
    }

    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        match self.words_by_slot[slot_id].replace(word_id) {
            Some(previous) => {
                self.used_words.remove(previous);
            }
            None => self.assigned_count += 1,
        }
        self.used_words.insert(word_id);
    }

    pub fn unassign(&mut self, slot_id: SlotId) {
        if let Some(word_id) = self.words_by_slot[slot_id].take() {
            self.assigned_count -= 1;
            self.used_words.remove(word_id);
        }
    }
}

/// Whether a (possibly partial) assignment satisfies all constraints: every
/// assigned word fits its slot's length, no word is used twice, and every
/// pair of assigned crossing slots agrees on the shared cell. Unassigned
/// slots impose no constraint.
pub fn consistent(grid: &GridConfig, assignment: &Assignment) -> bool {
    let mut seen_words = BitSet::with_capacity(grid.word_count());

    for (slot_id, word_id) in assignment.iter() {
        let slot_config = &grid.slot_configs[slot_id];
        let word = &grid.words[word_id];

        if word.len() != slot_config.length || !seen_words.insert(word_id) {
            return false;
        }

        for (cell_idx, crossing) in slot_config.crossings.iter().enumerate() {
            let Some(crossing) = crossing else { continue };
            let Some(other_word_id) = assignment.get(crossing.other_slot_id) else { continue };

            let other_glyph = grid.words[other_word_id].glyphs.get(crossing.other_slot_cell);
            if other_glyph != Some(&word.glyphs[cell_idx]) {
                return false;
            }
        }
    }

    true
}

/// Among the slots not yet assigned, pick the one with the fewest remaining
/// candidates, breaking ties by preferring more crossings and then the lower
/// slot id so the choice is deterministic. Returns `None` once every slot is
/// assigned.
pub fn select_unassigned_slot(
    grid: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<SlotId> {
    grid.slot_configs
        .iter()
        .filter(|slot_config| assignment.get(slot_config.id).is_none())
        .min_by_key(|slot_config| {
            (
                domains.remaining(slot_config.id),
                std::cmp::Reverse(grid.degree(slot_config.id)),
                slot_config.id,
            )
        })
        .map(|slot_config| slot_config.id)
}

/// The candidates for a slot that aren't already used elsewhere in the
/// assignment, ordered by how many words they would rule out from the
/// domains of the slot's unassigned crossing slots (least-constraining-value
/// first). Expects node-consistent domains.
pub fn order_domain_values(
    grid: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
    slot_id: SlotId,
) -> Vec<WordId> {
    let slot_config = &grid.slot_configs[slot_id];

    let mut candidates: Vec<(u32, WordId)> = domains
        .iter_live(slot_id)
        .filter(|&word_id| !assignment.uses(word_id))
        .map(|word_id| {
            let word = &grid.words[word_id];
            let mut ruled_out: u32 = 0;

            for (cell_idx, crossing) in slot_config.crossings.iter().enumerate() {
                let Some(crossing) = crossing else { continue };
                if assignment.get(crossing.other_slot_id).is_some() {
                    continue;
                }

                let compatible = domains.glyph_count(
                    crossing.other_slot_id,
                    crossing.other_slot_cell,
                    word.glyphs[cell_idx],
                );
                let neighbor_domain = domains.remaining(crossing.other_slot_id) as u32;
                ruled_out += neighbor_domain.saturating_sub(compatible);
            }

            (ruled_out, word_id)
        })
        .collect();

    candidates.sort();
    candidates.into_iter().map(|(_, word_id)| word_id).collect()
}

/// Counters describing a completed (or abandoned) solve.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Search-tree states visited (slot-selection steps).
    pub states: u64,
    /// Tentative word placements tried.
    pub words_tested: u64,
    /// Dead ends that forced the search back to a parent state.
    pub backtracks: u64,
    pub duration: Duration,
}

/// Knobs for a solve run. The defaults match the base solver: a single
/// up-front arc consistency pass and no time limit.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Re-run arc consistency after each tentative assignment, restricted to
    /// the arcs into the assigned slot's crossings, on a branch-local copy
    /// of the domains. Changes search effort, never the outcome.
    pub interleave_ac3: bool,
    /// Abandon the search once this instant passes, checked once per
    /// slot-selection step.
    pub deadline: Option<Instant>,
}

/// A complete, consistent assignment together with solve counters.
#[derive(Debug)]
pub struct SolveSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// The ways a solve can end without a solution. Both are ordinary outcomes,
/// not process failures.
#[derive(Debug)]
pub enum SolveFailure {
    /// Filtering or exhaustive search proved no assignment exists.
    NoSolution { statistics: Statistics },
    /// The deadline passed before the search finished.
    DeadlineExceeded { statistics: Statistics },
}

struct SearchAborted;

/// Find a complete, consistent assignment of one word per slot, or report
/// that none exists. Runs node consistency, then AC-3, then depth-first
/// backtracking search; the two filtering phases can each prove the puzzle
/// unsolvable without any search.
pub fn solve(grid: &GridConfig, options: &SolveOptions) -> Result<SolveSuccess, SolveFailure> {
    let start = Instant::now();
    let mut statistics = Statistics::default();

    let mut domains = Domains::new(grid);
    enforce_node_consistency(grid, &mut domains);

    if let Some(slot_config) = grid.slot_configs.iter().find(|s| domains.remaining(s.id) == 0) {
        info!(
            "no words of length {} for slot {}; unsolvable without search",
            slot_config.length, slot_config.id
        );
        statistics.duration = start.elapsed();
        return Err(SolveFailure::NoSolution { statistics });
    }

    if !enforce_arc_consistency(grid, &mut domains) {
        info!("arc consistency proved the puzzle unsolvable");
        statistics.duration = start.elapsed();
        return Err(SolveFailure::NoSolution { statistics });
    }

    debug!(
        "after filtering, {} candidates remain across {} slots",
        (0..grid.slot_count()).map(|s| domains.remaining(s)).sum::<usize>(),
        grid.slot_count()
    );

    let mut assignment = Assignment::new(grid.slot_count());
    let result = backtrack(grid, &domains, &mut assignment, options, &mut statistics);
    statistics.duration = start.elapsed();

    match result {
        Ok(true) => {
            info!(
                "solved: {} states, {} words tested, {} backtracks in {:?}",
                statistics.states, statistics.words_tested, statistics.backtracks,
                statistics.duration
            );
            Ok(SolveSuccess { statistics, assignment })
        }
        Ok(false) => {
            info!("search exhausted all branches without a solution");
            Err(SolveFailure::NoSolution { statistics })
        }
        Err(SearchAborted) => Err(SolveFailure::DeadlineExceeded { statistics }),
    }
}

/// Depth-first exploration from the given partial assignment. Returns whether
/// a complete assignment was reached (it's left in `assignment` if so); every
/// tentative extension is undone before the next sibling is tried, so the
/// assignment never leaks state across branches.
fn backtrack(
    grid: &GridConfig,
    domains: &Domains,
    assignment: &mut Assignment,
    options: &SolveOptions,
    statistics: &mut Statistics,
) -> Result<bool, SearchAborted> {
    statistics.states += 1;

    if let Some(deadline) = options.deadline {
        if Instant::now() >= deadline {
            debug!("deadline passed after {} states", statistics.states);
            return Err(SearchAborted);
        }
    }

    let Some(slot_id) = select_unassigned_slot(grid, domains, assignment) else {
        return Ok(true);
    };

    for word_id in order_domain_values(grid, domains, assignment, slot_id) {
        statistics.words_tested += 1;
        assignment.assign(slot_id, word_id);

        if consistent(grid, assignment) {
            let found = if options.interleave_ac3 {
                // Propagate the tentative choice through a branch-local copy
                // of the domains; a wipeout means this word can't work and
                // we can skip the recursion entirely.
                let mut narrowed = domains.clone();
                narrowed.restrict_to(grid, slot_id, word_id);

                let arcs: Vec<(SlotId, SlotId)> =
                    grid.neighbors(slot_id).iter().map(|&z| (z, slot_id)).collect();

                enforce_arc_consistency_with(grid, &mut narrowed, arcs)
                    && backtrack(grid, &narrowed, assignment, options, statistics)?
            } else {
                backtrack(grid, domains, assignment, options, statistics)?
            };

            if found {
                return Ok(true);
            }
        }

        assignment.unassign(slot_id);
    }

    statistics.backtracks += 1;
    Ok(false)
}

//! Text rendering: lay a (possibly partial) assignment onto the grid's
//! row/column geometry. No constraint reasoning happens here.

use crate::grid::{Direction, GridConfig};
use crate::solve::Assignment;

/// Turn the given grid and assignment into a rendered string. Cells outside
/// every slot come out as `#`, cells of unassigned slots as `.`.
pub fn render_grid(grid: &GridConfig, assignment: &Assignment) -> String {
    let max_x = grid
        .slot_configs
        .iter()
        .map(|slot_config| match slot_config.direction {
            Direction::Across => slot_config.start_cell.0 + slot_config.length - 1,
            Direction::Down => slot_config.start_cell.0,
        })
        .max()
        .unwrap_or(0);

    let max_y = grid
        .slot_configs
        .iter()
        .map(|slot_config| match slot_config.direction {
            Direction::Across => slot_config.start_cell.1,
            Direction::Down => slot_config.start_cell.1 + slot_config.length - 1,
        })
        .max()
        .unwrap_or(0);

    let mut rows: Vec<Vec<char>> = (0..=max_y).map(|_| vec!['#'; max_x + 1]).collect();

    for slot_config in &grid.slot_configs {
        let word = assignment.get(slot_config.id).map(|word_id| &grid.words[word_id]);

        for (cell_idx, (x, y)) in slot_config.cell_coords().enumerate() {
            rows[y][x] = match word {
                Some(word) => grid.glyphs[word.glyphs[cell_idx]],
                None if rows[y][x] == '#' => '.',
                None => rows[y][x],
            };
        }
    }

    rows.into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridEntry;
    use crate::solve::{solve, SolveOptions};

    fn word_list(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_render_empty_assignment_shows_open_cells_and_blocks() {
        let grid = GridConfig::from_template(&word_list(&["cat"]), "...\n##.\n##.").unwrap();
        let assignment = Assignment::new(grid.slot_count());

        assert_eq!(render_grid(&grid, &assignment), "...\n##.\n##.");
    }

    #[test]
    fn test_render_partial_assignment() {
        let grid = GridConfig::from_entries(
            &word_list(&["cat", "cow"]),
            &[
                GridEntry { loc: (0, 0), len: 3, dir: Direction::Across },
                GridEntry { loc: (0, 0), len: 3, dir: Direction::Down },
            ],
        )
        .unwrap();

        let mut assignment = Assignment::new(grid.slot_count());
        let cow = grid.words.iter().position(|w| w.string == "cow").unwrap();
        assignment.assign(1, cow);

        assert_eq!(render_grid(&grid, &assignment), "c..\no##\nw##");
    }

    #[test]
    fn test_render_solved_grid_places_every_letter() {
        let words = word_list(&["cat", "ore", "wed", "cow", "are", "ted"]);
        let grid = GridConfig::from_template(&words, "...\n...\n...").unwrap();
        let success = solve(&grid, &SolveOptions::default()).unwrap();

        let rendered = render_grid(&grid, &success.assignment);
        assert_eq!(rendered.lines().count(), 3);
        assert!(rendered.chars().all(|c| c.is_ascii_lowercase() || c == '\n'));
    }
}

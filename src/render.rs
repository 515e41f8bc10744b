use crate::backtracking_search::Assignment;
use crate::structure::Structure;

/// Turn the given structure and (possibly partial) assignment into a rendered string: `#` for
/// blocks, letters where a slot has been filled, and `.` for open cells that are still empty.
pub fn render_grid(structure: &Structure, assignment: &Assignment) -> String {
    let mut grid: Vec<Vec<char>> = (0..structure.height())
        .map(|row| {
            (0..structure.width())
                .map(|column| if structure.is_open(row, column) { '.' } else { '#' })
                .collect()
        })
        .collect();

    for (slot, word) in assignment.iter() {
        for ((row, column), glyph) in slot.cells().zip(word.chars()) {
            grid[row][column] = glyph;
        }
    }

    grid.iter()
        .map(|cells_in_row| cells_in_row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtracking_search::{find_fill, FillOptions};
    use crate::structure::{Direction, Slot};
    use crate::word_list::Vocabulary;

    #[test]
    fn test_render_empty_assignment() {
        let structure = Structure::from_template(
            "
            ___#
            #___
            ",
        )
        .unwrap();

        insta::assert_snapshot!(render_grid(&structure, &Assignment::default()), @r"
        ...#
        #...
        ");
    }

    #[test]
    fn test_render_partial_assignment() {
        let structure = Structure::from_template(
            "
            ___#
            #___
            ",
        )
        .unwrap();
        let mut assignment = Assignment::default();
        assignment.insert(Slot::new(1, 1, Direction::Across, 3), "OWL".to_string());

        assert_eq!(render_grid(&structure, &assignment), "...#\n#OWL");
    }

    #[test]
    fn test_render_filled_cross() {
        let structure = Structure::from_template(
            "
            ___
            #_#
            #_#
            ",
        )
        .unwrap();
        let vocabulary = Vocabulary::new(["AGE", "RAT", "TEA"]);
        let result = find_fill(&structure, &vocabulary, &FillOptions::default()).unwrap();

        insta::assert_snapshot!(render_grid(&structure, &result.assignment), @r"
        RAT
        #G#
        #E#
        ");
    }
}

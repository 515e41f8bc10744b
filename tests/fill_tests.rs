//! Integration tests for crossfill.
//!
//! These go through the public API only: load or parse a structure and a word list, fill it, and
//! check the result.

use crossfill::{
    find_fill, load_structure, load_word_list, render_grid, Direction, FillError, FillFailure,
    FillOptions, Inference, Slot, Structure, Vocabulary,
};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

const ALL_INFERENCES: [Inference; 3] = [
    Inference::None,
    Inference::ForwardChecking,
    Inference::MaintainArcConsistency,
];

#[cfg(test)]
mod fixtures {
    use super::*;

    #[test]
    fn test_fill_structure0() {
        let structure = load_structure(fixture("structure0.txt")).unwrap();
        let vocabulary = load_word_list(fixture("words0.txt")).unwrap();

        assert_eq!(structure.slot_count(), 4);
        assert_eq!(vocabulary.len(), 10);

        for inference in ALL_INFERENCES {
            let options = FillOptions { inference, ..FillOptions::default() };
            let result = find_fill(&structure, &vocabulary, &options).unwrap();

            assert!(result.assignment.is_valid_for(&structure));
            assert_eq!(result.assignment.get(&Slot::new(0, 1, Direction::Down, 5)), Some("SEVEN"));
            assert_eq!(
                render_grid(&structure, &result.assignment),
                "#SIX#\n#E##F\n#V##I\n#E##V\n#NINE"
            );
        }
    }

    #[test]
    fn test_missing_fixture_is_an_error() {
        let err = load_structure(fixture("no_such_structure.txt")).unwrap_err();

        assert!(matches!(err, FillError::Io { .. }));
        assert_eq!(err.code(), "E003");
    }
}

#[cfg(test)]
mod grids {
    use super::*;

    #[test]
    fn test_fill_open_square() {
        let structure = Structure::from_template(
            "
            ...
            ...
            ...
            ",
        )
        .unwrap();
        let vocabulary = Vocabulary::new([
            "AEI", "ABD", "XYZ", "ABC", "DEF", "GHI", "ADG", "BEH", "CFI", "ZZZ",
        ]);

        for inference in ALL_INFERENCES {
            let options = FillOptions { inference, ..FillOptions::default() };
            let result = find_fill(&structure, &vocabulary, &options).unwrap();

            assert_eq!(result.assignment.len(), 6);
            assert!(result.assignment.is_valid_for(&structure));
            // The grid is symmetric, so the transposed fill is just as good.
            let rendered = render_grid(&structure, &result.assignment);
            assert!(
                rendered == "ABC\nDEF\nGHI" || rendered == "ADG\nBEH\nCFI",
                "unexpected fill:\n{rendered}"
            );
        }
    }

    #[test]
    fn test_unsatisfiable_is_not_an_empty_fill() {
        let structure = Structure::from_template(
            "
            ___
            #_#
            #_#
            ",
        )
        .unwrap();
        let vocabulary = Vocabulary::new(["AGE", "SKY"]);

        let result = find_fill(&structure, &vocabulary, &FillOptions::default());

        assert_eq!(result.unwrap_err(), FillFailure::Unsatisfiable);
    }

    #[test]
    fn test_word_list_parsing_feeds_the_solver() {
        let structure = Structure::from_template("___\n#_#\n#_#").unwrap();
        let vocabulary = Vocabulary::parse("age;10\nrat;20\n\ntea;30\n");

        let result = find_fill(&structure, &vocabulary, &FillOptions::default()).unwrap();

        assert_eq!(result.assignment.get(&Slot::new(0, 0, Direction::Across, 3)), Some("RAT"));
        assert_eq!(result.assignment.get(&Slot::new(0, 1, Direction::Down, 3)), Some("AGE"));
    }

    #[test]
    fn test_malformed_grid_is_reported() {
        let result = Structure::new(vec![vec![true, true, true], vec![true, false]]);

        assert!(matches!(
            result,
            Err(FillError::MalformedGrid { row: 1, expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_repeated_runs_agree() {
        let structure = load_structure(fixture("structure0.txt")).unwrap();
        let vocabulary = load_word_list(fixture("words0.txt")).unwrap();
        let options = FillOptions::default();

        let first = find_fill(&structure, &vocabulary, &options).unwrap();
        let second = find_fill(&structure, &vocabulary, &options).unwrap();

        assert_eq!(first.choices, second.choices);
        assert_eq!(first.assignment, second.assignment);
    }
}

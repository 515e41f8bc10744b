use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use crate::errors::FillError;
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the vocabulary's `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a slot of matching length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: &str) -> Word {
        Word {
            string: string.to_string(),
            glyphs: string.chars().collect(),
        }
    }

    /// The length of the word in letters (not bytes).
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The finite set of words available for filling. Duplicates are dropped, and the surviving words
/// keep the order in which they were first seen; that order is the iteration order of every slot's
/// domain, so it also decides which of several equally good candidates gets tried first.
#[derive(Clone, Default)]
pub struct Vocabulary {
    words: Vec<Word>,
    ids_by_string: HashMap<String, WordId>,
}

impl Debug for Vocabulary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vocabulary")
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl Vocabulary {
    pub fn new<I, S>(words: I) -> Vocabulary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Vocabulary::default();

        for word in words {
            let word = word.as_ref();
            if word.is_empty() || vocabulary.ids_by_string.contains_key(word) {
                continue;
            }
            vocabulary.ids_by_string.insert(word.to_string(), vocabulary.words.len());
            vocabulary.words.push(Word::new(word));
        }

        vocabulary
    }

    /// Build a vocabulary from the contents of a word-list file.
    pub fn parse(contents: &str) -> Vocabulary {
        Vocabulary::new(parse_word_list(contents))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn id_of(&self, word: &str) -> Option<WordId> {
        self.ids_by_string.get(word).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WordId, &Word)> {
        self.words.iter().enumerate()
    }
}

/// Split a word list into normalized words: one per line, trimmed and upper-cased. Blank lines are
/// skipped, and anything after a `;` or `,` (a score, in the usual dictionary formats) is ignored.
pub fn parse_word_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| {
            let word = line.split(&[';', ','][..]).next().unwrap_or("").trim();
            if word.is_empty() {
                None
            } else {
                Some(word.to_uppercase())
            }
        })
        .collect()
}

/// Read and parse a word-list file.
pub fn load_word_list<P: AsRef<Path>>(path: P) -> Result<Vocabulary, FillError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| FillError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let vocabulary = Vocabulary::parse(&contents);
    log::debug!("Loaded {} words from {}", vocabulary.len(), path.display());

    Ok(vocabulary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word_list_normalizes_lines() {
        let words = parse_word_list("cat\n  Dog  \n\nemu;50\nfox,12\n");

        assert_eq!(words, vec!["CAT", "DOG", "EMU", "FOX"]);
    }

    #[test]
    fn test_vocabulary_dedupes_in_first_seen_order() {
        let vocabulary = Vocabulary::new(["RAT", "AGE", "RAT", "", "TEA", "AGE"]);

        let strings: Vec<&str> = vocabulary.iter().map(|(_, word)| word.string.as_str()).collect();
        assert_eq!(strings, vec!["RAT", "AGE", "TEA"]);
        assert_eq!(vocabulary.id_of("TEA"), Some(2));
        assert_eq!(vocabulary.id_of("SKY"), None);
    }

    #[test]
    fn test_word_length_counts_chars() {
        let vocabulary = Vocabulary::new(["ÉTÉ"]);

        assert_eq!(vocabulary.word(0).len(), 3);
        assert_eq!(vocabulary.word(0).glyphs[0], 'É');
    }

    #[test]
    fn test_load_word_list_reports_missing_file() {
        let err = load_word_list("/definitely/not/a/word/list.txt").unwrap_err();

        assert!(matches!(err, FillError::Io { .. }));
    }
}

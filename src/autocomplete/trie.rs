//! Prefix trie over the suggestion dictionary
//!
//! Each node owns its children in a `BTreeMap`, so a depth-first walk visits
//! letters in ascending order and the suggestion output stays deterministic
//! across runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::autocomplete::ExclusionSet;

/// Upper bound on the number of words a suggestion query returns.
pub const MAX_SUGGESTIONS: usize = 3;

/// Default dictionary compiled into the binary.
const EMBEDDED_WORD_LIST: &str = include_str!("../../resources/word_list.txt");

/// Errors raised while seeding the trie from a word list.
///
/// An unreadable list is the one condition that aborts startup: without a
/// dictionary the keyboard cannot provide suggestions.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("Failed to read word list {path}: {source}")]
    UnreadableWordList {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    is_end_of_word: bool,
}

/// Dictionary membership and prefix-bounded suggestion search.
#[derive(Debug, Default)]
pub struct Trie {
    root: TrieNode,
    word_count: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a trie from a newline-delimited word list file.
    ///
    /// Duplicate entries are deduplicated silently; an unreadable file is
    /// fatal.
    pub fn from_word_list(path: &Path) -> Result<Self, DictionaryError> {
        info!("Opening trie word list: {}", path.display());
        let contents =
            fs::read_to_string(path).map_err(|source| DictionaryError::UnreadableWordList {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_lines(&contents))
    }

    /// Builds a trie from the word list compiled into the binary.
    pub fn from_embedded() -> Self {
        Self::from_lines(EMBEDDED_WORD_LIST)
    }

    fn from_lines(contents: &str) -> Self {
        let mut trie = Self::new();
        let mut duplicates = 0usize;
        for word in contents.lines().map(str::trim).filter(|w| !w.is_empty()) {
            if !trie.search_and_insert(word) {
                duplicates += 1;
            }
        }
        info!(
            "Dictionary loaded: {} words ({} duplicates skipped)",
            trie.word_count, duplicates
        );
        trie
    }

    /// Number of distinct words in the trie.
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Adds all characters of `word` as a chain from the root. Idempotent.
    pub fn insert(&mut self, word: &str) {
        let mut node = &mut self.root;
        for letter in word.chars() {
            node = node.children.entry(letter).or_default();
        }
        if !node.is_end_of_word {
            node.is_end_of_word = true;
            self.word_count += 1;
        }
    }

    /// Whether `word` is a complete dictionary entry (exact match, not prefix).
    pub fn search(&self, word: &str) -> bool {
        let mut node = &self.root;
        for letter in word.chars() {
            match node.children.get(&letter) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.is_end_of_word
    }

    /// Inserts `word` unless it is already a complete entry.
    ///
    /// Returns whether an insertion occurred. Used for dictionary loading so
    /// duplicate lines in the source list do not cause anomalies.
    pub fn search_and_insert(&mut self, word: &str) -> bool {
        if self.search(word) {
            return false;
        }
        self.insert(word);
        true
    }

    /// Collects up to [`MAX_SUGGESTIONS`] completions of `prefix`.
    ///
    /// The walk is a pre-order DFS over children in ascending character
    /// order, stopping the instant the third match is found. The prefix
    /// itself is never suggested, and neither is a word that misses a single
    /// letter to be complete when that letter is in `exclusion`: such a word
    /// costs the same gesture as typing the letter directly, so surfacing it
    /// would waste a suggestion slot.
    pub fn suggest(&self, prefix: &str, exclusion: &ExclusionSet) -> Vec<String> {
        let mut suggestions = Vec::new();

        let mut node = &self.root;
        for letter in prefix.chars() {
            match node.children.get(&letter) {
                // No words with this prefix
                None => return suggestions,
                Some(child) => node = child,
            }
        }

        let mut word = prefix.to_string();
        Self::suggest_helper(node, &mut word, 0, exclusion, &mut suggestions);
        debug!("Suggest \"{}\" -> {:?}", prefix, suggestions);
        suggestions
    }

    /// `depth` counts characters appended past the typed prefix; `last` is
    /// the most recently appended character (unused at depth 0).
    fn suggest_helper(
        node: &TrieNode,
        word: &mut String,
        depth: usize,
        exclusion: &ExclusionSet,
        suggestions: &mut Vec<String>,
    ) {
        if suggestions.len() >= MAX_SUGGESTIONS {
            return;
        }

        let one_letter_away = depth == 1;
        let last_excluded =
            one_letter_away && word.chars().next_back().is_some_and(|c| exclusion.contains(c));
        if node.is_end_of_word && depth > 0 && !last_excluded {
            suggestions.push(word.clone());
        }

        for (&letter, child) in &node.children {
            word.push(letter);
            Self::suggest_helper(child, word, depth + 1, exclusion, suggestions);
            word.truncate(word.len() - letter.len_utf8());
            if suggestions.len() >= MAX_SUGGESTIONS {
                return;
            }
        }
    }
}

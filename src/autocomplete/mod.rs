//! Word completion subsystem
//!
//! A prefix [`trie`] holds the dictionary; a [`session`] owns the edit
//! buffer the keyboard types into and mediates every trie query.
//!
//! ```text
//! buffer mutation ──► AutocompleteSession ──► Trie::suggest ──► suggestions
//! ```
//!
//! The dictionary is seeded once at startup, before any input event is
//! processed; everything after that is synchronous in-memory work.

pub mod session;
pub mod trie;

pub use session::{AutocompleteSession, BufferAction, CursorMove};
pub use trie::{DictionaryError, Trie, MAX_SUGGESTIONS};

/// Characters reachable as alternative choices within the currently selected
/// character group.
///
/// Used to filter suggestion candidates: a completion that misses a single
/// letter available in the same group takes the same effort as typing the
/// letter, so it is suppressed. Multi-character group entries (emotes) can
/// never equal a candidate's last character and are skipped at construction.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    chars: Vec<char>,
}

impl ExclusionSet {
    /// Builds the set from a character-group row.
    pub fn from_group(group: &[&str]) -> Self {
        let chars = group
            .iter()
            .filter_map(|entry| {
                let mut chars = entry.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            })
            .collect();
        Self { chars }
    }

    #[cfg(test)]
    pub fn from_chars(chars: &[char]) -> Self {
        Self {
            chars: chars.to_vec(),
        }
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }
}

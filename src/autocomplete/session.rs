//! Autocomplete session: the edit buffer and its suggestion state
//!
//! The session mirrors the word currently being typed, independently of the
//! externally displayed text, and is the only caller of the trie. An empty
//! buffer never queries the dictionary.

use tracing::debug;

use crate::autocomplete::{ExclusionSet, Trie};

/// Outcome of a buffer operation, reported back so the caller knows whether
/// the suggestion display needs refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAction {
    ClearedBuffer,
    SoughtSuggestions,
    Nothing,
}

/// Direction of a cursor move within the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Left,
    Right,
}

/// Owns the query buffer and mediates all trie access.
#[derive(Debug)]
pub struct AutocompleteSession {
    trie: Trie,

    // Lowercased characters of the in-progress word
    buffer: Vec<char>,

    // Insertion position, always in 0..=buffer.len()
    cursor: usize,

    suggestions: Vec<String>,

    exclusion: ExclusionSet,
}

impl AutocompleteSession {
    pub fn new(trie: Trie) -> Self {
        Self {
            trie,
            buffer: Vec::new(),
            cursor: 0,
            suggestions: Vec::new(),
            exclusion: ExclusionSet::default(),
        }
    }

    /// Inserts a character at the cursor, or removes the one before it when
    /// called with `None` (a backspace).
    ///
    /// A backspace that would empty the buffer, or one issued with the
    /// cursor at the left boundary, abandons the in-progress word instead.
    pub fn change_character(&mut self, character: Option<char>) -> BufferAction {
        match character {
            None if self.buffer.len() <= 1 || self.cursor == 0 => {
                self.clear_buffer();
                BufferAction::ClearedBuffer
            }
            None => {
                self.buffer.remove(self.cursor - 1);
                self.cursor -= 1;
                self.seek_suggestions();
                BufferAction::SoughtSuggestions
            }
            Some(character) => {
                // Lowering the case to ensure a match is possible in the
                // trie, as it contains only lowercase words
                for lowered in character.to_lowercase() {
                    self.buffer.insert(self.cursor, lowered);
                    self.cursor += 1;
                }
                self.seek_suggestions();
                BufferAction::SoughtSuggestions
            }
        }
    }

    /// Shifts the cursor by one position.
    ///
    /// Moving past either edge abandons the in-progress word; an in-range
    /// move leaves the suggestions untouched.
    pub fn move_cursor(&mut self, direction: CursorMove) -> BufferAction {
        if self.buffer.is_empty() {
            return BufferAction::Nothing;
        }

        let at_edge = match direction {
            CursorMove::Left => self.cursor == 0,
            CursorMove::Right => self.cursor == self.buffer.len(),
        };
        if at_edge {
            self.clear_buffer();
            return BufferAction::ClearedBuffer;
        }

        match direction {
            CursorMove::Left => self.cursor -= 1,
            CursorMove::Right => self.cursor += 1,
        }
        BufferAction::Nothing
    }

    /// Resets buffer, cursor and suggestions.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.suggestions.clear();
    }

    /// Replaces the exclusion set and recomputes suggestions for the current
    /// buffer.
    pub fn set_exclusion_set(&mut self, exclusion: ExclusionSet) {
        self.exclusion = exclusion;
        self.seek_suggestions();
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn cursor_index(&self) -> usize {
        self.cursor
    }

    fn seek_suggestions(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let query: String = self.buffer.iter().collect();
        self.suggestions = self.trie.suggest(&query, &self.exclusion);
        debug!("Buffer \"{}\" -> {} suggestions", query, self.suggestions.len());
    }
}

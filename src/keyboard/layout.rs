//! Tile layout: the compiled-in character tables of the radial menus
//!
//! The outer menu has exactly eight groups; each group maps to an inner menu
//! of eight tiles, split between literal characters and a reserved suffix of
//! suggestion slots. The characters associated to each tile can be switched
//! here. Be careful while modifying this file: there is no protection
//! preserving you from forgetting a character.

use crate::autocomplete::ExclusionSet;
use crate::keyboard::{KeyboardError, ShiftState};

/// Highest tile index of an inner group.
pub const MAX_TILE_INDEX: u8 = 7;

/// Number of character groups at the outer level.
pub const GROUP_COUNT: usize = 8;

/// A group of characters to be displayed by the eight tiles of a group.
pub type CharGroup = &'static [&'static str];

const INNER_TILES_LOWER: [CharGroup; GROUP_COUNT] = [
    &["t", "r", "s", "h", "e", "a"],
    &["q", "f", "l", "k", "b"],
    &["z", "g", "v", "x", "j"],
    &["o", "c", "i", "n", "d"],
    &["p", "u", "m", "w", "y"],
    &["1", "2", "3", "4", "5", "+", "/", "="],
    &["€", "#", "%", "&", "(", "[", "{", "<"],
    &["☺️", "☹️", "♥️", "✌️", "✨", "☀️", "☁️", "☕"],
];

const INNER_TILES_UPPER: [CharGroup; GROUP_COUNT] = [
    &["T", "R", "S", "H", "E", "A"],
    &["Q", "F", "L", "K", "B"],
    &["Z", "G", "V", "X", "J"],
    &["O", "C", "I", "N", "D"],
    &["P", "U", "M", "W", "Y"],
    &["6", "7", "8", "9", "0", "\"", "\\", "*"],
    &["$", "@", "^", "_", ")", "]", "}", ">"],
    &["☺️", "☹️", "♥️", "✌️", "✨", "☀️", "☁️", "☕"],
];

/// Number of suggestion tiles of each inner tile group.
const GROUP_SUGGESTION_SLOTS: [u8; GROUP_COUNT] = [2, 3, 3, 3, 3, 0, 0, 0];

/// Immutable tile configuration handed to the selection machine at
/// construction.
#[derive(Debug, Clone)]
pub struct KeyboardLayout {
    inner_tiles: [[CharGroup; GROUP_COUNT]; 2],
    suggestion_slots: [u8; GROUP_COUNT],
}

impl KeyboardLayout {
    /// The standard disposition.
    pub fn default_layout() -> Self {
        Self {
            inner_tiles: [INNER_TILES_LOWER, INNER_TILES_UPPER],
            suggestion_slots: GROUP_SUGGESTION_SLOTS,
        }
    }

    /// Checks that both shift rows carry eight groups and that character
    /// tiles plus suggestion slots fill each inner menu exactly.
    pub fn validate(&self) -> Result<(), KeyboardError> {
        for (shift_row, tiles) in self.inner_tiles.iter().enumerate() {
            for (group, chars) in tiles.iter().enumerate() {
                let slots = self.suggestion_slots[group] as usize;
                if chars.len() + slots != MAX_TILE_INDEX as usize + 1 {
                    return Err(KeyboardError::ConfigError(format!(
                        "Group {} (shift row {}) has {} characters and {} suggestion slots",
                        group,
                        shift_row,
                        chars.len(),
                        slots
                    )));
                }
            }
        }
        Ok(())
    }

    /// Character at `(shift, group, tile)`, `None` when out of range.
    pub fn character(&self, shift: ShiftState, group: u8, tile: u8) -> Option<&'static str> {
        self.inner_tiles
            .get(shift.index())?
            .get(group as usize)?
            .get(tile as usize)
            .copied()
    }

    /// Characters reachable within `group`, as the exclusion set for
    /// suggestion filtering. Always derived from the lowercase row, matching
    /// the all-lowercase dictionary.
    pub fn exclusion_set(&self, group: u8) -> ExclusionSet {
        let chars = self.inner_tiles[ShiftState::Lower.index()]
            .get(group as usize)
            .copied()
            .unwrap_or(&[]);
        ExclusionSet::from_group(chars)
    }

    pub fn suggestion_slots(&self, group: u8) -> u8 {
        self.suggestion_slots
            .get(group as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Highest tile index still holding a literal character in `group`; the
    /// tiles above it are the reserved suggestion suffix.
    pub fn last_character_tile(&self, group: u8) -> u8 {
        MAX_TILE_INDEX - self.suggestion_slots(group)
    }
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        Self::default_layout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        assert!(KeyboardLayout::default_layout().validate().is_ok());
    }

    #[test]
    fn every_group_fills_the_inner_menu() {
        let layout = KeyboardLayout::default_layout();
        for group in 0..GROUP_COUNT as u8 {
            let chars = layout.inner_tiles[0][group as usize].len() as u8;
            assert_eq!(chars + layout.suggestion_slots(group), MAX_TILE_INDEX + 1);
        }
    }

    #[test]
    fn shift_rows_have_matching_shapes() {
        let layout = KeyboardLayout::default_layout();
        for group in 0..GROUP_COUNT {
            assert_eq!(
                layout.inner_tiles[0][group].len(),
                layout.inner_tiles[1][group].len()
            );
        }
    }

    #[test]
    fn character_lookup_respects_shift() {
        let layout = KeyboardLayout::default_layout();
        assert_eq!(layout.character(ShiftState::Lower, 0, 0), Some("t"));
        assert_eq!(layout.character(ShiftState::Upper, 0, 0), Some("T"));
        assert_eq!(layout.character(ShiftState::Lower, 4, 2), Some("m"));
        assert_eq!(layout.character(ShiftState::Lower, 0, 6), None);
    }

    #[test]
    fn last_character_tile_reserves_the_suggestion_suffix() {
        let layout = KeyboardLayout::default_layout();
        assert_eq!(layout.last_character_tile(0), 5);
        assert_eq!(layout.last_character_tile(1), 4);
        assert_eq!(layout.last_character_tile(5), 7);
    }

    #[test]
    fn exclusion_set_uses_the_lowercase_row() {
        let layout = KeyboardLayout::default_layout();
        let set = layout.exclusion_set(0);
        assert!(set.contains('t'));
        assert!(set.contains('a'));
        assert!(!set.contains('T'));
        assert!(!set.contains('m'));
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let mut layout = KeyboardLayout::default_layout();
        layout.suggestion_slots[0] = 3;
        assert!(layout.validate().is_err());
    }
}

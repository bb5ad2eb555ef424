//! Selection state machine
//!
//! Combines the radial classifiers of both sticks with the shift/caps state
//! to decide which character or suggestion is committed. The outer (left)
//! stick selects a character group; the inner (right) stick selects a tile
//! within it, committing on release so the user can sweep across sectors
//! before deciding.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::autocomplete::{AutocompleteSession, BufferAction, CursorMove};
use crate::controller::classifier::{RadialClassifier, RadialEvent};
use crate::controller::event_collector::{ButtonType, JoystickType, RawControllerEvent};
use crate::keyboard::buttons::{self, Feature};
use crate::keyboard::layout::{KeyboardLayout, MAX_TILE_INDEX};
use crate::keyboard::{ControlAction, KeyboardError, KeyboardEvent, ShiftState};

/// Mutable keyboard state, fed raw controller events, emitting
/// [`KeyboardEvent`]s.
///
/// All state lives here and is touched by exactly one task; each call runs
/// to completion before the next event is accepted.
#[derive(Debug)]
pub struct SelectionMachine {
    layout: KeyboardLayout,

    outer: RadialClassifier,
    inner: RadialClassifier,

    shift: ShiftState,
    caps_lock: bool,

    session: AutocompleteSession,

    // Last seen value per button, for 0 -> non-zero edge detection
    button_levels: HashMap<ButtonType, f32>,
}

impl SelectionMachine {
    pub fn new(
        layout: KeyboardLayout,
        session: AutocompleteSession,
        border_dead_zone: f32,
    ) -> Result<Self, KeyboardError> {
        layout.validate()?;
        Ok(Self {
            layout,
            // The outer menu starts on its first group; the inner stick has
            // no selection until it enters a sector
            outer: RadialClassifier::new(border_dead_zone, Some(0)),
            inner: RadialClassifier::new(border_dead_zone, None),
            shift: ShiftState::Lower,
            caps_lock: false,
            session,
            button_levels: HashMap::new(),
        })
    }

    pub fn shift_state(&self) -> ShiftState {
        self.shift
    }

    pub fn caps_lock(&self) -> bool {
        self.caps_lock
    }

    /// Group currently selected on the outer menu.
    pub fn current_group(&self) -> u8 {
        self.outer.sector().unwrap_or(0)
    }

    /// Startup coherence pass: first group selected, suggestion slots blank.
    pub fn initialize(&mut self) -> Vec<KeyboardEvent> {
        let mut events = vec![KeyboardEvent::SelectionChanged {
            stick: JoystickType::Left,
            sector: Some(0),
        }];
        self.push_suggestions(&mut events);
        events
    }

    /// Processes one raw controller event to completion.
    pub fn process_event(&mut self, event: &RawControllerEvent) -> Vec<KeyboardEvent> {
        match event {
            RawControllerEvent::JoystickMove { stick, x, y, .. } => {
                self.joystick_moved(*stick, *x, *y)
            }
            RawControllerEvent::ButtonTransition { button, value, .. } => {
                self.button_changed(button, *value)
            }
        }
    }

    fn joystick_moved(&mut self, stick: JoystickType, x: f32, y: f32) -> Vec<KeyboardEvent> {
        let mut events = Vec::new();
        match stick {
            JoystickType::Left => match self.outer.sample(x, y) {
                Some(RadialEvent::SectorChanged(sector)) => {
                    self.outer_sector_changed(sector, &mut events);
                }
                // Commits happen on the inner stick only
                Some(RadialEvent::Released) | None => {}
            },
            JoystickType::Right => match self.inner.sample(x, y) {
                Some(RadialEvent::SectorChanged(sector)) => {
                    events.push(KeyboardEvent::SelectionChanged {
                        stick: JoystickType::Right,
                        sector: Some(sector),
                    });
                }
                Some(RadialEvent::Released) => self.inner_released(&mut events),
                None => {}
            },
        }
        events
    }

    /// A new character group was selected on the outer menu.
    fn outer_sector_changed(&mut self, group: u8, events: &mut Vec<KeyboardEvent>) {
        info!("Character group selected: {}", group);
        events.push(KeyboardEvent::SelectionChanged {
            stick: JoystickType::Left,
            sector: Some(group),
        });

        // The inner selection is stale for the new group
        self.inner.reset_sector();
        events.push(KeyboardEvent::SelectionChanged {
            stick: JoystickType::Right,
            sector: None,
        });

        self.session
            .set_exclusion_set(self.layout.exclusion_set(group));
        if self.layout.suggestion_slots(group) > 0 {
            self.push_suggestions(events);
        }
    }

    /// The inner stick fell back to the center: commit whatever its last
    /// sector selects.
    fn inner_released(&mut self, events: &mut Vec<KeyboardEvent>) {
        let group = self.current_group();
        let Some(tile) = self.inner.sector() else {
            // Nothing entered since the last group change
            return;
        };

        // The suggestion tiles occupy the last positions of the inner menu,
        // so a single comparison splits character and suggestion commits
        if tile <= self.layout.last_character_tile(group) {
            self.character_tile_selected(tile, group, events);
        } else {
            self.type_suggestion(tile, events);
        }
    }

    fn character_tile_selected(&mut self, tile: u8, group: u8, events: &mut Vec<KeyboardEvent>) {
        let Some(text) = self.layout.character(self.shift, group, tile) else {
            return;
        };
        info!("Character committed: {}", text);
        self.type_char(text, events);

        let character = text.chars().next();
        let result = self.session.change_character(character);
        if result != BufferAction::Nothing {
            self.push_suggestions(events);
        }
    }

    /// Commits the suggestion selected on a reserved tile: only the part not
    /// yet typed is emitted, followed by a space.
    fn type_suggestion(&mut self, tile: u8, events: &mut Vec<KeyboardEvent>) {
        let index = (MAX_TILE_INDEX - tile) as usize;
        let remainder: String = match self.session.suggestions().get(index) {
            Some(suggestion) => suggestion
                .chars()
                .skip(self.session.cursor_index())
                .collect(),
            // Empty slot, nothing to commit
            None => return,
        };

        let remainder = if self.caps_lock {
            remainder.to_uppercase()
        } else {
            remainder
        };
        info!("Suggestion committed, remainder: {}", remainder);
        events.push(KeyboardEvent::CommitCharacter(remainder));
        self.apply_feature(&buttons::SPACE, events);
    }

    /// Emits a character and reverts the one-shot shift.
    fn type_char(&mut self, text: &str, events: &mut Vec<KeyboardEvent>) {
        events.push(KeyboardEvent::CommitCharacter(text.to_string()));
        self.toggle_shift(events);
    }

    fn toggle_shift(&mut self, events: &mut Vec<KeyboardEvent>) {
        if !self.caps_lock {
            self.shift = ShiftState::Lower;
            events.push(KeyboardEvent::ShiftStateChanged {
                shift: self.shift,
                group: self.current_group(),
            });
        }
    }

    /// Shift button cycle: Lower -> Upper -> Upper with caps lock -> Lower.
    fn shift_button(&mut self, events: &mut Vec<KeyboardEvent>) {
        if self.shift == ShiftState::Lower {
            // Standard one-shot shift
            self.shift = ShiftState::Upper;
        } else if !self.caps_lock {
            // Second press locks caps
            self.caps_lock = true;
        } else {
            // Third press unlocks and returns to lower case
            self.caps_lock = false;
            self.shift = ShiftState::Lower;
        }
        info!(
            "Shift state: {:?}, caps lock: {}",
            self.shift, self.caps_lock
        );
        events.push(KeyboardEvent::ShiftStateChanged {
            shift: self.shift,
            group: self.current_group(),
        });
    }

    fn button_changed(&mut self, button: &ButtonType, value: f32) -> Vec<KeyboardEvent> {
        let mut events = Vec::new();

        let previous = self
            .button_levels
            .insert(button.clone(), value)
            .unwrap_or(0.0);
        // Features fire on the 0 -> non-zero edge only; held repeats and
        // releases do nothing
        if previous != 0.0 || value == 0.0 {
            return events;
        }

        let Some(binding) = buttons::binding(button) else {
            debug!("No feature bound to {:?}", button);
            return events;
        };
        let feature = binding.feature(self.shift);
        self.apply_feature(&feature, &mut events);
        events
    }

    fn apply_feature(&mut self, feature: &Feature, events: &mut Vec<KeyboardEvent>) {
        match feature {
            Feature::TextControl { action, .. } => {
                events.push(KeyboardEvent::CommitControl(*action));
                let result = match action {
                    ControlAction::Space => {
                        self.session.clear_buffer();
                        BufferAction::ClearedBuffer
                    }
                    ControlAction::Backspace => self.session.change_character(None),
                    ControlAction::MoveLeft => self.session.move_cursor(CursorMove::Left),
                    ControlAction::MoveRight => self.session.move_cursor(CursorMove::Right),
                };
                if result != BufferAction::Nothing {
                    self.push_suggestions(events);
                }
            }
            Feature::Punctuation { glyph, .. } => {
                self.type_char(&glyph.to_string(), events);
                self.apply_feature(&buttons::SPACE, events);
            }
            Feature::WordConnector { glyph, .. } => {
                self.type_char(&glyph.to_string(), events);
                let result = self.session.change_character(Some(*glyph));
                if result != BufferAction::Nothing {
                    self.push_suggestions(events);
                }
            }
            Feature::ShiftToggle { .. } => self.shift_button(events),
        }
    }

    /// Renders the suggestion slots of the current group, top tile first;
    /// slots without a suggestion carry an empty string.
    fn push_suggestions(&mut self, events: &mut Vec<KeyboardEvent>) {
        let group = self.current_group();
        let slot_count = self.layout.suggestion_slots(group);
        if slot_count == 0 {
            return;
        }

        let suggestions = self.session.suggestions();
        let mut slots = Vec::with_capacity(slot_count as usize);
        for index in 0..slot_count {
            let tile = MAX_TILE_INDEX - index;
            let text = suggestions
                .get(index as usize)
                .cloned()
                .unwrap_or_default();
            slots.push((tile, text));
        }
        events.push(KeyboardEvent::SuggestionsChanged(slots));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocomplete::Trie;
    use crate::controller::classifier::BORDER_DEAD_ZONE;
    use chrono::Local;

    fn machine_of(words: &[&str]) -> SelectionMachine {
        let mut trie = Trie::new();
        for word in words {
            trie.search_and_insert(word);
        }
        SelectionMachine::new(
            KeyboardLayout::default_layout(),
            AutocompleteSession::new(trie),
            BORDER_DEAD_ZONE,
        )
        .unwrap()
    }

    // Border position whose normalized angle selects `sector`
    fn stick_at(sector: u8) -> (f32, f32) {
        let raw = (45.0 * sector as f32 - 180.0).to_radians();
        (raw.cos(), raw.sin())
    }

    fn move_stick(machine: &mut SelectionMachine, stick: JoystickType, x: f32, y: f32) -> Vec<KeyboardEvent> {
        machine.process_event(&RawControllerEvent::JoystickMove {
            stick,
            x,
            y,
            timestamp: Local::now(),
        })
    }

    fn select_outer(machine: &mut SelectionMachine, group: u8) -> Vec<KeyboardEvent> {
        let (x, y) = stick_at(group);
        move_stick(machine, JoystickType::Left, x, y)
    }

    // Sweep the inner stick into `tile` and release it
    fn commit_inner(machine: &mut SelectionMachine, tile: u8) -> Vec<KeyboardEvent> {
        let (x, y) = stick_at(tile);
        let mut events = move_stick(machine, JoystickType::Right, x, y);
        events.extend(move_stick(machine, JoystickType::Right, 0.0, 0.0));
        events
    }

    fn press_button(machine: &mut SelectionMachine, button: ButtonType) -> Vec<KeyboardEvent> {
        let press = machine.process_event(&RawControllerEvent::ButtonTransition {
            button: button.clone(),
            value: 1.0,
            timestamp: Local::now(),
        });
        machine.process_event(&RawControllerEvent::ButtonTransition {
            button,
            value: 0.0,
            timestamp: Local::now(),
        });
        press
    }

    fn committed_text(events: &[KeyboardEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                KeyboardEvent::CommitCharacter(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn initialize_selects_group_zero_and_blanks_suggestions() {
        let mut machine = machine_of(&[]);
        let events = machine.initialize();
        assert_eq!(
            events[0],
            KeyboardEvent::SelectionChanged {
                stick: JoystickType::Left,
                sector: Some(0),
            }
        );
        assert_eq!(
            events[1],
            KeyboardEvent::SuggestionsChanged(vec![(7, String::new()), (6, String::new())])
        );
    }

    #[test]
    fn inner_release_commits_a_character() {
        let mut machine = machine_of(&[]);
        // Group 0, tile 0 is "t"
        let events = commit_inner(&mut machine, 0);
        assert_eq!(committed_text(&events), vec!["t".to_string()]);
    }

    #[test]
    fn inner_release_without_selection_commits_nothing() {
        let mut machine = machine_of(&[]);
        // Release straight from the center: the sentinel blocks the commit
        let events = move_stick(&mut machine, JoystickType::Right, 0.0, 0.0);
        assert!(committed_text(&events).is_empty());
    }

    #[test]
    fn outer_change_resets_the_inner_selection() {
        let mut machine = machine_of(&[]);
        let (x, y) = stick_at(2);
        move_stick(&mut machine, JoystickType::Right, x, y);
        move_stick(&mut machine, JoystickType::Right, 0.0, 0.0);

        let events = select_outer(&mut machine, 3);
        assert!(events.contains(&KeyboardEvent::SelectionChanged {
            stick: JoystickType::Right,
            sector: None,
        }));
        // The stale tile from before the group change must not commit
        let events = move_stick(&mut machine, JoystickType::Right, 0.0, 0.0);
        assert!(committed_text(&events).is_empty());
    }

    #[test]
    fn typing_updates_suggestions_with_the_group_exclusion() {
        let mut machine = machine_of(&["the", "there", "them"]);
        machine.initialize();
        // Select group 3 so the group-0 letters are not excluded, then back
        // to group 0: "t" tile 0, "h" tile 3, "e" tile 4
        select_outer(&mut machine, 3);
        select_outer(&mut machine, 0);
        commit_inner(&mut machine, 0);
        commit_inner(&mut machine, 3);
        let events = commit_inner(&mut machine, 4);

        // Group 0 excludes none of 'm'/'r', so both completions survive
        let suggestions = events.iter().rev().find_map(|event| match event {
            KeyboardEvent::SuggestionsChanged(slots) => Some(slots.clone()),
            _ => None,
        });
        assert_eq!(
            suggestions,
            Some(vec![(7, "them".to_string()), (6, "there".to_string())])
        );
    }

    #[test]
    fn committing_a_suggestion_emits_the_remainder_and_a_space() {
        let mut machine = machine_of(&["the", "there", "them"]);
        machine.initialize();
        select_outer(&mut machine, 3);
        select_outer(&mut machine, 0);
        commit_inner(&mut machine, 0); // t
        commit_inner(&mut machine, 3); // h
        commit_inner(&mut machine, 4); // e

        // Tile 7 is suggestion slot 0: "them", already-typed "the" stripped
        let events = commit_inner(&mut machine, 7);
        assert_eq!(committed_text(&events), vec!["m".to_string()]);
        assert!(events.contains(&KeyboardEvent::CommitControl(ControlAction::Space)));
        // The space cleared the buffer, so the slots rerender empty
        assert_eq!(
            events.last(),
            Some(&KeyboardEvent::SuggestionsChanged(vec![
                (7, String::new()),
                (6, String::new()),
            ]))
        );
    }

    #[test]
    fn committing_an_empty_suggestion_slot_does_nothing() {
        let mut machine = machine_of(&[]);
        machine.initialize();
        let events = commit_inner(&mut machine, 7);
        assert!(committed_text(&events).is_empty());
    }

    #[test]
    fn shift_cycle_lower_upper_capslock_lower() {
        let mut machine = machine_of(&[]);
        assert_eq!(machine.shift_state(), ShiftState::Lower);

        press_button(&mut machine, ButtonType::LeftTrigger);
        assert_eq!(machine.shift_state(), ShiftState::Upper);
        assert!(!machine.caps_lock());

        press_button(&mut machine, ButtonType::LeftTrigger);
        assert_eq!(machine.shift_state(), ShiftState::Upper);
        assert!(machine.caps_lock());

        press_button(&mut machine, ButtonType::LeftTrigger);
        assert_eq!(machine.shift_state(), ShiftState::Lower);
        assert!(!machine.caps_lock());
    }

    #[test]
    fn typing_with_caps_off_reverts_shift() {
        let mut machine = machine_of(&[]);
        press_button(&mut machine, ButtonType::LeftTrigger);
        let events = commit_inner(&mut machine, 0);
        assert_eq!(committed_text(&events), vec!["T".to_string()]);
        assert_eq!(machine.shift_state(), ShiftState::Lower);
    }

    #[test]
    fn typing_with_caps_lock_keeps_upper() {
        let mut machine = machine_of(&[]);
        press_button(&mut machine, ButtonType::LeftTrigger);
        press_button(&mut machine, ButtonType::LeftTrigger);
        let events = commit_inner(&mut machine, 0);
        assert_eq!(committed_text(&events), vec!["T".to_string()]);
        assert_eq!(machine.shift_state(), ShiftState::Upper);
    }

    #[test]
    fn caps_lock_uppercases_the_suggestion_remainder() {
        let mut machine = machine_of(&["the", "there", "them"]);
        machine.initialize();
        select_outer(&mut machine, 3);
        select_outer(&mut machine, 0);
        press_button(&mut machine, ButtonType::LeftTrigger);
        press_button(&mut machine, ButtonType::LeftTrigger);
        commit_inner(&mut machine, 0);
        commit_inner(&mut machine, 3);
        commit_inner(&mut machine, 4);

        let events = commit_inner(&mut machine, 7);
        assert_eq!(committed_text(&events), vec!["M".to_string()]);
    }

    #[test]
    fn buttons_fire_on_the_press_edge_only() {
        let mut machine = machine_of(&[]);
        let press = machine.process_event(&RawControllerEvent::ButtonTransition {
            button: ButtonType::Y,
            value: 1.0,
            timestamp: Local::now(),
        });
        assert!(press.contains(&KeyboardEvent::CommitControl(ControlAction::Space)));

        // Still held: a repeated non-zero value does nothing
        let held = machine.process_event(&RawControllerEvent::ButtonTransition {
            button: ButtonType::Y,
            value: 1.0,
            timestamp: Local::now(),
        });
        assert!(held.is_empty());

        // Release does nothing either
        let release = machine.process_event(&RawControllerEvent::ButtonTransition {
            button: ButtonType::Y,
            value: 0.0,
            timestamp: Local::now(),
        });
        assert!(release.is_empty());
    }

    #[test]
    fn punctuation_types_the_glyph_and_a_space() {
        let mut machine = machine_of(&[]);
        let events = press_button(&mut machine, ButtonType::DPadUp);
        assert_eq!(committed_text(&events), vec![",".to_string()]);
        assert!(events.contains(&KeyboardEvent::CommitControl(ControlAction::Space)));
    }

    #[test]
    fn shifted_dpad_selects_the_second_feature() {
        let mut machine = machine_of(&[]);
        press_button(&mut machine, ButtonType::LeftTrigger);
        let events = press_button(&mut machine, ButtonType::DPadUp);
        assert_eq!(committed_text(&events), vec![".".to_string()]);
    }

    #[test]
    fn word_connector_feeds_the_buffer() {
        let mut machine = machine_of(&["e-mail"]);
        machine.initialize();
        select_outer(&mut machine, 3);
        select_outer(&mut machine, 0);
        commit_inner(&mut machine, 4); // e
        let events = press_button(&mut machine, ButtonType::DPadLeft);
        // Unshifted D-pad left is the apostrophe; shift first for hyphen
        assert_eq!(committed_text(&events), vec!["’".to_string()]);

        let suggestions = events.iter().rev().find_map(|event| match event {
            KeyboardEvent::SuggestionsChanged(slots) => Some(slots.clone()),
            _ => None,
        });
        // "e’" matches nothing, but the buffer kept the word going: the
        // slots were re-rendered (empty) rather than left stale
        assert_eq!(
            suggestions,
            Some(vec![(7, String::new()), (6, String::new())])
        );
    }

    #[test]
    fn backspace_button_updates_the_buffer() {
        let mut machine = machine_of(&["the"]);
        machine.initialize();
        select_outer(&mut machine, 3);
        select_outer(&mut machine, 0);
        commit_inner(&mut machine, 0); // t
        let events = press_button(&mut machine, ButtonType::X);
        assert!(events.contains(&KeyboardEvent::CommitControl(ControlAction::Backspace)));
        // Single-character buffer: the backspace cleared it
        assert_eq!(
            events.last(),
            Some(&KeyboardEvent::SuggestionsChanged(vec![
                (7, String::new()),
                (6, String::new()),
            ]))
        );
    }

    #[test]
    fn groups_without_slots_suppress_the_suggestion_query() {
        let mut machine = machine_of(&["the"]);
        machine.initialize();
        let events = select_outer(&mut machine, 5);
        assert!(!events
            .iter()
            .any(|event| matches!(event, KeyboardEvent::SuggestionsChanged(_))));

        // Typing in a slotless group still commits, but renders no slots
        let events = commit_inner(&mut machine, 0);
        assert_eq!(committed_text(&events), vec!["1".to_string()]);
        assert!(!events
            .iter()
            .any(|event| matches!(event, KeyboardEvent::SuggestionsChanged(_))));
    }
}

//! Radial keyboard subsystem
//!
//! Turns classified stick events and button transitions into keyboard output:
//! committed characters, text-control orders, selection highlights and
//! suggestion updates. The [`selection`] state machine holds all mutable
//! state; [`engine`] runs it inside a statum-typed lifecycle.

pub mod buttons;
pub mod engine;
pub mod error;
pub mod layout;
pub mod selection;

// Re-exports for simpler access
pub use engine::{KeyboardEngine, KeyboardEngineHandle, KeyboardEngineState};
pub use error::KeyboardError;
pub use layout::KeyboardLayout;
pub use selection::SelectionMachine;

use crate::controller::event_collector::JoystickType;

/// One-shot shift modifier; caps lock is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftState {
    #[default]
    Lower,
    Upper,
}

impl ShiftState {
    /// Row index into the per-shift tables.
    pub fn index(self) -> usize {
        match self {
            ShiftState::Lower => 0,
            ShiftState::Upper => 1,
        }
    }
}

/// Text-control order forwarded to the display collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Space,
    Backspace,
    MoveLeft,
    MoveRight,
}

/// Output event type of the keyboard engine.
///
/// The display collaborator consumes these synchronously; they replace the
/// signal wiring of a GUI toolkit with an explicit message type.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyboardEvent {
    /// A character (or suggestion remainder) to append to the text.
    CommitCharacter(String),

    /// A cursor move, space or backspace for the text field.
    CommitControl(ControlAction),

    /// A stick selected a new sector, or lost its selection (`None`).
    SelectionChanged {
        stick: JoystickType,
        sector: Option<u8>,
    },

    /// Suggestion slots to render, addressed by tile index; an empty string
    /// means "no suggestion in this slot".
    SuggestionsChanged(Vec<(u8, String)>),

    /// Shift state changed; the current group is included so the display can
    /// re-render the affected tiles.
    ShiftStateChanged { shift: ShiftState, group: u8 },
}

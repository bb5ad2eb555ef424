pub mod autocomplete;
pub mod config;
pub mod controller;
pub mod keyboard;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::autocomplete::{AutocompleteSession, Trie};
use crate::config::Settings;
use crate::controller::event_collector::{CollectorHandle, CollectorSettings};
use crate::keyboard::{
    ControlAction, KeyboardEngineHandle, KeyboardEvent, KeyboardLayout, SelectionMachine,
};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings = Settings::load();
    info!("Starting with settings: {:?}", settings);

    // The dictionary is the one startup step allowed to abort: without it
    // the keyboard cannot provide suggestions
    let trie = match &settings.dictionary_path {
        Some(path) => Trie::from_word_list(path)?,
        None => Trie::from_embedded(),
    };

    let session = AutocompleteSession::new(trie);
    let layout = KeyboardLayout::default_layout();
    let selection = SelectionMachine::new(layout, session, settings.border_dead_zone)
        .map_err(|e| eyre!("Invalid keyboard layout: {}", e))?;

    let mut engine_handle = KeyboardEngineHandle::new("opentyper-keyboard".to_string());
    let (keyboard_events, raw_events) = engine_handle
        .start(selection, settings.channel_capacity)
        .map_err(|e| eyre!("Failed to start keyboard engine: {}", e))?;

    let _collector_handle = CollectorHandle::spawn(Some(CollectorSettings::default()), raw_events)
        .map_err(|e| eyre!("Failed to spawn collector: {}", e))?;

    info!("Keyboard running, feeding the text sink");
    run_text_sink(keyboard_events).await;

    engine_handle.shutdown().await?;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

/// Minimal display collaborator: mirrors committed text and logs the other
/// event kinds. A GUI would consume the same stream.
async fn run_text_sink(mut events: tokio::sync::mpsc::Receiver<KeyboardEvent>) {
    let mut text = String::new();
    let mut cursor = 0usize;

    while let Some(event) = events.recv().await {
        match event {
            KeyboardEvent::CommitCharacter(committed) => {
                text.insert_str(cursor, &committed);
                cursor += committed.len();
                info!("Text: {}", text);
            }
            KeyboardEvent::CommitControl(action) => {
                apply_control(&mut text, &mut cursor, action);
                info!("Text: {}", text);
            }
            KeyboardEvent::SelectionChanged { stick, sector } => {
                debug!("Selection changed: {:?} -> {:?}", stick, sector);
            }
            KeyboardEvent::SuggestionsChanged(slots) => {
                debug!("Suggestions: {:?}", slots);
            }
            KeyboardEvent::ShiftStateChanged { shift, group } => {
                debug!("Shift state: {:?} (group {})", shift, group);
            }
        }
    }
}

fn apply_control(text: &mut String, cursor: &mut usize, action: ControlAction) {
    match action {
        ControlAction::Space => {
            text.insert(*cursor, ' ');
            *cursor += 1;
        }
        ControlAction::Backspace => {
            if let Some((index, removed)) = text[..*cursor].char_indices().next_back() {
                text.remove(index);
                *cursor -= removed.len_utf8();
            }
        }
        ControlAction::MoveLeft => {
            if let Some((index, _)) = text[..*cursor].char_indices().next_back() {
                *cursor = index;
            }
        }
        ControlAction::MoveRight => {
            if let Some(next) = text[*cursor..].chars().next() {
                *cursor += next.len_utf8();
            }
        }
    }
}

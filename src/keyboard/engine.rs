//! Keyboard engine with statum state machine for event processing
//!
//! Wraps the selection machine in a typed lifecycle and runs it inside a
//! tokio task. Events are processed strictly in arrival order, each to
//! completion, before the next one is received.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Configured ──► Active ──► Deactivating ──► Deactivated
//!                     │              │           ▲
//!                     └──────────────┘           │
//!                       (activate)            (shutdown)
//! ```
//!
//! # Architecture
//!
//! ```text
//! RawControllerEvent ──► [SelectionMachine] ──► KeyboardEvent
//!       ▲                                           │
//!       │                                           ▼
//!   Input Channel                             Output Channel
//! ```

use statum::{machine, state};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::controller::event_collector::RawControllerEvent;
use crate::keyboard::selection::SelectionMachine;
use crate::keyboard::{KeyboardError, KeyboardEvent};

/// States for the keyboard engine lifecycle using statum
#[state]
#[derive(Debug, Clone)]
pub enum KeyboardEngineState {
    Initializing, // Setting up engine structure
    Configured,   // Selection machine installed
    Active,       // Processing events in main loop
    Deactivating, // Shutting down gracefully
    Deactivated,  // Fully stopped, ready for cleanup
}

/// Keyboard engine with compile-time state safety via statum
#[machine]
pub struct KeyboardEngine<S: KeyboardEngineState> {
    input_receiver: mpsc::Receiver<RawControllerEvent>,
    output_sender: mpsc::Sender<KeyboardEvent>,
    name: String,
    selection: Option<SelectionMachine>,
}

impl<S: KeyboardEngineState> KeyboardEngine<S> {
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

impl KeyboardEngine<Initializing> {
    pub fn create(
        input_receiver: mpsc::Receiver<RawControllerEvent>,
        output_sender: mpsc::Sender<KeyboardEvent>,
        name: String,
    ) -> Self {
        info!("Initializing new keyboard engine: {}", name);

        Self::new(
            input_receiver,
            output_sender,
            name,
            None, // selection
        )
    }

    /// Installs the selection machine and transitions to Configured state
    pub fn configure(
        mut self,
        selection: SelectionMachine,
    ) -> Result<KeyboardEngine<Configured>, KeyboardError> {
        info!("Configuring keyboard engine: {}", self.name);
        self.selection = Some(selection);
        Ok(self.transition())
    }
}

impl KeyboardEngine<Configured> {
    pub fn activate(self) -> KeyboardEngine<Active> {
        info!("Activating keyboard engine: {}", self.name);
        self.transition()
    }
}

impl KeyboardEngine<Active> {
    /// Sends one keyboard event to the output channel
    pub async fn send_event(&self, event: KeyboardEvent) -> Result<(), KeyboardError> {
        self.output_sender
            .send(event)
            .await
            .map_err(|e| KeyboardError::ChannelError(format!("Failed to send event: {}", e)))
    }

    /// Main processing loop with graceful shutdown support
    ///
    /// Replays the startup coherence pass, then runs until the shutdown
    /// signal arrives or the input channel closes. Every raw event is
    /// processed to completion before the next is received, preserving the
    /// strict ordering the selection state relies on.
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<KeyboardEngine<Deactivating>, KeyboardError> {
        info!("Starting event processing loop for: {}", self.name);

        let startup = match self.selection.as_mut() {
            Some(selection) => selection.initialize(),
            None => {
                return Err(KeyboardError::ConfigError(
                    "No selection machine available".to_string(),
                ))
            }
        };
        for event in startup {
            if let Err(e) = self.send_event(event).await {
                warn!("Failed to send startup event: {}", e);
            }
        }

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received for: {}", self.name);
                    break;
                }

                maybe_event = self.input_receiver.recv() => {
                    match maybe_event {
                        Some(raw_event) => {
                            debug!("Processing raw event: {:?}", raw_event);
                            let outputs = match self.selection.as_mut() {
                                Some(selection) => selection.process_event(&raw_event),
                                None => Vec::new(),
                            };
                            for event in outputs {
                                if let Err(e) = self.send_event(event).await {
                                    warn!("Failed to send event: {}", e);
                                }
                            }
                        }
                        None => {
                            info!("Input channel closed for: {}", self.name);
                            break;
                        }
                    }
                }
            }
        }

        info!("Transitioning to Deactivating state: {}", self.name);
        Ok(self.transition())
    }
}

impl KeyboardEngine<Deactivating> {
    /// Final cleanup and transition to Deactivated state
    pub async fn shutdown(self) -> KeyboardEngine<Deactivated> {
        info!("Engine shut down successfully: {}", self.name);
        self.transition()
    }
}

impl KeyboardEngine<Deactivated> {}

/// Handle for managing the keyboard engine in a tokio task
///
/// Handles task spawning, graceful shutdown, and resource cleanup.
#[derive(Debug)]
pub struct KeyboardEngineHandle {
    pub name: String,

    task_handle: Option<JoinHandle<Result<(), KeyboardError>>>,

    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl KeyboardEngineHandle {
    pub fn new(name: String) -> Self {
        Self {
            name,
            task_handle: None,
            shutdown_tx: None,
        }
    }

    /// Starts the engine in a tokio task and returns communication channels
    ///
    /// # Returns
    ///
    /// * Output receiver for keyboard events
    /// * Input sender for raw controller events
    pub fn start(
        &mut self,
        selection: SelectionMachine,
        channel_capacity: usize,
    ) -> Result<
        (
            mpsc::Receiver<KeyboardEvent>,
            mpsc::Sender<RawControllerEvent>,
        ),
        KeyboardError,
    > {
        let (raw_event_sender, raw_event_receiver) = mpsc::channel(channel_capacity);
        let (keyboard_event_sender, keyboard_event_receiver) = mpsc::channel(channel_capacity);
        let engine_name = self.name.clone();

        let engine = KeyboardEngine::create(
            raw_event_receiver,
            keyboard_event_sender,
            engine_name.clone(),
        )
        .configure(selection)?;

        let active_engine = engine.activate();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);
        let task_handle = tokio::spawn(async move {
            match active_engine.run_until_shutdown(shutdown_rx).await {
                Ok(deactivating_engine) => {
                    info!("Engine entering deactivating state: {}", engine_name);
                    let _ = deactivating_engine.shutdown().await;
                    Ok(())
                }
                Err(e) => {
                    error!("Error running engine: {} - {}", engine_name, e);
                    Err(e)
                }
            }
        });

        self.task_handle = Some(task_handle);

        info!("Keyboard engine activated: {}", self.name);
        Ok((keyboard_event_receiver, raw_event_sender))
    }

    /// Gracefully shuts down the engine and waits for task completion
    pub async fn shutdown(&mut self) -> Result<(), KeyboardError> {
        debug!("Sending shutdown signal to engine: {}", self.name);

        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Engine task already terminated: {}", self.name);
            }
        }

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => {
                    debug!("Engine task completed: {}", self.name);
                    result
                }
                Err(e) => {
                    error!("Engine task panicked: {} - {}", self.name, e);
                    Err(KeyboardError::TaskError(format!(
                        "Engine task panicked: {}",
                        e
                    )))
                }
            }
        } else {
            debug!("Engine already shut down: {}", self.name);
            Ok(())
        }
    }
}

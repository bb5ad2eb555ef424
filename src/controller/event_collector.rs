use chrono::{DateTime, Local};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use serde::{Deserialize, Serialize};
use statum::{machine, state};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// Raw controller event with precise chrono timestamps
#[derive(Debug, Clone)]
pub enum RawControllerEvent {
    JoystickMove {
        stick: JoystickType,
        x: f32,
        y: f32,
        timestamp: DateTime<Local>,
    },
    ButtonTransition {
        button: ButtonType,
        value: f32,
        timestamp: DateTime<Local>,
    },
}

// Joystick type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoystickType {
    Left,
    Right,
}

// Button type
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonType {
    A,
    B,
    X,
    Y,
    Start,
    Select,
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Guide,
}

// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    /// Sleep between polls of the gilrs event queue, in microseconds.
    pub idle_sleep_us: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self { idle_sleep_us: 100 }
    }
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to send event: {0}")]
    EventSendError(String),
}

// Define collector states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    // Active gamepad
    active_gamepad: Option<GamepadId>,

    // Collector settings
    settings: CollectorSettings,

    // Channel for sending events to the keyboard engine
    event_sender: mpsc::Sender<RawControllerEvent>,

    // Last seen stick values, kept so every stick event carries a full
    // (x, y) pair even though gilrs reports one axis at a time
    last_left_stick_x: f32,
    last_left_stick_y: f32,
    last_right_stick_x: f32,
    last_right_stick_y: f32,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }
}

// Implementation for Initializing state
impl EventCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        event_sender: mpsc::Sender<RawControllerEvent>,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(
            gilrs,
            None,
            settings,
            event_sender,
            0.0, // last_left_stick_x
            0.0, // last_left_stick_y
            0.0, // last_right_stick_x
            0.0, // last_right_stick_y
        ))
    }

    // Select an active gamepad and transition to Collecting state
    pub fn initialize(mut self) -> Result<EventCollector<Collecting>, CollectorError> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, continuing in idle mode");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!("  [{}] ID: {}, Name: {}", idx, id, gamepad.name());
            }
            let (id, gamepad) = &gamepads[0];
            self.active_gamepad = Some(*id);
            info!("Selected gamepad: {} ({})", gamepad.name(), id);
        }

        info!("Event Collector initialized, transitioning to Collecting state");
        Ok(self.transition())
    }
}

// Implementation for Collecting state
impl EventCollector<Collecting> {
    // Collect a single event and send it to the queue
    pub fn collect_next_event(&mut self) -> Result<(), CollectorError> {
        if let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            // Only process events from the active gamepad if one is set
            if let Some(active_id) = self.active_gamepad {
                if id != active_id {
                    debug!("Skipping event from non-active gamepad: {:?}", id);
                    return Ok(());
                }
            }

            if let Some(raw_event) = self.convert_gilrs_event(event) {
                match &raw_event {
                    RawControllerEvent::ButtonTransition {
                        button,
                        value,
                        timestamp,
                    } => {
                        info!(
                            "Button transition: {:?} = {:.2} at {}",
                            button,
                            value,
                            timestamp.format("%H:%M:%S.%3f")
                        );
                    }
                    _ => debug!("Captured event: {:?}", raw_event),
                }

                match self.event_sender.try_send(raw_event) {
                    Ok(_) => debug!("Event sent to keyboard engine"),
                    Err(e) => {
                        error!("Failed to send event to keyboard engine: {}", e);
                        return Err(CollectorError::EventSendError(e.to_string()));
                    }
                }
            } else {
                debug!("Event ignored due to filtering or mapping");
            }
        }

        Ok(())
    }

    // Run the collector in a loop
    pub fn run_collection_loop(&mut self) -> Result<(), CollectorError> {
        info!("Starting Event Collector loop");

        // For performance monitoring
        let mut event_count = 0;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);
        let idle_sleep = std::time::Duration::from_micros(self.settings.idle_sleep_us);

        loop {
            if let Err(e) = self.collect_next_event() {
                error!("Error collecting event: {}", e);
                // Continue despite errors to maintain the loop
            } else {
                event_count += 1;
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Event Collector stats: {} polls in last {} seconds",
                    event_count,
                    log_interval.num_seconds()
                );
                event_count = 0;
                last_log_time = now;
            }

            // Small sleep to prevent 100% CPU usage
            std::thread::sleep(idle_sleep);
        }
    }

    // Convert a gilrs event to the internal raw event type
    //
    // Axis values are forwarded raw: the radial classifier downstream applies
    // its own border dead zone, and rescaled values would shift its threshold.
    fn convert_gilrs_event(&mut self, event: EventType) -> Option<RawControllerEvent> {
        let now = Local::now();

        match event {
            EventType::AxisChanged(axis, value, _) => {
                debug!("Axis changed: {:?} = {:.4}", axis, value);

                match axis {
                    Axis::LeftStickX => {
                        self.last_left_stick_x = value;
                        Some(RawControllerEvent::JoystickMove {
                            stick: JoystickType::Left,
                            x: value,
                            y: self.last_left_stick_y,
                            timestamp: now,
                        })
                    }
                    Axis::LeftStickY => {
                        self.last_left_stick_y = value;
                        Some(RawControllerEvent::JoystickMove {
                            stick: JoystickType::Left,
                            x: self.last_left_stick_x,
                            y: value,
                            timestamp: now,
                        })
                    }
                    Axis::RightStickX => {
                        self.last_right_stick_x = value;
                        Some(RawControllerEvent::JoystickMove {
                            stick: JoystickType::Right,
                            x: value,
                            y: self.last_right_stick_y,
                            timestamp: now,
                        })
                    }
                    Axis::RightStickY => {
                        self.last_right_stick_y = value;
                        Some(RawControllerEvent::JoystickMove {
                            stick: JoystickType::Right,
                            x: self.last_right_stick_x,
                            y: value,
                            timestamp: now,
                        })
                    }
                    _ => {
                        debug!("Ignoring unsupported axis: {:?}", axis);
                        None
                    }
                }
            }
            EventType::ButtonPressed(button, _) => {
                map_button(button).map(|button| RawControllerEvent::ButtonTransition {
                    button,
                    value: 1.0,
                    timestamp: now,
                })
            }
            EventType::ButtonReleased(button, _) => {
                map_button(button).map(|button| RawControllerEvent::ButtonTransition {
                    button,
                    value: 0.0,
                    timestamp: now,
                })
            }
            EventType::ButtonChanged(button, value, _) => {
                // Analog trigger levels; digital buttons already arrive as
                // Pressed/Released
                match button {
                    Button::LeftTrigger2 | Button::RightTrigger2 => {
                        map_button(button).map(|button| RawControllerEvent::ButtonTransition {
                            button,
                            value,
                            timestamp: now,
                        })
                    }
                    _ => None,
                }
            }
            EventType::ButtonRepeated(button, _) => {
                debug!("Button repeat ignored: {:?}", button);
                None
            }
            EventType::Connected => {
                info!("Controller connected event detected");
                None
            }
            EventType::Disconnected => {
                warn!("Controller disconnected event detected");
                None
            }
            _ => {
                debug!("Unhandled event type: {:?}", event);
                None
            }
        }
    }
}

// Public interface for spawning and running the collector
pub struct CollectorHandle {
    event_sender: mpsc::Sender<RawControllerEvent>,
}

impl CollectorHandle {
    // Create a new collector and spawn it on a blocking thread
    pub fn spawn(
        settings: Option<CollectorSettings>,
        event_sender: mpsc::Sender<RawControllerEvent>,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);

        let sender_clone = event_sender.clone();
        let collector = EventCollector::create(settings, event_sender)?;

        let task_handle = tokio::task::spawn_blocking(move || match collector.initialize() {
            Ok(mut collecting) => {
                if let Err(e) = collecting.run_collection_loop() {
                    error!("Collector task terminated with error: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to initialize Event Collector: {}", e);
            }
        });

        debug!("Collector task spawned with handle: {:?}", task_handle);
        info!("Event Collector successfully started");

        Ok(Self {
            event_sender: sender_clone,
        })
    }

    // Get a sender for raw events
    pub fn event_sender(&self) -> mpsc::Sender<RawControllerEvent> {
        self.event_sender.clone()
    }
}

// Helper function to map gilrs Button to our ButtonType
fn map_button(button: Button) -> Option<ButtonType> {
    match button {
        Button::South => Some(ButtonType::A),
        Button::East => Some(ButtonType::B),
        Button::West => Some(ButtonType::X),
        Button::North => Some(ButtonType::Y),
        Button::Start => Some(ButtonType::Start),
        Button::Select => Some(ButtonType::Select),
        Button::LeftTrigger => Some(ButtonType::LeftBumper),
        Button::RightTrigger => Some(ButtonType::RightBumper),
        Button::LeftTrigger2 => Some(ButtonType::LeftTrigger),
        Button::RightTrigger2 => Some(ButtonType::RightTrigger),
        Button::LeftThumb => Some(ButtonType::LeftStick),
        Button::RightThumb => Some(ButtonType::RightStick),
        Button::DPadUp => Some(ButtonType::DPadUp),
        Button::DPadDown => Some(ButtonType::DPadDown),
        Button::DPadLeft => Some(ButtonType::DPadLeft),
        Button::DPadRight => Some(ButtonType::DPadRight),
        Button::Mode => Some(ButtonType::Guide),
        _ => None,
    }
}

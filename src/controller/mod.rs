//! Controller subsystem for gamepad input handling
//!
//! 1. [`event_collector`] - Raw gamepad input collection
//! 2. [`classifier`] - Radial classification of stick positions
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Collector ──► RawControllerEvent ──► Keyboard engine
//!             (gilrs)       (mpsc queue)           (classifiers live there)
//! ```
//!
//! The collector is the only thread touching hardware; every event it emits
//! is funneled through a single serializing queue, so downstream state needs
//! no locking.

pub mod classifier;
pub mod event_collector;

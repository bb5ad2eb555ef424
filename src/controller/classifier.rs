//! Radial classification of analog stick positions
//!
//! Converts the continuous `(x, y)` stream of one joystick into discrete,
//! edge-triggered events: sector changes while the stick rides the border,
//! and a release event when it falls back to the center.

use tracing::debug;

/// Deadzone around the stick border.
///
/// Mainly needed to compensate factory defaults of controllers: a Nintendo
/// Switch Pro stick can read a radius of 0.99 at its mechanical limit. The
/// generous value also absorbs the stick dipping slightly inward while the
/// user sweeps along the border.
pub const BORDER_DEAD_ZONE: f32 = 0.3;

/// Radius of a stick pushed all the way to the border.
const BORDER_RADIUS: f32 = 1.0;

/// Stored angle value marking "no valid angle since the last sector change".
const ANGLE_SENTINEL: f32 = -1.0;

/// Number of angular sectors the border is divided into.
pub const SECTOR_COUNT: u8 = 8;

/// Width of one sector in degrees.
const SECTOR_WIDTH: f32 = 360.0 / SECTOR_COUNT as f32;

/// Binary radius classification of a stick's deflection magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiusState {
    Center,
    Border,
}

/// Discrete event produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadialEvent {
    /// The stick entered a new sector while at the border.
    SectorChanged(u8),

    /// The stick fell from the border back to the center.
    Released,
}

/// Per-stick classifier state.
///
/// Feed it raw axis samples via [`RadialClassifier::sample`]; it answers with
/// at most one event per sample. Repeated samples inside the same sector, or
/// anywhere in the center region, produce nothing.
#[derive(Debug, Clone)]
pub struct RadialClassifier {
    x: f32,
    y: f32,

    // Last computed angle in degrees, ANGLE_SENTINEL after a sector change
    angle: f32,

    radius: RadiusState,

    // None is the "no selection" sentinel
    sector: Option<u8>,

    dead_zone: f32,
}

impl RadialClassifier {
    pub fn new(dead_zone: f32, initial_sector: Option<u8>) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: ANGLE_SENTINEL,
            radius: RadiusState::Center,
            sector: initial_sector,
            dead_zone,
        }
    }

    /// Currently selected sector, `None` when reset.
    pub fn sector(&self) -> Option<u8> {
        self.sector
    }

    pub fn radius(&self) -> RadiusState {
        self.radius
    }

    /// Installs the "no selection" sentinel.
    pub fn reset_sector(&mut self) {
        self.sector = None;
    }

    /// Processes one raw axis sample and returns the resulting event, if any.
    pub fn sample(&mut self, x: f32, y: f32) -> Option<RadialEvent> {
        self.x = x;
        self.y = y;

        let radius = self.normalize_radius();
        let event = if radius == RadiusState::Border {
            self.update_angle()
        } else {
            self.released(radius)
        };
        self.radius = radius;
        event
    }

    /// Classifies the current deflection magnitude.
    ///
    /// The raw radius varies across controllers and angles due to drift and
    /// manufacturing imperfections; the dead zone normalizes it into a clean
    /// border/center decision.
    fn normalize_radius(&self) -> RadiusState {
        let radius = (self.x.powi(2) + self.y.powi(2)).sqrt();
        if radius >= BORDER_RADIUS - self.dead_zone {
            RadiusState::Border
        } else {
            RadiusState::Center
        }
    }

    fn update_angle(&mut self) -> Option<RadialEvent> {
        // atan2 yields [-180, 180]; shifting by a half circle gives [0, 360]
        let angle = self.y.atan2(self.x).to_degrees() + 180.0;
        self.angle = angle;
        self.update_sector()
    }

    fn update_sector(&mut self) -> Option<RadialEvent> {
        // The half-sector offset centers sector 0 on 0 degrees
        let moved_angle = (self.angle + SECTOR_WIDTH / 2.0) % 360.0;
        let new_sector = (moved_angle / SECTOR_WIDTH) as u8 % SECTOR_COUNT;

        if self.sector != Some(new_sector) {
            debug!("Sector change: {:?} -> {}", self.sector, new_sector);
            self.sector = Some(new_sector);
            // Invalidate the angle so returning to the same literal angle
            // after passing through other sectors still re-triggers
            self.angle = ANGLE_SENTINEL;
            Some(RadialEvent::SectorChanged(new_sector))
        } else {
            None
        }
    }

    /// The stick emits redundant X and Y signals while settling back to the
    /// center; comparing against the stored radius state collapses them so a
    /// single physical release produces a single event.
    fn released(&self, new_radius: RadiusState) -> Option<RadialEvent> {
        if new_radius != self.radius {
            debug!("Stick released");
            Some(RadialEvent::Released)
        } else {
            None
        }
    }
}

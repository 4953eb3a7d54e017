//! Bloink - bouncing balls that play notes
//!
//! Core modules:
//! - `sim`: Deterministic simulation (balls, blocks, scales, collisions)
//! - `driver`: Start/stop state machine and between-tick command queue
//! - `renderer`: Drawing surface abstraction (text grid natively, 2D canvas on web)
//! - `audio`: Per-ball voices and synth backends
//! - `platform`: Tick scheduling and browser glue
//! - `settings`: Data-driven configuration

pub mod audio;
pub mod controls;
pub mod driver;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use driver::{Command, RunPhase, Simulation};
pub use error::{InitError, ScaleError, SettingsError};
pub use settings::Settings;

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed tick period in milliseconds
    pub const TICK_PERIOD_MS: u32 = 50;

    /// Reference minimum drawing surface (the engine itself accepts any positive size)
    pub const ARENA_MIN_WIDTH: f32 = 400.0;
    pub const ARENA_MIN_HEIGHT: f32 = 200.0;

    /// Distance from the arena edge at which a ball bounces
    pub const BORDER_MARGIN: f32 = 3.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 5.0;
    pub const BALL_START_SPEED: i32 = 2;
    pub const BALL_MIN_SPEED: i32 = 1;
    pub const BALL_MAX_SPEED: i32 = 6;
    /// Proximity box half-width for ball-ball contact (~1.6 radii)
    pub const HIT_DISTANCE: f32 = 8.0;

    /// Pixels per semitone on the vertical axis
    pub const NOTE_PIXELS: f32 = 6.0;
    /// Note played at the bottom of the arena
    pub const NOTE_BASE: i32 = 30;

    /// Interactive block size range (width and height drawn independently)
    pub const BLOCK_MIN_SIZE: f32 = 5.0;
    pub const BLOCK_MAX_SIZE: f32 = 55.0;

    /// Initial block bands
    pub const BAND_SPACING: f32 = 30.0;
    pub const BAND_EDGE_OFFSET: f32 = 50.0;
    pub const BAND_JITTER: f32 = 50.0;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Component-wise sum of two coordinates
#[inline]
pub fn add_coords(a: Vec2, b: Vec2) -> Vec2 {
    a + b
}

/// Inclusive containment test for an axis-aligned rectangle
/// given by its component-wise minimum and maximum corners
#[inline]
pub fn rect_contains(bottom_left: Vec2, top_right: Vec2, point: Vec2) -> bool {
    bottom_left.x <= point.x
        && point.x <= top_right.x
        && bottom_left.y <= point.y
        && point.y <= top_right.y
}

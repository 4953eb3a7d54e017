//! Error types
//!
//! Everything that can fail does so at startup. Once a simulation is built,
//! ticking is plain arithmetic and has no error path.

use thiserror::Error;

/// Invalid scale membership pattern
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    #[error("pattern must have 13 entries (12 semitones plus octave sentinel), got {0}")]
    WrongLength(usize),
    #[error("pattern has no member notes")]
    NoMembers,
    #[error("octave sentinel (entry 12) must equal the root (entry 0)")]
    SentinelMismatch,
}

/// Configuration could not be loaded or is out of range
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Fatal startup failure
#[derive(Debug, Error)]
pub enum InitError {
    #[error("arena must have positive dimensions, got {width}x{height}")]
    InvalidArena { width: f32, height: f32 },
    #[error("at least one ball is required")]
    NoBalls,
    #[error("ball `{name}`: {reason}")]
    InvalidBall { name: String, reason: String },
    #[error("unknown scale `{0}`")]
    UnknownScale(String),
    #[error("scale `{name}`: {source}")]
    InvalidScale {
        name: String,
        #[source]
        source: ScaleError,
    },
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("no element with id `{0}`")]
    MissingElement(String),
    #[error("canvas is {width}x{height}, minimum is {min_width}x{min_height}")]
    CanvasTooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
    #[error("drawing surface unavailable: {0}")]
    Surface(String),
    #[error("audio unavailable: {0}")]
    Audio(String),
}

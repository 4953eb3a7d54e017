//! Simulation settings
//!
//! Persisted in LocalStorage on the web; natively read from an optional JSON file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;
use crate::sim::{BUILTIN_SCALES, Rgb};

/// One ball of the roster together with its voice configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallSettings {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub color: Rgb,
    /// Instrument / timbre (0-127)
    pub program: u8,
    /// Speed magnitude per tick
    pub speed: i32,
    /// Note velocity (0-127)
    pub volume: u8,
    /// Note length in seconds
    pub delay: f32,
}

impl BallSettings {
    fn reference(name: &str, x: f32, color: Rgb, program: u8) -> Self {
        Self {
            name: name.to_string(),
            x,
            y: 200.0,
            color,
            program,
            speed: BALL_START_SPEED,
            volume: 50,
            delay: 0.5,
        }
    }
}

/// Initial block bands along the top and bottom edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandSettings {
    pub enabled: bool,
    /// Horizontal distance between block centres
    pub spacing: f32,
    /// Distance from the arena edge to the near side of the band
    pub edge_offset: f32,
    /// Height of the band within which centres are randomised
    pub jitter: f32,
}

impl Default for BandSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            spacing: BAND_SPACING,
            edge_offset: BAND_EDGE_OFFSET,
            jitter: BAND_JITTER,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub arena_width: f32,
    pub arena_height: f32,
    /// Milliseconds between ticks
    pub tick_period_ms: u32,
    /// Fixed RNG seed; a time-based seed is used when absent
    pub seed: Option<u64>,
    /// Scale selected at startup
    pub scale: String,
    /// Extra scales as 13-entry 0/1 patterns (entry 12 repeats entry 0)
    pub custom_scales: BTreeMap<String, Vec<u8>>,
    pub balls: Vec<BallSettings>,
    pub blocks: BandSettings,
    /// Start ticking immediately instead of waiting for an explicit start
    pub autostart: bool,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena_width: 900.0,
            arena_height: 400.0,
            tick_period_ms: TICK_PERIOD_MS,
            seed: None,
            scale: "major".to_string(),
            custom_scales: BTreeMap::new(),
            balls: vec![
                BallSettings::reference("redball", 200.0, Rgb::RED, 0),
                BallSettings::reference("greenball", 300.0, Rgb::GREEN, 24),
                BallSettings::reference("blueball", 360.0, Rgb::BLUE, 44),
            ],
            blocks: BandSettings::default(),
            autostart: false,
            muted: false,
        }
    }
}

impl Settings {
    /// Check ranges that serde cannot express
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |field: &'static str, reason: String| SettingsError::Invalid { field, reason };

        if !(self.arena_width > 0.0 && self.arena_height > 0.0) {
            return Err(invalid(
                "arena",
                format!("{}x{} is not a positive size", self.arena_width, self.arena_height),
            ));
        }
        if self.tick_period_ms == 0 {
            return Err(invalid("tick_period_ms", "must be at least 1".into()));
        }
        for ball in &self.balls {
            if !(BALL_MIN_SPEED..=BALL_MAX_SPEED).contains(&ball.speed) {
                return Err(invalid(
                    "balls.speed",
                    format!(
                        "{}: {} not in {}..={}",
                        ball.name, ball.speed, BALL_MIN_SPEED, BALL_MAX_SPEED
                    ),
                ));
            }
            if ball.volume > 127 || ball.program > 127 {
                return Err(invalid(
                    "balls.volume",
                    format!("{}: volume and program must be 0..=127", ball.name),
                ));
            }
            if !(0.05..=1.0).contains(&ball.delay) {
                return Err(invalid(
                    "balls.delay",
                    format!("{}: {} not in 0.05..=1.0", ball.name, ball.delay),
                ));
            }
        }
        if self.balls.len() > u8::MAX as usize {
            return Err(invalid("balls", "too many balls for voice channels".into()));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Whether `name` is a built-in or one of `custom_scales`
    pub fn knows_scale(&self, name: &str) -> bool {
        BUILTIN_SCALES.iter().any(|(builtin, _)| *builtin == name)
            || self.custom_scales.contains_key(name)
    }

    /// Parse previously saved settings. A saved scale that no longer exists
    /// falls back to the default one instead of failing startup.
    pub fn from_stored_json(json: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::from_json(json)?;
        if !settings.knows_scale(&settings.scale) {
            let fallback = Self::default().scale;
            log::warn!(
                "Stored scale {:?} is unknown, using {:?}",
                settings.scale,
                fallback
            );
            settings.scale = fallback;
        }
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "bloink_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_stored_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

//! Simulation state and core entity types
//!
//! Everything a tick reads or writes lives in [`SimState`]. It is built once
//! from [`Settings`] and then only mutated by [`super::tick`] and by the
//! between-tick edits exposed here (block toggling, speed changes).

use std::fmt;

use glam::{IVec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::block::Block;
use super::collision::{balls_touching, border_flip, flip_axes, pair_flip};
use super::scale::{Scale, ScaleKeeper};
use crate::consts::*;
use crate::error::InitError;
use crate::settings::Settings;

/// Colour string was not `#rrggbb`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid colour {0:?}, expected #rrggbb")]
pub struct ColorParseError(pub String);

/// 24-bit display colour, serialised as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(0xff, 0x00, 0x00);
    pub const GREEN: Rgb = Rgb::new(0x00, 0xff, 0x00);
    pub const BLUE: Rgb = Rgb::new(0x00, 0x00, 0xff);
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Uniformly random colour
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::new(rng.random(), rng.random(), rng.random())
    }

    pub fn parse(s: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgb::parse(&s)
    }
}

/// Fixed-size playfield `[0, width] x [0, height]`, y pointing down
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Result<Self, InitError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(InitError::InvalidArena { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn contains(&self, point: Vec2) -> bool {
        crate::rect_contains(Vec2::ZERO, Vec2::new(self.width, self.height), point)
    }
}

/// What a ball bounced off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BounceKind {
    Wall,
    Ball,
    Block,
}

/// A note request produced by a bounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub tick: u64,
    pub ball_id: u32,
    /// Output channel of the ball's voice
    pub channel: u8,
    /// Unquantized pitch from the vertical position
    pub raw: i32,
    /// Pitch snapped to the active scale
    pub note: i32,
    pub cause: BounceKind,
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub name: String,
    /// Voice channel, fixed at construction
    pub channel: u8,
    pub pos: Vec2,
    /// Integer velocity with `|x| == |y|`
    pub vel: IVec2,
    pub radius: f32,
    pub color: Rgb,
}

impl Ball {
    pub fn new(id: u32, channel: u8, name: impl Into<String>, pos: Vec2, color: Rgb) -> Self {
        Self {
            id,
            name: name.into(),
            channel,
            pos,
            vel: IVec2::splat(BALL_START_SPEED),
            radius: BALL_RADIUS,
            color,
        }
    }

    /// Advance one tick
    #[inline]
    pub fn advance(&mut self) {
        self.pos = crate::add_coords(self.pos, self.vel.as_vec2());
    }

    /// Bounce off the arena edges using the current (post-move) position.
    /// Returns true if either axis flipped; a corner hit still counts once.
    pub fn detect_border_collision(&mut self, arena: &Arena) -> bool {
        let axes = border_flip(self.pos, arena.width, arena.height);
        if axes.any() {
            self.vel = flip_axes(self.vel, axes);
            true
        } else {
            false
        }
    }

    /// Resolve contact with another ball. Both balls flip the same axes.
    pub fn handle_pair_collision(&mut self, other: &mut Ball) -> bool {
        if !balls_touching(self.pos, other.pos) {
            return false;
        }
        let axes = pair_flip(self.pos - other.pos, self.vel, other.vel);
        if !axes.any() {
            return false;
        }
        self.vel = flip_axes(self.vel, axes);
        other.vel = flip_axes(other.vel, axes);
        true
    }

    /// Bounce off the first block (in insertion order) that reports a hit.
    /// Later blocks are not consulted this tick.
    pub fn bounce_on_blocks(&mut self, blocks: &[Block]) -> bool {
        blocks.iter().any(|block| block.bounces(self))
    }

    /// Linear pitch from height: bottom edge is [`NOTE_BASE`], one semitone
    /// per [`NOTE_PIXELS`] upward
    pub fn raw_note(&self, arena: &Arena) -> i32 {
        ((arena.height - self.pos.y) / NOTE_PIXELS).floor() as i32 + NOTE_BASE
    }

    /// Build the note event for a bounce at the current position
    pub fn note(&self, arena: &Arena, scales: &ScaleKeeper, tick: u64, cause: BounceKind) -> NoteEvent {
        let raw = self.raw_note(arena);
        NoteEvent {
            tick,
            ball_id: self.id,
            channel: self.channel,
            raw,
            note: scales.adjust_to_current_scale(raw),
            cause,
        }
    }

    /// Current speed magnitude
    pub fn speed(&self) -> i32 {
        self.vel.x.abs()
    }

    /// Change speed magnitude keeping each axis's direction.
    ///
    /// Requests below `BALL_MIN_SPEED` are raised to it so a ball can never
    /// freeze. Returns the applied speed.
    pub fn set_speed(&mut self, speed: i32) -> i32 {
        let speed = speed.max(BALL_MIN_SPEED);
        let sign = |v: i32| if v < 0 { -1 } else { 1 };
        self.vel = IVec2::new(speed * sign(self.vel.x), speed * sign(self.vel.y));
        speed
    }
}

/// Resolve every unordered pair once, in roster order.
/// Returns the index pairs that bounced.
pub fn handle_all_collisions(balls: &mut [Ball]) -> Vec<(usize, usize)> {
    let mut hits = Vec::new();
    for j in 1..balls.len() {
        let (head, tail) = balls.split_at_mut(j);
        let b = &mut tail[0];
        for (i, a) in head.iter_mut().enumerate() {
            if a.handle_pair_collision(b) {
                hits.push((i, j));
            }
        }
    }
    hits
}

/// Result of a pointer edit on the block collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEdit {
    Removed(u32),
    Created(u32),
}

/// Serialisable view of the world for diagnostics
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub tick: u64,
    pub scale: &'a str,
    pub balls: &'a [Ball],
    pub blocks: &'a [Block],
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct SimState {
    pub arena: Arena,
    /// Fixed roster, iterated in order every tick
    pub balls: Vec<Ball>,
    /// Insertion-ordered; only [`SimState::remove_or_create_at`] changes membership
    pub blocks: Vec<Block>,
    pub scales: ScaleKeeper,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    next_id: u32,
}

impl SimState {
    /// Empty world: no balls, no blocks, chromatic scale
    pub fn empty(arena: Arena, seed: u64) -> Self {
        Self {
            arena,
            balls: Vec::new(),
            blocks: Vec::new(),
            scales: ScaleKeeper::new(),
            time_ticks: 0,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Build the configured world, including the initial block bands
    pub fn new(settings: &Settings, seed: u64) -> Result<Self, InitError> {
        let arena = Arena::new(settings.arena_width, settings.arena_height)?;
        if settings.balls.is_empty() {
            return Err(InitError::NoBalls);
        }

        let mut state = Self::empty(arena, seed);

        for (name, pattern) in &settings.custom_scales {
            let scale = Scale::from_pattern(pattern).map_err(|source| InitError::InvalidScale {
                name: name.clone(),
                source,
            })?;
            state.scales.insert(name.clone(), scale);
        }
        if !state.scales.set_current(&settings.scale) {
            return Err(InitError::UnknownScale(settings.scale.clone()));
        }

        for cfg in &settings.balls {
            let pos = Vec2::new(cfg.x, cfg.y);
            if !arena.contains(pos) {
                return Err(InitError::InvalidBall {
                    name: cfg.name.clone(),
                    reason: format!("start ({}, {}) is outside the arena", cfg.x, cfg.y),
                });
            }
            let idx = state.add_ball(cfg.name.clone(), pos, cfg.color);
            state.balls[idx].set_speed(cfg.speed);
        }

        if settings.blocks.enabled {
            super::tick::populate_block_bands(&mut state, &settings.blocks);
        }

        log::info!(
            "World ready: {}x{} arena, {} balls, {} blocks, scale {}, seed {}",
            arena.width,
            arena.height,
            state.balls.len(),
            state.blocks.len(),
            state.scales.current_name(),
            seed
        );
        Ok(state)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a ball on the next free voice channel; returns its roster index
    pub fn add_ball(&mut self, name: impl Into<String>, pos: Vec2, color: Rgb) -> usize {
        let id = self.next_entity_id();
        let channel = self.balls.len() as u8;
        self.balls.push(Ball::new(id, channel, name, pos, color));
        self.balls.len() - 1
    }

    /// Append a block as-is (no toggling)
    pub fn add_block(&mut self, a: Vec2, b: Vec2, color: Rgb) -> u32 {
        let id = self.next_entity_id();
        self.blocks.push(Block::new(id, a, b, color));
        id
    }

    /// Delete the oldest block containing `point`, or create a random block
    /// centred there if none does
    pub fn remove_or_create_at(&mut self, point: Vec2) -> BlockEdit {
        if let Some(idx) = self.blocks.iter().position(|b| b.contains(point)) {
            let removed = self.blocks.remove(idx);
            log::debug!("Removed block {} at ({}, {})", removed.id, point.x, point.y);
            return BlockEdit::Removed(removed.id);
        }

        let id = self.next_entity_id();
        let block = Block::random_at(id, point, &mut self.rng);
        log::debug!(
            "Created block {} {:?}..{:?} {}",
            id,
            block.bottom_left,
            block.top_right,
            block.color
        );
        self.blocks.push(block);
        BlockEdit::Created(id)
    }

    pub fn ball_index(&self, id: u32) -> Option<usize> {
        self.balls.iter().position(|b| b.id == id)
    }

    /// Change a ball's speed; returns the applied (clamped) value
    pub fn set_ball_speed(&mut self, id: u32, speed: i32) -> Option<i32> {
        let idx = self.ball_index(id)?;
        let applied = self.balls[idx].set_speed(speed);
        if applied != speed {
            log::warn!("Speed {} for ball {} clamped to {}", speed, id, applied);
        }
        Some(applied)
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            tick: self.time_ticks,
            scale: self.scales.current_name(),
            balls: &self.balls,
            blocks: &self.blocks,
        }
    }
}

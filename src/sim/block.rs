//! Rectangular obstacles

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{block_flip, flip_axes};
use super::state::{Ball, Rgb};
use crate::consts::{BLOCK_MAX_SIZE, BLOCK_MIN_SIZE};
use crate::rect_contains;

/// An axis-aligned block. Geometry never changes after creation.
///
/// `bottom_left` and `top_right` are the component-wise minimum and maximum
/// corners in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    pub bottom_left: Vec2,
    pub top_right: Vec2,
    pub color: Rgb,
}

impl Block {
    /// Block from two corners in any order
    pub fn new(id: u32, a: Vec2, b: Vec2, color: Rgb) -> Self {
        Self {
            id,
            bottom_left: a.min(b),
            top_right: a.max(b),
            color,
        }
    }

    /// Block of the given size centred on `center`
    pub fn centered(id: u32, center: Vec2, size: Vec2, color: Rgb) -> Self {
        let half = size.abs() / 2.0;
        Self::new(id, center - half, center + half, color)
    }

    /// Randomly sized, randomly coloured block centred on `center`
    pub fn random_at<R: Rng>(id: u32, center: Vec2, rng: &mut R) -> Self {
        let size = Vec2::new(
            rng.random_range(BLOCK_MIN_SIZE..=BLOCK_MAX_SIZE),
            rng.random_range(BLOCK_MIN_SIZE..=BLOCK_MAX_SIZE),
        );
        Self::centered(id, center, size, Rgb::random(rng))
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.top_right - self.bottom_left
    }

    /// Inclusive point containment
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        rect_contains(self.bottom_left, self.top_right, point)
    }

    /// Flip the ball's velocity on every axis whose single-axis step would
    /// enter this block. Returns true if anything flipped.
    ///
    /// Does not play a note; the caller emits one per ball per tick.
    pub fn bounces(&self, ball: &mut Ball) -> bool {
        let axes = block_flip(ball.pos, ball.vel, self.bottom_left, self.top_right);
        if axes.any() {
            ball.vel = flip_axes(ball.vel, axes);
            true
        } else {
            false
        }
    }
}

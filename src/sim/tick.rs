//! Fixed-period simulation tick
//!
//! Advances the world by one discrete step. The phase order is part of the
//! behaviour: later phases read positions and velocities written by earlier ones.

use glam::Vec2;
use rand::Rng;

use super::state::{BounceKind, NoteEvent, SimState, handle_all_collisions};
use crate::settings::BandSettings;

/// Advance the world one tick and return the notes it triggered, in order.
///
/// 1. move every ball
/// 2. arena border bounces
/// 3. ball-ball bounces (each unordered pair once)
/// 4. block bounces (first hit block per ball)
///
/// A ball sounds at most once per tick, for the first phase in which it
/// bounced; later bounces still flip its velocity silently. Rendering is the
/// caller's step 5.
pub fn tick(state: &mut SimState) -> Vec<NoteEvent> {
    state.time_ticks += 1;
    let now = state.time_ticks;
    let mut notes = Vec::new();
    let mut sounded = vec![false; state.balls.len()];

    for ball in &mut state.balls {
        ball.advance();
    }

    for (idx, ball) in state.balls.iter_mut().enumerate() {
        if ball.detect_border_collision(&state.arena) {
            sounded[idx] = true;
            notes.push(ball.note(&state.arena, &state.scales, now, BounceKind::Wall));
        }
    }

    for (i, j) in handle_all_collisions(&mut state.balls) {
        for idx in [i, j] {
            if !std::mem::replace(&mut sounded[idx], true) {
                let ball = &state.balls[idx];
                notes.push(ball.note(&state.arena, &state.scales, now, BounceKind::Ball));
            }
        }
    }

    for (idx, ball) in state.balls.iter_mut().enumerate() {
        if ball.bounce_on_blocks(&state.blocks) && !sounded[idx] {
            sounded[idx] = true;
            notes.push(ball.note(&state.arena, &state.scales, now, BounceKind::Block));
        }
    }

    if !notes.is_empty() {
        log::trace!("Tick {}: {} notes", now, notes.len());
    }
    notes
}

/// Lay down two horizontal bands of random blocks, one below the top edge and
/// one above the bottom edge. Placement goes through
/// [`SimState::remove_or_create_at`], so overlapping picks may cancel out.
pub fn populate_block_bands(state: &mut SimState, bands: &BandSettings) {
    if bands.spacing <= 0.0 {
        log::warn!("Block band spacing {} is not positive, skipping", bands.spacing);
        return;
    }

    let width = state.arena.width;
    let height = state.arena.height;
    let columns = (width / bands.spacing).floor() as u32;
    let jitter = bands.jitter.max(0.0);

    for i in 0..=columns {
        let x = i as f32 * bands.spacing;

        let top_y = (bands.edge_offset + jitter_offset(state, jitter)).floor();
        state.remove_or_create_at(Vec2::new(x, top_y));

        let bottom_y = (height - bands.edge_offset - jitter + jitter_offset(state, jitter)).floor();
        state.remove_or_create_at(Vec2::new(x, bottom_y));
    }

    log::debug!("Populated block bands: {} blocks", state.blocks.len());
}

fn jitter_offset(state: &mut SimState, jitter: f32) -> f32 {
    if jitter > 0.0 {
        state.rng_mut().random_range(0.0..jitter)
    } else {
        0.0
    }
}

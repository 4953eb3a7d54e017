//! Deterministic simulation module
//!
//! All bounce and pitch logic lives here. This module must be pure and deterministic:
//! - Discrete ticks only
//! - Seeded RNG only
//! - Stable iteration order (roster order for balls, insertion order for blocks)
//! - No rendering, audio or platform dependencies

pub mod block;
pub mod collision;
pub mod scale;
pub mod state;
pub mod tick;

pub use block::Block;
pub use collision::{balls_touching, block_flip, border_flip, flip_axes, pair_flip};
pub use scale::{BUILTIN_SCALES, Scale, ScaleKeeper};
pub use state::{
    Arena, Ball, BlockEdit, BounceKind, NoteEvent, Rgb, SimState, Snapshot, handle_all_collisions,
};
pub use tick::{populate_block_bands, tick};

//! Drawing
//!
//! The world is redrawn from scratch every frame: clear, blocks, then balls.
//! Any surface that can draw filled shapes implements [`Canvas`].

pub mod text;

#[cfg(target_arch = "wasm32")]
pub mod canvas2d;

#[cfg(target_arch = "wasm32")]
pub use canvas2d::Canvas2d;
pub use text::TextCanvas;

use glam::Vec2;

use crate::sim::{Rgb, SimState};

/// Background colour behind the arena
pub const BACKGROUND: Rgb = Rgb::BLACK;
/// Outline colour for balls and blocks
pub const OUTLINE: Rgb = Rgb::WHITE;

/// A 2D drawing surface in arena coordinates (origin top-left, y down)
pub trait Canvas {
    /// Blank the whole surface
    fn clear(&mut self, background: Rgb);
    /// Filled circle with an [`OUTLINE`] stroke
    fn circle(&mut self, center: Vec2, radius: f32, fill: Rgb);
    /// Filled axis-aligned rectangle with an [`OUTLINE`] stroke
    fn rect(&mut self, min: Vec2, max: Vec2, fill: Rgb);
}

/// Draw one frame of the world
pub fn render<C: Canvas + ?Sized>(state: &SimState, canvas: &mut C) {
    canvas.clear(BACKGROUND);
    for block in &state.blocks {
        canvas.rect(block.bottom_left, block.top_right, block.color);
    }
    for ball in &state.balls {
        canvas.circle(ball.pos, ball.radius, ball.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Arena;

    #[derive(Default)]
    struct Recorder {
        ops: Vec<String>,
    }

    impl Canvas for Recorder {
        fn clear(&mut self, background: Rgb) {
            self.ops.push(format!("clear {}", background));
        }

        fn circle(&mut self, center: Vec2, radius: f32, fill: Rgb) {
            self.ops.push(format!("circle {} {} {} {}", center.x, center.y, radius, fill));
        }

        fn rect(&mut self, min: Vec2, max: Vec2, fill: Rgb) {
            self.ops.push(format!("rect {} {} {} {} {}", min.x, min.y, max.x, max.y, fill));
        }
    }

    #[test]
    fn test_render_order_blocks_before_balls() {
        let mut state = SimState::empty(Arena::new(400.0, 200.0).unwrap(), 1);
        state.add_ball("a", Vec2::new(50.0, 60.0), Rgb::RED);
        state.add_block(Vec2::new(10.0, 10.0), Vec2::new(20.0, 30.0), Rgb::GREEN);

        let mut canvas = Recorder::default();
        render(&state, &mut canvas);

        assert_eq!(
            canvas.ops,
            vec![
                "clear #000000",
                "rect 10 10 20 30 #00ff00",
                "circle 50 60 5 #ff0000",
            ]
        );
    }
}

//! Collision detection and response
//!
//! Every bounce in bloink is a sign flip of one or both velocity components,
//! never a change of magnitude. These functions decide *which* axes flip;
//! the entity types apply the result and request notes.

use glam::{BVec2, IVec2, Vec2};

use crate::consts::{BORDER_MARGIN, HIT_DISTANCE};
use crate::rect_contains;

/// Negate the velocity components selected by `axes`
#[inline]
pub fn flip_axes(vel: IVec2, axes: BVec2) -> IVec2 {
    IVec2::new(
        if axes.x { -vel.x } else { vel.x },
        if axes.y { -vel.y } else { vel.y },
    )
}

/// Axes on which a (post-move) position has left the arena interior
pub fn border_flip(pos: Vec2, width: f32, height: f32) -> BVec2 {
    BVec2::new(
        pos.x < BORDER_MARGIN || pos.x > width - BORDER_MARGIN,
        pos.y < BORDER_MARGIN || pos.y > height - BORDER_MARGIN,
    )
}

/// Proximity-box contact test between two ball centres.
///
/// Not a circle test: both axis gaps must be within [`HIT_DISTANCE`].
#[inline]
pub fn balls_touching(a: Vec2, b: Vec2) -> bool {
    let d = (a - b).abs();
    d.x <= HIT_DISTANCE && d.y <= HIT_DISTANCE
}

/// Axes to flip on *both* balls of a touching pair.
///
/// `delta` is the positional offset between the centres. When velocities are
/// opposed on both axes the axis with the larger misalignment wins (both on a
/// tie). Balls travelling the same way on both axes are left alone.
pub fn pair_flip(delta: Vec2, vel_a: IVec2, vel_b: IVec2) -> BVec2 {
    let opposed_x = vel_a.x * vel_b.x < 0;
    let opposed_y = vel_a.y * vel_b.y < 0;

    if opposed_x && opposed_y {
        let d = delta.abs();
        BVec2::new(d.x >= d.y, d.x <= d.y)
    } else if opposed_y {
        BVec2::new(false, true)
    } else if opposed_x {
        BVec2::new(true, false)
    } else {
        BVec2::FALSE
    }
}

/// Axes on which a single-axis step from `pos` would land inside a rectangle.
///
/// The x and y samples are independent; both firing is a corner bounce.
pub fn block_flip(pos: Vec2, vel: IVec2, bottom_left: Vec2, top_right: Vec2) -> BVec2 {
    let step = vel.as_vec2();
    let here_to_next_x = pos + Vec2::new(step.x, 0.0);
    let here_to_next_y = pos + Vec2::new(0.0, step.y);
    BVec2::new(
        rect_contains(bottom_left, top_right, here_to_next_x),
        rect_contains(bottom_left, top_right, here_to_next_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_axes() {
        let vel = IVec2::new(2, -2);
        assert_eq!(flip_axes(vel, BVec2::new(true, false)), IVec2::new(-2, -2));
        assert_eq!(flip_axes(vel, BVec2::TRUE), IVec2::new(-2, 2));
        assert_eq!(flip_axes(vel, BVec2::FALSE), vel);
    }

    #[test]
    fn test_border_flip() {
        // Inside: no flip
        assert_eq!(border_flip(Vec2::new(200.0, 100.0), 400.0, 200.0), BVec2::FALSE);
        // Exactly on the margin is still inside
        assert_eq!(border_flip(Vec2::new(3.0, 197.0), 400.0, 200.0), BVec2::FALSE);
        // Right wall
        assert_eq!(
            border_flip(Vec2::new(400.0, 100.0), 400.0, 200.0),
            BVec2::new(true, false)
        );
        // Arena corner flips both
        assert_eq!(border_flip(Vec2::new(1.0, 199.0), 400.0, 200.0), BVec2::TRUE);
    }

    #[test]
    fn test_balls_touching_is_a_box() {
        let a = Vec2::new(100.0, 100.0);
        assert!(balls_touching(a, Vec2::new(108.0, 108.0)));
        assert!(!balls_touching(a, Vec2::new(108.5, 100.0)));
        // Circle distance ~11.3 but still inside the box
        assert!(balls_touching(a, Vec2::new(92.0, 92.0)));
    }

    #[test]
    fn test_pair_flip_larger_misalignment_wins() {
        let flip = pair_flip(Vec2::new(5.0, 3.0), IVec2::new(2, 2), IVec2::new(-2, -2));
        assert_eq!(flip, BVec2::new(true, false));

        let flip = pair_flip(Vec2::new(-1.0, 6.0), IVec2::new(2, 2), IVec2::new(-2, -2));
        assert_eq!(flip, BVec2::new(false, true));
    }

    #[test]
    fn test_pair_flip_tie_flips_both() {
        let flip = pair_flip(Vec2::new(4.0, -4.0), IVec2::new(3, -3), IVec2::new(-3, 3));
        assert_eq!(flip, BVec2::TRUE);
    }

    #[test]
    fn test_pair_flip_single_axis_opposition() {
        // Opposed on y only
        let flip = pair_flip(Vec2::new(6.0, 1.0), IVec2::new(2, 2), IVec2::new(2, -2));
        assert_eq!(flip, BVec2::new(false, true));
        // Opposed on x only
        let flip = pair_flip(Vec2::new(1.0, 6.0), IVec2::new(2, 2), IVec2::new(-2, 2));
        assert_eq!(flip, BVec2::new(true, false));
    }

    #[test]
    fn test_pair_flip_same_direction_is_ignored() {
        let flip = pair_flip(Vec2::new(2.0, 2.0), IVec2::new(2, -2), IVec2::new(4, -4));
        assert_eq!(flip, BVec2::FALSE);
    }

    #[test]
    fn test_block_flip_sides_and_corner() {
        let bl = Vec2::new(100.0, 100.0);
        let tr = Vec2::new(120.0, 120.0);

        // Approaching the left face: only the x sample enters
        let flip = block_flip(Vec2::new(98.0, 90.0), IVec2::new(2, 2), bl, tr);
        assert_eq!(flip, BVec2::FALSE);
        let flip = block_flip(Vec2::new(98.0, 110.0), IVec2::new(2, 2), bl, tr);
        assert_eq!(flip, BVec2::new(true, false));

        // Approaching the top face from above
        let flip = block_flip(Vec2::new(110.0, 99.0), IVec2::new(2, 2), bl, tr);
        assert_eq!(flip, BVec2::new(false, true));

        // Already inside the block: both samples fire
        let flip = block_flip(Vec2::new(110.0, 110.0), IVec2::new(2, 2), bl, tr);
        assert_eq!(flip, BVec2::TRUE);
    }
}

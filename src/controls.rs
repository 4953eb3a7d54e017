//! Slider controls
//!
//! Each control is a horizontal bar; the click position along it picks the
//! value. These map a click `x` within a bar of `width` pixels to the value a
//! setter accepts, always within that setter's valid range.

use crate::audio::{MAX_DELAY, MIDI_MAX, MIN_DELAY};
use crate::consts::{BALL_MAX_SPEED, BALL_MIN_SPEED};

/// Position along the bar in `[0, 1]`
#[inline]
pub fn slider_fraction(x: f32, width: f32) -> f32 {
    if width > 0.0 && x.is_finite() {
        (x / width).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Ball speed: 1 at the left edge up to 6 at the right
pub fn speed_from_slider(x: f32, width: f32) -> i32 {
    let steps = (BALL_MAX_SPEED - BALL_MIN_SPEED) as f32;
    (BALL_MIN_SPEED + (slider_fraction(x, width) * steps).floor() as i32).min(BALL_MAX_SPEED)
}

/// Voice volume 0-127
pub fn volume_from_slider(x: f32, width: f32) -> u8 {
    midi_from_slider(x, width)
}

/// Voice instrument program 0-127
pub fn timbre_from_slider(x: f32, width: f32) -> u8 {
    midi_from_slider(x, width)
}

/// Note length 0.05-1.0 s
pub fn delay_from_slider(x: f32, width: f32) -> f32 {
    MIN_DELAY + slider_fraction(x, width) * (MAX_DELAY - MIN_DELAY)
}

fn midi_from_slider(x: f32, width: f32) -> u8 {
    (slider_fraction(x, width) * MIDI_MAX as f32).floor() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_range() {
        assert_eq!(speed_from_slider(0.0, 170.0), 1);
        assert_eq!(speed_from_slider(85.0, 170.0), 3);
        assert_eq!(speed_from_slider(169.0, 170.0), 5);
        assert_eq!(speed_from_slider(170.0, 170.0), 6);
        // Outside the bar clamps instead of freezing or overshooting
        assert_eq!(speed_from_slider(-20.0, 170.0), 1);
        assert_eq!(speed_from_slider(900.0, 170.0), 6);
    }

    #[test]
    fn test_midi_sliders() {
        assert_eq!(volume_from_slider(0.0, 100.0), 0);
        assert_eq!(volume_from_slider(100.0, 100.0), 127);
        assert_eq!(timbre_from_slider(50.0, 100.0), 63);
    }

    #[test]
    fn test_delay_slider() {
        assert!((delay_from_slider(0.0, 100.0) - 0.05).abs() < 1e-6);
        assert!((delay_from_slider(100.0, 100.0) - 1.0).abs() < 1e-6);
        assert!((delay_from_slider(50.0, 100.0) - 0.525).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_width() {
        assert_eq!(slider_fraction(10.0, 0.0), 0.0);
        assert_eq!(slider_fraction(f32::NAN, 10.0), 0.0);
    }
}

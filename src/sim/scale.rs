//! Musical scales and note quantization
//!
//! A scale is a 12-semitone membership mask. Raw notes are snapped *upward*
//! to the nearest member, so quantizing never lowers pitch.

use std::collections::BTreeMap;

use crate::error::ScaleError;

/// Entries in a literal scale pattern: 12 semitones plus the octave sentinel
pub const SCALE_PATTERN_LEN: usize = 13;

/// Semitones per octave
const OCTAVE: i32 = 12;

/// Name of the scale selected before any explicit choice
pub const DEFAULT_SCALE: &str = "chromatic";

/// Built-in scales as 13-entry patterns (entry 12 repeats entry 0)
pub const BUILTIN_SCALES: [(&str, [u8; SCALE_PATTERN_LEN]); 9] = [
    ("chromatic", [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]),
    ("major", [1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 1]),
    ("minor", [1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0, 1, 1]),
    ("diminished", [1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1]),
    ("arab", [1, 0, 1, 0, 1, 1, 1, 0, 1, 0, 1, 0, 1]),
    ("debussy", [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1]),
    ("gypsy", [1, 0, 1, 1, 0, 0, 1, 1, 1, 0, 1, 0, 1]),
    ("pent1", [1, 0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 0, 1]),
    ("pent2", [1, 0, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 1]),
];

/// Immutable set of member semitones within one octave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    members: [bool; 12],
}

impl Scale {
    /// Build a scale from a literal 0/1 pattern.
    ///
    /// The pattern carries a 13th sentinel entry that must match the root so
    /// that an upward scan from any offset always lands on a member.
    pub fn from_pattern(pattern: &[u8]) -> Result<Self, ScaleError> {
        if pattern.len() != SCALE_PATTERN_LEN {
            return Err(ScaleError::WrongLength(pattern.len()));
        }
        if (pattern[0] != 0) != (pattern[12] != 0) {
            return Err(ScaleError::SentinelMismatch);
        }

        let mut members = [false; 12];
        for (slot, &entry) in members.iter_mut().zip(pattern) {
            *slot = entry != 0;
        }
        if !members.iter().any(|&m| m) {
            return Err(ScaleError::NoMembers);
        }

        Ok(Self { members })
    }

    /// Whether a semitone (any octave) belongs to the scale
    pub fn contains(&self, note: i32) -> bool {
        self.members[note.rem_euclid(OCTAVE) as usize]
    }

    /// Snap a raw note upward to the nearest member semitone
    pub fn quantize(&self, raw_note: i32) -> i32 {
        let offset = raw_note.rem_euclid(OCTAVE) as usize;
        // A non-empty scale always has a member within one octave of any offset
        let steps = (0..12)
            .find(|k| self.members[(offset + k) % 12])
            .unwrap_or(0);
        raw_note + steps as i32
    }
}

/// Named scales plus the currently active one
#[derive(Debug, Clone)]
pub struct ScaleKeeper {
    scales: BTreeMap<String, Scale>,
    current: String,
}

impl Default for ScaleKeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleKeeper {
    /// Keeper with the built-in scales, chromatic selected
    pub fn new() -> Self {
        let mut scales = BTreeMap::new();
        for (name, pattern) in BUILTIN_SCALES {
            if let Ok(scale) = Scale::from_pattern(&pattern) {
                scales.insert(name.to_string(), scale);
            }
        }
        Self {
            scales,
            current: DEFAULT_SCALE.to_string(),
        }
    }

    /// Register (or replace) a named scale
    pub fn insert(&mut self, name: impl Into<String>, scale: Scale) {
        self.scales.insert(name.into(), scale);
    }

    /// Select the active scale. Unknown names are ignored and the
    /// previous selection is kept; returns whether the switch happened.
    pub fn set_current(&mut self, name: &str) -> bool {
        if self.scales.contains_key(name) {
            if self.current != name {
                log::info!("Scale: {} -> {}", self.current, name);
                self.current = name.to_string();
            }
            true
        } else {
            log::warn!("Ignoring unknown scale {:?}", name);
            false
        }
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scales.contains_key(name)
    }

    /// Scale names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scales.keys().map(String::as_str)
    }

    /// Quantize a raw note to the active scale
    pub fn adjust_to_current_scale(&self, raw_note: i32) -> i32 {
        match self.scales.get(&self.current) {
            Some(scale) => scale.quantize(raw_note),
            None => raw_note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn major() -> Scale {
        Scale::from_pattern(&[1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 1]).unwrap()
    }

    #[test]
    fn test_major_quantize_sharp_to_next_member() {
        let scale = major();
        assert_eq!(scale.quantize(61), 62);
        assert_eq!(scale.quantize(60), 60);
        // B is a member, stays put
        assert_eq!(scale.quantize(71), 71);
        // A# snaps up to B
        assert_eq!(scale.quantize(70), 71);
    }

    #[test]
    fn test_keeper_adjust_uses_current() {
        let mut keeper = ScaleKeeper::new();
        assert_eq!(keeper.current_name(), "chromatic");
        assert_eq!(keeper.adjust_to_current_scale(61), 61);

        assert!(keeper.set_current("major"));
        assert_eq!(keeper.adjust_to_current_scale(61), 62);
    }

    #[test]
    fn test_unknown_scale_is_ignored() {
        let mut keeper = ScaleKeeper::new();
        keeper.set_current("minor");
        assert!(!keeper.set_current("lydian-ish"));
        assert_eq!(keeper.current_name(), "minor");
    }

    #[test]
    fn test_negative_notes_wrap_offset() {
        let scale = major();
        // -11 ≡ 1 (mod 12), so it moves up one semitone like 61 does
        assert_eq!(scale.quantize(-11), -10);
    }

    #[test]
    fn test_pattern_validation() {
        assert_eq!(
            Scale::from_pattern(&[1, 0, 1]),
            Err(ScaleError::WrongLength(3))
        );
        assert_eq!(
            Scale::from_pattern(&[0; SCALE_PATTERN_LEN]),
            Err(ScaleError::NoMembers)
        );
        assert_eq!(
            Scale::from_pattern(&[1, 0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 0, 0]),
            Err(ScaleError::SentinelMismatch)
        );
    }

    #[test]
    fn test_rootless_scale_wraps_to_next_octave() {
        // Only F (5) is a member; from G (7) the next F is 10 steps up
        let scale = Scale::from_pattern(&[0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(scale.quantize(67), 77);
    }

    #[test]
    fn test_builtin_scales_all_load() {
        let keeper = ScaleKeeper::new();
        assert_eq!(keeper.names().count(), BUILTIN_SCALES.len());
        assert!(keeper.contains("pent1"));
    }

    proptest! {
        #[test]
        fn quantize_lands_on_member_within_an_octave(
            raw in -200i32..400,
            idx in 0usize..BUILTIN_SCALES.len(),
        ) {
            let scale = Scale::from_pattern(&BUILTIN_SCALES[idx].1).unwrap();
            let q = scale.quantize(raw);
            prop_assert!(q >= raw);
            prop_assert!(q - raw < 12);
            prop_assert!(scale.contains(q));
        }
    }
}

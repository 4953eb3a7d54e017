//! Audio: one voice per ball
//!
//! Each ball owns a fixed output channel assigned at construction. A voice
//! holds that channel's user-adjustable volume, timbre and note length, and
//! remembers its sounding note so the next one can cut it off.

use crate::settings::Settings;
use crate::sim::NoteEvent;

/// Highest MIDI value for notes, volume and program
pub const MIDI_MAX: u8 = 127;
/// Note length bounds in seconds
pub const MIN_DELAY: f32 = 0.05;
pub const MAX_DELAY: f32 = 1.0;

/// Something that can actually make sound
pub trait SynthBackend {
    /// Start `note` on `channel`, letting it ring for `length` seconds
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8, program: u8, length: f32);
    /// Silence `note` on `channel` if it is still sounding
    fn note_off(&mut self, channel: u8, note: u8);
}

/// Per-ball sound settings
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub channel: u8,
    volume: u8,
    program: u8,
    delay: f32,
    last_note: Option<u8>,
}

impl Voice {
    pub fn new(channel: u8, program: u8) -> Self {
        Self {
            channel,
            volume: 50,
            program: program.min(MIDI_MAX),
            delay: 0.5,
            last_note: None,
        }
    }

    /// Note velocity, clamped to 0-127
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(MIDI_MAX);
    }

    /// Instrument program, clamped to 0-127
    pub fn set_timbre(&mut self, program: u8) {
        self.program = program.min(MIDI_MAX);
    }

    /// Note length in seconds
    pub fn set_delay(&mut self, seconds: f32) {
        self.delay = if seconds.is_finite() {
            seconds.clamp(MIN_DELAY, MAX_DELAY)
        } else {
            MIN_DELAY
        };
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn timbre(&self) -> u8 {
        self.program
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn last_note(&self) -> Option<u8> {
        self.last_note
    }

    /// Stop the previous note and start a new one
    pub fn play<B: SynthBackend>(&mut self, backend: &mut B, note: u8) {
        if let Some(prev) = self.last_note.replace(note) {
            backend.note_off(self.channel, prev);
        }
        backend.note_on(self.channel, note, self.volume, self.program, self.delay);
    }
}

/// Routes note events to voices by channel
pub struct AudioManager<B: SynthBackend> {
    backend: B,
    voices: Vec<Voice>,
    muted: bool,
}

impl<B: SynthBackend> AudioManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            voices: Vec::new(),
            muted: false,
        }
    }

    /// One voice per configured ball, channels in roster order
    pub fn from_settings(backend: B, settings: &Settings) -> Self {
        let mut audio = Self::new(backend);
        for ball in &settings.balls {
            let channel = audio.add_voice(ball.program);
            if let Some(voice) = audio.voice_mut(channel) {
                voice.set_volume(ball.volume);
                voice.set_delay(ball.delay);
            }
        }
        audio.set_muted(settings.muted);
        audio
    }

    /// Add the voice for the next channel; returns its channel number
    pub fn add_voice(&mut self, program: u8) -> u8 {
        let channel = self.voices.len() as u8;
        self.voices.push(Voice::new(channel, program));
        channel
    }

    pub fn voice(&self, channel: u8) -> Option<&Voice> {
        self.voices.get(channel as usize)
    }

    pub fn voice_mut(&mut self, channel: u8) -> Option<&mut Voice> {
        self.voices.get_mut(channel as usize)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Play a note event on its ball's voice
    pub fn play(&mut self, event: &NoteEvent) {
        if self.muted {
            return;
        }
        let Some(voice) = self.voices.get_mut(event.channel as usize) else {
            log::warn!("No voice for channel {}", event.channel);
            return;
        };
        let note = event.note.clamp(0, MIDI_MAX as i32) as u8;
        voice.play(&mut self.backend, note);
    }

    pub fn play_all(&mut self, events: &[NoteEvent]) {
        for event in events {
            self.play(event);
        }
    }
}

/// Convert a MIDI note number to frequency in Hz (A4 = 69 = 440 Hz)
#[inline]
pub fn midi_to_hz(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

/// Backend that only logs, for headless runs
#[derive(Debug, Default)]
pub struct LogSynth {
    pub notes_played: u64,
}

impl SynthBackend for LogSynth {
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8, program: u8, length: f32) {
        self.notes_played += 1;
        log::debug!(
            "ch{} note {} ({:.1} Hz) vel {} prog {} for {:.2}s",
            channel,
            note,
            midi_to_hz(note),
            velocity,
            program,
            length
        );
    }

    fn note_off(&mut self, channel: u8, note: u8) {
        log::trace!("ch{} note {} off", channel, note);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebSynth;

#[cfg(target_arch = "wasm32")]
mod web {
    //! Procedural synth on the Web Audio API - no samples needed

    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{MIDI_MAX, SynthBackend, midi_to_hz};
    use crate::error::InitError;

    /// Overall level so three voices never clip
    const MASTER_GAIN: f32 = 0.3;

    /// Oscillator per channel, replaced on every note
    pub struct WebSynth {
        ctx: AudioContext,
        sounding: Vec<Option<(u8, OscillatorNode)>>,
    }

    impl WebSynth {
        pub fn new() -> Result<Self, InitError> {
            let ctx = AudioContext::new()
                .map_err(|e| InitError::Audio(format!("{:?}", e)))?;
            Ok(Self {
                ctx,
                sounding: Vec::new(),
            })
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            let _ = self.ctx.resume();
        }

        /// Map the 0-127 program range onto the four oscillator shapes
        fn waveform(program: u8) -> OscillatorType {
            match program / 32 {
                0 => OscillatorType::Sine,
                1 => OscillatorType::Triangle,
                2 => OscillatorType::Square,
                _ => OscillatorType::Sawtooth,
            }
        }

        fn create_osc(&self, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
            let osc = self.ctx.create_oscillator().ok()?;
            let gain = self.ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&self.ctx.destination()).ok()?;

            Some((osc, gain))
        }
    }

    impl SynthBackend for WebSynth {
        fn note_on(&mut self, channel: u8, note: u8, velocity: u8, program: u8, length: f32) {
            if self.ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = self.ctx.resume();
            }

            let Some((osc, gain)) = self.create_osc(midi_to_hz(note), Self::waveform(program)) else {
                return;
            };
            let t = self.ctx.current_time();
            let level = MASTER_GAIN * velocity as f32 / MIDI_MAX as f32;
            let length = length as f64;

            gain.gain().set_value_at_time(level.max(0.0001), t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.0001, t + length)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + length).ok();

            let slot = channel as usize;
            if self.sounding.len() <= slot {
                self.sounding.resize_with(slot + 1, || None);
            }
            self.sounding[slot] = Some((note, osc));
        }

        fn note_off(&mut self, channel: u8, note: u8) {
            if let Some(slot) = self.sounding.get_mut(channel as usize) {
                if let Some((sounding, osc)) = slot.take() {
                    if sounding == note {
                        osc.stop().ok();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BounceKind;

    #[derive(Default)]
    struct RecordingSynth {
        log: Vec<String>,
    }

    impl SynthBackend for RecordingSynth {
        fn note_on(&mut self, channel: u8, note: u8, velocity: u8, program: u8, _length: f32) {
            self.log.push(format!("on {} {} {} {}", channel, note, velocity, program));
        }

        fn note_off(&mut self, channel: u8, note: u8) {
            self.log.push(format!("off {} {}", channel, note));
        }
    }

    fn event(channel: u8, note: i32) -> NoteEvent {
        NoteEvent {
            tick: 1,
            ball_id: channel as u32 + 1,
            channel,
            raw: note,
            note,
            cause: BounceKind::Wall,
        }
    }

    #[test]
    fn test_play_stops_previous_note() {
        let mut audio = AudioManager::new(RecordingSynth::default());
        audio.add_voice(24);

        audio.play(&event(0, 60));
        audio.play(&event(0, 64));

        assert_eq!(
            audio.backend().log,
            vec!["on 0 60 50 24", "off 0 60", "on 0 64 50 24"]
        );
        assert_eq!(audio.voice(0).unwrap().last_note(), Some(64));
    }

    #[test]
    fn test_channels_are_independent() {
        let mut audio = AudioManager::new(RecordingSynth::default());
        audio.add_voice(0);
        audio.add_voice(44);

        audio.play(&event(0, 60));
        audio.play(&event(1, 62));

        assert_eq!(audio.backend().log, vec!["on 0 60 50 0", "on 1 62 50 44"]);
    }

    #[test]
    fn test_muted_and_unknown_channel_are_silent() {
        let mut audio = AudioManager::new(RecordingSynth::default());
        audio.add_voice(0);

        audio.play(&event(5, 60));
        audio.set_muted(true);
        audio.play(&event(0, 60));

        assert!(audio.backend().log.is_empty());
    }

    #[test]
    fn test_voice_setters_clamp() {
        let mut voice = Voice::new(0, 200);
        assert_eq!(voice.timbre(), 127);
        voice.set_volume(255);
        assert_eq!(voice.volume(), 127);
        voice.set_delay(5.0);
        assert_eq!(voice.delay(), MAX_DELAY);
        voice.set_delay(0.0);
        assert_eq!(voice.delay(), MIN_DELAY);
        voice.set_delay(f32::NAN);
        assert_eq!(voice.delay(), MIN_DELAY);
    }

    #[test]
    fn test_out_of_range_notes_clamp() {
        let mut audio = AudioManager::new(RecordingSynth::default());
        audio.add_voice(0);
        audio.play(&event(0, 140));
        assert_eq!(audio.backend().log, vec!["on 0 127 50 0"]);
    }

    #[test]
    fn test_from_settings_matches_roster() {
        let settings = Settings::default();
        let audio = AudioManager::from_settings(RecordingSynth::default(), &settings);
        let programs: Vec<u8> = audio.voices().iter().map(Voice::timbre).collect();
        assert_eq!(programs, vec![0, 24, 44]);
        assert_eq!(audio.voice(2).unwrap().channel, 2);
        assert_eq!(audio.voice(1).unwrap().delay(), 0.5);
    }

    #[test]
    fn test_midi_to_hz() {
        assert!((midi_to_hz(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_hz(81) - 880.0).abs() < 1e-2);
    }
}

//! Simulation driver
//!
//! Owns the world and decides when it advances. Ticks are driven by a
//! [`TickScheduler`]; user input arrives as [`Command`]s that are applied
//! strictly between ticks.

use std::collections::VecDeque;

use glam::Vec2;

use crate::audio::{AudioManager, SynthBackend};
use crate::error::InitError;
use crate::platform::{TickScheduler, TimerId};
use crate::renderer::{Canvas, render};
use crate::settings::Settings;
use crate::sim::{BlockEdit, NoteEvent, SimState, tick};

/// Whether a tick timer is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Stopped,
    Running,
}

/// User input, applied between ticks
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Pointer released at an arena-relative point: toggle a block there
    Pointer(Vec2),
    /// Switch the active scale; unknown names are ignored
    SetScale(String),
    /// Change a ball's speed magnitude
    SetSpeed { ball: u32, speed: i32 },
}

pub struct Simulation {
    state: SimState,
    phase: RunPhase,
    timer: Option<TimerId>,
    period_ms: u32,
    pending: VecDeque<Command>,
}

impl Simulation {
    /// Build the configured world in the stopped phase
    pub fn new(settings: &Settings, seed: u64) -> Result<Self, InitError> {
        settings.validate()?;
        let state = SimState::new(settings, seed)?;
        Ok(Self::from_state(state, settings.tick_period_ms))
    }

    pub fn from_state(state: SimState, period_ms: u32) -> Self {
        Self {
            state,
            phase: RunPhase::Stopped,
            timer: None,
            period_ms: period_ms.max(1),
            pending: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }

    /// Begin ticking. Any timer from an earlier start is cancelled first, so
    /// at most one is ever armed. Returns false, leaving the driver stopped,
    /// if the scheduler could not arm a timer.
    pub fn start<S: TickScheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        if let Some(old) = self.timer.take() {
            scheduler.cancel(old);
        }
        self.timer = scheduler.schedule(self.period_ms);
        if self.timer.is_none() {
            log::error!("No tick timer available, staying stopped");
            self.phase = RunPhase::Stopped;
            return false;
        }
        if self.phase != RunPhase::Running {
            log::info!("Simulation started ({} ms/tick)", self.period_ms);
        }
        self.phase = RunPhase::Running;
        true
    }

    /// Stop ticking; no further ticks fire after this returns
    pub fn stop<S: TickScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(old) = self.timer.take() {
            scheduler.cancel(old);
        }
        if self.phase == RunPhase::Running {
            log::info!("Simulation stopped at tick {}", self.state.time_ticks);
        }
        self.phase = RunPhase::Stopped;
    }

    /// Queue user input. While stopped no tick can be in progress, so the
    /// queue is drained right away.
    pub fn submit(&mut self, command: Command) {
        self.pending.push_back(command);
        if self.phase == RunPhase::Stopped {
            self.apply_pending();
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Apply all queued commands in arrival order
    pub fn apply_pending(&mut self) {
        while let Some(command) = self.pending.pop_front() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Pointer(point) => {
                if !(point.x.is_finite() && point.y.is_finite()) {
                    log::warn!("Ignoring pointer at non-finite {:?}", point);
                    return;
                }
                match self.state.remove_or_create_at(point) {
                    BlockEdit::Created(id) => log::debug!("Pointer created block {}", id),
                    BlockEdit::Removed(id) => log::debug!("Pointer removed block {}", id),
                }
            }
            Command::SetScale(name) => {
                self.state.scales.set_current(&name);
            }
            Command::SetSpeed { ball, speed } => {
                if self.state.set_ball_speed(ball, speed).is_none() {
                    log::warn!("No ball {} for speed change", ball);
                }
            }
        }
    }

    /// Apply queued input, then advance one tick
    pub fn step(&mut self) -> Vec<NoteEvent> {
        self.apply_pending();
        tick(&mut self.state)
    }

    /// One timer firing: tick, sound the notes, redraw. Does nothing while
    /// stopped, so a late firing after `stop` cannot advance the world.
    pub fn run_frame<B, C>(&mut self, audio: &mut AudioManager<B>, canvas: &mut C) -> usize
    where
        B: SynthBackend,
        C: Canvas + ?Sized,
    {
        if !self.is_running() {
            return 0;
        }
        let notes = self.step();
        audio.play_all(&notes);
        render(&self.state, canvas);
        notes.len()
    }

    /// Draw the current world without ticking
    pub fn redraw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        render(&self.state, canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LogSynth;
    use crate::platform::{ManualScheduler, TimerId};
    use crate::renderer::TextCanvas;
    use crate::sim::{Arena, Rgb};

    fn quiet_sim() -> Simulation {
        let mut state = SimState::empty(Arena::new(400.0, 200.0).unwrap(), 11);
        state.add_ball("a", Vec2::new(100.0, 100.0), Rgb::RED);
        Simulation::from_state(state, 50)
    }

    #[test]
    fn test_starts_stopped() {
        let sim = Simulation::new(&Settings::default(), 1).unwrap();
        assert_eq!(sim.phase(), RunPhase::Stopped);
        assert_eq!(sim.state().time_ticks, 0);
        assert_eq!(sim.state().balls.len(), 3);
    }

    #[test]
    fn test_double_start_keeps_one_timer() {
        let mut sched = ManualScheduler::new();
        let mut sim = quiet_sim();

        assert!(sim.start(&mut sched));
        assert!(sim.start(&mut sched));

        assert!(sim.is_running());
        assert_eq!(sched.active(), 1);
        assert_eq!(sched.advance(100), 2);
    }

    #[test]
    fn test_stop_disarms_timer() {
        let mut sched = ManualScheduler::new();
        let mut sim = quiet_sim();

        sim.start(&mut sched);
        sim.stop(&mut sched);

        assert_eq!(sim.phase(), RunPhase::Stopped);
        assert_eq!(sched.active(), 0);
        assert_eq!(sched.advance(1000), 0);

        // Stopping again is harmless
        sim.stop(&mut sched);
        assert_eq!(sim.phase(), RunPhase::Stopped);
    }

    /// Scheduler whose platform never grants a timer
    #[derive(Default)]
    struct RefusingScheduler {
        cancelled: Vec<TimerId>,
    }

    impl TickScheduler for RefusingScheduler {
        fn schedule(&mut self, _period_ms: u32) -> Option<TimerId> {
            None
        }

        fn cancel(&mut self, id: TimerId) {
            self.cancelled.push(id);
        }
    }

    #[test]
    fn test_start_without_timer_stays_stopped() {
        let mut sched = RefusingScheduler::default();
        let mut sim = quiet_sim();

        assert!(!sim.start(&mut sched));
        assert_eq!(sim.phase(), RunPhase::Stopped);

        let mut audio = AudioManager::new(LogSynth::default());
        let mut canvas = TextCanvas::for_arena(400.0, 200.0, 20.0);
        assert_eq!(sim.run_frame(&mut audio, &mut canvas), 0);

        // Nothing was armed, so stop has nothing to cancel
        sim.stop(&mut sched);
        assert!(sched.cancelled.is_empty());
    }

    #[test]
    fn test_failed_restart_drops_running_phase() {
        let mut good = ManualScheduler::new();
        let mut sim = quiet_sim();
        assert!(sim.start(&mut good));

        let mut bad = RefusingScheduler::default();
        assert!(!sim.start(&mut bad));
        assert!(!sim.is_running());
    }

    #[test]
    fn test_frame_ignored_while_stopped() {
        let mut sim = quiet_sim();
        let mut audio = AudioManager::new(LogSynth::default());
        let mut canvas = TextCanvas::for_arena(400.0, 200.0, 20.0);

        assert_eq!(sim.run_frame(&mut audio, &mut canvas), 0);
        assert_eq!(sim.state().time_ticks, 0);
    }

    #[test]
    fn test_pointer_queued_while_running() {
        let mut sched = ManualScheduler::new();
        let mut sim = quiet_sim();
        sim.start(&mut sched);

        sim.submit(Command::Pointer(Vec2::new(300.0, 50.0)));
        assert_eq!(sim.pending(), 1);
        assert!(sim.state().blocks.is_empty());

        sim.step();
        assert_eq!(sim.pending(), 0);
        assert_eq!(sim.state().blocks.len(), 1);

        sim.step();
        assert_eq!(sim.state().blocks.len(), 1);
    }

    #[test]
    fn test_pointer_applied_immediately_while_stopped() {
        let mut sim = quiet_sim();
        let p = Vec2::new(300.0, 50.0);

        sim.submit(Command::Pointer(p));
        assert_eq!(sim.state().blocks.len(), 1);
        sim.submit(Command::Pointer(p));
        assert!(sim.state().blocks.is_empty());
    }

    #[test]
    fn test_scale_and_speed_commands() {
        let mut sim = quiet_sim();
        let id = sim.state().balls[0].id;

        sim.submit(Command::SetScale("minor".into()));
        sim.submit(Command::SetScale("nope".into()));
        assert_eq!(sim.state().scales.current_name(), "minor");

        sim.submit(Command::SetSpeed { ball: id, speed: 4 });
        assert_eq!(sim.state().balls[0].speed(), 4);
        sim.submit(Command::SetSpeed { ball: id, speed: 0 });
        assert_eq!(sim.state().balls[0].speed(), 1);
        sim.submit(Command::SetSpeed { ball: 999, speed: 3 });
    }

    #[test]
    fn test_running_frame_ticks_and_draws() {
        let mut sched = ManualScheduler::new();
        let mut sim = quiet_sim();
        let mut audio = AudioManager::new(LogSynth::default());
        audio.add_voice(0);
        let mut canvas = TextCanvas::for_arena(400.0, 200.0, 20.0);

        sim.start(&mut sched);
        for _ in 0..sched.advance(500) {
            sim.run_frame(&mut audio, &mut canvas);
        }

        assert_eq!(sim.state().time_ticks, 10);
        assert!(canvas.to_string().contains('R'));
    }
}

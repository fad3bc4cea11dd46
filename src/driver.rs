//! Frame Driver
//!
//! Turns variable-length frames into fixed simulation steps. Real time is
//! accumulated in whole microseconds; each full step's worth runs one tick.
//! A frame never runs more than `max_steps_per_frame` ticks: anything beyond
//! that is dropped so a stall cannot snowball into a longer one.

use std::time::Duration;

use tracing::warn;

use crate::core::fixed::to_float;
use crate::game::events::GameEvent;
use crate::game::input::{InputFrame, InputRecording};
use crate::game::level::Level;
use crate::game::state::{Outcome, SessionState};
use crate::game::tick::{tick, SimConfig};
use crate::render::{RenderSink, TextureHandle};

/// Length of one step (1/60 s).
pub const STEP_MICROS: u64 = 16_667;

/// Banner offset left of the player, in world units.
const BANNER_OFFSET_X: f32 = 3.5;

/// Steps granted for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepPlan {
    /// Steps to run now.
    pub steps: u32,
    /// Backlog thrown away by the cap.
    pub dropped: Duration,
}

/// Fixed-timestep accumulator.
#[derive(Clone, Debug)]
pub struct FixedStepClock {
    accumulator_us: u64,
    max_steps: u32,
}

impl FixedStepClock {
    /// Empty accumulator with a per-frame step cap (at least 1).
    pub fn new(max_steps: u32) -> Self {
        Self {
            accumulator_us: 0,
            max_steps: max_steps.max(1),
        }
    }

    /// Add a frame's elapsed time and take the steps it pays for.
    ///
    /// Leftover time under one step stays for the next frame.
    pub fn advance(&mut self, elapsed: Duration) -> StepPlan {
        let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.accumulator_us = self.accumulator_us.saturating_add(elapsed_us);

        let due = self.accumulator_us / STEP_MICROS;
        self.accumulator_us %= STEP_MICROS;

        let steps = due.min(self.max_steps as u64) as u32;
        let dropped_steps = due - steps as u64;
        let dropped = Duration::from_micros(dropped_steps * STEP_MICROS);
        if dropped_steps > 0 {
            warn!(
                due,
                ran = steps,
                dropped_ms = dropped.as_millis() as u64,
                "Frame overran the step cap, dropping backlog"
            );
        }

        StepPlan { steps, dropped }
    }

    /// Time waiting for the next step.
    pub fn pending(&self) -> Duration {
        Duration::from_micros(self.accumulator_us)
    }

    /// Forget accumulated time.
    pub fn reset(&mut self) {
        self.accumulator_us = 0;
    }
}

/// What one frame did.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Ticks run.
    pub steps: u32,
    /// Backlog dropped by the cap.
    pub dropped: Duration,
    /// Events from every tick run, in order.
    pub events: Vec<GameEvent>,
    /// Outcome after the frame.
    pub outcome: Outcome,
}

/// Owns a session and advances it frame by frame.
pub struct Driver {
    state: SessionState,
    config: SimConfig,
    clock: FixedStepClock,
    font: TextureHandle,
    pending_jump: bool,
    recording: InputRecording,
}

impl Driver {
    /// Drive a freshly built level.
    pub fn new(level: Level, config: SimConfig, max_steps_per_frame: u32) -> Self {
        Self {
            state: level.state,
            config,
            clock: FixedStepClock::new(max_steps_per_frame),
            font: level.font,
            pending_jump: false,
            recording: InputRecording::new(),
        }
    }

    /// Current session.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Simulation config in use.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Inputs fed to every tick so far.
    pub fn recording(&self) -> &InputRecording {
        &self.recording
    }

    /// Per-tick inputs, ready for [`replay_session`](crate::game::tick::replay_session).
    pub fn recorded_inputs(&self) -> Vec<InputFrame> {
        self.recording.replay_iter().map(|(_, frame)| frame).collect()
    }

    /// Advance by one frame of real time.
    ///
    /// A jump press is held until a tick consumes it, then applies to that
    /// tick only. After the session ends time no longer accumulates.
    pub fn frame(&mut self, elapsed: Duration, input: &InputFrame) -> FrameReport {
        let mut report = FrameReport::default();

        if input.jump_pressed() {
            self.pending_jump = true;
        }

        if self.state.is_over() {
            self.clock.reset();
            self.pending_jump = false;
            report.outcome = self.state.outcome;
            return report;
        }

        let plan = self.clock.advance(elapsed);
        report.dropped = plan.dropped;

        for _ in 0..plan.steps {
            let mut step_input = *input;
            step_input.set_jump(self.pending_jump);
            self.pending_jump = false;

            self.recording.record(self.state.tick, step_input);
            let result = tick(&mut self.state, &step_input, &self.config);
            report.steps += 1;
            report.events.extend(result.events);

            if result.game_over {
                self.clock.reset();
                break;
            }
        }

        report.outcome = self.state.outcome;
        report
    }

    /// Draw the session with the camera on the player, plus the banner once
    /// the session is over.
    pub fn render(&self, sink: &mut dyn RenderSink) {
        let player_x = to_float(self.state.player.position.x);
        sink.set_view(player_x);
        self.state.render(sink);

        if let Some(banner) = self.state.outcome.banner() {
            sink.draw_text(self.font, banner, (player_x - BANNER_OFFSET_X, 0.0));
        }
    }
}

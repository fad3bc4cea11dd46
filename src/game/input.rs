//! Input Capture and Normalization
//!
//! Per-step input with deterministic normalization. Axis values go through
//! a lookup table (MOVE_LUT) for exact i8 to Fixed conversion.

use serde::{Serialize, Deserialize};
use crate::core::fixed::{Fixed, FIXED_ONE};
use crate::core::vec2::FixedVec2;

// =============================================================================
// MOVE LOOKUP TABLE
// =============================================================================

/// Lookup table for converting i8 axis input to Fixed.
///
/// Scales [-127..+127] to [-1.0..+1.0] with floor division:
/// `(value * 65536) / 127`.
///
/// Index 128 (-128 as i8) maps to 0 and means "axis released".
pub static MOVE_LUT: [Fixed; 256] = {
    let mut lut = [0i32; 256];
    let mut i = 0i32;
    while i < 256 {
        // 0..127 = positive, 128..255 = negative (-128..-1)
        let signed = if i < 128 { i } else { i - 256 };

        if signed == -128 {
            lut[i as usize] = 0;
        } else {
            lut[i as usize] = (signed * 65536) / 127;
        }
        i += 1;
    }
    lut
};

/// Convert i8 axis input to Fixed using the lookup table.
#[inline]
pub fn move_to_fixed(input: i8) -> Fixed {
    MOVE_LUT[(input as u8) as usize]
}

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Input state for a single simulation step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Horizontal axis: -127 (left) to +127 (right), -128 = released
    pub move_x: i8,

    /// Vertical axis: -127 (down) to +127 (up), -128 = released
    pub move_y: i8,

    /// Action flags:
    /// - Bit 0: Jump pressed this step (edge trigger)
    /// - Bit 1-7: Reserved
    pub flags: u8,
}

impl InputFrame {
    /// Axis released.
    pub const NO_INPUT: i8 = -128;

    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x01;

    /// Empty frame.
    pub const fn new() -> Self {
        Self {
            move_x: Self::NO_INPUT,
            move_y: Self::NO_INPUT,
            flags: 0,
        }
    }

    /// Frame with both axes set.
    pub const fn with_movement(move_x: i8, move_y: i8) -> Self {
        Self {
            move_x,
            move_y,
            flags: 0,
        }
    }

    /// Frame holding left or right at full tilt (or nothing for 0).
    pub const fn horizontal(direction: i8) -> Self {
        let move_x = if direction > 0 {
            127
        } else if direction < 0 {
            -127
        } else {
            Self::NO_INPUT
        };
        Self::with_movement(move_x, Self::NO_INPUT)
    }

    /// Builder form of [`set_jump`](Self::set_jump).
    pub const fn jumping(mut self) -> Self {
        self.flags |= Self::FLAG_JUMP;
        self
    }

    /// Movement direction, normalised when its magnitude exceeds 1.
    pub fn move_direction(&self) -> FixedVec2 {
        let raw = FixedVec2 {
            x: move_to_fixed(self.move_x),
            y: move_to_fixed(self.move_y),
        };
        if raw.length_squared() > FIXED_ONE {
            raw.normalize()
        } else {
            raw
        }
    }

    /// Jump pressed this step.
    #[inline]
    pub fn jump_pressed(&self) -> bool {
        self.flags & Self::FLAG_JUMP != 0
    }

    /// Set jump flag.
    #[inline]
    pub fn set_jump(&mut self, pressed: bool) {
        if pressed {
            self.flags |= Self::FLAG_JUMP;
        } else {
            self.flags &= !Self::FLAG_JUMP;
        }
    }
}

/// Input change recorded at a tick.
///
/// Only stored when input changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

impl InputDelta {
    /// Create new delta entry.
    pub fn new(tick: u32, frame: InputFrame) -> Self {
        Self { tick, frame }
    }
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// Delta-compressed input history of one session, for replay.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputRecording {
    /// First recorded tick
    pub start_tick: u32,

    /// Last recorded tick
    pub end_tick: u32,

    /// Ticks where input changed.
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecording {
    /// Empty recording.
    pub fn new() -> Self {
        Self {
            start_tick: 0,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick. Only stored if it changed.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        if self.deltas.is_empty() {
            self.start_tick = tick;
        }
        self.end_tick = tick;

        if self.deltas.is_empty() || frame != self.last_frame {
            self.deltas.push(InputDelta::new(tick, frame));
            self.last_frame = frame;
        }
    }

    /// Number of delta entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Iterate every tick from start to end with its input.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            recording: self,
            current_tick: self.start_tick,
            delta_idx: 0,
            current_frame: InputFrame::new(),
        }
    }
}

/// Iterator for replaying inputs tick-by-tick.
pub struct ReplayIterator<'a> {
    recording: &'a InputRecording,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.recording.is_empty() || self.current_tick > self.recording.end_tick {
            return None;
        }

        while let Some(delta) = self.recording.deltas.get(self.delta_idx) {
            if delta.tick > self.current_tick {
                break;
            }
            self.current_frame = delta.frame;
            self.delta_idx += 1;
        }

        let result = (self.current_tick, self.current_frame);
        self.current_tick += 1;
        Some(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================

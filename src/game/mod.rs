//! Game Logic Module
//!
//! All session simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `map`: Static tile grid and ground queries
//! - `collision`: AABB overlap and axis-separated resolution
//! - `ai`: Guard, Assassin and Jumper behaviours
//! - `entity`: Player/enemy state and the per-step update
//! - `input`: Input capture, normalization, recording
//! - `events`: Game events for logging and replay checks
//! - `state`: Session state and outcome
//! - `tick`: Simulation step and replay
//! - `level`: Level 1 data and roster

pub mod map;
pub mod collision;
pub mod ai;
pub mod entity;
pub mod input;
pub mod events;
pub mod state;
pub mod tick;
pub mod level;

// Re-export key types
pub use ai::{AiState, AiType};
pub use entity::{Entity, EntityType};
pub use input::{InputFrame, InputRecording, MOVE_LUT};
pub use state::{Outcome, SessionState};
pub use tick::{SimConfig, TickResult};
pub use events::GameEvent;

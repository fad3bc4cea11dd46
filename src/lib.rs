//! # Rise of the AI
//!
//! Deterministic simulation of a small 2D platformer: a tile map, a player
//! who can double jump, and three enemy AIs that die when stomped.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RISE OF THE AI                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec2.rs     - 2D vector with fixed-point                │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── map.rs      - Tile grid                                 │
//! │  ├── collision.rs- AABB resolution, stomp and hit            │
//! │  ├── ai.rs       - Guard, Assassin, Jumper                   │
//! │  ├── entity.rs   - Entities and the per-step update          │
//! │  ├── input.rs    - Input capture and recording               │
//! │  ├── state.rs    - Session state                             │
//! │  ├── tick.rs     - Simulation step and replay                │
//! │  └── level.rs    - Level 1                                   │
//! │                                                              │
//! │  driver.rs       - Fixed-timestep frame driver               │
//! │  render.rs       - Texture loader and render sink seams      │
//! │  config.rs       - JSON tuning                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic in game logic
//! - No system time dependencies
//! - Fixed roster order, no hash-ordered containers
//!
//! Given identical inputs, the simulation produces **identical results**
//! on any platform. Floats appear only in configuration and rendering.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod render;
pub mod driver;
pub mod config;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use game::input::{InputFrame, InputRecording};
pub use game::state::{SessionState, Outcome};
pub use driver::Driver;
pub use config::GameConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

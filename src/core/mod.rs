//! Core deterministic primitives.
//!
//! Everything the simulation computes goes through these types, so two runs
//! fed the same inputs end on bit-identical state.

pub mod fixed;
pub mod vec2;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use hash::{session_hash, StateHash};

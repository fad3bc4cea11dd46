//! Session Hashing
//!
//! SHA-256 digest of a session, compared after a replay to prove the same
//! inputs reached the same state. Fields go in a fixed order; the domain
//! tag versions that layout.

use sha2::{Digest, Sha256};

use super::fixed::Fixed;
use super::vec2::FixedVec2;

/// Domain tag prepended to every session digest.
const SESSION_DOMAIN: &[u8] = b"rise-of-the-ai/session/v1";

/// 32-byte SHA-256 digest.
pub type StateHash = [u8; 32];

/// Incremental digest of one session, fed entity by entity.
pub struct StateHasher {
    digest: Sha256,
}

impl StateHasher {
    /// Start a session digest at `tick`.
    pub fn session(tick: u32) -> Self {
        let mut digest = Sha256::new();
        digest.update(SESSION_DOMAIN);
        digest.update(tick.to_le_bytes());
        Self { digest }
    }

    /// An enum discriminant: entity kind, AI state, outcome.
    #[inline]
    pub fn tag(&mut self, tag: u8) {
        self.digest.update([tag]);
    }

    /// A counter, such as ticks in state or roster length.
    #[inline]
    pub fn count(&mut self, value: u32) {
        self.digest.update(value.to_le_bytes());
    }

    /// Kinematic state of a body.
    pub fn body(&mut self, position: FixedVec2, velocity: FixedVec2) {
        for component in [position.x, position.y, velocity.x, velocity.y] {
            self.digest.update(component.to_le_bytes());
        }
    }

    /// Movement intent and the speed multiplier applied to it.
    pub fn intent(&mut self, movement: FixedVec2, speed_scale: Fixed) {
        for component in [movement.x, movement.y, speed_scale] {
            self.digest.update(component.to_le_bytes());
        }
    }

    /// Up to eight flags packed into one byte, first flag in bit 0.
    pub fn flags(&mut self, flags: &[bool]) {
        debug_assert!(flags.len() <= 8, "flags pack into a single byte");
        let packed = flags
            .iter()
            .enumerate()
            .fold(0u8, |acc, (bit, &set)| acc | (u8::from(set) << bit));
        self.digest.update([packed]);
    }

    /// Map and entity contact sides, as side bit sets.
    #[inline]
    pub fn contacts(&mut self, map: u8, entity: u8) {
        self.digest.update([map, entity]);
    }

    /// Finish the digest.
    pub fn finish(self) -> StateHash {
        self.digest.finalize().into()
    }
}

/// Digest a session at `tick`; `feed` adds everything after the tick.
pub fn session_hash(tick: u32, feed: impl FnOnce(&mut StateHasher)) -> StateHash {
    let mut hasher = StateHasher::session(tick);
    feed(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    fn resting_body(hasher: &mut StateHasher) {
        hasher.tag(1);
        hasher.body(FixedVec2::new(to_fixed(2.5), -to_fixed(1.0)), FixedVec2::ZERO);
        hasher.flags(&[true, false, false]);
        hasher.contacts(0b0100, 0);
    }

    #[test]
    fn test_same_session_same_hash() {
        assert_eq!(session_hash(42, resting_body), session_hash(42, resting_body));
    }

    #[test]
    fn test_tick_is_part_of_the_hash() {
        assert_ne!(session_hash(42, resting_body), session_hash(43, resting_body));
    }

    #[test]
    fn test_flag_positions_matter() {
        let a = session_hash(0, |h| h.flags(&[true, false]));
        let b = session_hash(0, |h| h.flags(&[false, true]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_body_order_matters() {
        let up = FixedVec2::new(0, to_fixed(1.0));
        let a = session_hash(0, |h| h.body(up, FixedVec2::ZERO));
        let b = session_hash(0, |h| h.body(FixedVec2::ZERO, up));
        assert_ne!(a, b);
    }
}

//! Session State
//!
//! Everything one play session owns: the player, the enemy roster, the map
//! and the outcome. Passed explicitly to the tick; nothing is global.

use serde::{Serialize, Deserialize};

use crate::core::hash::{session_hash, StateHash};
use crate::game::entity::Entity;
use crate::game::events::GameEvent;
use crate::game::map::TileMap;
use crate::render::RenderSink;

// =============================================================================
// OUTCOME
// =============================================================================

/// How the session ended, if it has.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[repr(u8)]
pub enum Outcome {
    /// Still playing
    #[default]
    InProgress = 0,
    /// Every enemy was stomped or fell
    MissionSuccess = 1,
    /// The player was hit or fell
    MissionFailed = 2,
}

impl Outcome {
    /// Banner shown once the session is over.
    pub fn banner(self) -> Option<&'static str> {
        match self {
            Outcome::InProgress => None,
            Outcome::MissionSuccess => Some("MISSION SUCCESS!"),
            Outcome::MissionFailed => Some("MISSION FAILED!"),
        }
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Complete state of one session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionState {
    /// Steps simulated so far
    pub tick: u32,

    /// The player
    pub player: Entity,

    /// Enemy roster. Defeated enemies stay here, flagged dead.
    pub enemies: Vec<Entity>,

    /// Level geometry
    pub map: TileMap,

    /// Current outcome
    pub outcome: Outcome,

    /// Events generated since the last `take_events`
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl SessionState {
    /// Create a session at tick 0.
    pub fn new(player: Entity, enemies: Vec<Entity>, map: TileMap) -> Self {
        Self {
            tick: 0,
            player,
            enemies,
            map,
            outcome: Outcome::InProgress,
            pending_events: Vec::new(),
        }
    }

    /// Number of stomped enemies. Recomputed from the roster on every call.
    pub fn dead_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.dead).count()
    }

    /// Whether a non-empty roster has been wiped out.
    pub fn all_enemies_dead(&self) -> bool {
        !self.enemies.is_empty() && self.dead_enemy_count() == self.enemies.len()
    }

    /// Check if the session has ended.
    pub fn is_over(&self) -> bool {
        self.outcome != Outcome::InProgress
    }

    /// Draw map, enemies and player, in that order.
    pub fn render(&self, sink: &mut dyn RenderSink) {
        self.map.render(sink);
        for enemy in &self.enemies {
            enemy.render(sink);
        }
        self.player.render(sink);
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        session_hash(self.tick, |hasher| {
            hasher.tag(self.outcome as u8);

            self.player.hash_into(hasher);

            // Roster order is fixed at setup
            hasher.count(self.enemies.len() as u32);
            for enemy in &self.enemies {
                enemy.hash_into(hasher);
            }
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

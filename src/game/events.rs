//! Game Events
//!
//! Events generated during simulation, for logging, tests and replay checks.

use serde::{Serialize, Deserialize};
use crate::game::ai::{AiState, AiType};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Player deaths processed first
    PlayerHit = 0,
    /// Then kills
    EnemyStomp = 1,
    /// Then player movement
    PlayerAction = 2,
    /// Then AI bookkeeping
    AiTransition = 3,
    /// Session outcome last
    Other = 255,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player left the ground, or jumped again mid-air
    PlayerJumped {
        double: bool,
    },

    /// Player landed on an enemy
    EnemyStomped {
        enemy: u32,
        ai_type: AiType,
    },

    /// Enemy touched the player anywhere but its top
    PlayerHit {
        enemy: u32,
    },

    /// Enemy dropped out of the level
    EnemyFell {
        enemy: u32,
    },

    /// Player dropped out of the level
    PlayerFell,

    /// Enemy AI changed state
    AiStateChanged {
        enemy: u32,
        from: AiState,
        to: AiState,
    },

    /// Every enemy is dead
    MissionSuccess,

    /// Player was hit or fell
    MissionFailed,
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Enemy involved (for tie-breaking); `None` for the player or the session
    pub subject: Option<u32>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let subject = match &data {
            GameEventData::EnemyStomped { enemy, .. } => Some(*enemy),
            GameEventData::PlayerHit { enemy } => Some(*enemy),
            GameEventData::EnemyFell { enemy } => Some(*enemy),
            GameEventData::AiStateChanged { enemy, .. } => Some(*enemy),
            _ => None,
        };

        Self {
            tick,
            priority,
            subject,
            data,
        }
    }

    /// Create player jumped event.
    pub fn player_jumped(tick: u32, double: bool) -> Self {
        Self::new(tick, EventPriority::PlayerAction, GameEventData::PlayerJumped { double })
    }

    /// Create enemy stomped event.
    pub fn enemy_stomped(tick: u32, enemy: u32, ai_type: AiType) -> Self {
        Self::new(
            tick,
            EventPriority::EnemyStomp,
            GameEventData::EnemyStomped { enemy, ai_type },
        )
    }

    /// Create player hit event.
    pub fn player_hit(tick: u32, enemy: u32) -> Self {
        Self::new(tick, EventPriority::PlayerHit, GameEventData::PlayerHit { enemy })
    }

    /// Create enemy fell event.
    pub fn enemy_fell(tick: u32, enemy: u32) -> Self {
        Self::new(tick, EventPriority::EnemyStomp, GameEventData::EnemyFell { enemy })
    }

    /// Create player fell event.
    pub fn player_fell(tick: u32) -> Self {
        Self::new(tick, EventPriority::PlayerHit, GameEventData::PlayerFell)
    }

    /// Create AI state change event.
    pub fn ai_state_changed(tick: u32, enemy: u32, from: AiState, to: AiState) -> Self {
        Self::new(
            tick,
            EventPriority::AiTransition,
            GameEventData::AiStateChanged { enemy, from, to },
        )
    }

    /// Create mission success event.
    pub fn mission_success(tick: u32) -> Self {
        Self::new(tick, EventPriority::Other, GameEventData::MissionSuccess)
    }

    /// Create mission failed event.
    pub fn mission_failed(tick: u32) -> Self {
        Self::new(tick, EventPriority::Other, GameEventData::MissionFailed)
    }

    /// Whether this event ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, GameEventData::MissionSuccess | GameEventData::MissionFailed)
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.subject == other.subject
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then subject
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.subject.cmp(&other.subject))
    }
}

//! Enemy AI
//!
//! Each archetype is a small state machine evaluated once per tick, before
//! the enemy's physics step. A behaviour only reads state and returns an
//! [`AiDecision`]; the entity applies it. All distances are horizontal and
//! pursuit is a straight line: nothing paths around tiles.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed, FIXED_ONE,
    fixed_abs, fixed_clamp, fixed_div, fixed_signum, to_fixed,
};
use crate::core::vec2::FixedVec2;
use crate::game::map::TileMap;

/// Slowest return speed of an assassin nearing its post, as a speed scale.
const MIN_RETURN_SCALE: Fixed = 16384; // 0.25

/// Enemy archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AiType {
    /// Waits until the player is close, then walks at them.
    Guard = 0,
    /// Charges fast, then returns to its post.
    Assassin = 1,
    /// Follows, leaps, then rests.
    Jumper = 2,
}

/// Behaviour state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AiState {
    /// Moving (toward the player, or home for an assassin).
    Walking = 0,
    /// Standing still.
    Idle = 1,
    /// Charging or leaping at the player.
    Attacking = 2,
    /// Cooling down after an attack.
    Reset = 3,
}

/// AI tuning, in fixed-point world units and ticks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiTuning {
    /// Guard starts walking when the player is this close.
    pub guard_aggro_radius: Fixed,
    /// Jumper follows the player within this distance.
    pub jumper_sight_range: Fixed,
    /// Jumper leaps when this close.
    pub jumper_strike_range: Fixed,
    /// Jumper leaps anyway after following this long.
    pub jumper_chase_ticks: u32,
    /// Jumper rests this long after landing.
    pub jumper_cooldown_ticks: u32,
    /// Horizontal speed scale during a leap.
    pub jumper_leap_scale: Fixed,
    /// Assassin charges when the player is this close.
    pub assassin_range: Fixed,
    /// Assassin breaks off when this close.
    pub assassin_melee_range: Fixed,
    /// Speed scale while charging.
    pub assassin_charge_scale: Fixed,
    /// Assassin is home when within this distance of its spawn.
    pub assassin_arrival_tolerance: Fixed,
    /// Assassin slows down inside this distance of its spawn.
    pub assassin_slow_radius: Fixed,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            guard_aggro_radius: to_fixed(3.0),
            jumper_sight_range: to_fixed(6.0),
            jumper_strike_range: to_fixed(1.5),
            jumper_chase_ticks: 180,    // 3 seconds
            jumper_cooldown_ticks: 120, // 2 seconds
            jumper_leap_scale: to_fixed(3.0),
            assassin_range: to_fixed(5.0),
            assassin_melee_range: to_fixed(0.75),
            assassin_charge_scale: to_fixed(2.5),
            assassin_arrival_tolerance: to_fixed(0.05),
            assassin_slow_radius: FIXED_ONE,
        }
    }
}

/// What a behaviour sees of its own entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AiView {
    /// Position resolved at the end of the previous tick.
    pub position: FixedVec2,
    /// Velocity at the end of the previous tick.
    pub velocity: FixedVec2,
    /// Half extents, for ground queries.
    pub half_extents: FixedVec2,
    /// Where the enemy was placed at level setup.
    pub spawn: FixedVec2,
    /// Current state.
    pub state: AiState,
    /// Ticks already spent in `state`.
    pub ticks_in_state: u32,
}

/// A behaviour's output for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AiDecision {
    /// State after this tick.
    pub state: AiState,
    /// Horizontal intent in [-1, 1].
    pub movement_x: Fixed,
    /// Multiplier on the entity's base speed.
    pub speed_scale: Fixed,
    /// Request a jump impulse this tick.
    pub jump: bool,
}

impl AiDecision {
    /// No movement.
    pub const fn stand(state: AiState) -> Self {
        Self { state, movement_x: 0, speed_scale: FIXED_ONE, jump: false }
    }

    /// Move toward `target_x` from `from_x` at `speed_scale`.
    pub fn toward(state: AiState, from_x: Fixed, target_x: Fixed, speed_scale: Fixed) -> Self {
        Self {
            state,
            movement_x: fixed_signum(target_x - from_x),
            speed_scale,
            jump: false,
        }
    }

    fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }
}

impl AiType {
    /// State an enemy of this type spawns in.
    pub fn initial_state(self) -> AiState {
        match self {
            AiType::Guard | AiType::Assassin => AiState::Idle,
            AiType::Jumper => AiState::Reset,
        }
    }

    /// Run this archetype's behaviour.
    pub fn decide(self, me: &AiView, player: FixedVec2, map: &TileMap, tuning: &AiTuning) -> AiDecision {
        match self {
            AiType::Guard => guard(me, player, tuning),
            AiType::Assassin => assassin(me, player, tuning),
            AiType::Jumper => jumper(me, player, map, tuning),
        }
    }
}

/// Guard: Idle beyond the aggro radius, Walking at the player inside it.
pub fn guard(me: &AiView, player: FixedVec2, tuning: &AiTuning) -> AiDecision {
    let distance = fixed_abs(player.x - me.position.x);
    if distance > tuning.guard_aggro_radius {
        return AiDecision::stand(AiState::Idle);
    }
    AiDecision::toward(AiState::Walking, me.position.x, player.x, FIXED_ONE)
}

/// Jumper: follow, leap, land, rest for a fixed number of ticks, repeat.
pub fn jumper(me: &AiView, player: FixedVec2, map: &TileMap, tuning: &AiTuning) -> AiDecision {
    let distance = fixed_abs(player.x - me.position.x);
    let chase = |state| AiDecision::toward(state, me.position.x, player.x, FIXED_ONE);
    let leap = || {
        AiDecision::toward(AiState::Attacking, me.position.x, player.x, tuning.jumper_leap_scale)
    };

    match me.state {
        AiState::Reset => {
            if me.ticks_in_state >= tuning.jumper_cooldown_ticks {
                chase(AiState::Walking)
            } else {
                AiDecision::stand(AiState::Reset)
            }
        }
        AiState::Idle | AiState::Walking => {
            if distance > tuning.jumper_sight_range {
                return AiDecision::stand(AiState::Idle);
            }
            let chased_too_long = me.state == AiState::Walking
                && me.ticks_in_state >= tuning.jumper_chase_ticks;
            if distance <= tuning.jumper_strike_range || chased_too_long {
                leap().with_jump()
            } else {
                chase(AiState::Walking)
            }
        }
        AiState::Attacking => {
            let landed = me.velocity.y <= 0 && map.is_ground_below(me.position, me.half_extents);
            // A leap that never lands gives up after the chase window
            if landed || me.ticks_in_state >= tuning.jumper_chase_ticks {
                AiDecision::stand(AiState::Reset)
            } else {
                leap()
            }
        }
    }
}

/// Assassin: charge at the player, break off, walk back to the post.
pub fn assassin(me: &AiView, player: FixedVec2, tuning: &AiTuning) -> AiDecision {
    let distance = fixed_abs(player.x - me.position.x);
    let head_home = || {
        let remaining = fixed_abs(me.spawn.x - me.position.x);
        if remaining <= tuning.assassin_arrival_tolerance {
            return AiDecision::stand(AiState::Idle);
        }
        let scale = fixed_clamp(
            fixed_div(remaining, tuning.assassin_slow_radius),
            MIN_RETURN_SCALE,
            FIXED_ONE,
        );
        AiDecision::toward(AiState::Walking, me.position.x, me.spawn.x, scale)
    };

    match me.state {
        AiState::Idle | AiState::Reset => {
            if distance <= tuning.assassin_range {
                AiDecision::toward(AiState::Attacking, me.position.x, player.x, tuning.assassin_charge_scale)
            } else {
                AiDecision::stand(AiState::Idle)
            }
        }
        AiState::Attacking => {
            if distance <= tuning.assassin_melee_range || distance > tuning.assassin_range {
                head_home()
            } else {
                AiDecision::toward(AiState::Attacking, me.position.x, player.x, tuning.assassin_charge_scale)
            }
        }
        AiState::Walking => head_home(),
    }
}

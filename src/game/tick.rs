//! Simulation Tick
//!
//! One fixed step of the session. Fully deterministic: the same state and
//! input always produce the same next state.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::fixed::{Fixed, TICK_DURATION};
use crate::game::ai::AiTuning;
use crate::game::entity::JumpKind;
use crate::game::events::GameEvent;
use crate::game::input::InputFrame;
use crate::game::state::{Outcome, SessionState};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, in (tick, priority, subject) order
    pub events: Vec<GameEvent>,
    /// Whether the session is over after this tick
    pub game_over: bool,
    /// Outcome after this tick
    pub outcome: Outcome,
}

/// Configuration for the simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Step length in seconds
    pub dt: Fixed,
    /// Enemy behaviour tuning
    pub ai: AiTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: TICK_DURATION,
            ai: AiTuning::default(),
        }
    }
}

/// Run one simulation tick.
///
/// Order: player input, player step (which resolves stomps and hits against
/// the roster), enemy steps, outcome. Once the outcome is decided the
/// session is frozen and further calls do nothing.
pub fn tick(state: &mut SessionState, input: &InputFrame, config: &SimConfig) -> TickResult {
    let mut result = TickResult::default();

    if state.is_over() {
        result.game_over = true;
        result.outcome = state.outcome;
        return result;
    }

    // 0. Advance tick counter
    state.tick += 1;

    // 1. Apply player input
    apply_input(state, input);

    // 2. Player step
    update_player(state, config);

    // 3. Enemy steps
    update_enemies(state, config);

    // 4. Outcome
    if let Some(outcome) = resolve_outcome(state) {
        end_session(state, outcome);
    }

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        tick = state.tick,
        x = state.player.position.x,
        y = state.player.position.y,
        contacts = state.player.contacts().map.bits(),
        "player"
    );

    result.events = state.take_events();
    result.events.sort();
    result.game_over = state.is_over();
    result.outcome = state.outcome;
    result
}

/// Apply input to the player.
fn apply_input(state: &mut SessionState, input: &InputFrame) {
    state.player.movement = input.move_direction();

    if input.jump_pressed() {
        if let Some(kind) = state.player.request_jump() {
            let double = kind == JumpKind::Double;
            debug!(tick = state.tick, double, "player jumped");
            state.push_event(GameEvent::player_jumped(state.tick, double));
        }
    }
}

/// Step the player against the map and the enemy roster.
fn update_player(state: &mut SessionState, config: &SimConfig) {
    let player_position = state.player.position;
    let report = state.player.update(
        config.dt,
        player_position,
        &mut state.enemies,
        &state.map,
        &config.ai,
    );

    for index in report.stomped {
        let ai_type = match state.enemies.get(index).and_then(|e| e.ai_type()) {
            Some(ai_type) => ai_type,
            None => continue,
        };
        debug!(tick = state.tick, enemy = index, ?ai_type, "enemy stomped");
        state.push_event(GameEvent::enemy_stomped(state.tick, index as u32, ai_type));
    }

    if let Some(index) = report.hit_by {
        debug!(tick = state.tick, enemy = index, "player hit");
        state.push_event(GameEvent::player_hit(state.tick, index as u32));
    }

    if report.fell_out {
        state.push_event(GameEvent::player_fell(state.tick));
    }
}

/// Step every enemy. Enemies collide with the map only; contact with the
/// player is resolved from the player's side.
fn update_enemies(state: &mut SessionState, config: &SimConfig) {
    let player_position = state.player.position;
    let mut events = Vec::new();

    for (index, enemy) in state.enemies.iter_mut().enumerate() {
        let report = enemy.update(config.dt, player_position, &mut [], &state.map, &config.ai);
        if let Some((from, to)) = report.ai_transition {
            events.push(GameEvent::ai_state_changed(state.tick, index as u32, from, to));
        }
        if report.fell_out {
            events.push(GameEvent::enemy_fell(state.tick, index as u32));
        }
    }

    for event in events {
        state.push_event(event);
    }
}

/// Decide whether this tick ended the session. A hit or fall outranks a
/// clear.
pub fn resolve_outcome(state: &SessionState) -> Option<Outcome> {
    if state.is_over() {
        return None;
    }
    if state.player.game_over {
        Some(Outcome::MissionFailed)
    } else if state.all_enemies_dead() {
        Some(Outcome::MissionSuccess)
    } else {
        None
    }
}

/// Record the outcome and emit its event.
fn end_session(state: &mut SessionState, outcome: Outcome) {
    state.outcome = outcome;
    state.player.game_over = true;

    let event = match outcome {
        Outcome::MissionSuccess => GameEvent::mission_success(state.tick),
        Outcome::MissionFailed => GameEvent::mission_failed(state.tick),
        Outcome::InProgress => return,
    };
    info!(
        tick = state.tick,
        ?outcome,
        dead = state.dead_enemy_count(),
        "session over"
    );
    state.push_event(event);
}

/// Replay a session from recorded per-step inputs.
///
/// Stops early once the session ends.
pub fn replay_session(
    initial_state: SessionState,
    inputs: &[InputFrame],
    config: &SimConfig,
) -> (SessionState, Vec<GameEvent>) {
    let mut state = initial_state;
    let mut all_events = Vec::new();

    for input in inputs {
        let result = tick(&mut state, input, config);
        all_events.extend(result.events);

        if result.game_over {
            break;
        }
    }

    (state, all_events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{to_fixed, FIXED_ONE};
    use crate::core::vec2::FixedVec2;
    use crate::game::ai::{AiState, AiType};
    use crate::game::entity::Entity;
    use crate::game::events::GameEventData;
    use crate::game::map::TileMap;

    // Floor along row 2 (top edge y = -1.5), 12 columns
    fn floor_map() -> TileMap {
        let mut tiles = vec![0; 24];
        tiles.extend([2; 12]);
        TileMap::new(12, 3, tiles, FIXED_ONE).unwrap()
    }

    fn unit(entity: Entity) -> Entity {
        entity.with_size(FIXED_ONE, FIXED_ONE)
    }

    fn session(player_at: (f64, f64), enemies: &[(AiType, f64)]) -> SessionState {
        let player = unit(Entity::player(FixedVec2::new(to_fixed(player_at.0), to_fixed(player_at.1))));
        let roster = enemies
            .iter()
            .map(|(ai, x)| unit(Entity::enemy(*ai, FixedVec2::new(to_fixed(*x), -FIXED_ONE))))
            .collect();
        SessionState::new(player, roster, floor_map())
    }

    fn run_until_over(state: &mut SessionState, input: InputFrame, max: u32) -> Vec<GameEvent> {
        let config = SimConfig::default();
        let mut events = Vec::new();
        for _ in 0..max {
            let result = tick(state, &input, &config);
            events.extend(result.events);
            if result.game_over {
                break;
            }
        }
        events
    }

    #[test]
    fn test_tick_determinism() {
        let config = SimConfig::default();
        let mut a = session((1.0, -1.0), &[(AiType::Guard, 9.0), (AiType::Jumper, 6.0)]);
        let mut b = a.clone();

        for t in 0..200u32 {
            let mut input = InputFrame::horizontal(if t % 50 < 25 { 1 } else { -1 });
            input.set_jump(t % 40 == 0);
            tick(&mut a, &input, &config);
            tick(&mut b, &input, &config);
        }

        assert_eq!(a.tick, b.tick);
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_player_moves_right() {
        let mut state = session((1.0, -1.0), &[(AiType::Guard, 10.0)]);
        tick(&mut state, &InputFrame::horizontal(1), &SimConfig::default());
        assert!(state.player.position.x > to_fixed(1.0));
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn test_jump_events() {
        let config = SimConfig::default();
        let mut state = session((1.0, -1.0), &[(AiType::Guard, 10.0)]);
        tick(&mut state, &InputFrame::new(), &config);

        let first = tick(&mut state, &InputFrame::new().jumping(), &config);
        assert!(first.events.iter().any(|e| e.data == GameEventData::PlayerJumped { double: false }));

        let second = tick(&mut state, &InputFrame::new().jumping(), &config);
        assert!(second.events.iter().any(|e| e.data == GameEventData::PlayerJumped { double: true }));

        let third = tick(&mut state, &InputFrame::new().jumping(), &config);
        assert!(third.events.is_empty());
    }

    #[test]
    fn test_stomp_wins_exactly_once() {
        let mut state = session((5.0, 0.5), &[(AiType::Guard, 5.0)]);

        let events = run_until_over(&mut state, InputFrame::new(), 120);

        assert_eq!(state.outcome, Outcome::MissionSuccess);
        assert!(state.player.game_over);
        assert!(state.enemies[0].dead);
        assert!(!state.enemies[0].is_active());
        assert_eq!(state.dead_enemy_count(), 1);

        let stomped = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::EnemyStomped { enemy: 0, ai_type: AiType::Guard }))
            .count();
        let wins = events.iter().filter(|e| e.data == GameEventData::MissionSuccess).count();
        assert_eq!(stomped, 1);
        assert_eq!(wins, 1);

        // Frozen afterwards
        let tick_at_end = state.tick;
        let hash_at_end = state.compute_hash();
        for _ in 0..10 {
            let result = tick(&mut state, &InputFrame::horizontal(1).jumping(), &SimConfig::default());
            assert!(result.events.is_empty());
            assert!(result.game_over);
            assert_eq!(result.outcome, Outcome::MissionSuccess);
        }
        assert_eq!(state.tick, tick_at_end);
        assert_eq!(state.compute_hash(), hash_at_end);
    }

    #[test]
    fn test_stomping_every_archetype_wins_once() {
        let mut tiles = vec![0; 80];
        tiles.extend([2; 40]);
        let map = TileMap::new(40, 3, tiles, FIXED_ONE).unwrap();
        let enemy = |ai, x| unit(Entity::enemy(ai, FixedVec2::new(to_fixed(x), -FIXED_ONE)));
        let roster = vec![
            enemy(AiType::Jumper, 15.0),
            enemy(AiType::Assassin, 30.0),
            enemy(AiType::Guard, 2.0),
        ];
        let player = unit(Entity::player(FixedVec2::new(to_fixed(8.0), -FIXED_ONE)));
        let mut state = SessionState::new(player, roster, map);
        let config = SimConfig::default();

        let mut events = Vec::new();
        for target in 0..3 {
            assert!(!state.is_over(), "ended before enemy {target}");
            state.player.position = FixedVec2::new(state.enemies[target].position.x, to_fixed(2.0));
            state.player.velocity = FixedVec2::ZERO;

            for _ in 0..90 {
                events.extend(tick(&mut state, &InputFrame::new(), &config).events);
            }
            assert!(state.enemies[target].dead, "enemy {target} survived");
        }

        assert_eq!(state.outcome, Outcome::MissionSuccess);
        assert_eq!(state.dead_enemy_count(), 3);

        let stomps: Vec<u32> = events
            .iter()
            .filter_map(|e| match e.data {
                GameEventData::EnemyStomped { enemy, .. } => Some(enemy),
                _ => None,
            })
            .collect();
        assert_eq!(stomps, vec![0, 1, 2]);

        let wins = events.iter().filter(|e| e.data == GameEventData::MissionSuccess).count();
        assert_eq!(wins, 1);
        assert!(events.last().is_some_and(|e| e.is_terminal()));
        assert!(!events.iter().any(|e| e.data == GameEventData::MissionFailed));
    }

    // Floor with a bottomless gap at columns 4 and 5
    fn gap_map() -> TileMap {
        let mut tiles = vec![0; 24];
        tiles.extend([2, 2, 2, 2, 0, 0, 2, 2, 2, 2, 2, 2]);
        TileMap::new(12, 3, tiles, FIXED_ONE).unwrap()
    }

    #[test]
    fn test_player_falling_out_fails() {
        let player = unit(Entity::player(FixedVec2::new(to_fixed(1.0), -FIXED_ONE)));
        let guard = unit(Entity::enemy(AiType::Guard, FixedVec2::new(to_fixed(11.0), -FIXED_ONE)));
        let mut state = SessionState::new(player, vec![guard], gap_map());

        let events = run_until_over(&mut state, InputFrame::horizontal(1), 600);

        assert_eq!(state.outcome, Outcome::MissionFailed);
        assert!(!state.enemies[0].dead);
        let fell = events.iter().position(|e| e.data == GameEventData::PlayerFell);
        let failed = events.iter().position(|e| e.data == GameEventData::MissionFailed);
        assert!(fell.is_some());
        assert!(fell < failed);
        assert!(!events.iter().any(|e| matches!(e.data, GameEventData::PlayerHit { .. })));
    }

    #[test]
    fn test_enemy_falling_out_leaves_play() {
        let player = unit(Entity::player(FixedVec2::new(to_fixed(10.0), -FIXED_ONE)));
        let guards = vec![
            unit(Entity::enemy(AiType::Guard, FixedVec2::new(to_fixed(4.5), 0))),
            unit(Entity::enemy(AiType::Guard, FixedVec2::new(to_fixed(1.0), -FIXED_ONE))),
        ];
        let mut state = SessionState::new(player, guards, gap_map());
        let config = SimConfig::default();

        let mut events = Vec::new();
        for _ in 0..10_000 {
            events.extend(tick(&mut state, &InputFrame::new(), &config).events);
        }

        assert_eq!(state.tick, 10_000);
        assert!(state.enemies[0].dead);
        assert!(!state.enemies[0].is_active());
        assert!(state.enemies[0].position.y > state.map.fall_limit() - FIXED_ONE);
        assert!(!state.enemies[1].dead);
        assert_eq!(state.outcome, Outcome::InProgress);

        let falls: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::EnemyFell { .. }))
            .collect();
        assert_eq!(falls.len(), 1);
        assert_eq!(falls[0].subject, Some(0));
        assert!(!events.iter().any(|e| matches!(e.data, GameEventData::EnemyStomped { .. })));
    }

    #[test]
    fn test_walking_into_enemy_fails() {
        let mut state = session((1.0, -1.0), &[(AiType::Guard, 3.0)]);

        let events = run_until_over(&mut state, InputFrame::horizontal(1), 120);

        assert_eq!(state.outcome, Outcome::MissionFailed);
        assert!(!state.enemies[0].dead);

        let hit = events.iter().position(|e| e.data == GameEventData::PlayerHit { enemy: 0 });
        let failed = events.iter().position(|e| e.data == GameEventData::MissionFailed);
        assert!(hit.is_some());
        assert!(hit < failed);
    }

    #[test]
    fn test_failure_outranks_success() {
        let mut state = session((1.0, -1.0), &[(AiType::Guard, 8.0)]);
        state.enemies[0].dead = true;
        state.player.game_over = true;

        assert_eq!(resolve_outcome(&state), Some(Outcome::MissionFailed));

        state.player.game_over = false;
        assert_eq!(resolve_outcome(&state), Some(Outcome::MissionSuccess));

        state.outcome = Outcome::MissionSuccess;
        assert_eq!(resolve_outcome(&state), None);
    }

    #[test]
    fn test_guard_holds_position_while_player_is_far() {
        let config = SimConfig::default();
        let mut state = session((1.0, -1.0), &[(AiType::Guard, 10.0)]);

        for _ in 0..30 {
            tick(&mut state, &InputFrame::new(), &config);
        }
        let rest = state.enemies[0].position;

        for _ in 0..600 {
            let result = tick(&mut state, &InputFrame::new(), &config);
            assert!(result.events.is_empty());
        }
        assert_eq!(state.enemies[0].position, rest);
        assert_eq!(state.enemies[0].ai_state(), Some(AiState::Idle));
    }

    #[test]
    fn test_ai_transitions_become_events() {
        let mut state = session((7.0, -1.0), &[(AiType::Guard, 9.0)]);
        let result = tick(&mut state, &InputFrame::new(), &SimConfig::default());

        assert!(result.events.iter().any(|e| e.data
            == GameEventData::AiStateChanged { enemy: 0, from: AiState::Idle, to: AiState::Walking }));
    }

    #[test]
    fn test_replay_determinism() {
        let initial = session((1.0, -1.0), &[(AiType::Jumper, 5.0), (AiType::Assassin, 10.0)]);

        let inputs: Vec<InputFrame> = (0..300)
            .map(|t| {
                let frame = InputFrame::horizontal(if (t / 30) % 2 == 0 { 1 } else { -1 });
                if t % 45 == 0 { frame.jumping() } else { frame }
            })
            .collect();

        let (final1, events1) = replay_session(initial.clone(), &inputs, &SimConfig::default());
        let (final2, events2) = replay_session(initial, &inputs, &SimConfig::default());

        assert_eq!(final1.compute_hash(), final2.compute_hash());
        assert_eq!(events1.len(), events2.len());
        assert_eq!(final1.tick, final2.tick);
    }
}

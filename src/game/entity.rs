//! Entities
//!
//! One type covers the player and the enemies. Enemies carry
//! a [`Brain`]; the player is driven by input. [`Entity::update`] advances a
//! single entity by one fixed step.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{
    Fixed, FIXED_HALF, FIXED_ONE,
    DEFAULT_EXTENT, GRAVITY, JUMP_POWER, PLAYER_SPEED,
    fixed_mul,
};
use crate::core::hash::StateHasher;
use crate::core::vec2::FixedVec2;
use crate::game::ai::{AiDecision, AiState, AiTuning, AiType, AiView};
use crate::game::collision::{
    resolve_entities, resolve_map, Aabb, Axis, ContactSet,
};
use crate::game::map::TileMap;
use crate::render::{ModelTransform, RenderSink, TextureHandle};

// =============================================================================
// IDENTITY
// =============================================================================

/// What an entity is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityType {
    /// The player.
    Player = 1,
    /// An AI-driven enemy.
    Enemy = 2,
}

/// Which jump an input produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpKind {
    /// Jump from the ground.
    Ground,
    /// Second jump while airborne.
    Double,
}

/// AI state carried by an enemy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brain {
    /// Archetype.
    pub ai_type: AiType,
    /// Current state.
    pub state: AiState,
    /// Position at level setup.
    pub spawn: FixedVec2,
    /// Ticks spent in `state`.
    pub ticks_in_state: u32,
}

impl Brain {
    /// Fresh brain in the archetype's starting state.
    pub fn new(ai_type: AiType, spawn: FixedVec2) -> Self {
        Self {
            ai_type,
            state: ai_type.initial_state(),
            spawn,
            ticks_in_state: 0,
        }
    }

    /// Record the state chosen this tick.
    fn commit(&mut self, next: AiState) -> Option<(AiState, AiState)> {
        if next == self.state {
            self.ticks_in_state = self.ticks_in_state.saturating_add(1);
            None
        } else {
            let from = self.state;
            self.state = next;
            self.ticks_in_state = 1;
            Some((from, next))
        }
    }
}

// =============================================================================
// STEP REPORT
// =============================================================================

/// What happened to one entity during one step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Contacts from this step.
    pub contacts: ContactSet,
    /// Indices (into `others`) of enemies stomped.
    pub stomped: Vec<usize>,
    /// Index (into `others`) of the enemy that hit the player.
    pub hit_by: Option<usize>,
    /// AI transition as (from, to).
    pub ai_transition: Option<(AiState, AiState)>,
    /// Dropped below the map and left play this step.
    pub fell_out: bool,
}

// =============================================================================
// ENTITY
// =============================================================================

/// A simulated actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Role.
    pub entity_type: EntityType,
    /// AI, for enemies only.
    pub brain: Option<Brain>,

    /// Centre of the bounding box.
    pub position: FixedVec2,
    /// Velocity (units per second).
    pub velocity: FixedVec2,
    /// Constant acceleration, usually gravity.
    pub acceleration: FixedVec2,
    /// Movement intent; x drives horizontal velocity.
    pub movement: FixedVec2,
    /// Base horizontal speed.
    pub speed: Fixed,
    /// Multiplier on `speed`, set by the AI.
    pub speed_scale: Fixed,

    width: Fixed,
    height: Fixed,
    active: bool,

    /// Killed by a stomp.
    pub dead: bool,
    /// Jump impulse pending for the next step.
    pub is_jumping: bool,
    /// Vertical velocity set by a jump.
    pub jumping_power: Fixed,
    /// Jumps since the last landing (0..=2).
    pub jump_counter: u8,

    contacts: ContactSet,

    /// Player only: the session is over.
    pub game_over: bool,

    /// Sprite.
    pub texture: TextureHandle,
    model: ModelTransform,
}

impl Entity {
    /// Bare entity with default extents and no forces.
    pub fn new(entity_type: EntityType, position: FixedVec2) -> Self {
        let mut entity = Self {
            entity_type,
            brain: None,
            position,
            velocity: FixedVec2::ZERO,
            acceleration: FixedVec2::ZERO,
            movement: FixedVec2::ZERO,
            speed: 0,
            speed_scale: FIXED_ONE,
            width: DEFAULT_EXTENT,
            height: DEFAULT_EXTENT,
            active: true,
            dead: false,
            is_jumping: false,
            jumping_power: 0,
            jump_counter: 0,
            contacts: ContactSet::default(),
            game_over: false,
            texture: TextureHandle::default(),
            model: ModelTransform::default(),
        };
        entity.refresh_model();
        entity
    }

    /// Player under gravity with the standard speed and jump.
    pub fn player(position: FixedVec2) -> Self {
        Self::new(EntityType::Player, position)
            .with_speed(PLAYER_SPEED)
            .with_acceleration(FixedVec2::new(0, GRAVITY))
            .with_jumping_power(JUMP_POWER)
    }

    /// Enemy under gravity that remembers `position` as its spawn.
    pub fn enemy(ai_type: AiType, position: FixedVec2) -> Self {
        let mut entity = Self::new(EntityType::Enemy, position)
            .with_speed(FIXED_ONE)
            .with_acceleration(FixedVec2::new(0, GRAVITY));
        entity.brain = Some(Brain::new(ai_type, position));
        entity
    }

    /// Set full extents.
    pub fn with_size(mut self, width: Fixed, height: Fixed) -> Self {
        self.set_width(width);
        self.set_height(height);
        self
    }

    /// Set base speed.
    pub fn with_speed(mut self, speed: Fixed) -> Self {
        self.speed = speed;
        self
    }

    /// Set constant acceleration.
    pub fn with_acceleration(mut self, acceleration: FixedVec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Set sprite.
    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = texture;
        self
    }

    /// Set jump impulse.
    pub fn with_jumping_power(mut self, power: Fixed) -> Self {
        self.jumping_power = power;
        self
    }

    /// Override the starting AI state. No effect without a brain.
    pub fn with_ai_state(mut self, state: AiState) -> Self {
        if let Some(brain) = self.brain.as_mut() {
            brain.state = state;
            brain.ticks_in_state = 0;
        }
        self
    }

    /// Set full width. Setup only.
    pub fn set_width(&mut self, width: Fixed) {
        self.width = width;
        self.refresh_model();
    }

    /// Set full height. Setup only.
    pub fn set_height(&mut self, height: Fixed) {
        self.height = height;
        self.refresh_model();
    }

    /// Full width.
    #[inline]
    pub fn width(&self) -> Fixed {
        self.width
    }

    /// Full height.
    #[inline]
    pub fn height(&self) -> Fixed {
        self.height
    }

    /// Half width and half height.
    #[inline]
    pub fn half_extents(&self) -> FixedVec2 {
        FixedVec2::new(fixed_mul(self.width, FIXED_HALF), fixed_mul(self.height, FIXED_HALF))
    }

    /// Current bounding box.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.position, self.half_extents())
    }

    /// Contacts from the last step.
    #[inline]
    pub fn contacts(&self) -> ContactSet {
        self.contacts
    }

    /// Whether the entity takes part in the simulation.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Remove from simulation and rendering. The entity stays in its roster.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Archetype, for enemies.
    pub fn ai_type(&self) -> Option<AiType> {
        self.brain.as_ref().map(|b| b.ai_type)
    }

    /// AI state, for enemies.
    pub fn ai_state(&self) -> Option<AiState> {
        self.brain.as_ref().map(|b| b.state)
    }

    /// Transform used for drawing.
    pub fn model(&self) -> &ModelTransform {
        &self.model
    }

    /// Ask for a jump: from the ground, or one more while airborne.
    ///
    /// Returns the kind of jump granted, or `None` when both are spent.
    pub fn request_jump(&mut self) -> Option<JumpKind> {
        if self.contacts.grounded() {
            self.jump_counter = 1;
            self.is_jumping = true;
            Some(JumpKind::Ground)
        } else if self.jump_counter == 1 {
            self.jump_counter = 2;
            self.is_jumping = true;
            Some(JumpKind::Double)
        } else {
            None
        }
    }

    /// Advance one fixed step.
    ///
    /// `others` are the bodies this entity collides with; the player passes
    /// the enemy roster, enemies pass nothing. Indices in the report refer
    /// to `others`.
    pub fn update(
        &mut self,
        dt: Fixed,
        player_position: FixedVec2,
        others: &mut [Entity],
        map: &TileMap,
        tuning: &AiTuning,
    ) -> StepReport {
        let mut report = StepReport::default();
        if !self.active || self.dead {
            return report;
        }

        if self.brain.is_some() {
            report.ai_transition = self.think(player_position, map, tuning);
        }

        if self.is_jumping {
            self.velocity.y = self.jumping_power;
            self.is_jumping = false;
        }

        self.velocity = self.velocity + self.acceleration.scale(dt);
        self.velocity.x = fixed_mul(fixed_mul(self.movement.x, self.speed), self.speed_scale);

        self.position.x += fixed_mul(self.velocity.x, dt);
        let map_x = resolve_map(self, map, Axis::X);
        let hits_x = resolve_entities(self, others, Axis::X);

        self.position.y += fixed_mul(self.velocity.y, dt);
        let map_y = resolve_map(self, map, Axis::Y);
        let hits_y = resolve_entities(self, others, Axis::Y);

        if self.position.y < map.fall_limit() {
            self.fall_out();
            report.fell_out = true;
        }

        self.contacts = ContactSet::new(map_x.union(map_y), hits_x.sides.union(hits_y.sides));
        if self.contacts.grounded() {
            self.jump_counter = 0;
        }

        report.contacts = self.contacts;
        report.stomped = hits_x.stomped;
        report.stomped.extend(hits_y.stomped);
        report.hit_by = hits_x.hit_by.or(hits_y.hit_by);

        self.refresh_model();
        report
    }

    /// Leave play after dropping out of the level. An enemy counts as
    /// defeated; the player ends the session.
    fn fall_out(&mut self) {
        match self.entity_type {
            EntityType::Player => self.game_over = true,
            EntityType::Enemy => self.dead = true,
        }
        self.active = false;
        self.velocity = FixedVec2::ZERO;
        self.movement = FixedVec2::ZERO;
        self.is_jumping = false;
        debug!(entity = ?self.entity_type, y = self.position.y, "fell out of the level");
    }

    /// Run the brain and apply its decision.
    fn think(&mut self, player_position: FixedVec2, map: &TileMap, tuning: &AiTuning) -> Option<(AiState, AiState)> {
        let view = {
            let brain = self.brain.as_ref()?;
            AiView {
                position: self.position,
                velocity: self.velocity,
                half_extents: self.half_extents(),
                spawn: brain.spawn,
                state: brain.state,
                ticks_in_state: brain.ticks_in_state,
            }
        };
        let ai_type = self.ai_type()?;
        let decision: AiDecision = ai_type.decide(&view, player_position, map, tuning);

        self.movement = FixedVec2::new(decision.movement_x, 0);
        self.speed_scale = decision.speed_scale;
        if decision.jump && self.contacts.grounded() {
            self.is_jumping = true;
        }

        let transition = self.brain.as_mut()?.commit(decision.state);
        if let Some((from, to)) = transition {
            debug!("{:?} at x={} changed {:?} -> {:?}", ai_type, self.position.x, from, to);
        }
        transition
    }

    fn refresh_model(&mut self) {
        self.model = ModelTransform {
            translation: self.position,
            scale: FixedVec2::new(self.width, self.height),
        };
    }

    /// Draw the sprite. Inactive entities draw nothing.
    pub fn render(&self, sink: &mut dyn RenderSink) {
        if !self.active {
            return;
        }
        sink.draw_quad(self.texture, &self.model);
    }

    /// Feed this entity into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.tag(self.entity_type as u8);
        match &self.brain {
            Some(brain) => {
                hasher.tag(brain.ai_type as u8);
                hasher.tag(brain.state as u8);
                hasher.count(brain.ticks_in_state);
            }
            None => hasher.tag(u8::MAX),
        }
        hasher.body(self.position, self.velocity);
        hasher.intent(self.movement, self.speed_scale);
        hasher.flags(&[self.active, self.dead, self.game_over, self.is_jumping]);
        hasher.tag(self.jump_counter);
        hasher.contacts(self.contacts.map.bits(), self.contacts.entity.bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{fixed_abs, to_fixed, TICK_DURATION};
    use crate::render::FrameRecorder;
    use proptest::prelude::*;

    // Floor along row 2 (top edge at y = -1.5), 10 columns wide
    fn floor_map() -> TileMap {
        let mut tiles = vec![0; 20];
        tiles.extend([3; 10]);
        TileMap::new(10, 3, tiles, FIXED_ONE).unwrap()
    }

    fn empty_map() -> TileMap {
        TileMap::new(1, 1, vec![0], FIXED_ONE).unwrap()
    }

    fn unit_player(x: f64, y: f64) -> Entity {
        Entity::player(FixedVec2::new(to_fixed(x), to_fixed(y))).with_size(FIXED_ONE, FIXED_ONE)
    }

    fn step(entity: &mut Entity, others: &mut [Entity], map: &TileMap) -> StepReport {
        entity.update(TICK_DURATION, FixedVec2::ZERO, others, map, &AiTuning::default())
    }

    fn settle(entity: &mut Entity, map: &TileMap) {
        for _ in 0..120 {
            step(entity, &mut [], map);
        }
    }

    #[test]
    fn test_constructors() {
        let player = Entity::player(FixedVec2::ZERO);
        assert_eq!(player.entity_type, EntityType::Player);
        assert_eq!(player.speed, PLAYER_SPEED);
        assert_eq!(player.acceleration.y, GRAVITY);
        assert_eq!(player.width(), DEFAULT_EXTENT);
        assert!(player.brain.is_none());

        let jumper = Entity::enemy(AiType::Jumper, FixedVec2::from_ints(2, 3));
        assert_eq!(jumper.ai_type(), Some(AiType::Jumper));
        assert_eq!(jumper.ai_state(), Some(AiState::Reset));
        assert_eq!(jumper.brain.as_ref().unwrap().spawn, FixedVec2::from_ints(2, 3));

        let guard = Entity::enemy(AiType::Guard, FixedVec2::ZERO).with_ai_state(AiState::Walking);
        assert_eq!(guard.ai_state(), Some(AiState::Walking));

        let player = Entity::player(FixedVec2::ZERO).with_ai_state(AiState::Walking);
        assert_eq!(player.ai_state(), None);
    }

    #[test]
    fn test_falls_and_lands() {
        let map = floor_map();
        let mut player = unit_player(2.0, 0.0);

        let first = step(&mut player, &mut [], &map);
        assert!(player.velocity.y < 0, "gravity applies on the first step");
        assert!(!first.contacts.grounded());

        settle(&mut player, &map);
        assert!(player.contacts().grounded());
        assert_eq!(player.position.y, -FIXED_ONE);
        assert_eq!(player.velocity.y, 0);
        assert_eq!(player.model().translation, player.position);
    }

    #[test]
    fn test_horizontal_velocity_follows_movement() {
        let map = floor_map();
        let mut player = unit_player(2.0, -1.0);
        player.movement = FixedVec2::new(FIXED_ONE, 0);

        step(&mut player, &mut [], &map);

        assert_eq!(player.velocity.x, PLAYER_SPEED);
        assert_eq!(player.position.x, to_fixed(2.0) + fixed_mul(PLAYER_SPEED, TICK_DURATION));
    }

    #[test]
    fn test_double_jump_then_exhausted() {
        let map = floor_map();
        let mut player = unit_player(2.0, -1.0);
        settle(&mut player, &map);

        assert_eq!(player.request_jump(), Some(JumpKind::Ground));
        step(&mut player, &mut [], &map);
        assert!(player.velocity.y > 0);
        assert!(!player.is_jumping, "impulse lasts one step");
        assert!(!player.contacts().grounded());

        assert_eq!(player.request_jump(), Some(JumpKind::Double));
        step(&mut player, &mut [], &map);
        assert_eq!(player.request_jump(), None);

        settle(&mut player, &map);
        assert_eq!(player.jump_counter, 0);
        assert_eq!(player.request_jump(), Some(JumpKind::Ground));
    }

    #[test]
    fn test_no_jump_when_falling_off_a_ledge() {
        let mut player = unit_player(0.0, 5.0);
        step(&mut player, &mut [], &empty_map());
        assert_eq!(player.request_jump(), None);
    }

    #[test]
    fn test_inactive_and_dead_are_frozen() {
        let map = floor_map();
        let mut player = unit_player(2.0, 0.0);
        player.deactivate();
        assert_eq!(step(&mut player, &mut [], &map), StepReport::default());
        assert_eq!(player.position, FixedVec2::new(to_fixed(2.0), 0));

        player.active = true;
        player.dead = true;
        step(&mut player, &mut [], &map);
        assert_eq!(player.position, FixedVec2::new(to_fixed(2.0), 0));
    }

    #[test]
    fn test_stomp_reported_with_index() {
        let map = empty_map();
        let mut player = unit_player(5.0, 1.0);
        player.velocity.y = -to_fixed(3.0);
        let mut enemies = vec![
            Entity::enemy(AiType::Guard, FixedVec2::from_ints(0, 0)).with_size(FIXED_ONE, FIXED_ONE),
            Entity::enemy(AiType::Guard, FixedVec2::from_ints(5, 0)).with_size(FIXED_ONE, FIXED_ONE),
        ];
        enemies[1].position.y = -to_fixed(0.02);

        let report = step(&mut player, &mut enemies, &map);

        assert_eq!(report.stomped, vec![1]);
        assert!(enemies[1].dead);
        assert!(!enemies[0].dead);
        assert!(!player.game_over);
    }

    #[test]
    fn test_enemy_reports_ai_transition() {
        let map = floor_map();
        let mut guard = Entity::enemy(AiType::Guard, FixedVec2::from_ints(5, -1))
            .with_size(FIXED_ONE, FIXED_ONE);

        let near = FixedVec2::from_ints(6, -1);
        let report = guard.update(TICK_DURATION, near, &mut [], &map, &AiTuning::default());
        assert_eq!(report.ai_transition, Some((AiState::Idle, AiState::Walking)));
        assert_eq!(guard.brain.as_ref().unwrap().ticks_in_state, 1);
        assert!(guard.position.x > to_fixed(5.0));

        let report = guard.update(TICK_DURATION, near, &mut [], &map, &AiTuning::default());
        assert_eq!(report.ai_transition, None);
        assert_eq!(guard.brain.as_ref().unwrap().ticks_in_state, 2);
    }

    #[test]
    fn test_jumper_rests_for_cooldown_then_walks() {
        let map = floor_map();
        let tuning = AiTuning::default();
        let mut jumper = Entity::enemy(AiType::Jumper, FixedVec2::from_ints(2, -1))
            .with_size(FIXED_ONE, FIXED_ONE)
            .with_speed(FIXED_HALF)
            .with_jumping_power(to_fixed(4.0));
        let player = FixedVec2::from_ints(6, -1);
        let start_x = jumper.position.x;

        for _ in 0..tuning.jumper_cooldown_ticks {
            jumper.update(TICK_DURATION, player, &mut [], &map, &tuning);
            assert_eq!(jumper.ai_state(), Some(AiState::Reset));
            assert_eq!(jumper.position.x, start_x);
        }

        let report = jumper.update(TICK_DURATION, player, &mut [], &map, &tuning);
        assert_eq!(report.ai_transition, Some((AiState::Reset, AiState::Walking)));
        assert!(jumper.position.x > start_x);
    }

    #[test]
    fn test_jumper_leaps_and_returns_to_reset() {
        let map = floor_map();
        let tuning = AiTuning::default();
        let mut jumper = Entity::enemy(AiType::Jumper, FixedVec2::from_ints(2, -1))
            .with_size(FIXED_ONE, FIXED_ONE)
            .with_speed(FIXED_HALF)
            .with_jumping_power(to_fixed(4.0))
            .with_ai_state(AiState::Walking);
        settle_enemy(&mut jumper, &map);
        jumper.brain.as_mut().unwrap().state = AiState::Walking;

        let player = FixedVec2::from_ints(3, -1);
        jumper.update(TICK_DURATION, player, &mut [], &map, &tuning);
        assert_eq!(jumper.ai_state(), Some(AiState::Attacking));
        assert!(jumper.velocity.y > 0, "leap applied");

        let mut landed = false;
        for _ in 0..240 {
            jumper.update(TICK_DURATION, player, &mut [], &map, &tuning);
            if jumper.ai_state() == Some(AiState::Reset) {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert!(jumper.contacts().grounded());
    }

    fn settle_enemy(enemy: &mut Entity, map: &TileMap) {
        // Far-away player keeps the brain quiet while it lands
        let far = FixedVec2::from_ints(1000, 0);
        for _ in 0..30 {
            enemy.update(TICK_DURATION, far, &mut [], map, &AiTuning::default());
        }
    }

    #[test]
    fn test_falling_out_ends_the_player() {
        let map = empty_map();
        let mut player = unit_player(0.0, 0.0);

        let mut fell = false;
        for _ in 0..600 {
            fell |= step(&mut player, &mut [], &map).fell_out;
        }

        assert!(fell);
        assert!(player.game_over);
        assert!(!player.dead);
        assert!(!player.is_active());
        assert!(player.position.y < map.fall_limit());
        assert!(player.position.y > map.fall_limit() - FIXED_ONE);
        assert_eq!(player.velocity, FixedVec2::ZERO);
    }

    #[test]
    fn test_falling_out_defeats_an_enemy() {
        let map = empty_map();
        let mut guard = Entity::enemy(AiType::Guard, FixedVec2::ZERO).with_size(FIXED_ONE, FIXED_ONE);

        let mut fell = 0;
        for _ in 0..600 {
            if guard.update(TICK_DURATION, FixedVec2::ZERO, &mut [], &map, &AiTuning::default()).fell_out {
                fell += 1;
            }
        }

        assert_eq!(fell, 1);
        assert!(guard.dead);
        assert!(!guard.is_active());
        assert!(!guard.game_over);
    }

    #[test]
    fn test_render_skips_inactive() {
        let mut recorder = FrameRecorder::new();
        let mut player = unit_player(0.0, 0.0).with_texture(TextureHandle(4));
        player.render(&mut recorder);
        player.deactivate();
        player.render(&mut recorder);
        assert_eq!(recorder.quad_count(), 1);
    }

    #[test]
    fn test_hash_tracks_state() {
        let hash = |e: &Entity| {
            let mut hasher = StateHasher::session(0);
            e.hash_into(&mut hasher);
            hasher.finish()
        };
        let a = unit_player(1.0, 1.0);
        let mut b = a.clone();
        assert_eq!(hash(&a), hash(&b));
        b.position.x += 1;
        assert_ne!(hash(&a), hash(&b));
    }

    proptest! {
        #[test]
        fn prop_horizontal_step_is_bounded(
            move_x in -FIXED_ONE..=FIXED_ONE,
            start_x in -(50 * FIXED_ONE)..(50 * FIXED_ONE),
            vy in -(8 * FIXED_ONE)..(8 * FIXED_ONE),
        ) {
            let mut player = Entity::player(FixedVec2::new(start_x, 0)).with_size(FIXED_ONE, FIXED_ONE);
            player.movement = FixedVec2::new(move_x, 0);
            player.velocity.y = vy;

            step(&mut player, &mut [], &empty_map());

            let bound = fixed_mul(PLAYER_SPEED, TICK_DURATION) + 2;
            prop_assert!(fixed_abs(player.position.x - start_x) <= bound);
        }
    }
}

//! Collision Detection and Resolution
//!
//! Axis-separated AABB resolution against the tile map and against other
//! entities. Each pass returns the sides that were touched; the entity
//! folds them into one immutable [`ContactSet`] per tick.
//!
//! There is no broad phase. A level has at most 125 tiles and three
//! enemies, so every check walks the full lists.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, fixed_abs};
use crate::core::vec2::FixedVec2;
use crate::game::entity::{Entity, EntityType};
use crate::game::map::TileMap;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aabb {
    /// Centre.
    pub center: FixedVec2,
    /// Half extents.
    pub half: FixedVec2,
}

impl Aabb {
    /// Create a box from its centre and half extents.
    #[inline]
    pub const fn new(center: FixedVec2, half: FixedVec2) -> Self {
        Self { center, half }
    }

    /// Strict overlap test. Boxes that share an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let dx = fixed_abs(self.center.x - other.center.x);
        let dy = fixed_abs(self.center.y - other.center.y);
        dx < self.half.x + other.half.x && dy < self.half.y + other.half.y
    }
}

/// Resolution axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal pass.
    X,
    /// Vertical pass.
    Y,
}

/// Sides of a box that touched something during a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sides {
    /// Blocked from above.
    pub top: bool,
    /// Supported from below.
    pub bottom: bool,
    /// Blocked on the left.
    pub left: bool,
    /// Blocked on the right.
    pub right: bool,
}

impl Sides {
    /// Sides touched in either set.
    #[inline]
    pub fn union(self, other: Sides) -> Sides {
        Sides {
            top: self.top || other.top,
            bottom: self.bottom || other.bottom,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }

    /// Whether any side was touched.
    #[inline]
    pub fn any(self) -> bool {
        self.top || self.bottom || self.left || self.right
    }

    /// Pack into four bits (top, bottom, left, right) for hashing.
    #[inline]
    pub fn bits(self) -> u8 {
        (self.top as u8) | (self.bottom as u8) << 1 | (self.left as u8) << 2 | (self.right as u8) << 3
    }
}

/// Everything an entity touched during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactSet {
    /// Contacts with map tiles.
    pub map: Sides,
    /// Contacts with other entities.
    pub entity: Sides,
}

impl ContactSet {
    /// Build from the two families.
    pub const fn new(map: Sides, entity: Sides) -> Self {
        Self { map, entity }
    }

    /// Standing on a tile.
    #[inline]
    pub fn grounded(&self) -> bool {
        self.map.bottom
    }
}

/// Outcome of an entity-vs-entity pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityContacts {
    /// Sides touched.
    pub sides: Sides,
    /// Indices of enemies killed by landing on them.
    pub stomped: Vec<usize>,
    /// First enemy that hit the player, if any.
    pub hit_by: Option<usize>,
}

/// Resolve one axis against every solid tile.
///
/// Tiles only push back along the direction of travel; a body that is not
/// moving on `axis` is left for the other pass.
pub fn resolve_map(entity: &mut Entity, map: &TileMap, axis: Axis) -> Sides {
    let mut sides = Sides::default();
    let direction = match axis {
        Axis::X => entity.velocity.x,
        Axis::Y => entity.velocity.y,
    };
    if direction == 0 {
        return sides;
    }

    for tile in map.solid_tiles() {
        let body = entity.aabb();
        if !body.overlaps(&tile) {
            continue;
        }

        match axis {
            Axis::X => {
                let reach = body.half.x + tile.half.x;
                if direction > 0 {
                    let penetration = reach - (tile.center.x - body.center.x);
                    entity.position.x -= penetration;
                    sides.right = true;
                } else {
                    let penetration = reach - (body.center.x - tile.center.x);
                    entity.position.x += penetration;
                    sides.left = true;
                }
                entity.velocity.x = 0;
            }
            Axis::Y => {
                let reach = body.half.y + tile.half.y;
                if direction > 0 {
                    let penetration = reach - (tile.center.y - body.center.y);
                    entity.position.y -= penetration;
                    sides.top = true;
                } else {
                    let penetration = reach - (body.center.y - tile.center.y);
                    entity.position.y += penetration;
                    sides.bottom = true;
                }
                entity.velocity.y = 0;
            }
        }
    }

    sides
}

/// Resolve one axis against other entities.
///
/// Bodies are pushed away from the other's centre. When the mover is the
/// player and the other is an enemy, contact is also combat: landing on the
/// enemy's top while falling kills it, any other touch ends the game.
pub fn resolve_entities(entity: &mut Entity, others: &mut [Entity], axis: Axis) -> EntityContacts {
    let mut contacts = EntityContacts::default();

    for (index, other) in others.iter_mut().enumerate() {
        if !other.is_active() || other.dead {
            continue;
        }

        let body = entity.aabb();
        let target = other.aabb();
        if !body.overlaps(&target) {
            continue;
        }

        let combat = entity.entity_type == EntityType::Player
            && other.entity_type == EntityType::Enemy;

        match axis {
            Axis::X => {
                let reach = body.half.x + target.half.x;
                let offset = body.center.x - target.center.x;
                let from_left = tie_break(offset, entity.velocity.x > 0);
                if from_left {
                    entity.position.x = target.center.x - reach;
                    contacts.sides.right = true;
                } else {
                    entity.position.x = target.center.x + reach;
                    contacts.sides.left = true;
                }
                entity.velocity.x = 0;

                if combat {
                    entity.game_over = true;
                    contacts.hit_by.get_or_insert(index);
                }
            }
            Axis::Y => {
                let reach = body.half.y + target.half.y;
                let offset = body.center.y - target.center.y;
                let falling = entity.velocity.y < 0;
                let from_above = !tie_break(offset, !falling);
                if from_above {
                    entity.position.y = target.center.y + reach;
                    contacts.sides.bottom = true;
                } else {
                    entity.position.y = target.center.y - reach;
                    contacts.sides.top = true;
                }
                entity.velocity.y = 0;

                if combat {
                    // Sign of the approach, not mere contact: the mover must be
                    // coming down and sit above the enemy's centre.
                    if falling && offset > 0 {
                        other.dead = true;
                        other.deactivate();
                        contacts.stomped.push(index);
                    } else {
                        entity.game_over = true;
                        contacts.hit_by.get_or_insert(index);
                    }
                }
            }
        }
    }

    contacts
}

/// True when the mover sits on the negative side of the other body.
/// A zero offset falls back to the mover's direction of travel.
#[inline]
fn tie_break(offset: Fixed, moving_positive: bool) -> bool {
    if offset != 0 { offset < 0 } else { moving_positive }
}

//! Behavior selection
//!
//! Given a creature's state, pattern archetype and the tactical picture
//! (distance to target, own HP fraction, line of sight, ally count), pick
//! exactly one action for this turn. Selection is deterministic; dice only
//! come in when an action is executed.

pub mod movement;

pub use movement::{
    circle_step, open_escape_directions, random_step, step_away, step_toward, surround_step,
};

use crate::combat::select_attack;
use crate::consts::{
    GUARD_ATTACK_RADIUS, GUARD_MAX_DISPLACEMENT, PACK_HUNTER_ALLY_RADIUS, PACK_HUNTER_MIN_ALLIES,
    RANGED_KEEP_DISTANCE, WEAK_TARGET_PERCENT,
};
use crate::creature::{AiPattern, Creature, CreatureId, CreatureState, Target};
use crate::spatial::{chebyshev, distance, SpatialQuery};
use crate::world::World;

/// The one thing a creature does this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AiAction {
    /// Resolve an attack from the creature's attack list.
    Attack { target: Target, attack_index: usize },

    /// Fire a special ability through the ability engine.
    UseAbility { name: String, target: Target },

    /// Move one step toward a specific cell (surround heuristic).
    MoveTo { x: i32, y: i32 },

    /// Move one step toward the target.
    Pursue,

    /// Back off one step while staying engaged.
    StepBack,

    /// Sidestep around the target.
    Circle,

    /// Run from the target.
    Flee,

    /// Walk back toward the guard post.
    GuardReturn,

    /// Idle drift for non-hostile creatures.
    Wander,

    /// Do nothing this turn.
    Wait,
}

/// Count same-kind hostile allies near a creature.
fn ally_count(world: &World, creature: &Creature) -> usize {
    world
        .creatures
        .iter()
        .filter(|other| {
            other.id != creature.id
                && other.alive
                && other.kind_id == creature.kind_id
                && other.state == CreatureState::Hostile
                && distance(creature.x, creature.y, other.x, other.y) <= PACK_HUNTER_ALLY_RADIUS
        })
        .count()
}

/// First ready, usable special ability against a target this far away.
fn ready_ability(creature: &Creature, dist: i32, has_los: bool) -> Option<String> {
    creature
        .abilities
        .iter()
        .find(|a| {
            !a.kind.is_passive()
                && creature.cooldown(&a.name) == 0
                && a.range.map(|r| dist <= r).unwrap_or(true)
                && (has_los || !a.kind.is_targeted())
                && a.trigger_below_percent
                    .map(|p| creature.hp_percent() < p)
                    .unwrap_or(true)
        })
        .map(|a| a.name.clone())
}

fn attack_or_pursue(creature: &Creature, dist: i32, has_los: bool) -> AiAction {
    match select_attack(&creature.attacks, dist, has_los) {
        Some(index) => AiAction::Attack {
            target: Target::Player,
            attack_index: index,
        },
        None => AiAction::Pursue,
    }
}

/// Choose this turn's action for a creature.
pub fn select_action(world: &World, id: CreatureId, spatial: &dyn SpatialQuery) -> AiAction {
    let Some(creature) = world.creature(id) else {
        return AiAction::Wait;
    };
    if !creature.alive || !world.player.alive {
        return AiAction::Wait;
    }

    let (px, py) = (world.player.x, world.player.y);
    let dist = distance(creature.x, creature.y, px, py);
    let adjacent = chebyshev(creature.x, creature.y, px, py) <= 1;
    let has_los = spatial.line_of_sight(creature.x, creature.y, px, py);

    if creature.state != CreatureState::Hostile {
        // Guards drift back to their post even before anything happens.
        if creature.pattern == AiPattern::Guard {
            if let Some((gx, gy)) = creature.guard_post {
                if chebyshev(creature.x, creature.y, gx, gy) > GUARD_MAX_DISPLACEMENT {
                    return AiAction::GuardReturn;
                }
            }
        }
        return match creature.state {
            CreatureState::Wandering => AiAction::Wander,
            _ => AiAction::Wait,
        };
    }

    // Flee check precedes pattern dispatch.
    if creature.below_flee_threshold() {
        let stands_ground = creature.pattern == AiPattern::Cowardly
            && (open_escape_directions(world, spatial, id) <= 1
                || world.player.hp_percent() < WEAK_TARGET_PERCENT);
        if !stands_ground {
            return AiAction::Flee;
        }
        // Cornered or smelling blood: cowards lash out.
        return attack_or_pursue(creature, dist, has_los);
    }

    match creature.pattern {
        AiPattern::Aggressive | AiPattern::Cowardly => attack_or_pursue(creature, dist, has_los),

        AiPattern::Defensive => {
            if adjacent {
                attack_or_pursue(creature, dist, has_los)
            } else if creature.hp_percent() < 50 && dist <= 2 {
                AiAction::StepBack
            } else if dist <= 3 {
                AiAction::Pursue
            } else {
                AiAction::Wait
            }
        }

        AiPattern::Ranged => {
            if let Some(name) = ready_ability(creature, dist, has_los) {
                return AiAction::UseAbility {
                    name,
                    target: Target::Player,
                };
            }
            if dist < RANGED_KEEP_DISTANCE && !adjacent {
                return AiAction::StepBack;
            }
            match select_attack(&creature.attacks, dist, has_los) {
                Some(index) => AiAction::Attack {
                    target: Target::Player,
                    attack_index: index,
                },
                None => AiAction::Pursue,
            }
        }

        AiPattern::Intelligent => {
            if let Some(name) = ready_ability(creature, dist, has_los) {
                return AiAction::UseAbility {
                    name,
                    target: Target::Player,
                };
            }
            if adjacent {
                attack_or_pursue(creature, dist, has_los)
            } else if ally_count(world, creature) >= 1 && dist <= 3 {
                AiAction::Circle
            } else {
                AiAction::Pursue
            }
        }

        AiPattern::PackHunter => {
            if adjacent {
                return attack_or_pursue(creature, dist, has_los);
            }
            if ally_count(world, creature) >= PACK_HUNTER_MIN_ALLIES {
                // Surround: the executor falls back to plain pursuit when
                // the ring is full.
                return AiAction::MoveTo { x: px, y: py };
            }
            AiAction::Pursue
        }

        AiPattern::Guard => {
            let post = creature.guard_post.unwrap_or((creature.x, creature.y));
            let target_near_post = distance(px, py, post.0, post.1) <= GUARD_ATTACK_RADIUS;
            if creature.guard_engaged || target_near_post {
                return attack_or_pursue(creature, dist, has_los);
            }
            if chebyshev(creature.x, creature.y, post.0, post.1) > GUARD_MAX_DISPLACEMENT {
                return AiAction::GuardReturn;
            }
            AiAction::Wait
        }
    }
}

//! Turn driver.
//!
//! Single-threaded and cooperative: every creature's turn runs to completion
//! (upkeep, awareness, decision, resolution) before the next one starts.
//! The spatial handle and the notice sink are passed in by the host each
//! turn; the core keeps no global state.

use qd_rng::GameRng;

use crate::ability::{run_passives, use_ability};
use crate::ai::{
    circle_step, random_step, select_action, step_away, step_toward, surround_step, AiAction,
};
use crate::combat::{apply_damage, creature_attack};
use crate::consts::{FAST_SPEED, GUARD_MAX_DISPLACEMENT, POISON_TICK_DAMAGE};
use crate::creature::{AiPattern, Condition, CreatureId, CreatureState, NoiseEvent, Target};
use crate::creature::awareness::update_awareness;
use crate::event::{Notice, NoticeSink};
use crate::spatial::{chebyshev, SpatialQuery};
use crate::world::World;

/// Run one full game turn for every live creature, then tick the player's
/// own conditions. Returns the creatures removed by death this turn.
pub fn run_turn(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
    noise: Option<NoiseEvent>,
) -> Vec<crate::creature::Creature> {
    for id in world.live_ids() {
        take_creature_turn(world, id, spatial, rng, sink, noise.as_ref());
    }
    tick_player_conditions(world, sink);
    world.sweep_dead()
}

/// One creature's complete turn.
pub fn take_creature_turn(
    world: &mut World,
    id: CreatureId,
    spatial: &dyn SpatialQuery,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
    noise: Option<&NoiseEvent>,
) {
    let Some(creature) = world.creature(id) else {
        return;
    };
    if !creature.alive {
        return;
    }

    upkeep(world, id, sink);
    let still_alive = world.creature(id).map(|c| c.alive).unwrap_or(false);
    if !still_alive {
        return;
    }

    run_passives(world, id, rng, sink);
    update_awareness(world, id, spatial, noise, rng, sink);
    act(world, id, spatial, rng, sink);

    // Conditions run down at the end of the turn, so a one-turn stun skips
    // exactly one turn.
    expire_conditions(world, id, sink);
}

/// The decision-and-resolution phase of a creature's turn.
fn act(
    world: &mut World,
    id: CreatureId,
    spatial: &dyn SpatialQuery,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) {
    let Some(creature) = world.creature(id) else {
        return;
    };

    // Whole-turn skips.
    if creature.state == CreatureState::Sleeping || !creature.can_act() {
        return;
    }

    // Confusion replaces the behavior selector with a stumble.
    if creature.has_condition(Condition::Confused) {
        if creature.can_move() {
            random_step(world, spatial, id, rng);
        }
        return;
    }

    let action = select_action(world, id, spatial);
    execute_action(world, id, action, spatial, rng, sink);
}

/// Start-of-turn bookkeeping: cooldowns tick down, poison bites.
fn upkeep(world: &mut World, id: CreatureId, sink: &mut dyn NoticeSink) {
    let poisoned = {
        let Some(creature) = world.creature_mut(id) else {
            return;
        };
        creature.tick_cooldowns();
        creature.has_condition(Condition::Poisoned)
    };

    if poisoned {
        apply_damage(
            world,
            Target::Creature(id),
            POISON_TICK_DAMAGE,
            "poison",
            sink,
        );
    }
}

/// End-of-turn condition countdown with single-fire on-expire effects.
fn expire_conditions(world: &mut World, id: CreatureId, sink: &mut dyn NoticeSink) {
    let Some(creature) = world.creature_mut(id) else {
        return;
    };
    if !creature.alive {
        return;
    }
    let expired = creature.conditions.tick();
    for condition in expired {
        if condition == Condition::Raging {
            creature.rage_bonus = 0;
        }
        sink.notice(Notice::StatusExpired {
            target: Target::Creature(id),
            condition,
        });
    }
}

/// Poison and condition expiry for the player, once per game turn.
fn tick_player_conditions(world: &mut World, sink: &mut dyn NoticeSink) {
    if !world.player.alive {
        return;
    }
    if world.player.conditions.has(Condition::Poisoned) {
        apply_damage(world, Target::Player, POISON_TICK_DAMAGE, "poison", sink);
        if !world.player.alive {
            return;
        }
    }
    for condition in world.player.conditions.tick() {
        sink.notice(Notice::StatusExpired {
            target: Target::Player,
            condition,
        });
    }
}

/// Carry out the selected action. A blocked move simply spends the turn.
fn execute_action(
    world: &mut World,
    id: CreatureId,
    action: AiAction,
    spatial: &dyn SpatialQuery,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) {
    let (px, py) = (world.player.x, world.player.y);
    let (can_move, speed, pattern) = match world.creature(id) {
        Some(c) => (c.can_move(), c.speed, c.pattern),
        None => return,
    };
    let steps = if speed >= FAST_SPEED { 2 } else { 1 };

    if let Some(creature) = world.creature_mut(id) {
        creature.fleeing = action == AiAction::Flee;
    }

    match action {
        AiAction::Attack {
            target,
            attack_index,
        } => {
            // A guard that strikes once never goes back to its post.
            if pattern == AiPattern::Guard {
                if let Some(creature) = world.creature_mut(id) {
                    creature.guard_engaged = true;
                }
            }
            creature_attack(world, id, target, attack_index, spatial, rng, sink);
        }

        AiAction::UseAbility { name, target } => {
            // A refused ability still consumes the turn; the world is
            // untouched and that is the whole outcome.
            let _ = use_ability(world, id, &name, target, spatial, rng, sink);
        }

        AiAction::MoveTo { x, y } => {
            if can_move && surround_step(world, spatial, id, x, y).is_none() {
                step_toward(world, spatial, id, px, py);
            }
        }

        AiAction::Pursue => {
            if can_move {
                for _ in 0..steps {
                    if step_toward(world, spatial, id, px, py).is_none() {
                        break;
                    }
                }
            }
        }

        AiAction::StepBack => {
            if can_move {
                step_away(world, spatial, id, px, py);
            }
        }

        AiAction::Circle => {
            if can_move {
                circle_step(world, spatial, id, px, py);
            }
        }

        AiAction::Flee => {
            if can_move {
                for _ in 0..steps {
                    if step_away(world, spatial, id, px, py).is_none() {
                        break;
                    }
                }
            }
        }

        AiAction::GuardReturn => {
            if can_move {
                let post = world.creature(id).and_then(|c| c.guard_post);
                if let Some((gx, gy)) = post {
                    step_toward(world, spatial, id, gx, gy);
                    if let Some(creature) = world.creature_mut(id) {
                        if creature.state != CreatureState::Hostile
                            && chebyshev(creature.x, creature.y, gx, gy)
                                <= GUARD_MAX_DISPLACEMENT
                        {
                            creature.state = CreatureState::Guarding;
                        }
                    }
                }
            }
        }

        AiAction::Wander => {
            // Half the time a wanderer just stands around.
            if can_move && !rng.one_in(2) {
                random_step(world, spatial, id, rng);
            }
        }

        AiAction::Wait => {}
    }
}

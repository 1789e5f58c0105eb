//! Awareness state machine: sleeping, wandering, guarding, hostile.
//!
//! Hostility is sticky. Once a creature has noticed its target it stays
//! hostile until the target gets farther away than three times its sight
//! range; it is not re-checked against sight or hearing every turn, and
//! intervening terrain does not break the lock.

use qd_rng::GameRng;

use super::{CreatureId, CreatureState};
use crate::consts::{PACK_ALERT_RADIUS, SIGHT_ESCAPE_MULTIPLIER};
use crate::event::{Notice, NoticeSink};
use crate::spatial::{distance, SpatialQuery};
use crate::world::World;

/// A turn-scoped noise event (the player fighting, shouting, falling over).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseEvent {
    pub x: i32,
    pub y: i32,
    /// Loudness doubles as the radius within which the noise carries.
    pub loudness: i32,
}

/// Probability (percent) that a noise wakes a sleeper this far away.
fn wake_chance(loudness: i32, dist: i32) -> u32 {
    if loudness <= 0 || dist > loudness {
        return 0;
    }
    (((loudness - dist) * 100 / loudness).max(5)) as u32
}

/// Update one creature's awareness of the player.
pub fn update_awareness(
    world: &mut World,
    id: CreatureId,
    spatial: &dyn SpatialQuery,
    noise: Option<&NoiseEvent>,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) {
    let Some(creature) = world.creature(id) else {
        return;
    };
    if !creature.alive || !world.player.alive {
        return;
    }

    let (px, py) = (world.player.x, world.player.y);
    let dist = distance(creature.x, creature.y, px, py);

    match creature.state {
        CreatureState::Hostile => {
            if dist > creature.sight_range * SIGHT_ESCAPE_MULTIPLIER {
                // The target got away; give up and drift.
                if let Some(creature) = world.creature_mut(id) {
                    creature.state = CreatureState::Wandering;
                    creature.fleeing = false;
                }
            }
        }

        CreatureState::Sleeping => {
            // Sight and hearing contribute nothing while asleep; only a
            // noise event can wake the creature.
            let Some(noise) = noise else {
                return;
            };
            let noise_dist = distance(creature.x, creature.y, noise.x, noise.y);
            if rng.percent(wake_chance(noise.loudness, noise_dist)) {
                if let Some(creature) = world.creature_mut(id) {
                    creature.state = CreatureState::Wandering;
                }
                sink.notice(Notice::Awakened { id });
            }
        }

        CreatureState::Wandering | CreatureState::Guarding => {
            let sees = dist <= creature.effective_sight()
                && !(world.player.is_invisible() && !creature.sees_invisible())
                && spatial.line_of_sight(creature.x, creature.y, px, py);
            let hears = noise
                .map(|n| n.loudness > 0 && dist <= creature.effective_hearing())
                .unwrap_or(false);
            if sees || hears {
                become_hostile(world, id, sink);
            }
        }
    }
}

/// Turn a creature hostile and alert its pack.
///
/// Every same-kind creature within the alert radius is force-set to hostile,
/// with no line-of-sight requirement of its own.
pub fn become_hostile(world: &mut World, id: CreatureId, sink: &mut dyn NoticeSink) {
    let Some(creature) = world.creature_mut(id) else {
        return;
    };
    if creature.state == CreatureState::Hostile {
        return;
    }
    creature.state = CreatureState::Hostile;
    let (kind_id, x, y) = (creature.kind_id, creature.x, creature.y);
    sink.notice(Notice::Alerted { id });

    let pack: Vec<CreatureId> = world
        .creatures
        .iter()
        .filter(|other| {
            other.id != id
                && other.alive
                && other.kind_id == kind_id
                && other.state != CreatureState::Hostile
                && distance(x, y, other.x, other.y) <= PACK_ALERT_RADIUS
        })
        .map(|other| other.id)
        .collect();

    if pack.is_empty() {
        return;
    }
    let count = pack.len() as u32;
    for ally_id in pack {
        if let Some(ally) = world.creature_mut(ally_id) {
            ally.state = CreatureState::Hostile;
        }
    }
    sink.notice(Notice::PackAlerted { leader: id, count });
}

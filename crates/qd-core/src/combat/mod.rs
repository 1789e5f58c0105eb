//! Combat resolution
//!
//! Two asymmetric pipelines converge here: creatures roll THAC0-style to-hit
//! checks ([`creature_attack`]), the player's attacks are gated by quiz
//! results ([`player_attack`]). Both funnel into [`apply_damage`], the single
//! place that clamps HP and fires the death transition exactly once.

mod attack_type;
mod creature_attack;
mod damage_kind;
mod player_attack;

pub use attack_type::AttackType;
pub use creature_attack::{creature_attack, select_attack};
pub use damage_kind::DamageKind;
pub use player_attack::{player_attack, ChainWeapon, QuizResult};

use qd_rng::{DiceExpr, GameRng};
use serde::{Deserialize, Serialize};

use crate::creature::{Condition, Resistances, Target};
use crate::event::{Notice, NoticeSink};
use crate::world::World;

/// Optional status effect riding on an attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusRider {
    pub condition: Condition,
    /// Duration roll, in turns.
    pub duration: DiceExpr,
    /// Chance the rider triggers on a hit.
    pub chance_percent: u32,
}

/// A damage-kind tagged attack definition. Read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    pub attack_type: AttackType,
    pub damage: DiceExpr,
    pub kind: DamageKind,
    /// Reach for ranged deliveries; melee ignores it.
    pub range: Option<i32>,
    pub rider: Option<StatusRider>,
}

impl Attack {
    pub const fn new(attack_type: AttackType, damage: DiceExpr, kind: DamageKind) -> Self {
        Self {
            attack_type,
            damage,
            kind,
            range: None,
            rider: None,
        }
    }

    pub fn with_range(mut self, range: i32) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_rider(mut self, rider: StatusRider) -> Self {
        self.rider = Some(rider);
        self
    }
}

/// Ephemeral result record of one resolved attack or ability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatOutcome {
    pub hit: bool,
    pub damage: i32,
    pub kind: DamageKind,
    pub condition_applied: Option<Condition>,
    pub target_died: bool,
    pub attacker_died: bool,
}

impl CombatOutcome {
    pub const MISS: Self = Self {
        hit: false,
        damage: 0,
        kind: DamageKind::Physical,
        condition_applied: None,
        target_died: false,
        attacker_died: false,
    };

    pub const fn hit(damage: i32, kind: DamageKind) -> Self {
        Self {
            hit: true,
            damage,
            kind,
            condition_applied: None,
            target_died: false,
            attacker_died: false,
        }
    }
}

/// Result of pushing damage into a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageApplied {
    pub dealt: i32,
    pub died: bool,
}

impl DamageApplied {
    pub const NONE: Self = Self {
        dealt: 0,
        died: false,
    };
}

/// Elemental mitigation: halved when resisted, doubled when the target is
/// weak to the kind, zero when the target reflects a reflectable kind.
pub fn mitigate(
    damage: i32,
    kind: DamageKind,
    resistances: Resistances,
    weaknesses: Resistances,
    reflects: bool,
) -> i32 {
    if reflects && kind.is_reflectable() {
        return 0;
    }
    match kind.resistance() {
        Some(tag) if resistances.contains(tag) => damage / 2,
        Some(tag) if weaknesses.contains(tag) => damage * 2,
        _ => damage,
    }
}

/// Resistance view of a combatant: (resistances, weaknesses, reflects).
pub fn target_defenses(world: &World, target: Target) -> (Resistances, Resistances, bool) {
    match target {
        Target::Player => (
            world.player.resistances,
            world.player.weaknesses,
            world.player.reflection,
        ),
        Target::Creature(id) => match world.creature(id) {
            Some(c) => (c.resistances, c.weaknesses, c.has_reflection()),
            None => (Resistances::empty(), Resistances::empty(), false),
        },
    }
}

/// Armor class of a combatant; `None` when the target is gone.
pub fn target_armor_class(world: &World, target: Target) -> Option<i32> {
    match target {
        Target::Player => world.player.alive.then_some(world.player.armor_class),
        Target::Creature(id) => world.creature(id).filter(|c| c.alive).map(|c| c.armor_class),
    }
}

/// Subtract damage from a combatant's HP, clamping at zero, and run the
/// death transition exactly once.
///
/// Damage against a missing or already-dead target is a no-op. `cause` names
/// the killer for the player-death notice.
pub fn apply_damage(
    world: &mut World,
    target: Target,
    amount: i32,
    cause: &str,
    sink: &mut dyn NoticeSink,
) -> DamageApplied {
    if amount < 0 || !world.is_alive(target) {
        return DamageApplied::NONE;
    }

    match target {
        Target::Player => {
            let dealt = amount.min(world.player.hp);
            world.player.hp -= dealt;
            if world.player.hp == 0 {
                world.player.alive = false;
                sink.notice(Notice::PlayerDied {
                    cause: cause.to_string(),
                });
                release_engulfed(world, Target::Player, sink);
            }
            DamageApplied {
                dealt,
                died: !world.player.alive,
            }
        }
        Target::Creature(id) => {
            let Some(creature) = world.creature_mut(id) else {
                return DamageApplied::NONE;
            };
            let dealt = amount.min(creature.hp);
            creature.hp -= dealt;
            if creature.hp == 0 {
                kill_creature(world, id, sink);
                DamageApplied { dealt, died: true }
            } else {
                DamageApplied { dealt, died: false }
            }
        }
    }
}

/// Death transition for a creature: notice, loot handoff, engulf cleanup.
/// Idempotent; the alive flag guards against double firing.
pub fn kill_creature(world: &mut World, id: crate::creature::CreatureId, sink: &mut dyn NoticeSink) {
    let Some(creature) = world.creature_mut(id) else {
        return;
    };
    if !creature.alive {
        return;
    }
    creature.alive = false;
    creature.hp = 0;
    let (kind_id, name, x, y) = (
        creature.kind_id,
        creature.name.clone(),
        creature.x,
        creature.y,
    );
    let released = creature.engulfed_target.take();

    sink.notice(Notice::CreatureDied {
        id,
        kind_id,
        name,
        x,
        y,
    });
    sink.notice(Notice::LootRequested { kind_id, x, y });

    if let Some(victim) = released {
        if victim == Target::Player {
            world.player.engulfed_by = None;
        }
        sink.notice(Notice::Expelled {
            attacker: id,
            target: victim,
        });
    }
    release_engulfed(world, Target::Creature(id), sink);
}

/// If anything was engulfing `target`, clear the hold.
fn release_engulfed(world: &mut World, target: Target, sink: &mut dyn NoticeSink) {
    let holder = world
        .creatures
        .iter()
        .find(|c| c.alive && c.engulfed_target == Some(target))
        .map(|c| c.id);
    if let Some(holder_id) = holder {
        if let Some(holder) = world.creature_mut(holder_id) {
            holder.engulfed_target = None;
        }
        if target == Target::Player {
            world.player.engulfed_by = None;
        }
        sink.notice(Notice::Expelled {
            attacker: holder_id,
            target,
        });
    }
}

/// Apply a condition to a combatant, emitting a status notice.
///
/// Free action protects the player from paralysis; dead targets are no-ops.
pub fn apply_condition(
    world: &mut World,
    target: Target,
    condition: Condition,
    duration: u16,
    sink: &mut dyn NoticeSink,
) -> bool {
    if !world.is_alive(target) || duration == 0 {
        return false;
    }
    if condition == Condition::Paralyzed && target == Target::Player && world.player.free_action {
        return false;
    }
    let applied = match target {
        Target::Player => world.player.conditions.apply(condition, duration),
        Target::Creature(id) => world
            .creature_mut(id)
            .and_then(|c| c.conditions.apply(condition, duration)),
    };
    if applied.is_some() {
        sink.notice(Notice::StatusApplied {
            target,
            condition,
            duration,
        });
        true
    } else {
        false
    }
}

/// Roll an attack's status rider against its trigger chance.
pub fn roll_rider(
    world: &mut World,
    target: Target,
    rider: &StatusRider,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) -> Option<Condition> {
    if !rng.percent(rider.chance_percent) {
        return None;
    }
    let duration = rider.duration.roll(rng) as u16;
    apply_condition(world, target, rider.condition, duration, sink).then_some(rider.condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::{Creature, CreatureId};
    use crate::event::NoticeLog;
    use crate::world::PlayerState;

    fn world_with_creature(hp: i32) -> (World, CreatureId) {
        let mut w = World::new(PlayerState::new(0, 0, 30));
        let mut c = Creature::new(CreatureId::NONE, 2, "troll", 3, 3);
        c.hp = hp;
        c.hp_max = hp;
        let id = w.add_creature(c);
        (w, id)
    }

    #[test]
    fn test_mitigation_table() {
        let r = Resistances::FIRE;
        let w = Resistances::COLD;
        assert_eq!(mitigate(10, DamageKind::Fire, r, w, false), 5);
        assert_eq!(mitigate(10, DamageKind::Cold, r, w, false), 20);
        assert_eq!(mitigate(10, DamageKind::Lightning, r, w, false), 10);
        assert_eq!(mitigate(10, DamageKind::Fire, r, w, true), 0);
        // Physical damage is never reflected or resisted.
        assert_eq!(mitigate(10, DamageKind::Physical, r, w, true), 10);
    }

    #[test]
    fn test_damage_clamps_and_kills_once() {
        let (mut w, id) = world_with_creature(5);
        let mut log = NoticeLog::new();
        let first = apply_damage(&mut w, Target::Creature(id), 99, "test", &mut log);
        assert_eq!(first.dealt, 5);
        assert!(first.died);
        assert_eq!(w.creature(id).unwrap().hp, 0);

        // Second blow against the corpse is a no-op.
        let second = apply_damage(&mut w, Target::Creature(id), 10, "test", &mut log);
        assert_eq!(second, DamageApplied::NONE);
        let deaths = log.count(|n| matches!(n, Notice::CreatureDied { .. }));
        assert_eq!(deaths, 1);
        let loots = log.count(|n| matches!(n, Notice::LootRequested { .. }));
        assert_eq!(loots, 1);
    }

    #[test]
    fn test_player_death_notice() {
        let (mut w, _) = world_with_creature(5);
        let mut log = NoticeLog::new();
        w.player.hp = 3;
        let applied = apply_damage(&mut w, Target::Player, 10, "a troll", &mut log);
        assert!(applied.died);
        assert!(!w.player.alive);
        assert_eq!(log.count(|n| matches!(n, Notice::PlayerDied { .. })), 1);
    }

    #[test]
    fn test_dying_engulfer_releases_target() {
        let (mut w, id) = world_with_creature(5);
        let mut log = NoticeLog::new();
        w.creature_mut(id).unwrap().engulfed_target = Some(Target::Player);
        w.player.engulfed_by = Some(id);

        apply_damage(&mut w, Target::Creature(id), 99, "test", &mut log);
        assert_eq!(w.player.engulfed_by, None);
        assert_eq!(log.count(|n| matches!(n, Notice::Expelled { .. })), 1);
    }

    proptest::proptest! {
        #[test]
        fn prop_hp_stays_in_bounds(hp in 1i32..200, dmg in 0i32..500) {
            let (mut w, id) = world_with_creature(hp);
            let mut log = NoticeLog::new();
            apply_damage(&mut w, Target::Creature(id), dmg, "prop", &mut log);
            let c = w.creature(id).unwrap();
            proptest::prop_assert!(c.hp >= 0 && c.hp <= c.hp_max);
        }
    }

    #[test]
    fn test_free_action_blocks_paralysis() {
        let (mut w, _) = world_with_creature(5);
        let mut log = NoticeLog::new();
        w.player.free_action = true;
        assert!(!apply_condition(
            &mut w,
            Target::Player,
            Condition::Paralyzed,
            5,
            &mut log
        ));
        assert!(apply_condition(
            &mut w,
            Target::Player,
            Condition::Poisoned,
            5,
            &mut log
        ));
    }
}

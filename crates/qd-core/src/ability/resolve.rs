//! Resolution functions for the ability catalog.
//!
//! Each function takes the world, the acting creature's id, the ability
//! definition and the target explicitly; nothing is captured. World
//! mutation outside the creature list happens only through emitted notices.

use qd_rng::GameRng;

use super::{Ability, AbilityError, AbilityKind, GazeEffect};
use crate::combat::{
    apply_condition, apply_damage, mitigate, target_defenses, CombatOutcome, DamageKind,
};
use crate::consts::{
    DEFAULT_RANGED_RANGE, DIGEST_INSTAKILL_ONE_IN, DIGEST_WEAK_PERCENT, RAGE_TO_HIT_BONUS,
    TELEPORT_RADIUS,
};
use crate::creature::{Condition, CreatureId, Target};
use crate::event::{Notice, NoticeSink, SpawnRequest};
use crate::spatial::{chebyshev, cone_cells, SpatialQuery};
use crate::world::World;

pub(crate) fn dispatch(
    world: &mut World,
    user: CreatureId,
    ability: &Ability,
    target: Target,
    spatial: &dyn SpatialQuery,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) -> Result<CombatOutcome, AbilityError> {
    match ability.kind {
        AbilityKind::Breath { cone } => breath(world, user, ability, target, cone, spatial, rng, sink),
        AbilityKind::Gaze(effect) => gaze(world, user, ability, effect, target, rng, sink),
        AbilityKind::Engulf => engulf(world, user, ability, target, rng, sink),
        AbilityKind::Digest => digest(world, user, ability, rng, sink),
        AbilityKind::Touch => touch(world, user, ability, target, rng, sink),
        AbilityKind::Summon { kind_id, count } => {
            let count = count.roll(rng).max(1);
            let (x, y) = actor_pos(world, user)?;
            sink.notice(Notice::SpawnRequested(SpawnRequest {
                kind_id,
                count,
                x,
                y,
            }));
            Ok(CombatOutcome::hit(0, ability.damage_kind))
        }
        AbilityKind::Teleport => teleport(world, user, spatial, rng, sink),
        AbilityKind::Steal => steal(world, user, target, sink),
        AbilityKind::Transform(kind) => {
            let (x, y) = actor_pos(world, user)?;
            sink.notice(Notice::TerrainChangeRequested { x, y, kind });
            Ok(CombatOutcome::hit(0, ability.damage_kind))
        }
        AbilityKind::Regeneration | AbilityKind::PoisonOnHit | AbilityKind::BerserkTrigger => {
            Err(AbilityError::PassiveOnly)
        }
    }
}

fn actor_pos(world: &World, user: CreatureId) -> Result<(i32, i32), AbilityError> {
    world
        .creature(user)
        .filter(|c| c.alive)
        .map(|c| (c.x, c.y))
        .ok_or(AbilityError::UserGone)
}

/// Deal mitigated elemental damage to one victim, with reflection zeroing
/// reflectable kinds, and emit the hit notice.
fn elemental_hit(
    world: &mut World,
    attacker: Target,
    victim: Target,
    rolled: i32,
    kind: DamageKind,
    cause: &str,
    sink: &mut dyn NoticeSink,
) -> (i32, bool) {
    let (resist, weak, reflects) = target_defenses(world, victim);
    if reflects && kind.is_reflectable() {
        sink.notice(Notice::Reflected {
            source: attacker,
            target: victim,
        });
        return (0, false);
    }
    let amount = mitigate(rolled, kind, resist, weak, false);
    let applied = apply_damage(world, victim, amount, cause, sink);
    sink.notice(Notice::AttackHit {
        attacker,
        target: victim,
        damage: applied.dealt,
        kind,
    });
    (applied.dealt, applied.died)
}

#[allow(clippy::too_many_arguments)]
fn breath(
    world: &mut World,
    user: CreatureId,
    ability: &Ability,
    target: Target,
    cone: bool,
    spatial: &dyn SpatialQuery,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) -> Result<CombatOutcome, AbilityError> {
    let (ax, ay) = actor_pos(world, user)?;
    let (tx, ty) = world.position_of(target).ok_or(AbilityError::TargetGone)?;

    if !spatial.line_of_sight(ax, ay, tx, ty) {
        return Err(AbilityError::NoLineOfSight);
    }

    let rolled = ability.damage.map(|d| d.roll(rng)).unwrap_or(0) as i32;
    let kind = ability.damage_kind;
    let cause = ability.name.clone();
    let attacker = Target::Creature(user);

    if !cone {
        let (dealt, died) = elemental_hit(world, attacker, target, rolled, kind, &cause, sink);
        let mut outcome = CombatOutcome::hit(dealt, kind);
        outcome.target_died = died;
        return Ok(outcome);
    }

    // Cone sweep: every occupant in the cone is hit, friend or foe.
    let range = ability.range.unwrap_or(DEFAULT_RANGED_RANGE);
    let mut outcome = CombatOutcome {
        hit: false,
        ..CombatOutcome::hit(0, kind)
    };
    for (cx, cy) in cone_cells(ax, ay, tx, ty, range) {
        let Some(victim) = spatial.occupant_at(cx, cy) else {
            continue;
        };
        if victim == attacker || !world.is_alive(victim) {
            continue;
        }
        let (dealt, died) = elemental_hit(world, attacker, victim, rolled, kind, &cause, sink);
        if victim == target {
            outcome.hit = true;
            outcome.damage = dealt;
            outcome.target_died = died;
        }
    }
    Ok(outcome)
}

/// Whether a gaze between the two parties connects at all.
fn gaze_blocked(world: &World, user: CreatureId, target: Target) -> bool {
    let Some(actor) = world.creature(user) else {
        return true;
    };
    if actor.is_blind() {
        return true;
    }
    let (target_blind, target_invisible) = match target {
        Target::Player => (world.player.is_blind(), world.player.is_invisible()),
        Target::Creature(id) => match world.creature(id) {
            Some(c) => (c.is_blind(), c.is_invisible()),
            None => return true,
        },
    };
    // A blind target cannot meet the gaze; an unseen target cannot be gazed at.
    target_blind || (target_invisible && !actor.sees_invisible())
}

fn gaze(
    world: &mut World,
    user: CreatureId,
    ability: &Ability,
    effect: GazeEffect,
    target: Target,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) -> Result<CombatOutcome, AbilityError> {
    if gaze_blocked(world, user, target) {
        return Err(AbilityError::GazeBlocked);
    }

    // Reflection turns the gaze around: the user suffers its own effect.
    let (_, _, target_reflects) = target_defenses(world, target);
    let victim = if target_reflects {
        sink.notice(Notice::Reflected {
            source: Target::Creature(user),
            target,
        });
        Target::Creature(user)
    } else {
        target
    };

    let cause = ability.name.clone();
    let (resist, _, _) = target_defenses(world, victim);
    let mut outcome = CombatOutcome::hit(0, ability.damage_kind);

    let died = match effect {
        GazeEffect::Petrify => {
            if resist.contains(crate::creature::Resistances::STONE) {
                return Ok(CombatOutcome::MISS);
            }
            fatal(world, victim, &cause, sink)
        }
        GazeEffect::Death => {
            if resist.contains(crate::creature::Resistances::MAGIC) {
                return Ok(CombatOutcome::MISS);
            }
            fatal(world, victim, &cause, sink)
        }
        GazeEffect::Confuse => {
            let duration = roll_duration(ability, rng, 8);
            apply_condition(world, victim, Condition::Confused, duration, sink);
            outcome.condition_applied = Some(Condition::Confused);
            false
        }
        GazeEffect::Paralyze => {
            let duration = roll_duration(ability, rng, 4);
            if apply_condition(world, victim, Condition::Paralyzed, duration, sink) {
                outcome.condition_applied = Some(Condition::Paralyzed);
            }
            false
        }
    };

    outcome.target_died = died && victim == target;
    outcome.attacker_died = died && victim == Target::Creature(user);
    Ok(outcome)
}

/// Kill outright through the normal damage path so the death transition
/// stays single-fire.
fn fatal(world: &mut World, victim: Target, cause: &str, sink: &mut dyn NoticeSink) -> bool {
    let hp = match victim {
        Target::Player => world.player.hp,
        Target::Creature(id) => world.creature(id).map(|c| c.hp).unwrap_or(0),
    };
    apply_damage(world, victim, hp, cause, sink).died
}

fn roll_duration(ability: &Ability, rng: &mut GameRng, default: u32) -> u16 {
    match ability.duration {
        Some(expr) => expr.roll(rng) as u16,
        None => rng.rnd(default) as u16,
    }
}

fn engulf(
    world: &mut World,
    user: CreatureId,
    ability: &Ability,
    target: Target,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) -> Result<CombatOutcome, AbilityError> {
    let (ax, ay) = actor_pos(world, user)?;
    {
        let actor = world.creature(user).ok_or(AbilityError::UserGone)?;
        if actor.engulfed_target.is_some() {
            return Err(AbilityError::AlreadyEngulfing);
        }
    }
    let (tx, ty) = world.position_of(target).ok_or(AbilityError::TargetGone)?;
    let dist = chebyshev(ax, ay, tx, ty);
    if dist > 1 {
        return Err(AbilityError::OutOfRange {
            distance: dist,
            range: 1,
        });
    }

    if let Some(actor) = world.creature_mut(user) {
        actor.engulfed_target = Some(target);
    }
    if target == Target::Player {
        world.player.engulfed_by = Some(user);
    }
    sink.notice(Notice::Engulfed {
        attacker: user,
        target,
    });

    let rolled = ability.damage.map(|d| d.roll(rng)).unwrap_or(0) as i32;
    let (dealt, died) = if rolled > 0 {
        elemental_hit(
            world,
            Target::Creature(user),
            target,
            rolled,
            ability.damage_kind,
            &ability.name,
            sink,
        )
    } else {
        (0, false)
    };

    let mut outcome = CombatOutcome::hit(dealt, ability.damage_kind);
    outcome.target_died = died;
    Ok(outcome)
}

fn digest(
    world: &mut World,
    user: CreatureId,
    ability: &Ability,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) -> Result<CombatOutcome, AbilityError> {
    let victim = world
        .creature(user)
        .ok_or(AbilityError::UserGone)?
        .engulfed_target
        .ok_or(AbilityError::NothingEngulfed)?;

    if !world.is_alive(victim) {
        if let Some(actor) = world.creature_mut(user) {
            actor.engulfed_target = None;
        }
        return Err(AbilityError::NothingEngulfed);
    }

    let rolled = ability.damage.map(|d| d.roll(rng)).unwrap_or(0) as i32;
    let (dealt, mut died) = elemental_hit(
        world,
        Target::Creature(user),
        victim,
        rolled,
        ability.damage_kind,
        &ability.name,
        sink,
    );

    // A badly weakened victim can be finished off outright.
    if !died {
        let weak = match victim {
            Target::Player => world.player.hp_percent() < DIGEST_WEAK_PERCENT,
            Target::Creature(id) => world
                .creature(id)
                .map(|c| c.hp_percent() < DIGEST_WEAK_PERCENT)
                .unwrap_or(false),
        };
        if weak && rng.one_in(DIGEST_INSTAKILL_ONE_IN) {
            died = fatal(world, victim, &ability.name, sink);
        }
    }

    let mut outcome = CombatOutcome::hit(dealt, ability.damage_kind);
    outcome.target_died = died;
    Ok(outcome)
}

fn touch(
    world: &mut World,
    user: CreatureId,
    ability: &Ability,
    target: Target,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) -> Result<CombatOutcome, AbilityError> {
    let (ax, ay) = actor_pos(world, user)?;
    let (tx, ty) = world.position_of(target).ok_or(AbilityError::TargetGone)?;
    let dist = chebyshev(ax, ay, tx, ty);
    if dist > 1 {
        return Err(AbilityError::OutOfRange {
            distance: dist,
            range: 1,
        });
    }

    let rolled = ability.damage.map(|d| d.roll(rng)).unwrap_or(0) as i32;
    let (dealt, died) = if rolled > 0 {
        elemental_hit(
            world,
            Target::Creature(user),
            target,
            rolled,
            ability.damage_kind,
            &ability.name,
            sink,
        )
    } else {
        (0, false)
    };

    let mut outcome = CombatOutcome::hit(dealt, ability.damage_kind);
    outcome.target_died = died;

    if !died {
        if let (Some(condition), true) = (ability.condition, rng.percent(ability.chance_percent)) {
            let duration = roll_duration(ability, rng, 6);
            if apply_condition(world, target, condition, duration, sink) {
                outcome.condition_applied = Some(condition);
            }
        }
        if ability.degrades_equipment && rng.percent(ability.chance_percent) {
            sink.notice(Notice::EquipmentDamageRequested { target });
        }
    }
    Ok(outcome)
}

fn teleport(
    world: &mut World,
    user: CreatureId,
    spatial: &dyn SpatialQuery,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) -> Result<CombatOutcome, AbilityError> {
    let (ax, ay) = actor_pos(world, user)?;

    for _ in 0..20 {
        let dx = rng.rn2(2 * TELEPORT_RADIUS as u32 + 1) as i32 - TELEPORT_RADIUS;
        let dy = rng.rn2(2 * TELEPORT_RADIUS as u32 + 1) as i32 - TELEPORT_RADIUS;
        let (nx, ny) = (ax + dx, ay + dy);
        if (nx, ny) == (ax, ay) {
            continue;
        }
        if spatial.is_passable(nx, ny) && world.is_cell_free(nx, ny) {
            world.move_creature(user, nx, ny);
            sink.notice(Notice::Teleported {
                id: user,
                from: (ax, ay),
                to: (nx, ny),
            });
            return Ok(CombatOutcome::hit(0, DamageKind::Magic));
        }
    }
    Err(AbilityError::NoDestination)
}

fn steal(
    world: &mut World,
    user: CreatureId,
    target: Target,
    sink: &mut dyn NoticeSink,
) -> Result<CombatOutcome, AbilityError> {
    let (ax, ay) = actor_pos(world, user)?;
    let (tx, ty) = world.position_of(target).ok_or(AbilityError::TargetGone)?;
    let dist = chebyshev(ax, ay, tx, ty);
    if dist > 1 {
        return Err(AbilityError::OutOfRange {
            distance: dist,
            range: 1,
        });
    }
    sink.notice(Notice::ItemTheftRequested {
        thief: user,
        target,
    });
    Ok(CombatOutcome::hit(0, DamageKind::Physical))
}

/// Run a creature's passive abilities, once per turn.
pub fn run_passives(
    world: &mut World,
    id: CreatureId,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) {
    let passives: Vec<Ability> = match world.creature(id) {
        Some(c) if c.alive => c
            .abilities
            .iter()
            .filter(|a| a.kind.is_passive())
            .cloned()
            .collect(),
        _ => return,
    };

    for ability in passives {
        match ability.kind {
            AbilityKind::Regeneration => {
                let heal = ability.damage.map(|d| d.roll(rng)).unwrap_or(1) as i32;
                if let Some(c) = world.creature_mut(id) {
                    c.hp = (c.hp + heal).min(c.hp_max);
                }
            }
            AbilityKind::BerserkTrigger => {
                let triggers = world
                    .creature(id)
                    .map(|c| c.is_badly_hurt() && !c.has_condition(Condition::Raging))
                    .unwrap_or(false);
                if triggers {
                    let duration = roll_duration(&ability, rng, 8);
                    if apply_condition(world, Target::Creature(id), Condition::Raging, duration, sink)
                    {
                        if let Some(c) = world.creature_mut(id) {
                            c.rage_bonus = RAGE_TO_HIT_BONUS;
                        }
                    }
                }
            }
            // Consulted by the combat resolver on melee hits.
            AbilityKind::PoisonOnHit => {}
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::use_ability;
    use crate::creature::{Creature, CreatureFlags, CreatureState, Resistances};
    use crate::event::NoticeLog;
    use crate::spatial::testgrid::TestGrid;
    use crate::world::PlayerState;
    use qd_rng::DiceExpr;

    fn hostile(name: &str, x: i32, y: i32, hp: i32) -> Creature {
        let mut c = Creature::new(CreatureId::NONE, 9, name, x, y);
        c.hp = hp;
        c.hp_max = hp;
        c.state = CreatureState::Hostile;
        c
    }

    fn breath_ability(cone: bool) -> Ability {
        Ability::new("fire_breath", AbilityKind::Breath { cone }, 4)
            .with_range(6)
            .with_damage(DiceExpr::new(3, 1, 0), DamageKind::Fire)
    }

    #[test]
    fn test_breath_resisted_is_halved() {
        let mut world = World::new(PlayerState::new(5, 5, 40));
        let mut dragon = hostile("dragon", 8, 5, 30);
        dragon.abilities.push(breath_ability(false));
        let id = world.add_creature(dragon);
        world.player.resistances = Resistances::FIRE;

        let grid = TestGrid::open(20, 20);
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        // 3d1 = 3 flat; halved to 1.
        let outcome = use_ability(
            &mut world,
            id,
            "fire_breath",
            Target::Player,
            &grid,
            &mut rng,
            &mut log,
        )
        .unwrap();
        assert_eq!(outcome.damage, 1);
        assert_eq!(world.player.hp, 39);
    }

    #[test]
    fn test_breath_reflected_is_zero() {
        let mut world = World::new(PlayerState::new(5, 5, 40));
        let mut dragon = hostile("dragon", 8, 5, 30);
        dragon.abilities.push(breath_ability(false));
        let id = world.add_creature(dragon);
        world.player.reflection = true;

        let grid = TestGrid::open(20, 20);
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        let outcome = use_ability(
            &mut world,
            id,
            "fire_breath",
            Target::Player,
            &grid,
            &mut rng,
            &mut log,
        )
        .unwrap();
        assert_eq!(outcome.damage, 0);
        assert_eq!(world.player.hp, 40);
        assert_eq!(log.count(|n| matches!(n, Notice::Reflected { .. })), 1);
    }

    #[test]
    fn test_cone_breath_hits_bystanders() {
        let mut world = World::new(PlayerState::new(10, 5, 40));
        let mut dragon = hostile("dragon", 5, 5, 30);
        dragon.abilities.push(breath_ability(true));
        let id = world.add_creature(dragon);
        // A packmate standing inside the cone gets scorched too.
        let ally = world.add_creature(hostile("kobold", 7, 5, 10));

        let grid = TestGrid::open(20, 20)
            .occupy(10, 5, Target::Player)
            .occupy(7, 5, Target::Creature(ally));
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        let outcome = use_ability(
            &mut world,
            id,
            "fire_breath",
            Target::Player,
            &grid,
            &mut rng,
            &mut log,
        )
        .unwrap();

        assert!(outcome.hit);
        assert_eq!(world.player.hp, 37);
        assert_eq!(world.creature(ally).unwrap().hp, 7);
    }

    #[test]
    fn test_breath_requires_line_of_sight() {
        let mut world = World::new(PlayerState::new(10, 5, 40));
        let mut dragon = hostile("dragon", 5, 5, 30);
        dragon.abilities.push(breath_ability(false));
        let id = world.add_creature(dragon);

        let grid = TestGrid::open(20, 20).wall(7, 5);
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        let err = use_ability(
            &mut world,
            id,
            "fire_breath",
            Target::Player,
            &grid,
            &mut rng,
            &mut log,
        )
        .unwrap_err();
        assert_eq!(err, AbilityError::NoLineOfSight);
        // Failure leaves the cooldown untouched.
        assert_eq!(world.creature(id).unwrap().cooldown("fire_breath"), 0);
    }

    #[test]
    fn test_petrifying_gaze_reflects_onto_user() {
        let mut world = World::new(PlayerState::new(6, 5, 40));
        let mut medusa = hostile("medusa", 5, 5, 25);
        medusa.abilities.push(
            Ability::new("petrification_gaze", AbilityKind::Gaze(GazeEffect::Petrify), 3)
                .with_range(6),
        );
        let id = world.add_creature(medusa);
        world.player.reflection = true;

        let grid = TestGrid::open(20, 20);
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        let outcome = use_ability(
            &mut world,
            id,
            "petrification_gaze",
            Target::Player,
            &grid,
            &mut rng,
            &mut log,
        )
        .unwrap();

        // The mirror case: the gazer dies, the player is untouched.
        assert!(outcome.attacker_died);
        assert!(!outcome.target_died);
        assert!(!world.creature(id).unwrap().alive);
        assert_eq!(world.player.hp, 40);
    }

    #[test]
    fn test_gaze_blocked_by_blindness() {
        let mut world = World::new(PlayerState::new(6, 5, 40));
        let mut medusa = hostile("medusa", 5, 5, 25);
        medusa.flags |= CreatureFlags::BLIND;
        medusa.abilities.push(
            Ability::new("petrification_gaze", AbilityKind::Gaze(GazeEffect::Petrify), 3)
                .with_range(6),
        );
        let id = world.add_creature(medusa);

        let grid = TestGrid::open(20, 20);
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        let err = use_ability(
            &mut world,
            id,
            "petrification_gaze",
            Target::Player,
            &grid,
            &mut rng,
            &mut log,
        )
        .unwrap_err();
        assert_eq!(err, AbilityError::GazeBlocked);
    }

    #[test]
    fn test_gaze_blocked_by_invisible_target() {
        let mut world = World::new(PlayerState::new(6, 5, 40));
        world.player.invisible = true;
        let mut medusa = hostile("medusa", 5, 5, 25);
        medusa.abilities.push(
            Ability::new("petrification_gaze", AbilityKind::Gaze(GazeEffect::Petrify), 3)
                .with_range(6),
        );
        let id = world.add_creature(medusa);

        let grid = TestGrid::open(20, 20);
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        assert_eq!(
            use_ability(
                &mut world,
                id,
                "petrification_gaze",
                Target::Player,
                &grid,
                &mut rng,
                &mut log,
            )
            .unwrap_err(),
            AbilityError::GazeBlocked
        );

        // See-invisible restores the gaze.
        world.creature_mut(id).unwrap().flags |= CreatureFlags::SEE_INVIS;
        let outcome = use_ability(
            &mut world,
            id,
            "petrification_gaze",
            Target::Player,
            &grid,
            &mut rng,
            &mut log,
        )
        .unwrap();
        assert!(outcome.target_died);
    }

    #[test]
    fn test_engulf_holds_one_target() {
        let mut world = World::new(PlayerState::new(6, 5, 40));
        let mut lurker = hostile("lurker", 5, 5, 30);
        lurker
            .abilities
            .push(Ability::new("engulf", AbilityKind::Engulf, 2));
        lurker.abilities.push(
            Ability::new("digest", AbilityKind::Digest, 0)
                .with_damage(DiceExpr::new(4, 1, 0), DamageKind::Acid),
        );
        let id = world.add_creature(lurker);
        let other = world.add_creature(hostile("rat", 4, 5, 8));

        let grid = TestGrid::open(20, 20);
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        use_ability(&mut world, id, "engulf", Target::Player, &grid, &mut rng, &mut log).unwrap();
        assert_eq!(world.player.engulfed_by, Some(id));

        let err = use_ability(
            &mut world,
            id,
            "engulf",
            Target::Creature(other),
            &grid,
            &mut rng,
            &mut log,
        )
        .unwrap_err();
        assert_eq!(err, AbilityError::AlreadyEngulfing);
    }

    #[test]
    fn test_digest_damages_held_target() {
        let mut world = World::new(PlayerState::new(6, 5, 40));
        let mut lurker = hostile("lurker", 5, 5, 30);
        lurker.engulfed_target = Some(Target::Player);
        lurker.abilities.push(
            Ability::new("digest", AbilityKind::Digest, 0)
                .with_damage(DiceExpr::new(4, 1, 0), DamageKind::Acid),
        );
        let id = world.add_creature(lurker);
        world.player.engulfed_by = Some(id);

        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        let grid = TestGrid::open(20, 20);
        let outcome =
            use_ability(&mut world, id, "digest", Target::Player, &grid, &mut rng, &mut log)
                .unwrap();
        assert_eq!(outcome.damage, 4);
        assert_eq!(world.player.hp, 36);
    }

    #[test]
    fn test_summon_emits_spawn_request() {
        let mut world = World::new(PlayerState::new(6, 5, 40));
        let mut bones = hostile("gravecaller", 5, 5, 20);
        bones.abilities.push(Ability::new(
            "raise_skeletons",
            AbilityKind::Summon {
                kind_id: 12,
                count: DiceExpr::new(2, 1, 0),
            },
            8,
        ));
        let id = world.add_creature(bones);

        let grid = TestGrid::open(20, 20);
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        use_ability(
            &mut world,
            id,
            "raise_skeletons",
            Target::Player,
            &grid,
            &mut rng,
            &mut log,
        )
        .unwrap();

        let request = log
            .notices
            .iter()
            .find_map(|n| match n {
                Notice::SpawnRequested(r) => Some(r.clone()),
                _ => None,
            })
            .expect("spawn request");
        assert_eq!(request.kind_id, 12);
        assert_eq!(request.count, 2);
        assert_eq!((request.x, request.y), (5, 5));
        // No creature was created by the core itself.
        assert_eq!(world.creatures.len(), 1);
    }

    #[test]
    fn test_teleport_moves_to_open_cell() {
        let mut world = World::new(PlayerState::new(6, 5, 40));
        let mut imp = hostile("imp", 5, 5, 10);
        imp.abilities
            .push(Ability::new("teleport", AbilityKind::Teleport, 6));
        let id = world.add_creature(imp);

        let grid = TestGrid::open(30, 30);
        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        use_ability(&mut world, id, "teleport", Target::Player, &grid, &mut rng, &mut log)
            .unwrap();
        let c = world.creature(id).unwrap();
        assert_ne!((c.x, c.y), (5, 5));
        assert_eq!(log.count(|n| matches!(n, Notice::Teleported { .. })), 1);
    }

    #[test]
    fn test_regeneration_passive_heals() {
        let mut world = World::new(PlayerState::new(6, 5, 40));
        let mut troll = hostile("troll", 1, 1, 30);
        troll.hp = 10;
        troll.abilities.push(
            Ability::new("regeneration", AbilityKind::Regeneration, 0)
                .with_damage(DiceExpr::new(2, 1, 0), DamageKind::Physical),
        );
        let id = world.add_creature(troll);

        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        run_passives(&mut world, id, &mut rng, &mut log);
        assert_eq!(world.creature(id).unwrap().hp, 12);

        // Healing never exceeds max.
        world.creature_mut(id).unwrap().hp = 30;
        run_passives(&mut world, id, &mut rng, &mut log);
        assert_eq!(world.creature(id).unwrap().hp, 30);
    }

    #[test]
    fn test_berserk_trigger_applies_rage_once() {
        let mut world = World::new(PlayerState::new(6, 5, 40));
        let mut berserker = hostile("berserker", 1, 1, 40);
        berserker.hp = 8; // 20%
        berserker
            .abilities
            .push(Ability::new("berserk", AbilityKind::BerserkTrigger, 0));
        let id = world.add_creature(berserker);

        let mut log = NoticeLog::new();
        let mut rng = GameRng::new(5);
        run_passives(&mut world, id, &mut rng, &mut log);
        let c = world.creature(id).unwrap();
        assert!(c.has_condition(Condition::Raging));
        assert_eq!(c.rage_bonus, RAGE_TO_HIT_BONUS);
        assert!(c.effective_to_hit() < c.to_hit);

        // Already raging: no re-application.
        let before = log.notices.len();
        run_passives(&mut world, id, &mut rng, &mut log);
        assert_eq!(log.notices.len(), before);
    }
}

//! Special-ability engine
//!
//! The catalog is plain data: an [`Ability`] definition names its kind,
//! cooldown, range and numeric parameters, and a pure resolution function
//! per [`AbilityKind`] does the work. Cooldown state lives in the owning
//! creature's cooldown map, never in the shared definition.

mod resolve;

pub use resolve::run_passives;
pub(crate) use resolve::dispatch as resolve_ability;

use qd_rng::{DiceExpr, GameRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::{CombatOutcome, DamageKind};
use crate::creature::{Condition, CreatureId, Target};
use crate::event::{Notice, NoticeSink, TerrainChangeKind};
use crate::spatial::{distance, SpatialQuery};
use crate::world::World;

/// What a gaze does to whoever ends up on the receiving end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GazeEffect {
    /// Turns the victim to stone; fatal unless stone-resistant.
    Petrify,
    /// Kills outright; resisted by magic resistance.
    Death,
    Confuse,
    Paralyze,
}

/// Ability category; the tag drives dispatch to a resolution function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Elemental breath; `cone` sweeps an area, otherwise single target.
    Breath { cone: bool },

    /// Eye-contact attack with reflection-redirect semantics.
    Gaze(GazeEffect),

    /// Swallow an adjacent target; at most one held at a time.
    Engulf,

    /// Repeat damage against the currently engulfed target.
    Digest,

    /// Adjacent touch carrying damage and/or a condition.
    Touch,

    /// Ask the spawn collaborator for reinforcements.
    Summon { kind_id: u16, count: DiceExpr },

    /// Relocate to a random open cell nearby.
    Teleport,

    /// Ask the inventory collaborator to move an item to the thief.
    Steal,

    /// Ask the dungeon for a terrain change at the user's cell.
    Transform(TerrainChangeKind),

    /// Passive: regain HP every turn.
    Regeneration,

    /// Passive: melee hits may poison; consulted by the combat resolver.
    PoisonOnHit,

    /// Passive: rage when badly hurt.
    BerserkTrigger,
}

impl AbilityKind {
    /// Passive abilities run automatically once per turn and are never
    /// selected through `use_ability`.
    pub const fn is_passive(&self) -> bool {
        matches!(
            self,
            AbilityKind::Regeneration | AbilityKind::PoisonOnHit | AbilityKind::BerserkTrigger
        )
    }

    /// Kinds that need a live target to resolve.
    pub const fn is_targeted(&self) -> bool {
        matches!(
            self,
            AbilityKind::Breath { .. }
                | AbilityKind::Gaze(_)
                | AbilityKind::Engulf
                | AbilityKind::Touch
                | AbilityKind::Steal
        )
    }
}

/// A named special ability. Shared, immutable definition data; per-instance
/// cooldown state lives on the creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    pub kind: AbilityKind,

    /// Cooldown length in turns, set on successful use.
    pub cooldown: u16,

    /// Maximum reach; `None` means unlimited (or inapplicable).
    pub range: Option<i32>,

    /// Damage roll, for kinds that deal damage (regeneration reads it as
    /// the per-turn heal).
    pub damage: Option<DiceExpr>,
    pub damage_kind: DamageKind,

    /// Condition and duration applied on success, for status kinds.
    pub condition: Option<Condition>,
    pub duration: Option<DiceExpr>,

    /// Trigger chance for riders and equipment degradation.
    pub chance_percent: u32,

    /// Only usable below this HP percentage.
    pub trigger_below_percent: Option<i32>,

    /// Touch abilities may additionally wear down the target's gear.
    pub degrades_equipment: bool,
}

impl Ability {
    pub fn new(name: impl Into<String>, kind: AbilityKind, cooldown: u16) -> Self {
        Self {
            name: name.into(),
            kind,
            cooldown,
            range: None,
            damage: None,
            damage_kind: DamageKind::Physical,
            condition: None,
            duration: None,
            chance_percent: 100,
            trigger_below_percent: None,
            degrades_equipment: false,
        }
    }

    pub fn with_range(mut self, range: i32) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_damage(mut self, damage: DiceExpr, kind: DamageKind) -> Self {
        self.damage = Some(damage);
        self.damage_kind = kind;
        self
    }

    pub fn with_condition(mut self, condition: Condition, duration: DiceExpr) -> Self {
        self.condition = Some(condition);
        self.duration = Some(duration);
        self
    }

    pub fn with_chance(mut self, percent: u32) -> Self {
        self.chance_percent = percent;
        self
    }

    pub fn with_trigger_below(mut self, percent: i32) -> Self {
        self.trigger_below_percent = Some(percent);
        self
    }

    pub fn with_equipment_degradation(mut self) -> Self {
        self.degrades_equipment = true;
        self
    }
}

/// Why an ability use did not happen. Precondition failures leave the world
/// untouched; the caller decides whether the turn is still consumed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbilityError {
    #[error("unknown ability '{0}'")]
    UnknownAbility(String),

    #[error("the user is gone")]
    UserGone,

    #[error("'{name}' is cooling down for {remaining} more turns")]
    OnCooldown { name: String, remaining: u16 },

    #[error("the user cannot act")]
    Incapacitated,

    #[error("target out of range ({distance} > {range})")]
    OutOfRange { distance: i32, range: i32 },

    #[error("no line of sight to the target")]
    NoLineOfSight,

    #[error("trigger condition not met")]
    TriggerNotMet,

    #[error("the target is gone")]
    TargetGone,

    #[error("the gaze is blocked")]
    GazeBlocked,

    #[error("already holding an engulfed target")]
    AlreadyEngulfing,

    #[error("nothing engulfed to digest")]
    NothingEngulfed,

    #[error("passive abilities cannot be invoked")]
    PassiveOnly,

    #[error("no open destination")]
    NoDestination,
}

/// Use a named ability. Preconditions are checked before any effect; on
/// success the ability's cooldown starts and an `AbilityUsed` notice is
/// emitted.
pub fn use_ability(
    world: &mut World,
    user: CreatureId,
    name: &str,
    target: Target,
    spatial: &dyn SpatialQuery,
    rng: &mut GameRng,
    sink: &mut dyn NoticeSink,
) -> Result<CombatOutcome, AbilityError> {
    let Some(actor) = world.creature(user) else {
        return Err(AbilityError::UserGone);
    };
    if !actor.alive {
        return Err(AbilityError::UserGone);
    }

    let Some(ability) = actor.ability(name).cloned() else {
        sink.notice(Notice::Debug(format!(
            "{} tried unknown ability '{}'",
            actor.name, name
        )));
        return Err(AbilityError::UnknownAbility(name.to_string()));
    };

    if ability.kind.is_passive() {
        return Err(AbilityError::PassiveOnly);
    }
    if !actor.can_use_abilities() {
        return Err(AbilityError::Incapacitated);
    }

    let remaining = actor.cooldown(&ability.name);
    if remaining > 0 {
        return Err(AbilityError::OnCooldown {
            name: ability.name.clone(),
            remaining,
        });
    }

    if let (Some(range), Some((tx, ty))) = (ability.range, world.position_of(target)) {
        let dist = distance(actor.x, actor.y, tx, ty);
        if dist > range {
            return Err(AbilityError::OutOfRange {
                distance: dist,
                range,
            });
        }
    }

    if let Some(percent) = ability.trigger_below_percent {
        if actor.hp_percent() >= percent {
            return Err(AbilityError::TriggerNotMet);
        }
    }

    if ability.kind.is_targeted() && !world.is_alive(target) {
        return Err(AbilityError::TargetGone);
    }

    let outcome = resolve::dispatch(world, user, &ability, target, spatial, rng, sink)?;

    if let Some(actor) = world.creature_mut(user) {
        actor.set_cooldown(&ability.name, ability.cooldown);
    }
    sink.notice(Notice::AbilityUsed {
        user,
        name: ability.name.clone(),
    });
    Ok(outcome)
}

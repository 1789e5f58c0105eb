//! Creature instances.

use std::collections::HashMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::conditions::{Condition, ConditionMap};
use super::Target;
use crate::ability::Ability;
use crate::combat::Attack;
use crate::consts::{BERSERK_TRIGGER_PERCENT, DEFAULT_FLEE_PERCENT};

/// Unique identifier for creature instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureId(pub u32);

impl CreatureId {
    pub const NONE: CreatureId = CreatureId(0);

    pub fn next(self) -> Self {
        CreatureId(self.0 + 1)
    }
}

bitflags! {
    /// Elemental resistances and weaknesses (damage-kind tags).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Resistances: u16 {
        const FIRE = 0x0001;
        const COLD = 0x0002;
        const LIGHTNING = 0x0004;
        const ACID = 0x0008;
        const POISON = 0x0010;
        const STONE = 0x0020;
        const MAGIC = 0x0040;
    }
}

bitflags! {
    /// Innate creature capabilities.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CreatureFlags: u16 {
        /// Reflects gaze attacks and reflectable elemental damage.
        const REFLECT = 0x0001;
        /// Sees invisible targets.
        const SEE_INVIS = 0x0002;
        /// Takes the blessed-weapon bonus from player attacks.
        const UNHOLY = 0x0004;
        /// Innately blind; immune to and incapable of gaze attacks.
        const BLIND = 0x0008;
    }
}

impl Serialize for Resistances {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resistances {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(Resistances::from_bits_truncate(bits))
    }
}

impl Serialize for CreatureFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CreatureFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(CreatureFlags::from_bits_truncate(bits))
    }
}

/// Primary awareness state.
///
/// `fleeing` is a behavioral sub-mode of `Hostile`, tracked separately on the
/// creature, not a state of its own.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum CreatureState {
    Sleeping,
    #[default]
    Wandering,
    Guarding,
    Hostile,
}

/// AI pattern archetype, fixed at creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum AiPattern {
    #[default]
    Aggressive,
    Defensive,
    Ranged,
    Intelligent,
    Cowardly,
    PackHunter,
    Guard,
}

impl AiPattern {
    /// Flee threshold in percent of max HP. Checked before pattern dispatch.
    pub const fn flee_percent(&self) -> i32 {
        match self {
            AiPattern::Cowardly => crate::consts::COWARDLY_FLEE_PERCENT,
            _ => DEFAULT_FLEE_PERCENT,
        }
    }
}

/// A live creature on the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    /// Unique identifier.
    pub id: CreatureId,

    /// Kind id (index into the spawn collaborator's catalog).
    pub kind_id: u16,

    /// Display name.
    pub name: String,

    /// Display symbol.
    pub symbol: char,

    /// Position on the integer grid.
    pub x: i32,
    pub y: i32,

    /// Hit points.
    pub hp: i32,
    pub hp_max: i32,

    /// THAC0-style to-hit value; a d20 roll plus the target's armor class
    /// must reach it.
    pub to_hit: i32,

    /// Armor class; lower is better.
    pub armor_class: i32,

    /// Movement speed.
    pub speed: i32,

    /// Sight radius; zero effective while sleeping.
    pub sight_range: i32,

    /// Hearing radius; zero effective while sleeping.
    pub hearing_range: i32,

    /// Attack list, selected from at resolution time.
    pub attacks: Vec<Attack>,

    /// Special-ability definitions owned by this creature.
    pub abilities: Vec<Ability>,

    pub resistances: Resistances,
    pub weaknesses: Resistances,
    pub flags: CreatureFlags,

    pub state: CreatureState,
    pub pattern: AiPattern,

    /// Active transient conditions.
    pub conditions: ConditionMap,

    /// Per-ability cooldown counters, keyed by ability name. Never negative;
    /// ticked down once at the start of this creature's turn.
    pub cooldowns: HashMap<String, u16>,

    /// Guard post for the guard pattern.
    pub guard_post: Option<(i32, i32)>,

    /// Set once a guard has attacked; it never returns to guarding.
    pub guard_engaged: bool,

    /// Engulfers hold at most one target at a time.
    pub engulfed_target: Option<Target>,

    /// To-hit bonus granted by the active rage; reverted when it expires.
    pub rage_bonus: i32,

    /// Fleeing sub-mode of the hostile state.
    pub fleeing: bool,

    /// False once the death transition has fired.
    pub alive: bool,
}

impl Creature {
    /// Create a creature with full HP and default wandering state.
    pub fn new(id: CreatureId, kind_id: u16, name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            id,
            kind_id,
            name: name.into(),
            symbol: '?',
            x,
            y,
            hp: 1,
            hp_max: 1,
            to_hit: 20,
            armor_class: 10,
            speed: crate::consts::BASE_SPEED,
            sight_range: 8,
            hearing_range: 6,
            attacks: Vec::new(),
            abilities: Vec::new(),
            resistances: Resistances::empty(),
            weaknesses: Resistances::empty(),
            flags: CreatureFlags::empty(),
            state: CreatureState::Wandering,
            pattern: AiPattern::Aggressive,
            conditions: ConditionMap::new(),
            cooldowns: HashMap::new(),
            guard_post: None,
            guard_engaged: false,
            engulfed_target: None,
            rage_bonus: 0,
            fleeing: false,
            alive: true,
        }
    }

    pub fn hp_percent(&self) -> i32 {
        if self.hp_max <= 0 {
            return 0;
        }
        self.hp * 100 / self.hp_max
    }

    pub fn is_adjacent(&self, x: i32, y: i32) -> bool {
        let dx = (self.x - x).abs();
        let dy = (self.y - y).abs();
        dx <= 1 && dy <= 1 && (dx | dy) != 0
    }

    /// Effective sight radius: zero while asleep.
    pub fn effective_sight(&self) -> i32 {
        if self.state == CreatureState::Sleeping {
            0
        } else {
            self.sight_range
        }
    }

    /// Effective hearing radius: zero while asleep.
    pub fn effective_hearing(&self) -> i32 {
        if self.state == CreatureState::Sleeping {
            0
        } else {
            self.hearing_range
        }
    }

    /// To-hit value adjusted by the active rage (lower is better).
    pub fn effective_to_hit(&self) -> i32 {
        self.to_hit - self.rage_bonus
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.has(condition)
    }

    pub fn is_blind(&self) -> bool {
        self.flags.contains(CreatureFlags::BLIND) || self.has_condition(Condition::Blinded)
    }

    pub fn is_invisible(&self) -> bool {
        self.has_condition(Condition::Invisible)
    }

    pub fn sees_invisible(&self) -> bool {
        self.flags.contains(CreatureFlags::SEE_INVIS)
    }

    pub fn has_reflection(&self) -> bool {
        self.flags.contains(CreatureFlags::REFLECT)
    }

    /// Whether the creature can take deliberate actions this turn.
    pub fn can_act(&self) -> bool {
        self.alive
            && self.state != CreatureState::Sleeping
            && !self.has_condition(Condition::Stunned)
            && !self.has_condition(Condition::Paralyzed)
    }

    /// Whether the creature may use special abilities right now.
    pub fn can_use_abilities(&self) -> bool {
        self.can_act() && !self.has_condition(Condition::Confused)
    }

    pub fn can_move(&self) -> bool {
        self.can_act() && !self.has_condition(Condition::Webbed)
    }

    pub fn ability(&self, name: &str) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.name == name)
    }

    pub fn cooldown(&self, name: &str) -> u16 {
        self.cooldowns.get(name).copied().unwrap_or(0)
    }

    pub fn set_cooldown(&mut self, name: &str, turns: u16) {
        self.cooldowns.insert(name.to_string(), turns);
    }

    /// Decrement every cooldown by exactly one turn, never below 0.
    pub fn tick_cooldowns(&mut self) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Flee threshold check, before pattern dispatch.
    pub fn below_flee_threshold(&self) -> bool {
        self.hp_percent() < self.pattern.flee_percent()
    }

    /// Berserk-trigger passives fire below this fraction.
    pub fn is_badly_hurt(&self) -> bool {
        self.hp_percent() < BERSERK_TRIGGER_PERCENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_never_negative() {
        let mut c = Creature::new(CreatureId(1), 0, "imp", 0, 0);
        c.set_cooldown("teleport", 2);
        c.tick_cooldowns();
        assert_eq!(c.cooldown("teleport"), 1);
        c.tick_cooldowns();
        c.tick_cooldowns();
        assert_eq!(c.cooldown("teleport"), 0);
    }

    #[test]
    fn test_sleeping_senses_are_zero() {
        let mut c = Creature::new(CreatureId(1), 0, "orc", 0, 0);
        c.sight_range = 8;
        c.hearing_range = 6;
        c.state = CreatureState::Sleeping;
        assert_eq!(c.effective_sight(), 0);
        assert_eq!(c.effective_hearing(), 0);
        c.state = CreatureState::Wandering;
        assert_eq!(c.effective_sight(), 8);
    }

    #[test]
    fn test_flee_thresholds() {
        let mut c = Creature::new(CreatureId(1), 0, "wolf", 0, 0);
        c.hp_max = 40;
        c.hp = 10; // 25%
        assert!(!c.below_flee_threshold());
        c.hp = 7; // 17.5%
        assert!(c.below_flee_threshold());

        c.pattern = AiPattern::Cowardly;
        c.hp = 20; // 50%
        assert!(c.below_flee_threshold());
    }

    #[test]
    fn test_adjacency_excludes_self() {
        let c = Creature::new(CreatureId(1), 0, "rat", 3, 3);
        assert!(c.is_adjacent(4, 4));
        assert!(c.is_adjacent(3, 2));
        assert!(!c.is_adjacent(3, 3));
        assert!(!c.is_adjacent(5, 3));
    }
}

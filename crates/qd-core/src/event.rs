//! Outcome notices and collaborator requests.
//!
//! The core never talks to the UI, the loot tables or the spawner directly.
//! Every externally visible consequence of a resolved action is emitted as a
//! [`Notice`] through the [`NoticeSink`] handle the turn driver passes in.
//! Each notice is self-contained: collaborators can render or act on it
//! without further lookups.

use serde::{Deserialize, Serialize};

use crate::combat::DamageKind;
use crate::creature::{Condition, CreatureId, Target};

/// Request to the spawn collaborator: create creatures near a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Kind of creature to create.
    pub kind_id: u16,
    /// How many.
    pub count: u32,
    /// Anchor cell; the spawner picks open cells nearby.
    pub x: i32,
    pub y: i32,
}

/// Terrain mutations the core may ask the dungeon to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainChangeKind {
    /// Consume a corpse on the cell (e.g. when something rises from it).
    RemoveCorpse,
    /// Break through a wall cell.
    DigWall,
}

/// A discrete outcome event produced by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    /// An attack connected.
    AttackHit {
        attacker: Target,
        target: Target,
        damage: i32,
        kind: DamageKind,
    },

    /// An attack missed; distinct from a failed attempt.
    AttackMissed { attacker: Target, target: Target },

    /// A condition was applied or had its timer refreshed.
    StatusApplied {
        target: Target,
        condition: Condition,
        duration: u16,
    },

    /// A condition ran out.
    StatusExpired { target: Target, condition: Condition },

    /// Death transition; fired exactly once per creature.
    CreatureDied {
        id: CreatureId,
        kind_id: u16,
        name: String,
        x: i32,
        y: i32,
    },

    /// The player's HP reached zero.
    PlayerDied { cause: String },

    /// A special ability resolved successfully.
    AbilityUsed { user: CreatureId, name: String },

    /// A gaze or elemental effect bounced back onto its originator.
    Reflected { source: Target, target: Target },

    /// A creature noticed its target and turned hostile.
    Alerted { id: CreatureId },

    /// A sleeping creature woke up.
    Awakened { id: CreatureId },

    /// Same-kind creatures were force-alerted around a new hostile.
    PackAlerted { leader: CreatureId, count: u32 },

    /// A target was engulfed.
    Engulfed { attacker: CreatureId, target: Target },

    /// An engulfed target was released (engulfer died or let go).
    Expelled { attacker: CreatureId, target: Target },

    /// A creature teleported.
    Teleported {
        id: CreatureId,
        from: (i32, i32),
        to: (i32, i32),
    },

    /// Ask the equipment collaborator to degrade something the target wears.
    EquipmentDamageRequested { target: Target },

    /// Ask the inventory collaborator to move an item from target to thief.
    ItemTheftRequested { thief: CreatureId, target: Target },

    /// Ask the spawn collaborator for new creatures.
    SpawnRequested(SpawnRequest),

    /// Ask the dungeon for a terrain change.
    TerrainChangeRequested {
        x: i32,
        y: i32,
        kind: TerrainChangeKind,
    },

    /// Creature died: generate loot here.
    LootRequested { kind_id: u16, x: i32, y: i32 },

    /// Debug-level report of an ignored invalid input.
    Debug(String),
}

/// Sink for notices, injected by the turn driver's caller.
pub trait NoticeSink {
    fn notice(&mut self, notice: Notice);
}

/// Simple vector-backed sink used by hosts and tests.
#[derive(Debug, Default)]
pub struct NoticeLog {
    pub notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Count notices matching a predicate, for assertions.
    pub fn count(&self, predicate: impl Fn(&Notice) -> bool) -> usize {
        self.notices.iter().filter(|n| predicate(n)).count()
    }
}

impl NoticeSink for NoticeLog {
    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

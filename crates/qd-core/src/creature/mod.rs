//! Creature system
//!
//! Contains creature instances, transient conditions and the awareness
//! state machine.

pub mod awareness;
mod conditions;
mod instance;

pub use awareness::{update_awareness, NoiseEvent};
pub use conditions::{Applied, Condition, ConditionMap};
pub use instance::{AiPattern, Creature, CreatureFlags, CreatureId, CreatureState, Resistances};

use serde::{Deserialize, Serialize};

/// A combatant reference: the player or a creature instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Player,
    Creature(CreatureId),
}

impl Target {
    pub fn is_player(&self) -> bool {
        matches!(self, Target::Player)
    }

    pub fn creature_id(&self) -> Option<CreatureId> {
        match self {
            Target::Player => None,
            Target::Creature(id) => Some(*id),
        }
    }
}

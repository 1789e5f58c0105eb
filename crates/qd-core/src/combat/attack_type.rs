//! Attack delivery modes.
//!
//! These define HOW an attack reaches its target; the damage kind defines
//! what it does on arrival.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// How an attack is delivered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum AttackType {
    /// Adjacent-cell strike.
    #[default]
    Melee,

    /// Single-target projectile; needs line of sight.
    Ranged,

    /// Area breath over an angular cone; hits every occupant.
    Cone,

    /// Eye contact; blocked by blindness and invisibility.
    Gaze,

    /// Swallow the target whole.
    Engulf,

    /// Adjacent touch; usually carries a status or drain effect.
    Touch,
}

impl AttackType {
    pub const fn is_ranged(&self) -> bool {
        matches!(self, AttackType::Ranged | AttackType::Cone | AttackType::Gaze)
    }

    pub const fn requires_adjacency(&self) -> bool {
        matches!(self, AttackType::Melee | AttackType::Touch | AttackType::Engulf)
    }
}

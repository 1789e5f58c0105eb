//! Damage kinds and their resistance mapping.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::creature::Resistances;

/// What kind of damage an attack deals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum DamageKind {
    #[default]
    Physical,
    Fire,
    Cold,
    Lightning,
    Acid,
    Poison,
    Magic,
}

impl DamageKind {
    /// Kinds that a reflecting target bounces away entirely.
    pub const fn is_reflectable(&self) -> bool {
        matches!(
            self,
            DamageKind::Fire | DamageKind::Cold | DamageKind::Lightning | DamageKind::Acid
        )
    }

    /// The resistance tag that halves this damage kind.
    pub const fn resistance(&self) -> Option<Resistances> {
        match self {
            DamageKind::Physical => None,
            DamageKind::Fire => Some(Resistances::FIRE),
            DamageKind::Cold => Some(Resistances::COLD),
            DamageKind::Lightning => Some(Resistances::LIGHTNING),
            DamageKind::Acid => Some(Resistances::ACID),
            DamageKind::Poison => Some(Resistances::POISON),
            DamageKind::Magic => Some(Resistances::MAGIC),
        }
    }
}

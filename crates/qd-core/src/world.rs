//! Shared mutable simulation state: the creature list and the player's
//! combat-relevant view.
//!
//! Equipment, inventory and experience live with their own collaborators;
//! [`PlayerState`] only carries the resolved numbers the resolvers need
//! (armor class, resistances, capability flags). The whole struct is plain
//! serde data so hosts can snapshot it.

use serde::{Deserialize, Serialize};

use crate::creature::{Condition, ConditionMap, Creature, CreatureId, Resistances, Target};

/// The player as the combat core sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: i32,
    pub y: i32,

    pub hp: i32,
    pub hp_max: i32,

    /// Resolved armor class from the equipment collaborator; lower is better.
    pub armor_class: i32,

    pub resistances: Resistances,
    pub weaknesses: Resistances,

    /// Reflection capability (shield/amulet), resolved externally.
    pub reflection: bool,
    pub see_invisible: bool,
    pub free_action: bool,
    pub blind: bool,
    pub invisible: bool,

    pub conditions: ConditionMap,

    /// Set while something has the player engulfed.
    pub engulfed_by: Option<CreatureId>,

    pub alive: bool,
}

impl PlayerState {
    pub fn new(x: i32, y: i32, hp_max: i32) -> Self {
        Self {
            x,
            y,
            hp: hp_max,
            hp_max,
            armor_class: 10,
            resistances: Resistances::empty(),
            weaknesses: Resistances::empty(),
            reflection: false,
            see_invisible: false,
            free_action: false,
            blind: false,
            invisible: false,
            conditions: ConditionMap::new(),
            engulfed_by: None,
            alive: true,
        }
    }

    pub fn is_blind(&self) -> bool {
        self.blind || self.conditions.has(Condition::Blinded)
    }

    pub fn is_invisible(&self) -> bool {
        self.invisible || self.conditions.has(Condition::Invisible)
    }

    pub fn hp_percent(&self) -> i32 {
        if self.hp_max <= 0 {
            return 0;
        }
        self.hp * 100 / self.hp_max
    }
}

/// The creature list plus the player view; everything the core mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub creatures: Vec<Creature>,
    pub player: PlayerState,
    next_id: u32,
}

impl World {
    pub fn new(player: PlayerState) -> Self {
        Self {
            creatures: Vec::new(),
            player,
            next_id: 1,
        }
    }

    /// Register a creature, assigning it a fresh id. The spawn collaborator
    /// fills in stats before handing the creature over.
    pub fn add_creature(&mut self, mut creature: Creature) -> CreatureId {
        let id = CreatureId(self.next_id);
        self.next_id += 1;
        creature.id = id;
        self.creatures.push(creature);
        id
    }

    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.id == id)
    }

    pub fn creature_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.iter_mut().find(|c| c.id == id)
    }

    /// The live creature standing on a cell, if any.
    pub fn creature_at(&self, x: i32, y: i32) -> Option<&Creature> {
        self.creatures
            .iter()
            .find(|c| c.alive && c.x == x && c.y == y)
    }

    /// Snapshot of live creature ids, in turn order. Taken up front so the
    /// list can be mutated while iterating a turn.
    pub fn live_ids(&self) -> Vec<CreatureId> {
        self.creatures
            .iter()
            .filter(|c| c.alive)
            .map(|c| c.id)
            .collect()
    }

    /// Whether a combatant is still alive and present.
    pub fn is_alive(&self, target: Target) -> bool {
        match target {
            Target::Player => self.player.alive,
            Target::Creature(id) => self.creature(id).map(|c| c.alive).unwrap_or(false),
        }
    }

    pub fn position_of(&self, target: Target) -> Option<(i32, i32)> {
        match target {
            Target::Player => Some((self.player.x, self.player.y)),
            Target::Creature(id) => self.creature(id).map(|c| (c.x, c.y)),
        }
    }

    /// Whether a cell is free of combatants (the map itself is the spatial
    /// collaborator's business).
    pub fn is_cell_free(&self, x: i32, y: i32) -> bool {
        !(self.player.alive && self.player.x == x && self.player.y == y)
            && self.creature_at(x, y).is_none()
    }

    pub fn move_creature(&mut self, id: CreatureId, x: i32, y: i32) {
        if let Some(creature) = self.creature_mut(id) {
            creature.x = x;
            creature.y = y;
        }
    }

    /// Remove dead creatures from the list, returning them for the host.
    /// Death notices and loot requests have already been emitted by the
    /// death transition.
    pub fn sweep_dead(&mut self) -> Vec<Creature> {
        let mut dead = Vec::new();
        self.creatures.retain(|c| {
            if c.alive {
                true
            } else {
                dead.push(c.clone());
                false
            }
        });
        dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::Creature;

    fn world() -> World {
        World::new(PlayerState::new(5, 5, 20))
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let mut w = world();
        let a = w.add_creature(Creature::new(CreatureId::NONE, 1, "rat", 1, 1));
        let b = w.add_creature(Creature::new(CreatureId::NONE, 1, "rat", 2, 1));
        assert_ne!(a, b);
        assert_eq!(w.creature(a).unwrap().name, "rat");
    }

    #[test]
    fn test_dead_creatures_do_not_occupy() {
        let mut w = world();
        let id = w.add_creature(Creature::new(CreatureId::NONE, 1, "rat", 1, 1));
        assert!(!w.is_cell_free(1, 1));
        w.creature_mut(id).unwrap().alive = false;
        assert!(w.is_cell_free(1, 1));
        assert!(!w.is_alive(Target::Creature(id)));
    }

    #[test]
    fn test_sweep_dead() {
        let mut w = world();
        let a = w.add_creature(Creature::new(CreatureId::NONE, 1, "rat", 1, 1));
        let _b = w.add_creature(Creature::new(CreatureId::NONE, 1, "rat", 2, 1));
        w.creature_mut(a).unwrap().alive = false;
        let dead = w.sweep_dead();
        assert_eq!(dead.len(), 1);
        assert_eq!(w.creatures.len(), 1);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut w = world();
        w.add_creature(Creature::new(CreatureId::NONE, 7, "lurker", 3, 4));
        let json = serde_json::to_string(&w).unwrap();
        let back: World = serde_json::from_str(&json).unwrap();
        assert_eq!(back.creatures.len(), 1);
        assert_eq!(back.creatures[0].kind_id, 7);
        assert_eq!(back.player.hp, 20);
    }
}

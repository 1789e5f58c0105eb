//! Transient conditions with remaining-duration counters.
//!
//! At most one instance of a condition is active at a time. Re-applying a
//! condition refreshes its timer; stackable conditions extend it instead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// A transient condition on a creature or the player.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Condition {
    /// Takes damage every turn while active.
    Poisoned,
    /// Turn is replaced by a random-direction move attempt.
    Confused,
    /// Skips the turn entirely.
    Stunned,
    /// Skips the turn entirely.
    Paralyzed,
    /// Cannot move (attacks still allowed).
    Webbed,
    /// Not visible to creatures without see-invisible.
    Invisible,
    /// Improved to-hit; reverted when the rage expires.
    Raging,
    /// Cannot see; blocks gaze attacks in both directions.
    Blinded,
}

impl Condition {
    /// Stackable conditions extend their duration on re-application instead
    /// of refreshing it.
    pub const fn is_stackable(&self) -> bool {
        matches!(self, Condition::Poisoned)
    }

    /// Conditions that make a creature skip its whole turn.
    pub const fn is_incapacitating(&self) -> bool {
        matches!(self, Condition::Stunned | Condition::Paralyzed)
    }
}

/// How an application changed the condition map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The condition was not present before.
    Fresh,
    /// The timer was reset to the new duration.
    Refreshed,
    /// The new duration was added to the remaining timer.
    Extended,
}

/// Set of active conditions with remaining durations, in turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionMap {
    active: HashMap<Condition, u16>,
}

impl ConditionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, condition: Condition) -> bool {
        self.active.contains_key(&condition)
    }

    pub fn remaining(&self, condition: Condition) -> u16 {
        self.active.get(&condition).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Condition, u16)> + '_ {
        self.active.iter().map(|(c, d)| (*c, *d))
    }

    /// Apply a condition for `duration` turns.
    ///
    /// A zero duration is ignored. Returns how the map changed.
    pub fn apply(&mut self, condition: Condition, duration: u16) -> Option<Applied> {
        if duration == 0 {
            return None;
        }
        match self.active.get_mut(&condition) {
            None => {
                self.active.insert(condition, duration);
                Some(Applied::Fresh)
            }
            Some(remaining) if condition.is_stackable() => {
                *remaining = remaining.saturating_add(duration);
                Some(Applied::Extended)
            }
            Some(remaining) => {
                *remaining = duration;
                Some(Applied::Refreshed)
            }
        }
    }

    pub fn remove(&mut self, condition: Condition) -> bool {
        self.active.remove(&condition).is_some()
    }

    /// Decrement every duration by one turn, removing conditions that reach
    /// zero. Returns the expired conditions so on-expire effects can fire
    /// exactly once.
    pub fn tick(&mut self) -> Vec<Condition> {
        let mut expired = Vec::new();
        self.active.retain(|condition, remaining| {
            *remaining -= 1;
            if *remaining == 0 {
                expired.push(*condition);
                false
            } else {
                true
            }
        });
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_tick() {
        let mut map = ConditionMap::new();
        assert_eq!(map.apply(Condition::Stunned, 2), Some(Applied::Fresh));
        assert!(map.has(Condition::Stunned));

        assert!(map.tick().is_empty());
        assert_eq!(map.remaining(Condition::Stunned), 1);

        let expired = map.tick();
        assert_eq!(expired, vec![Condition::Stunned]);
        assert!(!map.has(Condition::Stunned));
    }

    #[test]
    fn test_reapply_refreshes_not_stacks() {
        let mut map = ConditionMap::new();
        map.apply(Condition::Confused, 5);
        map.tick();
        assert_eq!(map.remaining(Condition::Confused), 4);

        assert_eq!(map.apply(Condition::Confused, 3), Some(Applied::Refreshed));
        assert_eq!(map.remaining(Condition::Confused), 3);
    }

    #[test]
    fn test_poison_stacks() {
        let mut map = ConditionMap::new();
        map.apply(Condition::Poisoned, 4);
        assert_eq!(map.apply(Condition::Poisoned, 3), Some(Applied::Extended));
        assert_eq!(map.remaining(Condition::Poisoned), 7);
    }

    #[test]
    fn test_zero_duration_ignored() {
        let mut map = ConditionMap::new();
        assert_eq!(map.apply(Condition::Webbed, 0), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_expiry_fires_once() {
        let mut map = ConditionMap::new();
        map.apply(Condition::Raging, 1);
        assert_eq!(map.tick(), vec![Condition::Raging]);
        assert!(map.tick().is_empty());
    }
}

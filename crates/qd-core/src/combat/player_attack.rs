//! Player-side attack resolution: the quiz-chain model.
//!
//! The player never rolls to hit. An external quiz gates the attack, and the
//! score (consecutive correct answers) indexes the weapon's chain-multiplier
//! table. This is the only place the combat core sees the quiz subsystem,
//! and all it sees is the result record.

use super::{apply_damage, CombatOutcome, DamageKind};
use crate::consts::MIN_PLAYER_DAMAGE;
use crate::creature::{CreatureFlags, CreatureId, Target};
use crate::event::{Notice, NoticeSink};
use crate::world::World;

/// Result record delivered by the quiz collaborator, once per initiated
/// player attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizResult {
    pub success: bool,
    /// Consecutive correct answers; 0 when the quiz was failed outright.
    pub score: u32,
    pub total_questions: u32,
}

/// Player weapon view, with all equipment math already resolved by the
/// inventory collaborator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChainWeapon {
    pub name: String,
    pub base_damage: i32,
    /// `chain_multipliers[i]` scales damage for `i + 1` consecutive correct
    /// answers; scores past the end use the last entry.
    pub chain_multipliers: Vec<i32>,
    pub enchantment: i32,
    pub blessed: bool,
    pub cursed: bool,
}

impl ChainWeapon {
    pub fn new(name: impl Into<String>, base_damage: i32, chain_multipliers: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            base_damage,
            chain_multipliers,
            enchantment: 0,
            blessed: false,
            cursed: false,
        }
    }

    /// Multiplier for a quiz score; the table is 1-indexed by score.
    pub fn multiplier(&self, score: u32) -> i32 {
        if score == 0 || self.chain_multipliers.is_empty() {
            return 0;
        }
        let index = (score as usize - 1).min(self.chain_multipliers.len() - 1);
        self.chain_multipliers[index]
    }
}

/// Resolve one quiz-gated player attack against a creature.
///
/// A score of zero is always a complete miss, whatever the success flag
/// says. Attacks against missing or dead creatures fail without effect.
pub fn player_attack(
    world: &mut World,
    target_id: CreatureId,
    weapon: &ChainWeapon,
    quiz: QuizResult,
    sink: &mut dyn NoticeSink,
) -> CombatOutcome {
    let target = Target::Creature(target_id);
    if !world.is_alive(target) {
        return CombatOutcome::MISS;
    }

    if quiz.score == 0 {
        sink.notice(Notice::AttackMissed {
            attacker: Target::Player,
            target,
        });
        return CombatOutcome::MISS;
    }

    let mut damage = weapon.base_damage * weapon.multiplier(quiz.score) + weapon.enchantment;

    let unholy = world
        .creature(target_id)
        .map(|c| c.flags.contains(CreatureFlags::UNHOLY))
        .unwrap_or(false);
    if weapon.blessed && unholy {
        damage = damage * 3 / 2;
    }
    if weapon.cursed {
        damage /= 2;
    }
    let damage = damage.max(MIN_PLAYER_DAMAGE);

    let applied = apply_damage(world, target, damage, &weapon.name, sink);
    sink.notice(Notice::AttackHit {
        attacker: Target::Player,
        target,
        damage: applied.dealt,
        kind: DamageKind::Physical,
    });

    let mut outcome = CombatOutcome::hit(applied.dealt, DamageKind::Physical);
    outcome.target_died = applied.died;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::{Creature, CreatureFlags};
    use crate::event::NoticeLog;
    use crate::world::PlayerState;

    fn world_with(hp: i32, flags: CreatureFlags) -> (World, CreatureId) {
        let mut world = World::new(PlayerState::new(5, 5, 40));
        let mut c = Creature::new(CreatureId::NONE, 6, "ghoul", 6, 5);
        c.hp = hp;
        c.hp_max = hp;
        c.flags = flags;
        let id = world.add_creature(c);
        (world, id)
    }

    fn practice_sword() -> ChainWeapon {
        ChainWeapon::new("practice sword", 8, vec![1, 2, 4, 6, 8, 10])
    }

    fn quiz(score: u32) -> QuizResult {
        QuizResult {
            success: score > 0,
            score,
            total_questions: 6,
        }
    }

    #[test]
    fn test_chain_multiplier_indexing() {
        let weapon = practice_sword();
        assert_eq!(weapon.multiplier(0), 0);
        assert_eq!(weapon.multiplier(1), 1);
        assert_eq!(weapon.multiplier(3), 4);
        assert_eq!(weapon.multiplier(6), 10);
        // Past the table: clamps to the last tier.
        assert_eq!(weapon.multiplier(11), 10);
    }

    #[test]
    fn test_score_three_damage() {
        let (mut world, id) = world_with(100, CreatureFlags::empty());
        let mut log = NoticeLog::new();
        let outcome = player_attack(
            &mut world,
            id,
            &practice_sword(),
            quiz(3),
            &mut log,
        );
        assert_eq!(outcome.damage, 32); // 8 * 4
        assert_eq!(world.creature(id).unwrap().hp, 68);
    }

    #[test]
    fn test_zero_score_always_misses() {
        let (mut world, id) = world_with(100, CreatureFlags::empty());
        let mut log = NoticeLog::new();
        // Even a "successful" quiz with no correct answers whiffs.
        let result = QuizResult {
            success: true,
            score: 0,
            total_questions: 6,
        };
        let outcome = player_attack(&mut world, id, &practice_sword(), result, &mut log);
        assert!(!outcome.hit);
        assert_eq!(world.creature(id).unwrap().hp, 100);
        assert_eq!(log.count(|n| matches!(n, Notice::AttackMissed { .. })), 1);
    }

    #[test]
    fn test_blessed_bonus_against_unholy() {
        let (mut world, id) = world_with(100, CreatureFlags::UNHOLY);
        let mut weapon = practice_sword();
        weapon.blessed = true;
        weapon.enchantment = 2;
        let mut log = NoticeLog::new();
        let outcome = player_attack(&mut world, id, &weapon, quiz(2), &mut log);
        // (8 * 2 + 2) * 3 / 2 = 27
        assert_eq!(outcome.damage, 27);
    }

    #[test]
    fn test_blessed_bonus_needs_unholy_target() {
        let (mut world, id) = world_with(100, CreatureFlags::empty());
        let mut weapon = practice_sword();
        weapon.blessed = true;
        let mut log = NoticeLog::new();
        let outcome = player_attack(&mut world, id, &weapon, quiz(2), &mut log);
        assert_eq!(outcome.damage, 16);
    }

    #[test]
    fn test_cursed_weapon_floors_at_one() {
        let (mut world, id) = world_with(100, CreatureFlags::empty());
        let mut weapon = ChainWeapon::new("bent dagger", 1, vec![1]);
        weapon.cursed = true;
        let mut log = NoticeLog::new();
        let outcome = player_attack(&mut world, id, &weapon, quiz(1), &mut log);
        assert_eq!(outcome.damage, 1);
    }

    #[test]
    fn test_overkill_clamps_and_hands_off_loot() {
        let (mut world, id) = world_with(10, CreatureFlags::empty());
        let mut log = NoticeLog::new();
        let outcome = player_attack(
            &mut world,
            id,
            &practice_sword(),
            quiz(6),
            &mut log,
        );
        assert!(outcome.target_died);
        assert_eq!(world.creature(id).unwrap().hp, 0);
        assert_eq!(log.count(|n| matches!(n, Notice::CreatureDied { .. })), 1);
        assert_eq!(log.count(|n| matches!(n, Notice::LootRequested { .. })), 1);

        // A follow-up attack on the corpse is a failed no-op.
        let again = player_attack(
            &mut world,
            id,
            &practice_sword(),
            quiz(6),
            &mut log,
        );
        assert!(!again.hit);
        assert_eq!(log.count(|n| matches!(n, Notice::CreatureDied { .. })), 1);
    }
}

//! Tuning constants for awareness, behavior and combat.

/// A hostile creature loses its target once the target is farther away than
/// `sight_range * SIGHT_ESCAPE_MULTIPLIER`.
pub const SIGHT_ESCAPE_MULTIPLIER: i32 = 3;

/// Radius within which same-kind creatures are alerted when one turns hostile.
pub const PACK_ALERT_RADIUS: i32 = 5;

/// Pack hunters look for same-kind hostile allies within this radius.
pub const PACK_HUNTER_ALLY_RADIUS: i32 = 8;

/// Minimum ally count before pack hunters try to surround the target.
pub const PACK_HUNTER_MIN_ALLIES: usize = 2;

/// Default flee threshold, in percent of max HP.
pub const DEFAULT_FLEE_PERCENT: i32 = 20;

/// Cowardly creatures flee much earlier.
pub const COWARDLY_FLEE_PERCENT: i32 = 60;

/// A target below this HP fraction is considered weak enough for cowards to
/// attack instead of fleeing.
pub const WEAK_TARGET_PERCENT: i32 = 20;

/// Guards engage targets within this radius of their post.
pub const GUARD_ATTACK_RADIUS: i32 = 3;

/// Guards walk back once displaced more than this many tiles from the post.
pub const GUARD_MAX_DISPLACEMENT: i32 = 2;

/// Ranged-pattern creatures back off when the target is closer than this.
pub const RANGED_KEEP_DISTANCE: i32 = 3;

/// Default reach of ranged and breath attacks when the data gives none.
pub const DEFAULT_RANGED_RANGE: i32 = 8;

/// Digestion may instantly kill once the engulfed target is below this
/// fraction of max HP.
pub const DIGEST_WEAK_PERCENT: i32 = 25;

/// One-in-N chance for the digestion instant kill.
pub const DIGEST_INSTAKILL_ONE_IN: u32 = 10;

/// Berserk-trigger passives fire below this HP fraction.
pub const BERSERK_TRIGGER_PERCENT: i32 = 25;

/// To-hit bonus while raging.
pub const RAGE_TO_HIT_BONUS: i32 = 2;

/// Damage taken per turn while poisoned.
pub const POISON_TICK_DAMAGE: i32 = 1;

/// Self-teleport picks a destination within this radius.
pub const TELEPORT_RADIUS: i32 = 10;

/// Normal creature speed; faster creatures get an extra movement step.
pub const BASE_SPEED: i32 = 12;

/// Speed at or above which a creature moves twice per turn.
pub const FAST_SPEED: i32 = 18;

/// A successful player attack always deals at least this much damage.
pub const MIN_PLAYER_DAMAGE: i32 = 1;

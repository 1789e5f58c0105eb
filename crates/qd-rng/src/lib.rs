//! Seedable random number generation and dice-notation evaluation.
//!
//! Everything that rolls dice in the simulation core goes through [`GameRng`],
//! a ChaCha-backed generator that is reproducible from a seed. Combat and
//! ability data express damage as dice notation (`"2d6+3"`), parsed once into
//! a [`DiceExpr`] and rolled as many times as needed; each roll is an
//! independent draw.

use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Game random number generator.
///
/// Wraps ChaCha8Rng for reproducible random number generation. Only the seed
/// is serialized; a restored generator restarts its stream from the seed.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl Serialize for GameRng {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.seed.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameRng {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let seed = u64::deserialize(deserializer)?;
        Ok(GameRng::new(seed))
    }
}

impl GameRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a new RNG with a random seed.
    pub fn from_entropy() -> Self {
        let seed = rand::random();
        Self::new(seed)
    }

    /// Get the seed used to create this RNG.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns a random value in `0..n`. Returns 0 if n is 0.
    pub fn rn2(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Returns a random value in `1..=n`. Returns 0 if n is 0.
    pub fn rnd(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(1..=n)
    }

    /// Roll n dice with m sides and sum them.
    pub fn dice(&mut self, n: u32, m: u32) -> u32 {
        (0..n).map(|_| self.rnd(m)).sum()
    }

    /// Returns true with probability 1/n.
    pub fn one_in(&mut self, n: u32) -> bool {
        self.rn2(n) == 0
    }

    /// Returns true with probability percent/100.
    pub fn percent(&mut self, percent: u32) -> bool {
        self.rn2(100) < percent
    }

    /// Choose a random element from a slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.rn2(items.len() as u32) as usize])
        }
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.rn2(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Error produced when a string is not valid dice notation.
///
/// Callers that want the forgiving fallback behavior use [`roll`] instead of
/// parsing directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid dice notation: '{notation}'")]
pub struct DiceParseError {
    pub notation: String,
}

/// A parsed dice expression: `NdM[+K]`.
///
/// The modifier may be negative; the rolled result floors at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpr {
    /// Number of dice.
    pub num: u32,
    /// Sides per die.
    pub sides: u32,
    /// Flat modifier added after the dice.
    pub modifier: i32,
}

impl DiceExpr {
    /// A constant expression with no dice (rolls to `value`, floored at 0).
    pub const fn flat(value: i32) -> Self {
        Self {
            num: 0,
            sides: 0,
            modifier: value,
        }
    }

    pub const fn new(num: u32, sides: u32, modifier: i32) -> Self {
        Self {
            num,
            sides,
            modifier,
        }
    }

    /// Roll this expression. Each call is an independent draw.
    pub fn roll(&self, rng: &mut GameRng) -> u32 {
        let rolled = rng.dice(self.num, self.sides) as i64 + self.modifier as i64;
        rolled.max(0) as u32
    }

    /// Average value of this expression, floored at 0.
    pub fn average(&self) -> f32 {
        let dice = self.num as f32 * (self.sides as f32 + 1.0) / 2.0;
        (dice + self.modifier as f32).max(0.0)
    }
}

impl FromStr for DiceExpr {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || DiceParseError {
            notation: s.to_string(),
        };

        let d_pos = trimmed
            .find(|c: char| c == 'd' || c == 'D')
            .ok_or_else(err)?;
        let (num_part, rest) = trimmed.split_at(d_pos);
        let rest = &rest[1..];

        let num: u32 = num_part.trim().parse().map_err(|_| err())?;

        // Split off the optional +K / -K modifier.
        let (sides_part, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let (sides, modifier) = rest.split_at(pos);
                let modifier: String = modifier.chars().filter(|c| !c.is_whitespace()).collect();
                let modifier: i32 = modifier.parse().map_err(|_| err())?;
                (sides.trim(), modifier)
            }
            None => (rest.trim(), 0),
        };

        let sides: u32 = sides_part.parse().map_err(|_| err())?;

        Ok(DiceExpr {
            num,
            sides,
            modifier,
        })
    }
}

/// Evaluate a dice-notation string against the RNG.
///
/// Unparsable input falls back to its leading integer, or 0 when there is
/// none. A malformed damage string is a zero roll, never a fault.
pub fn roll(notation: &str, rng: &mut GameRng) -> u32 {
    match notation.parse::<DiceExpr>() {
        Ok(expr) => expr.roll(rng),
        Err(_) => parse_leading_int(notation).max(0) as u32,
    }
}

/// Leading-integer parse: accepts an optional sign followed by digits and
/// ignores any trailing garbage.
fn parse_leading_int(s: &str) -> i64 {
    let trimmed = s.trim_start();
    let mut chars = trimmed.char_indices();
    let mut end = 0;
    let start = match chars.next() {
        Some((_, '+')) | Some((_, '-')) => 1,
        Some((_, c)) if c.is_ascii_digit() => {
            end = 1;
            0
        }
        _ => return 0,
    };
    for (i, c) in chars {
        if c.is_ascii_digit() {
            end = i + 1;
        } else {
            break;
        }
    }
    if end <= start {
        return 0;
    }
    trimmed[..end].parse().unwrap_or(0)
}

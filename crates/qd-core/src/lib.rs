//! qd-core: creature behavior and combat resolution for the quiz-dungeon game.
//!
//! This crate contains the turn-driven simulation logic with no I/O
//! dependencies: creature awareness and state, behavior selection, the
//! special-ability engine, and the dual combat pipeline (THAC0-style rolls
//! for creatures, quiz-gated chain damage for the player).
//!
//! Rendering, the quiz subsystem, persistence, map generation and item
//! bonus computation are collaborators: the core consumes a [`spatial::SpatialQuery`]
//! handle and resolved equipment numbers, and produces [`event::Notice`]
//! records for everything it wants the outside world to know.

pub mod ability;
pub mod ai;
pub mod combat;
pub mod creature;
pub mod event;
pub mod spatial;
pub mod turn;
pub mod world;

mod consts;

pub use consts::*;
pub use qd_rng::{DiceExpr, GameRng, roll};
pub use world::{PlayerState, World};

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, one generator per run
//! - Stable iteration order (head-first segments, insertion-ordered entities)
//! - No rendering or platform dependencies

pub mod combat;
pub mod path;
pub mod progression;
pub mod rewards;
pub mod rng;
pub mod spawner;
pub mod state;
pub mod tick;

pub use path::PathCache;
pub use rng::Prng;
pub use state::{
    BonusCategory, BonusEffect, GameState, Outcome, PlayerStats, Projectile, ResultReason,
    RunPhase, RunResult, SpecialBonusChoice, UpgradeOffer, WeaponRuntimeStats, WormChain,
    WormSegment,
};
pub use tick::tick;

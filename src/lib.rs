//! Chain Defense - hold the line against a segmented chain
//!
//! Core modules:
//! - `sim`: Deterministic simulation (path math, spawning, combat, progression)
//! - `runtime`: Run orchestration (fixed substeps, offers, commands, events)
//! - `tuning`: Data-driven game balance and static catalogs
//! - `meta`: Cross-run progression store

pub mod meta;
pub mod runtime;
pub mod sim;
pub mod tuning;

pub use meta::{MetaProgress, RunModifiers};
pub use runtime::{Run, RunConfig, RunEvent, RunSummary};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta the runtime will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Minimum length used to guard divisions by tiny path segments
    pub const PATH_EPSILON: f32 = 0.0001;

    /// Projectiles further than this beyond the top of the world are dropped
    pub const PROJECTILE_MIN_Y: f32 = -1200.0;
    /// Projectiles below this are dropped
    pub const PROJECTILE_MAX_Y: f32 = 1400.0;
    /// Horizontal slack beyond the world edge before projectiles are dropped
    pub const PROJECTILE_X_PADDING: f32 = 40.0;

    /// Fire interval can never drop below this (seconds)
    pub const MIN_FIRE_INTERVAL: f32 = 0.08;
    /// Angular gap between shots in a fan (radians)
    pub const FAN_STEP: f32 = 0.12;
    /// Total width of random aim jitter per shot (radians)
    pub const AIM_JITTER: f32 = 0.05;

    /// Segments checked on each side of the estimated hit index
    pub const HIT_WINDOW: i32 = 3;

    /// Seconds a damaged segment keeps its HP bar visible
    pub const HP_DISPLAY_SECS: f32 = 1.5;
    /// Floating damage number lifetime (seconds)
    pub const FLOATING_TEXT_LIFE: f32 = 0.8;
    /// Floating damage number drift speed (units/s, upward)
    pub const FLOATING_TEXT_RISE: f32 = 26.0;
    /// Floating text cap; exceeding it drops the oldest `FLOATING_TEXT_TRIM`
    pub const FLOATING_TEXT_CAP: usize = 80;
    pub const FLOATING_TEXT_TRIM: usize = 20;

    /// Extra reach added to the pickup radius for XP orbs
    pub const ORB_PICKUP_SLACK: f32 = 18.0;
    /// Extra reach added to the pickup radius for special pickups
    pub const SPECIAL_PICKUP_SLACK: f32 = 12.0;

    /// Upgrade choices offered per level
    pub const OFFER_SIZE: usize = 3;
    /// Rerolls available at the start of a run
    pub const STARTING_REROLLS: u32 = 3;
}

/// Clamp a value to [-1, 1]
#[inline]
pub fn clamp_unit(v: f32) -> f32 {
    v.clamp(-1.0, 1.0)
}

/// Unit direction for an angle (radians, y down)
#[inline]
pub fn angle_to_dir(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// XP needed to advance past `level`
#[inline]
pub fn xp_curve(level: u32) -> f32 {
    let l = level as f32;
    (24.0 + l * 14.0 + l * l * 3.2).floor()
}

//! Data-driven game balance
//!
//! Static, read-only catalogs consumed by the simulation. `Tuning::default()`
//! is the built-in stage; `Tuning::from_json` lets a host override any part of
//! it (missing fields fall back to the defaults).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Reward rarity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
        }
    }
}

/// Chain (worm) definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WormDefinition {
    pub id: String,
    pub segment_hp: f32,
    pub segment_radius: f32,
    /// Arc-length gap between consecutive segments
    pub spacing: f32,
    /// Head advance along the path (units/s)
    pub head_speed: f32,
    /// Arc length of the head when the run starts
    pub start_head_s: f32,
    pub initial_segments: u32,
    /// Most segments alive at once
    pub max_segments: u32,
    /// Segments the stage will ever spawn, including the initial ones
    pub total_segments: u32,
    /// Tail appends per second while below `max_segments`
    pub spawn_rate: f32,
    /// Every n-th spawned segment is elite
    pub elite_every: u32,
    pub elite_hp_multiplier: f32,
    /// HP grows by this fraction per global kill
    pub kill_scale_step: f32,
    /// Chance a new segment gets an HP jitter
    pub jitter_chance: f32,
    /// Largest jitter bonus (fraction of HP)
    pub jitter_max: f32,
    pub xp_value: f32,
    pub coin_value: u32,
    pub gem_chance: f32,
    pub elite_coin_bonus: u32,
    pub elite_gem_bonus: f32,
    pub elite_xp_multiplier: f32,
    /// Head pushback per broken segment
    pub knockback_per_break: f32,
    pub clear_reward_coins: u32,
}

impl Default for WormDefinition {
    fn default() -> Self {
        Self {
            id: "nano-worm".to_string(),
            segment_hp: 30.0,
            segment_radius: 13.0,
            spacing: 22.0,
            head_speed: 22.0,
            start_head_s: 0.0,
            initial_segments: 24,
            max_segments: 90,
            total_segments: 160,
            spawn_rate: 1.6,
            elite_every: 12,
            elite_hp_multiplier: 3.5,
            kill_scale_step: 0.015,
            jitter_chance: 0.08,
            jitter_max: 0.25,
            xp_value: 5.0,
            coin_value: 1,
            gem_chance: 0.04,
            elite_coin_bonus: 2,
            elite_gem_bonus: 0.15,
            elite_xp_multiplier: 2.3,
            knockback_per_break: 6.0,
            clear_reward_coins: 150,
        }
    }
}

/// Weapon definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponDefinition {
    pub id: String,
    pub base_damage: f32,
    pub fire_interval: f32,
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    pub pierce: i32,
    pub count: u32,
    pub knockback: f32,
}

impl Default for WeaponDefinition {
    fn default() -> Self {
        Self {
            id: "pulse-needle".to_string(),
            base_damage: 14.0,
            fire_interval: 0.58,
            projectile_speed: 330.0,
            projectile_radius: 4.0,
            pierce: 0,
            count: 1,
            knockback: 8.0,
        }
    }
}

/// Player stat an upgrade can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStat {
    MaxHp,
    MoveSpeed,
    DamageBonus,
    FireRateBonus,
    CritChance,
    CritDamage,
    Armor,
    Regen,
    PickupRadius,
    XpGain,
}

/// Weapon stat an upgrade can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponStat {
    Damage,
    FireInterval,
    ProjectileSpeed,
    Pierce,
    Count,
    Knockback,
}

/// One-time capability unlock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unlock {
    Orbit,
    Cone,
    Shockwave,
}

/// A single upgrade effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpgradeEffect {
    Stat {
        stat: PlayerStat,
        #[serde(default)]
        add: Option<f32>,
        #[serde(default)]
        mul: Option<f32>,
    },
    Weapon {
        stat: WeaponStat,
        #[serde(default)]
        add: Option<f32>,
        #[serde(default)]
        mul: Option<f32>,
    },
    Unlock {
        unlock: Unlock,
    },
}

/// Upgrade catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    #[serde(default)]
    pub tags: Vec<String>,
    pub max_stacks: u32,
    pub effects: Vec<UpgradeEffect>,
}

/// Tier probabilities for the upgrade draw (should sum to 1)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RarityWeights {
    pub common: f32,
    pub rare: f32,
    pub epic: f32,
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self {
            common: 0.7,
            rare: 0.25,
            epic: 0.05,
        }
    }
}

impl RarityWeights {
    /// Map a uniform roll in [0, 1) to a tier
    pub fn tier_for(&self, roll: f32) -> Rarity {
        if roll < self.common {
            Rarity::Common
        } else if roll < self.common + self.rare {
            Rarity::Rare
        } else {
            Rarity::Epic
        }
    }
}

/// Discrete magnitude with its draw weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusValue {
    pub value: f32,
    pub weight: f32,
}

const fn bv(value: f32, weight: f32) -> BonusValue {
    BonusValue { value, weight }
}

/// Value tables for the elite special-bonus offer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialBonusTables {
    /// Extra simultaneous shots
    pub shots: Vec<BonusValue>,
    /// Fractional cooldown reduction
    pub cooldown: Vec<BonusValue>,
    /// Fractional damage increase
    pub damage: Vec<BonusValue>,
    /// Normalized magnitude above which a bonus is rare
    pub rare_threshold: f32,
    /// Normalized magnitude above which a bonus is epic
    pub epic_threshold: f32,
    /// Shot count that normalizes to magnitude 1
    pub shots_scale: f32,
    /// Damage bonus that normalizes to magnitude 1
    pub damage_scale: f32,
    /// Floor for a single cooldown multiplier
    pub min_cooldown_multiplier: f32,
}

impl Default for SpecialBonusTables {
    fn default() -> Self {
        Self {
            shots: vec![
                bv(1.0, 40.0),
                bv(2.0, 24.0),
                bv(3.0, 14.0),
                bv(4.0, 9.0),
                bv(5.0, 6.0),
                bv(6.0, 4.0),
                bv(8.0, 2.0),
                bv(10.0, 1.0),
            ],
            cooldown: vec![
                bv(0.2, 40.0),
                bv(0.3, 25.0),
                bv(0.4, 15.0),
                bv(0.5, 10.0),
                bv(0.6, 6.0),
                bv(0.75, 3.0),
                bv(0.9, 1.0),
            ],
            damage: vec![
                bv(0.2, 40.0),
                bv(0.5, 25.0),
                bv(1.0, 15.0),
                bv(1.5, 10.0),
                bv(2.5, 6.0),
                bv(3.5, 3.0),
                bv(5.0, 1.0),
            ],
            rare_threshold: 0.42,
            epic_threshold: 0.72,
            shots_scale: 10.0,
            damage_scale: 5.0,
            min_cooldown_multiplier: 0.1,
        }
    }
}

impl SpecialBonusTables {
    /// Rarity label for a magnitude normalized to [0, 1]
    pub fn rarity_for(&self, magnitude: f32) -> Rarity {
        if magnitude > self.epic_threshold {
            Rarity::Epic
        } else if magnitude > self.rare_threshold {
            Rarity::Rare
        } else {
            Rarity::Common
        }
    }
}

/// Stage geometry and run limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageDefinition {
    pub worm_id: String,
    pub weapon_id: String,
    /// Path the chain follows, head first from `waypoints[0]`
    pub waypoints: Vec<Vec2>,
    /// Fixed y of the player's lane
    pub player_lane_y: f32,
    /// The run is lost when the head's sampled y reaches this line
    pub defend_line_y: Option<f32>,
    /// Width of the playable area (player x is clamped to half of it)
    pub world_size: f32,
    /// Surviving this long wins the run (seconds)
    pub time_limit: Option<f32>,
}

impl Default for StageDefinition {
    fn default() -> Self {
        let rows = [-760.0, -600.0, -440.0, -280.0, -120.0, 40.0];
        let mut waypoints = Vec::with_capacity(rows.len() * 2 + 3);
        for (i, &y) in rows.iter().enumerate() {
            let (from, to) = if i % 2 == 0 { (-420.0, 420.0) } else { (420.0, -420.0) };
            waypoints.push(Vec2::new(from, y));
            waypoints.push(Vec2::new(to, y));
        }
        waypoints.push(Vec2::new(-420.0, 200.0));
        waypoints.push(Vec2::new(0.0, 200.0));
        waypoints.push(Vec2::new(0.0, 320.0));

        Self {
            worm_id: "nano-worm".to_string(),
            weapon_id: "pulse-needle".to_string(),
            waypoints,
            player_lane_y: 320.0,
            defend_line_y: Some(260.0),
            world_size: 1000.0,
            time_limit: Some(360.0),
        }
    }
}

/// Special pickup flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialPickupKind {
    BigXp,
    Heal,
}

/// Pickup spawning and collection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    /// Base seconds between special pickups
    pub special_interval: f32,
    /// Interval shrinks by this many seconds per elapsed second
    pub interval_decay: f32,
    /// Most the interval can shrink
    pub max_interval_reduction: f32,
    /// Special pickups spawn at x in [-half_width, half_width]
    pub spawn_half_width: f32,
    /// Height above the lane where special pickups appear
    pub lane_offset: f32,
    pub special_life: f32,
    pub big_xp_value: f32,
    pub heal_value: f32,
    /// Draw weights for each special pickup kind
    pub kind_weights: Vec<(SpecialPickupKind, f32)>,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            special_interval: 14.0,
            interval_decay: 0.02,
            max_interval_reduction: 6.0,
            spawn_half_width: 440.0,
            lane_offset: 40.0,
            special_life: 10.0,
            big_xp_value: 24.0,
            heal_value: 20.0,
            kind_weights: vec![(SpecialPickupKind::BigXp, 0.8), (SpecialPickupKind::Heal, 0.2)],
        }
    }
}

/// Complete static configuration for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub worms: Vec<WormDefinition>,
    pub weapons: Vec<WeaponDefinition>,
    pub upgrades: Vec<UpgradeDefinition>,
    pub rarity_weights: RarityWeights,
    pub special_bonus: SpecialBonusTables,
    pub stage: StageDefinition,
    pub pickups: PickupTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            worms: vec![WormDefinition::default()],
            weapons: vec![WeaponDefinition::default()],
            upgrades: default_upgrades(),
            rarity_weights: RarityWeights::default(),
            special_bonus: SpecialBonusTables::default(),
            stage: StageDefinition::default(),
            pickups: PickupTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse a tuning override; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn worm(&self, id: &str) -> Option<&WormDefinition> {
        self.worms.iter().find(|w| w.id == id)
    }

    pub fn weapon(&self, id: &str) -> Option<&WeaponDefinition> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn upgrade(&self, id: &str) -> Option<&UpgradeDefinition> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    /// Chain definition the stage uses
    pub fn stage_worm(&self) -> Option<&WormDefinition> {
        self.worm(&self.stage.worm_id)
    }

    /// Weapon the stage uses
    pub fn stage_weapon(&self) -> Option<&WeaponDefinition> {
        self.weapon(&self.stage.weapon_id)
    }
}

fn upgrade(
    id: &str,
    name: &str,
    description: &str,
    rarity: Rarity,
    tag: &str,
    max_stacks: u32,
    effect: UpgradeEffect,
) -> UpgradeDefinition {
    UpgradeDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        rarity,
        tags: vec![tag.to_string()],
        max_stacks,
        effects: vec![effect],
    }
}

fn stat_add(stat: PlayerStat, add: f32) -> UpgradeEffect {
    UpgradeEffect::Stat {
        stat,
        add: Some(add),
        mul: None,
    }
}

fn weapon_add(stat: WeaponStat, add: f32) -> UpgradeEffect {
    UpgradeEffect::Weapon {
        stat,
        add: Some(add),
        mul: None,
    }
}

/// Built-in upgrade catalog
pub fn default_upgrades() -> Vec<UpgradeDefinition> {
    use PlayerStat::*;
    use Rarity::*;

    vec![
        upgrade("dmg-1", "Focused Output", "Damage +12%", Common, "damage", 5, stat_add(DamageBonus, 0.12)),
        upgrade("dmg-2", "Piercing Potential", "Damage +20%", Rare, "damage", 3, stat_add(DamageBonus, 0.2)),
        upgrade("rate-1", "Overclock", "Fire interval -10%", Common, "rate", 5, stat_add(FireRateBonus, 0.1)),
        upgrade("rate-2", "Phase Sync", "Fire interval -16%", Rare, "rate", 3, stat_add(FireRateBonus, 0.16)),
        upgrade("multi-1", "Multishot", "Projectiles +1", Rare, "projectile", 3, weapon_add(WeaponStat::Count, 1.0)),
        upgrade("pierce-1", "Micro Pierce", "Pierce +1", Common, "projectile", 4, weapon_add(WeaponStat::Pierce, 1.0)),
        upgrade("crit-1", "Critical Calibration", "Crit chance +5%", Common, "crit", 6, stat_add(CritChance, 0.05)),
        upgrade("crit-2", "Fracture Crit", "Crit damage +25%", Rare, "crit", 4, stat_add(CritDamage, 0.25)),
        upgrade("kb-1", "Repulsor Ring", "Knockback +4", Common, "control", 4, weapon_add(WeaponStat::Knockback, 4.0)),
        upgrade("hp-1", "Pressure Frame", "Max HP +18", Common, "defense", 4, stat_add(MaxHp, 18.0)),
        upgrade("armor-1", "Particle Shield", "Damage taken -1", Rare, "defense", 6, stat_add(Armor, 1.0)),
        upgrade("regen-1", "Self-Repair Film", "HP +0.45/s", Rare, "defense", 4, stat_add(Regen, 0.45)),
        upgrade("move-1", "Low Friction", "Move speed +10%", Common, "utility", 5, stat_add(MoveSpeed, 0.1)),
        upgrade("pickup-1", "Magnetic Holo", "Pickup radius +18", Common, "utility", 5, stat_add(PickupRadius, 18.0)),
        upgrade("xp-1", "Analytic Learning", "XP gain +15%", Common, "utility", 5, stat_add(XpGain, 0.15)),
        upgrade("orbit-1", "Orbit Drone", "Activates an orbiting drone", Epic, "special", 1, UpgradeEffect::Unlock { unlock: Unlock::Orbit }),
        upgrade("cone-1", "Fan Burst", "Adds a forward 3-shot burst", Epic, "special", 1, UpgradeEffect::Unlock { unlock: Unlock::Cone }),
        upgrade("shock-1", "Short Shock", "Adds a periodic shockwave", Epic, "special", 1, UpgradeEffect::Unlock { unlock: Unlock::Shockwave }),
    ]
}

//! Game state and core simulation types
//!
//! Everything a renderer needs to draw a frame lives in `GameState`. The
//! run's generator and static catalogs are owned by the `Run`, not here.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::path::PathCache;
use crate::consts::STARTING_REROLLS;
use crate::meta::RunModifiers;
use crate::tuning::{
    PlayerStat, Rarity, SpecialPickupKind, Tuning, Unlock, WeaponDefinition, WeaponStat,
    WormDefinition,
};

/// One destructible unit of the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WormSegment {
    pub id: u32,
    pub hp: f32,
    pub max_hp: f32,
    pub radius: f32,
    /// Arc-length position, always `head_s - index * spacing`
    pub s: f32,
    pub is_elite: bool,
    /// Seconds the HP bar stays visible after a hit
    pub hp_display_timer: f32,
}

/// Book-keeping owned by the chain spawner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnerState {
    /// Fractional spawn budget; one segment is appended per whole unit
    pub accumulator: f32,
    /// Segments spawned so far, initial ones included
    pub spawned_count: u32,
}

/// Per-segment rewards, fixed when the chain is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRewards {
    pub xp: f32,
    pub coins: u32,
    pub gem_chance: f32,
    pub elite_coin_bonus: u32,
    pub elite_gem_bonus: f32,
    pub elite_xp_multiplier: f32,
    pub clear_coins: u32,
}

impl SegmentRewards {
    pub fn coins_for(&self, elite: bool) -> u32 {
        self.coins + if elite { self.elite_coin_bonus } else { 0 }
    }

    pub fn gem_chance_for(&self, elite: bool) -> f32 {
        self.gem_chance + if elite { self.elite_gem_bonus } else { 0.0 }
    }

    pub fn xp_for(&self, elite: bool) -> f32 {
        (self.xp * if elite { self.elite_xp_multiplier } else { 1.0 }).round()
    }
}

/// The chain of segments marching along the path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WormChain {
    pub def_id: String,
    pub head_s: f32,
    pub speed: f32,
    pub spacing: f32,
    /// Reaching this arc length loses the run
    pub goal_s: f32,
    pub knockback_per_break: f32,
    pub path: PathCache,
    /// Head first
    pub segments: Vec<WormSegment>,
    pub spawner: SpawnerState,
    pub rewards: SegmentRewards,
}

impl WormChain {
    pub fn new(def: &WormDefinition, path: PathCache) -> Self {
        Self {
            def_id: def.id.clone(),
            head_s: def.start_head_s,
            speed: def.head_speed,
            spacing: def.spacing,
            goal_s: path.total_length,
            knockback_per_break: def.knockback_per_break,
            path,
            segments: Vec::new(),
            spawner: SpawnerState::default(),
            rewards: SegmentRewards {
                xp: def.xp_value,
                coins: def.coin_value,
                gem_chance: def.gem_chance,
                elite_coin_bonus: def.elite_coin_bonus,
                elite_gem_bonus: def.elite_gem_bonus,
                elite_xp_multiplier: def.elite_xp_multiplier,
                clear_coins: def.clear_reward_coins,
            },
        }
    }

    /// Recompute every segment's `s` from the head
    pub fn relayout(&mut self) {
        let head = self.head_s;
        let spacing = self.spacing;
        for (i, seg) in self.segments.iter_mut().enumerate() {
            seg.s = head - i as f32 * spacing;
        }
    }

    /// World position of the segment at `index`
    pub fn segment_pos(&self, index: usize) -> Option<Vec2> {
        self.segments.get(index).map(|seg| self.path.sample(seg.s))
    }

    /// World position of the head
    pub fn head_pos(&self) -> Vec2 {
        self.path.sample(self.head_s)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A projectile in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub radius: f32,
    /// Hits left before the projectile is spent; spent once below zero
    pub pierce_left: i32,
    pub knockback: f32,
    pub is_crit: bool,
}

/// XP orb dropped by a broken segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orb {
    pub id: u32,
    pub pos: Vec2,
    pub value: f32,
}

/// Timed pickup that appears near the lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialPickup {
    pub id: u32,
    pub pos: Vec2,
    pub kind: SpecialPickupKind,
    pub value: f32,
    /// Seconds until it expires
    pub life: f32,
}

/// Damage number popup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingText {
    pub id: u32,
    pub pos: Vec2,
    pub value: i32,
    pub crit: bool,
    pub life: f32,
    pub max_life: f32,
}

/// The player on the defensive line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub hp: f32,
}

/// Run-scoped player modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub max_hp: f32,
    pub move_speed: f32,
    pub damage_bonus: f32,
    pub fire_rate_bonus: f32,
    pub crit_chance: f32,
    pub crit_damage: f32,
    pub armor: f32,
    pub regen: f32,
    pub pickup_radius: f32,
    pub xp_gain: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            move_speed: 130.0,
            damage_bonus: 0.0,
            fire_rate_bonus: 0.0,
            crit_chance: 0.05,
            crit_damage: 1.5,
            armor: 0.0,
            regen: 0.0,
            pickup_radius: 32.0,
            xp_gain: 0.0,
        }
    }
}

impl PlayerStats {
    /// Starting stats with permanent meta bonuses folded in
    pub fn with_modifiers(modifiers: &RunModifiers) -> Self {
        let mut stats = Self::default();
        stats.move_speed *= 1.0 + modifiers.move_speed_bonus;
        stats.damage_bonus += modifiers.damage_bonus;
        stats.xp_gain += modifiers.xp_gain_bonus;
        stats
    }

    fn field_mut(&mut self, stat: PlayerStat) -> &mut f32 {
        match stat {
            PlayerStat::MaxHp => &mut self.max_hp,
            PlayerStat::MoveSpeed => &mut self.move_speed,
            PlayerStat::DamageBonus => &mut self.damage_bonus,
            PlayerStat::FireRateBonus => &mut self.fire_rate_bonus,
            PlayerStat::CritChance => &mut self.crit_chance,
            PlayerStat::CritDamage => &mut self.crit_damage,
            PlayerStat::Armor => &mut self.armor,
            PlayerStat::Regen => &mut self.regen,
            PlayerStat::PickupRadius => &mut self.pickup_radius,
            PlayerStat::XpGain => &mut self.xp_gain,
        }
    }

    /// Add then multiply a single stat
    pub fn modify(&mut self, stat: PlayerStat, add: Option<f32>, mul: Option<f32>) {
        let field = self.field_mut(stat);
        if let Some(add) = add {
            *field += add;
        }
        if let Some(mul) = mul {
            *field *= mul;
        }
    }
}

/// Run-scoped weapon numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponRuntimeStats {
    pub damage: f32,
    pub fire_interval: f32,
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    pub pierce: i32,
    pub count: u32,
    pub knockback: f32,
}

impl From<&WeaponDefinition> for WeaponRuntimeStats {
    fn from(def: &WeaponDefinition) -> Self {
        Self {
            damage: def.base_damage,
            fire_interval: def.fire_interval,
            projectile_speed: def.projectile_speed,
            projectile_radius: def.projectile_radius,
            pierce: def.pierce,
            count: def.count,
            knockback: def.knockback,
        }
    }
}

impl WeaponRuntimeStats {
    /// Add then multiply a single stat; integer stats round to the nearest whole
    pub fn modify(&mut self, stat: WeaponStat, add: Option<f32>, mul: Option<f32>) {
        let apply = |v: f32| {
            let v = v + add.unwrap_or(0.0);
            v * mul.unwrap_or(1.0)
        };
        match stat {
            WeaponStat::Damage => self.damage = apply(self.damage),
            WeaponStat::FireInterval => self.fire_interval = apply(self.fire_interval),
            WeaponStat::ProjectileSpeed => self.projectile_speed = apply(self.projectile_speed),
            WeaponStat::Knockback => self.knockback = apply(self.knockback),
            WeaponStat::Pierce => self.pierce = apply(self.pierce as f32).round() as i32,
            WeaponStat::Count => self.count = apply(self.count as f32).round().max(0.0) as u32,
        }
    }
}

/// Permanent-for-the-run bonuses from elite offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunWeaponBonuses {
    pub extra_shots: u32,
    pub cooldown_multiplier: f32,
    pub damage_multiplier: f32,
}

impl Default for RunWeaponBonuses {
    fn default() -> Self {
        Self {
            extra_shots: 0,
            cooldown_multiplier: 1.0,
            damage_multiplier: 1.0,
        }
    }
}

/// Capabilities switched on by epic upgrades
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unlocks {
    pub orbit: bool,
    pub cone: bool,
    pub shockwave: bool,
}

impl Unlocks {
    pub fn set(&mut self, unlock: Unlock) {
        match unlock {
            Unlock::Orbit => self.orbit = true,
            Unlock::Cone => self.cone = true,
            Unlock::Shockwave => self.shockwave = true,
        }
    }
}

/// How many times each upgrade has been taken
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeStacks(BTreeMap<String, u32>);

impl UpgradeStacks {
    pub fn get(&self, id: &str) -> u32 {
        self.0.get(id).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, id: &str) -> u32 {
        let count = self.0.entry(id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Elite bonus categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusCategory {
    Shots,
    Cooldown,
    Damage,
}

/// What a special bonus does when chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BonusEffect {
    AddShots { shots: u32 },
    CooldownMul { multiplier: f32 },
    DamageMul { multiplier: f32 },
}

/// One entry of an elite special-bonus offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialBonusChoice {
    pub id: String,
    pub category: BonusCategory,
    pub rarity: Rarity,
    pub label: String,
    pub description: String,
    pub effect: BonusEffect,
}

/// State of the level-up upgrade offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpgradeOffer {
    /// A level was gained; choices are drawn at the top of the next step
    Due,
    /// Choices drawn and shown
    Ready(Vec<String>),
}

/// How a finished run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultReason {
    ChainCleared,
    TimeLimit,
    HeadReachedGoal,
    DefendLineBreached,
    PlayerDown,
}

/// Terminal result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub outcome: Outcome,
    pub reason: ResultReason,
}

impl RunResult {
    pub fn won(&self) -> bool {
        self.outcome == Outcome::Win
    }
}

/// Run state machine, derived from the state's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Playing,
    /// Paused by the player
    Paused,
    AwaitingUpgradeChoice,
    AwaitingSpecialBonus,
    Result,
}

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u32,
    /// Simulated seconds
    pub time: f32,
    pub paused: bool,
    /// Fast-forward factor (1 or 2)
    pub speed: u8,
    /// Lateral input in [-1, 1]
    pub movement_input: Vec2,
    pub player_lane_y: f32,
    pub defend_line_y: Option<f32>,
    pub world_size: f32,
    pub time_limit: Option<f32>,
    pub player: Player,
    pub player_stats: PlayerStats,
    pub weapon_stats: WeaponRuntimeStats,
    pub run_bonuses: RunWeaponBonuses,
    pub worm: WormChain,
    pub projectiles: Vec<Projectile>,
    pub orbs: Vec<Orb>,
    pub special_pickups: Vec<SpecialPickup>,
    pub floating_texts: Vec<FloatingText>,
    pub fire_timer: f32,
    pub special_spawn_timer: f32,
    pub level: u32,
    pub xp: f32,
    pub xp_to_next: f32,
    pub kills: u32,
    pub run_coins: u32,
    pub run_gems: u32,
    pub reroll_count: u32,
    pub upgrade_stacks: UpgradeStacks,
    pub selected_upgrades: Vec<String>,
    pub upgrade_offer: Option<UpgradeOffer>,
    /// Level-ups still waiting for an offer after the current one
    pub upgrades_owed: u32,
    pub special_offer: Option<Vec<SpecialBonusChoice>>,
    pub unlocks: Unlocks,
    pub result: Option<RunResult>,
    pub clear_reward_granted: bool,
    /// Projectiles fired over the whole run
    pub projectiles_fired: u64,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Build the starting state for a run. The chain starts empty; the
    /// spawner lays down the initial segments.
    pub fn new(seed: u32, tuning: &Tuning, modifiers: &RunModifiers) -> Self {
        let stage = &tuning.stage;
        let path = PathCache::new(stage.waypoints.clone());
        let default_worm = WormDefinition::default();
        let worm_def = tuning.stage_worm().unwrap_or_else(|| {
            log::warn!("Unknown chain definition '{}', using defaults", stage.worm_id);
            &default_worm
        });
        let weapon_stats = match tuning.stage_weapon() {
            Some(def) => WeaponRuntimeStats::from(def),
            None => {
                log::warn!("Unknown weapon '{}', using defaults", stage.weapon_id);
                WeaponRuntimeStats::from(&WeaponDefinition::default())
            }
        };
        let player_stats = PlayerStats::with_modifiers(modifiers);
        let mut worm = WormChain::new(worm_def, path);
        // Keep the stage id so a missing definition stays missing for the spawner
        worm.def_id = stage.worm_id.clone();

        Self {
            seed,
            time: 0.0,
            paused: false,
            speed: 1,
            movement_input: Vec2::ZERO,
            player_lane_y: stage.player_lane_y,
            defend_line_y: stage.defend_line_y,
            world_size: stage.world_size,
            time_limit: stage.time_limit,
            player: Player {
                pos: Vec2::new(0.0, stage.player_lane_y),
                hp: player_stats.max_hp,
            },
            player_stats,
            weapon_stats,
            run_bonuses: RunWeaponBonuses::default(),
            worm,
            projectiles: Vec::new(),
            orbs: Vec::new(),
            special_pickups: Vec::new(),
            floating_texts: Vec::new(),
            fire_timer: 0.0,
            special_spawn_timer: tuning.pickups.special_interval,
            level: 1,
            xp: 0.0,
            xp_to_next: crate::xp_curve(0),
            kills: 0,
            run_coins: 0,
            run_gems: 0,
            reroll_count: STARTING_REROLLS,
            upgrade_stacks: UpgradeStacks::default(),
            selected_upgrades: Vec::new(),
            upgrade_offer: None,
            upgrades_owed: 0,
            special_offer: None,
            unlocks: Unlocks::default(),
            result: None,
            clear_reward_granted: false,
            projectiles_fired: 0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Current state-machine phase
    pub fn phase(&self) -> RunPhase {
        if self.result.is_some() {
            RunPhase::Result
        } else if self.special_offer.is_some() {
            RunPhase::AwaitingSpecialBonus
        } else if self.paused {
            RunPhase::Paused
        } else if self.upgrade_offer.is_some() {
            RunPhase::AwaitingUpgradeChoice
        } else {
            RunPhase::Playing
        }
    }

    /// Set the terminal result unless one is already set
    pub fn finish(&mut self, outcome: Outcome, reason: ResultReason) -> bool {
        if self.result.is_some() {
            return false;
        }
        log::info!(
            "Run finished: {:?} ({:?}) at {:.1}s, level {}, kills {}",
            outcome,
            reason,
            self.time,
            self.level,
            self.kills
        );
        self.result = Some(RunResult { outcome, reason });
        true
    }

    /// Effective seconds between volleys
    pub fn fire_interval(&self) -> f32 {
        (self.weapon_stats.fire_interval
            * (1.0 - self.player_stats.fire_rate_bonus)
            * self.run_bonuses.cooldown_multiplier)
            .max(crate::consts::MIN_FIRE_INTERVAL)
    }

    /// Projectiles per volley
    pub fn shots_per_volley(&self) -> u32 {
        self.weapon_stats.count + self.run_bonuses.extra_shots
    }
}

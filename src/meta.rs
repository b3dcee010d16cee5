//! Cross-run progression
//!
//! Permanent upgrade levels and banked currency, persisted as JSON between
//! runs. The simulation only ever sees the derived [`RunModifiers`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::runtime::RunSummary;

/// Move speed gained per meta level (multiplicative)
pub const MOVE_SPEED_PER_LEVEL: f32 = 0.03;
/// Damage bonus gained per meta level
pub const DAMAGE_PER_LEVEL: f32 = 0.04;
/// XP gain bonus per meta level
pub const XP_GAIN_PER_LEVEL: f32 = 0.05;

/// Permanent bonuses folded into a run's starting stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunModifiers {
    /// Fraction added to move speed (0.06 = +6%)
    pub move_speed_bonus: f32,
    pub damage_bonus: f32,
    pub xp_gain_bonus: f32,
}

/// Purchasable meta stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaStat {
    Hp,
    Move,
    Damage,
    Xp,
}

impl MetaStat {
    pub const ALL: [MetaStat; 4] = [MetaStat::Hp, MetaStat::Move, MetaStat::Damage, MetaStat::Xp];
}

/// Player preferences stored alongside progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaSettings {
    pub sound: bool,
    pub vibration: bool,
}

impl Default for MetaSettings {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
        }
    }
}

/// Persistent meta-progression state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaProgress {
    pub hp: u32,
    #[serde(rename = "move")]
    pub move_level: u32,
    pub damage: u32,
    pub xp: u32,
    pub coins: u32,
    pub gems: u32,
    pub settings: MetaSettings,
}

/// Failure loading or saving the meta store
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    #[error("meta store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("meta store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coins needed to buy the next level when at `level`
pub fn upgrade_cost(level: u32) -> u32 {
    let l = level as f32;
    (30.0 + l * l * 18.0 + l * 12.0).floor() as u32
}

impl MetaProgress {
    pub fn level(&self, stat: MetaStat) -> u32 {
        match stat {
            MetaStat::Hp => self.hp,
            MetaStat::Move => self.move_level,
            MetaStat::Damage => self.damage,
            MetaStat::Xp => self.xp,
        }
    }

    fn level_mut(&mut self, stat: MetaStat) -> &mut u32 {
        match stat {
            MetaStat::Hp => &mut self.hp,
            MetaStat::Move => &mut self.move_level,
            MetaStat::Damage => &mut self.damage,
            MetaStat::Xp => &mut self.xp,
        }
    }

    /// Buy one level of `stat` with banked coins. False if unaffordable.
    pub fn purchase(&mut self, stat: MetaStat) -> bool {
        let cost = upgrade_cost(self.level(stat));
        if self.coins < cost {
            return false;
        }
        self.coins -= cost;
        *self.level_mut(stat) += 1;
        log::info!("Meta {:?} -> level {} for {} coins", stat, self.level(stat), cost);
        true
    }

    /// Starting bonuses for the next run
    pub fn run_modifiers(&self) -> RunModifiers {
        RunModifiers {
            move_speed_bonus: self.move_level as f32 * MOVE_SPEED_PER_LEVEL,
            damage_bonus: self.damage as f32 * DAMAGE_PER_LEVEL,
            xp_gain_bonus: self.xp as f32 * XP_GAIN_PER_LEVEL,
        }
    }

    /// Add a finished run's earnings to the bank
    pub fn bank(&mut self, summary: &RunSummary) {
        self.coins = self.coins.saturating_add(summary.coins);
        self.gems = self.gems.saturating_add(summary.gems);
        log::info!(
            "Banked {} coins, {} gems (now {} / {})",
            summary.coins,
            summary.gems,
            self.coins,
            self.gems
        );
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, MetaError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&raw)?)
    }

    /// Load from `path`, falling back to a fresh store on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(meta) => meta,
            Err(MetaError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Failed to load meta progress from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), MetaError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::debug!("Meta progress saved to {}", path.display());
        Ok(())
    }
}

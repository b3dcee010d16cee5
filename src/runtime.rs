//! Run orchestration
//!
//! A `Run` owns the game state, the run's generator and its tuning. The
//! frame loop feeds wall-clock deltas to [`Run::advance`], which executes
//! whole fixed sub-steps. Offers and results are queued as [`RunEvent`]s for
//! the caller to drain between frames.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clamp_unit;
use crate::consts::*;
use crate::meta::RunModifiers;
use crate::sim::rewards::{apply_special_bonus, apply_upgrade, roll_upgrade_choices};
use crate::sim::spawner::spawn_initial;
use crate::sim::state::{GameState, ResultReason, RunPhase, SpecialBonusChoice, UpgradeOffer};
use crate::sim::{Prng, tick};
use crate::tuning::Tuning;

/// Parameters fixed at run creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub seed: u32,
    pub modifiers: RunModifiers,
}

/// Result payload handed to the meta layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub won: bool,
    pub reason: Option<ResultReason>,
    /// Simulated seconds
    pub elapsed_time: f32,
    pub level: u32,
    pub kills: u32,
    pub coins: u32,
    pub gems: u32,
    pub seed: u32,
    pub remaining_segments: usize,
    pub upgrades: Vec<String>,
}

/// Notifications produced by stepping or by commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    /// A fresh set of upgrade ids to choose from
    UpgradeOffer(Vec<String>),
    /// An elite break opened a special-bonus offer
    SpecialBonusOffer(Vec<SpecialBonusChoice>),
    /// The run reached its terminal result
    Result(RunSummary),
}

/// One encounter from start to result
pub struct Run {
    state: GameState,
    rng: Prng,
    tuning: Tuning,
    accumulator: f32,
    events: Vec<RunEvent>,
}

impl Run {
    pub fn new(config: RunConfig, tuning: Tuning) -> Self {
        let mut state = GameState::new(config.seed, &tuning, &config.modifiers);
        let mut rng = Prng::new(config.seed);
        spawn_initial(&mut state, &tuning, &mut rng);
        log::info!(
            "Run started with seed {} ({} segments, goal at s={:.0})",
            config.seed,
            state.worm.len(),
            state.worm.goal_s
        );

        Self {
            state,
            rng,
            tuning,
            accumulator: 0.0,
            events: Vec::new(),
        }
    }

    /// Read-only snapshot of the current state
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase()
    }

    /// Generator draws consumed so far
    pub fn draws(&self) -> u64 {
        self.rng.draws()
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<RunEvent> {
        std::mem::take(&mut self.events)
    }

    /// Feed a variable frame delta; runs whole fixed sub-steps
    ///
    /// Each sub-step boundary runs `speed` steps. Returns the number of
    /// steps executed.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        // A NaN frame would poison the accumulator for good
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut substeps = 0;
        let mut steps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            for _ in 0..self.state.speed.max(1) {
                self.step(SIM_DT);
                steps += 1;
            }
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        steps
    }

    /// Advance exactly one step, honoring the pause/offer/result gates
    pub fn step(&mut self, dt: f32) {
        if self.state.result.is_some() || self.state.paused || self.state.special_offer.is_some() {
            return;
        }

        match self.state.upgrade_offer {
            Some(UpgradeOffer::Due) => {
                self.roll_upgrade_offer();
                return;
            }
            Some(UpgradeOffer::Ready(_)) => return,
            None => {}
        }

        tick(&mut self.state, &self.tuning, &mut self.rng, dt);

        if let Some(choices) = &self.state.special_offer {
            self.events.push(RunEvent::SpecialBonusOffer(choices.clone()));
        }
        if self.state.result.is_some() {
            self.events.push(RunEvent::Result(self.summary()));
        }
    }

    fn roll_upgrade_offer(&mut self) {
        let choices = roll_upgrade_choices(&self.state, &self.tuning, &mut self.rng);
        if choices.is_empty() {
            // Every upgrade is maxed; nothing left to offer for this or any owed level
            log::debug!("Upgrade pool exhausted, skipping {} offer(s)", 1 + self.state.upgrades_owed);
            self.state.upgrade_offer = None;
            self.state.upgrades_owed = 0;
            return;
        }
        log::info!("Level {} upgrade offer: {:?}", self.state.level, choices);
        self.events.push(RunEvent::UpgradeOffer(choices.clone()));
        self.state.upgrade_offer = Some(UpgradeOffer::Ready(choices));
    }

    /// Lateral movement input, clamped to [-1, 1]
    pub fn set_movement(&mut self, x: f32) {
        self.state.movement_input = Vec2::new(clamp_unit(x), 0.0);
    }

    /// Toggle the player pause. Has no effect while a special offer or
    /// result holds the run. Returns the pause flag afterwards.
    pub fn toggle_pause(&mut self) -> bool {
        if self.state.special_offer.is_none() && self.state.result.is_none() {
            self.state.paused = !self.state.paused;
            log::debug!("Paused: {}", self.state.paused);
        }
        self.state.paused
    }

    /// Switch between 1x and 2x. Returns the new multiplier.
    pub fn toggle_speed(&mut self) -> u8 {
        self.state.speed = if self.state.speed == 2 { 1 } else { 2 };
        self.state.speed
    }

    /// Take one of the offered upgrades
    ///
    /// Ids that are not in the current offer are ignored. A queued level-up
    /// becomes the next offer.
    pub fn choose_upgrade(&mut self, id: &str) -> bool {
        let offered = matches!(
            &self.state.upgrade_offer,
            Some(UpgradeOffer::Ready(choices)) if choices.iter().any(|c| c == id)
        );
        if !offered {
            log::debug!("Upgrade '{id}' is not on offer");
            return false;
        }
        if !apply_upgrade(&mut self.state, &self.tuning, id) {
            return false;
        }

        if self.state.upgrades_owed > 0 {
            self.state.upgrades_owed -= 1;
            self.state.upgrade_offer = Some(UpgradeOffer::Due);
        } else {
            self.state.upgrade_offer = None;
        }
        true
    }

    /// Take one of the elite bonus choices; resumes the run
    pub fn choose_special_bonus(&mut self, id: &str) -> bool {
        apply_special_bonus(&mut self.state, id)
    }

    /// Spend one reroll charge and one gem to redraw the upgrade offer
    pub fn reroll(&mut self) -> bool {
        if !matches!(self.state.upgrade_offer, Some(UpgradeOffer::Ready(_)))
            || self.state.reroll_count == 0
            || self.state.run_gems == 0
        {
            return false;
        }
        self.state.reroll_count -= 1;
        self.state.run_gems -= 1;

        let choices = roll_upgrade_choices(&self.state, &self.tuning, &mut self.rng);
        log::info!("Rerolled upgrade offer: {:?} ({} left)", choices, self.state.reroll_count);
        self.events.push(RunEvent::UpgradeOffer(choices.clone()));
        self.state.upgrade_offer = Some(UpgradeOffer::Ready(choices));
        true
    }

    /// Summary of the run so far; final once a result is set
    pub fn summary(&self) -> RunSummary {
        let s = &self.state;
        RunSummary {
            won: s.result.is_some_and(|r| r.won()),
            reason: s.result.map(|r| r.reason),
            elapsed_time: s.time,
            level: s.level,
            kills: s.kills,
            coins: s.run_coins,
            gems: s.run_gems,
            seed: s.seed,
            remaining_segments: s.worm.len(),
            upgrades: s.selected_upgrades.clone(),
        }
    }
}

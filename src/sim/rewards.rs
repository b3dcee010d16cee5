//! Upgrade and special-bonus draws
//!
//! Both draws go through the run's `Prng` so a seed fixes every offer.

use super::rng::Prng;
use super::state::{BonusCategory, BonusEffect, GameState, SpecialBonusChoice};
use crate::consts::OFFER_SIZE;
use crate::tuning::{BonusValue, SpecialBonusTables, Tuning, UpgradeDefinition, UpgradeEffect};

/// Draw up to three distinct upgrade ids from entries not yet maxed out
///
/// Each pick rolls a rarity tier first; if no remaining entry has that tier
/// the pick falls back to the whole remaining pool.
pub fn roll_upgrade_choices(state: &GameState, tuning: &Tuning, rng: &mut Prng) -> Vec<String> {
    let mut pool: Vec<&UpgradeDefinition> = tuning
        .upgrades
        .iter()
        .filter(|u| state.upgrade_stacks.get(&u.id) < u.max_stacks)
        .collect();
    let mut choices = Vec::with_capacity(OFFER_SIZE);

    while choices.len() < OFFER_SIZE && !pool.is_empty() {
        let tier = tuning.rarity_weights.tier_for(rng.next());
        let in_tier: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, u)| u.rarity == tier)
            .map(|(i, _)| i)
            .collect();
        let pick = if in_tier.is_empty() {
            rng.index(pool.len())
        } else {
            in_tier[rng.index(in_tier.len())]
        };
        choices.push(pool.remove(pick).id.clone());
    }

    choices
}

/// Apply an upgrade by id. Unknown ids are ignored.
pub fn apply_upgrade(state: &mut GameState, tuning: &Tuning, id: &str) -> bool {
    let Some(def) = tuning.upgrade(id) else {
        log::warn!("Ignoring unknown upgrade '{id}'");
        return false;
    };

    let stacks = state.upgrade_stacks.increment(id);
    state.selected_upgrades.push(id.to_string());

    for effect in &def.effects {
        match *effect {
            UpgradeEffect::Stat { stat, add, mul } => state.player_stats.modify(stat, add, mul),
            UpgradeEffect::Weapon { stat, add, mul } => state.weapon_stats.modify(stat, add, mul),
            UpgradeEffect::Unlock { unlock } => state.unlocks.set(unlock),
        }
    }
    log::info!("Upgrade '{}' taken (stack {})", id, stacks);
    true
}

fn draw(table: &[BonusValue], rng: &mut Prng, fallback: f32) -> f32 {
    rng.weighted_pick(table, |b| b.weight)
        .map(|b| b.value)
        .unwrap_or(fallback)
}

/// Draw one shots, one cooldown and one damage bonus
pub fn roll_special_bonus(tables: &SpecialBonusTables, rng: &mut Prng) -> Vec<SpecialBonusChoice> {
    let shots = draw(&tables.shots, rng, 1.0).round().max(1.0) as u32;
    let reduction = draw(&tables.cooldown, rng, 0.2).clamp(0.0, 1.0);
    let damage = draw(&tables.damage, rng, 0.2).max(0.0);

    let cooldown_pct = (reduction * 100.0).round() as i32;
    let damage_pct = (damage * 100.0).round() as i32;

    vec![
        SpecialBonusChoice {
            id: format!("shots-{shots}"),
            category: BonusCategory::Shots,
            rarity: tables.rarity_for((shots as f32 / tables.shots_scale).min(1.0)),
            label: "Extra Barrels".to_string(),
            description: format!("Simultaneous shots +{shots}"),
            effect: BonusEffect::AddShots { shots },
        },
        SpecialBonusChoice {
            id: format!("cooldown-{cooldown_pct}"),
            category: BonusCategory::Cooldown,
            rarity: tables.rarity_for(reduction),
            label: "Cooldown Cut".to_string(),
            description: format!("Fire interval -{cooldown_pct}%"),
            effect: BonusEffect::CooldownMul {
                multiplier: (1.0 - reduction).max(tables.min_cooldown_multiplier),
            },
        },
        SpecialBonusChoice {
            id: format!("damage-{damage_pct}"),
            category: BonusCategory::Damage,
            rarity: tables.rarity_for((damage / tables.damage_scale).min(1.0)),
            label: "Overcharge".to_string(),
            description: format!("Damage +{damage_pct}%"),
            effect: BonusEffect::DamageMul {
                multiplier: 1.0 + damage,
            },
        },
    ]
}

/// Apply a choice from the pending special offer, then close it and unpause
pub fn apply_special_bonus(state: &mut GameState, id: &str) -> bool {
    let Some(choice) = state
        .special_offer
        .as_ref()
        .and_then(|offer| offer.iter().find(|c| c.id == id))
        .cloned()
    else {
        return false;
    };

    let bonuses = &mut state.run_bonuses;
    match choice.effect {
        BonusEffect::AddShots { shots } => bonuses.extra_shots += shots,
        BonusEffect::CooldownMul { multiplier } => bonuses.cooldown_multiplier *= multiplier,
        BonusEffect::DamageMul { multiplier } => bonuses.damage_multiplier *= multiplier,
    }
    log::info!("Special bonus '{}' taken ({:?})", choice.id, choice.rarity);

    state.special_offer = None;
    state.paused = false;
    true
}

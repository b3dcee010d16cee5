//! Weapon fire and projectile-vs-chain collision
//!
//! Instead of testing every projectile against every segment, each projectile
//! is projected onto the path. Its arc length gives an estimated segment index
//! and only a small window around that estimate is tested. This assumes the
//! path doesn't fold back on itself within a few `spacing`s; a tighter curve
//! can hide a nearer segment outside the window. Accepted approximation.

use std::collections::BTreeMap;

use glam::Vec2;

use super::rewards::roll_special_bonus;
use super::rng::Prng;
use super::state::{FloatingText, GameState, Orb, Outcome, Projectile, ResultReason};
use crate::angle_to_dir;
use crate::consts::*;
use crate::tuning::Tuning;

/// Damage landed on one segment during a single step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingHit {
    pub damage: f32,
    pub crit: bool,
}

/// Fire, move, collide and cull for one step
pub fn update(state: &mut GameState, tuning: &Tuning, rng: &mut Prng, dt: f32) {
    state.fire_timer -= dt;
    if state.fire_timer <= 0.0 {
        state.fire_timer += state.fire_interval();
        fire_volley(state, rng);
    }

    for p in &mut state.projectiles {
        p.pos += p.vel * dt;
    }

    for seg in &mut state.worm.segments {
        seg.hp_display_timer = (seg.hp_display_timer - dt).max(0.0);
    }

    handle_projectile_hits(state, tuning, rng);

    let half = state.world_size / 2.0 + PROJECTILE_X_PADDING;
    state.projectiles.retain(|p| {
        p.pos.y > PROJECTILE_MIN_Y && p.pos.y < PROJECTILE_MAX_Y && p.pos.x > -half && p.pos.x < half
    });
}

/// Emit one volley fanned around straight up
pub fn fire_volley(state: &mut GameState, rng: &mut Prng) {
    let total = state.shots_per_volley();
    let stats = state.weapon_stats.clone();
    let radius = if stats.count > 5 { 3.0 } else { stats.projectile_radius };
    let base_damage = stats.damage * (1.0 + state.player_stats.damage_bonus) * state.run_bonuses.damage_multiplier;

    for i in 0..total {
        let fan = (i as f32 - (total as f32 - 1.0) / 2.0) * FAN_STEP;
        let jitter = (rng.next() - 0.5) * AIM_JITTER;
        let angle = -std::f32::consts::FRAC_PI_2 + fan + jitter;
        let crit = rng.next() < state.player_stats.crit_chance;
        let damage = base_damage * if crit { state.player_stats.crit_damage } else { 1.0 };

        let id = state.next_entity_id();
        state.projectiles.push(Projectile {
            id,
            pos: state.player.pos,
            vel: angle_to_dir(angle) * stats.projectile_speed,
            damage,
            radius,
            pierce_left: stats.pierce,
            knockback: stats.knockback,
            is_crit: crit,
        });
    }
    state.projectiles_fired += total as u64;
    log::trace!("Volley of {} at t={:.2}", total, state.time);
}

/// Collect hits from all projectiles into per-segment pending damage
///
/// Projectiles whose pierce runs out are removed here.
pub fn collect_hits(state: &mut GameState) -> BTreeMap<usize, PendingHit> {
    let mut pending: BTreeMap<usize, PendingHit> = BTreeMap::new();
    let worm = &state.worm;
    let spacing = worm.spacing.max(PATH_EPSILON);
    let count = worm.segments.len() as i32;

    state.projectiles.retain_mut(|p| {
        let s_projection = worm.path.project(p.pos);
        let center = ((worm.head_s - s_projection) / spacing).round() as i32;

        for d in -HIT_WINDOW..=HIT_WINDOW {
            let idx = center + d;
            if idx < 0 || idx >= count {
                continue;
            }
            let seg = &worm.segments[idx as usize];
            let seg_pos = worm.path.sample(seg.s);
            if !seg_pos.is_finite() {
                continue;
            }
            if p.pos.distance(seg_pos) <= p.radius + seg.radius {
                let hit = pending.entry(idx as usize).or_default();
                hit.damage += p.damage;
                hit.crit |= p.is_crit;

                p.pierce_left -= 1;
                if p.pierce_left < 0 {
                    return false;
                }
            }
        }
        true
    });

    pending
}

/// Resolve one step of projectile hits against the chain
pub fn handle_projectile_hits(state: &mut GameState, tuning: &Tuning, rng: &mut Prng) {
    let pending = collect_hits(state);
    if pending.is_empty() {
        return;
    }

    let mut broken = Vec::new();
    for (idx, hit) in pending {
        let Some(seg) = state.worm.segments.get_mut(idx) else {
            continue;
        };
        seg.hp -= hit.damage;
        seg.hp_display_timer = HP_DISPLAY_SECS;
        let dead = seg.hp <= 0.0;
        let pos = state.worm.path.sample(seg.s);
        if pos.is_finite() {
            add_floating_damage(state, pos, hit.damage, hit.crit);
        }
        if dead {
            broken.push(idx);
        }
    }

    if !broken.is_empty() {
        remove_broken(state, tuning, rng, broken);
    }
}

/// Remove broken segments, pay out rewards, knock the head back
pub fn remove_broken(state: &mut GameState, tuning: &Tuning, rng: &mut Prng, mut broken: Vec<usize>) {
    // Highest index first so earlier removals don't shift later ones
    broken.sort_unstable_by(|a, b| b.cmp(a));
    broken.dedup();

    let mut removed = 0u32;
    let mut offer_opened = false;
    for idx in broken {
        if idx >= state.worm.len() {
            continue;
        }
        let seg = state.worm.segments.remove(idx);
        let rewards = &state.worm.rewards;
        let coins = rewards.coins_for(seg.is_elite);
        let gem_chance = rewards.gem_chance_for(seg.is_elite);
        let xp = rewards.xp_for(seg.is_elite);

        state.kills += 1;
        state.run_coins += coins;
        if rng.next() < gem_chance {
            state.run_gems += 1;
        }

        let pos = state.worm.path.sample(seg.s);
        if pos.is_finite() {
            let id = state.next_entity_id();
            state.orbs.push(Orb { id, pos, value: xp });
        }

        if seg.is_elite && state.special_offer.is_none() && !offer_opened {
            let choices = roll_special_bonus(&tuning.special_bonus, rng);
            log::info!(
                "Elite segment {} broken, offering {:?}",
                seg.id,
                choices.iter().map(|c| c.id.as_str()).collect::<Vec<_>>()
            );
            state.special_offer = Some(choices);
            state.paused = true;
            offer_opened = true;
        }
        removed += 1;
    }

    let worm = &mut state.worm;
    worm.head_s = (worm.head_s - worm.knockback_per_break * removed as f32).clamp(0.0, worm.goal_s);
    worm.relayout();
    log::debug!(
        "Broke {} segments, head knocked back to {:.1}, {} left",
        removed,
        worm.head_s,
        worm.len()
    );

    if state.worm.is_empty() && !state.clear_reward_granted {
        state.run_coins += state.worm.rewards.clear_coins;
        state.clear_reward_granted = true;
        state.finish(Outcome::Win, ResultReason::ChainCleared);
        state.paused = true;
    }
}

fn add_floating_damage(state: &mut GameState, pos: Vec2, damage: f32, crit: bool) {
    if state.floating_texts.len() > FLOATING_TEXT_CAP {
        state.floating_texts.drain(0..FLOATING_TEXT_TRIM);
    }
    let id = state.next_entity_id();
    state.floating_texts.push(FloatingText {
        id,
        pos: pos - Vec2::new(0.0, 8.0),
        value: damage.round() as i32,
        crit,
        life: FLOATING_TEXT_LIFE,
        max_life: FLOATING_TEXT_LIFE,
    });
}

//! Player movement, pickups, leveling and terminal checks

use glam::Vec2;

use super::rng::Prng;
use super::state::{GameState, Outcome, ResultReason, SpecialPickup, UpgradeOffer};
use crate::consts::*;
use crate::tuning::{SpecialPickupKind, Tuning};
use crate::{clamp_unit, xp_curve};

/// Slide the player along the lane
pub fn update_movement(state: &mut GameState, dt: f32) {
    let dir_x = clamp_unit(state.movement_input.x);
    let half = state.world_size / 2.0;
    let x = state.player.pos.x + dir_x * state.player_stats.move_speed * dt;
    state.player.pos = Vec2::new(x.clamp(-half, half), state.player_lane_y);
}

/// Regen, pickups, leveling and the end-of-step terminal checks
pub fn update(state: &mut GameState, tuning: &Tuning, rng: &mut Prng, dt: f32) {
    let stats = &state.player_stats;
    if stats.regen > 0.0 {
        state.player.hp = (state.player.hp + stats.regen * dt).min(stats.max_hp);
    }

    collect_orbs(state);
    spawn_special_pickups(state, tuning, rng, dt);
    update_special_pickups(state, dt);
    level_up(state);
    age_floating_texts(state, dt);
    check_terminal(state);
}

fn xp_multiplier(state: &GameState) -> f32 {
    1.0 + state.player_stats.xp_gain
}

fn collect_orbs(state: &mut GameState) {
    let reach = state.player_stats.pickup_radius + ORB_PICKUP_SLACK;
    let player = state.player.pos;
    let mult = xp_multiplier(state);
    let mut gained = 0.0;
    state.orbs.retain(|orb| {
        if orb.pos.distance(player) <= reach {
            gained += orb.value * mult;
            false
        } else {
            true
        }
    });
    state.xp += gained;
}

fn spawn_special_pickups(state: &mut GameState, tuning: &Tuning, rng: &mut Prng, dt: f32) {
    let cfg = &tuning.pickups;
    state.special_spawn_timer -= dt;
    if state.special_spawn_timer > 0.0 {
        return;
    }
    state.special_spawn_timer =
        cfg.special_interval - (state.time * cfg.interval_decay).min(cfg.max_interval_reduction);

    let x = -cfg.spawn_half_width + rng.next() * cfg.spawn_half_width * 2.0;
    let kind = rng
        .weighted_pick(&cfg.kind_weights, |(_, w)| *w)
        .map(|(k, _)| *k)
        .unwrap_or(SpecialPickupKind::BigXp);
    let value = match kind {
        SpecialPickupKind::BigXp => cfg.big_xp_value,
        SpecialPickupKind::Heal => cfg.heal_value,
    };

    let id = state.next_entity_id();
    state.special_pickups.push(SpecialPickup {
        id,
        pos: Vec2::new(x, state.player_lane_y - cfg.lane_offset),
        kind,
        value,
        life: cfg.special_life,
    });
    log::trace!("Special pickup {:?} at x={:.0}", kind, x);
}

fn update_special_pickups(state: &mut GameState, dt: f32) {
    let reach = state.player_stats.pickup_radius + SPECIAL_PICKUP_SLACK;
    let player = state.player.pos;
    let mult = xp_multiplier(state);
    let mut xp = 0.0;
    let mut heal = 0.0;

    state.special_pickups.retain_mut(|p| {
        p.life -= dt;
        if p.life <= 0.0 {
            return false;
        }
        if p.pos.distance(player) <= reach {
            match p.kind {
                SpecialPickupKind::BigXp => xp += p.value * mult,
                SpecialPickupKind::Heal => heal += p.value,
            }
            return false;
        }
        true
    });

    state.xp += xp;
    state.player.hp = (state.player.hp + heal).min(state.player_stats.max_hp);
}

/// Spend XP on levels; every level owes one upgrade offer
pub fn level_up(state: &mut GameState) {
    while state.xp >= state.xp_to_next {
        state.xp -= state.xp_to_next;
        state.level += 1;
        state.xp_to_next = xp_curve(state.level);
        if state.upgrade_offer.is_none() {
            state.upgrade_offer = Some(UpgradeOffer::Due);
        } else {
            state.upgrades_owed += 1;
        }
        log::info!("Level up -> {} (next at {})", state.level, state.xp_to_next);
    }
}

fn age_floating_texts(state: &mut GameState, dt: f32) {
    state.floating_texts.retain_mut(|t| {
        t.life -= dt;
        t.pos.y -= FLOATING_TEXT_RISE * dt;
        t.life > 0.0
    });
}

fn check_terminal(state: &mut GameState) {
    if state.player.hp <= 0.0 {
        state.finish(Outcome::Lose, ResultReason::PlayerDown);
    } else if state.time_limit.is_some_and(|limit| state.time >= limit) {
        state.finish(Outcome::Win, ResultReason::TimeLimit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::RunModifiers;
    use crate::sim::state::{FloatingText, Orb};

    fn setup() -> (GameState, Tuning, Prng) {
        let tuning = Tuning::default();
        let state = GameState::new(11, &tuning, &RunModifiers::default());
        (state, tuning, Prng::new(11))
    }

    fn orb_at(state: &mut GameState, pos: Vec2, value: f32) {
        let id = state.next_entity_id();
        state.orbs.push(Orb { id, pos, value });
    }

    #[test]
    fn test_movement_clamped_to_lane() {
        let (mut state, _, _) = setup();
        state.movement_input = Vec2::new(5.0, 3.0);
        update_movement(&mut state, 1.0);
        assert_eq!(state.player.pos, Vec2::new(130.0, 320.0));

        state.movement_input = Vec2::new(1.0, 0.0);
        for _ in 0..10 {
            update_movement(&mut state, 1.0);
        }
        assert_eq!(state.player.pos.x, 500.0);
    }

    #[test]
    fn test_exact_xp_triggers_one_offer() {
        let (mut state, tuning, mut rng) = setup();
        let pos = state.player.pos;
        orb_at(&mut state, pos, 24.0);
        update(&mut state, &tuning, &mut rng, SIM_DT);

        assert_eq!(state.level, 2);
        assert_eq!(state.xp, 0.0);
        assert_eq!(state.xp_to_next, xp_curve(2));
        assert_eq!(state.upgrade_offer, Some(UpgradeOffer::Due));
        assert_eq!(state.upgrades_owed, 0);
        assert!(state.orbs.is_empty());
    }

    #[test]
    fn test_multiple_levels_queue_offers() {
        let (mut state, tuning, mut rng) = setup();
        let pos = state.player.pos;
        orb_at(&mut state, pos, 24.0 + xp_curve(2) + 1.0);
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert_eq!(state.level, 3);
        assert_eq!(state.xp, 1.0);
        assert_eq!(state.upgrades_owed, 1);
    }

    #[test]
    fn test_orbs_out_of_reach_stay() {
        let (mut state, tuning, mut rng) = setup();
        let far = state.player.pos + Vec2::new(200.0, 0.0);
        orb_at(&mut state, far, 10.0);
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert_eq!(state.orbs.len(), 1);
        assert_eq!(state.xp, 0.0);
    }

    #[test]
    fn test_xp_gain_scales_orbs() {
        let (mut state, tuning, mut rng) = setup();
        state.player_stats.xp_gain = 0.5;
        let pos = state.player.pos;
        orb_at(&mut state, pos, 10.0);
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert_eq!(state.xp, 15.0);
    }

    #[test]
    fn test_special_pickups_spawn_and_expire() {
        let (mut state, tuning, mut rng) = setup();
        // Keep the player away from the spawn band
        state.player_stats.pickup_radius = 0.0;
        state.player.pos.x = 10_000.0;
        state.special_spawn_timer = 0.01;
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert_eq!(state.special_pickups.len(), 1);
        assert!((state.special_spawn_timer - 14.0).abs() < 1e-4);
        let p = &state.special_pickups[0];
        assert!(p.pos.x.abs() <= 440.0);
        assert_eq!(p.pos.y, 280.0);

        for _ in 0..(10 * 60) {
            update(&mut state, &tuning, &mut rng, SIM_DT);
        }
        assert!(state.special_pickups.is_empty());
    }

    #[test]
    fn test_spawn_interval_shrinks_with_time() {
        let (mut state, tuning, mut rng) = setup();
        state.time = 1000.0;
        state.special_spawn_timer = 0.0;
        state.time_limit = None;
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert!((state.special_spawn_timer - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_heal_pickup_capped() {
        let (mut state, tuning, mut rng) = setup();
        state.player.hp = 90.0;
        let id = state.next_entity_id();
        state.special_pickups.push(SpecialPickup {
            id,
            pos: state.player.pos,
            kind: SpecialPickupKind::Heal,
            value: 20.0,
            life: 5.0,
        });
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert_eq!(state.player.hp, 100.0);
        assert!(state.special_pickups.is_empty());
    }

    #[test]
    fn test_floating_texts_age_out() {
        let (mut state, tuning, mut rng) = setup();
        let id = state.next_entity_id();
        state.floating_texts.push(FloatingText {
            id,
            pos: Vec2::ZERO,
            value: 5,
            crit: false,
            life: 0.02,
            max_life: 0.8,
        });
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert_eq!(state.floating_texts.len(), 1);
        assert!(state.floating_texts[0].pos.y < 0.0);
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert!(state.floating_texts.is_empty());
    }

    #[test]
    fn test_terminal_checks() {
        let (mut state, tuning, mut rng) = setup();
        state.time = 360.0;
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert_eq!(state.result.unwrap().reason, ResultReason::TimeLimit);

        let (mut state, tuning, mut rng) = setup();
        state.player.hp = 0.0;
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert_eq!(state.result.unwrap().reason, ResultReason::PlayerDown);
    }

    #[test]
    fn test_regen_capped() {
        let (mut state, tuning, mut rng) = setup();
        state.player_stats.regen = 6.0;
        state.player.hp = 99.95;
        update(&mut state, &tuning, &mut rng, SIM_DT);
        assert_eq!(state.player.hp, 100.0);
    }
}

//! Fixed timestep simulation tick
//!
//! Runs the systems in their fixed order: spawner, movement, combat, then
//! progression. Offer and pause gating is the runtime's job; `tick` always
//! advances.

use super::rng::Prng;
use super::state::GameState;
use super::{combat, progression, spawner};
use crate::tuning::Tuning;

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, tuning: &Tuning, rng: &mut Prng, dt: f32) {
    state.time += dt;

    spawner::update(state, tuning, rng, dt);
    progression::update_movement(state, dt);
    combat::update(state, tuning, rng, dt);
    progression::update(state, tuning, rng, dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::meta::RunModifiers;
    use glam::Vec2;

    fn new_state(seed: u32, tuning: &Tuning) -> (GameState, Prng) {
        let mut state = GameState::new(seed, tuning, &RunModifiers::default());
        let mut rng = Prng::new(seed);
        spawner::spawn_initial(&mut state, tuning, &mut rng);
        (state, rng)
    }

    #[test]
    fn test_tick_advances_time_and_head() {
        let tuning = Tuning::default();
        let (mut state, mut rng) = new_state(12345, &tuning);
        tick(&mut state, &tuning, &mut rng, SIM_DT);
        assert!((state.time - SIM_DT).abs() < 1e-7);
        assert!(state.worm.head_s > 0.0);
        // First tick fires immediately
        assert_eq!(state.projectiles_fired, 1);
    }

    #[test]
    fn test_movement_input_applied() {
        let tuning = Tuning::default();
        let (mut state, mut rng) = new_state(1, &tuning);
        state.movement_input = Vec2::new(-1.0, 0.0);
        for _ in 0..60 {
            tick(&mut state, &tuning, &mut rng, SIM_DT);
        }
        assert!((state.player.pos.x + 130.0).abs() < 0.1);
        assert_eq!(state.player.pos.y, state.player_lane_y);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let tuning = Tuning::default();
        let (mut state1, mut rng1) = new_state(99999, &tuning);
        let (mut state2, mut rng2) = new_state(99999, &tuning);

        for step in 0..600 {
            let input = Vec2::new(((step / 90) % 3) as f32 - 1.0, 0.0);
            state1.movement_input = input;
            state2.movement_input = input;
            tick(&mut state1, &tuning, &mut rng1, SIM_DT);
            tick(&mut state2, &tuning, &mut rng2, SIM_DT);
        }

        assert_eq!(state1, state2);
        assert_eq!(rng1.draws(), rng2.draws());
    }
}

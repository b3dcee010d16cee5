//! Chain spawner
//!
//! Advances the head along the path, grows the tail on a fractional budget,
//! and checks whether the head has reached the defended end.

use super::rng::Prng;
use super::state::{GameState, Outcome, ResultReason, WormSegment};
use crate::tuning::{Tuning, WormDefinition};

/// Lay down the chain's starting segments
pub fn spawn_initial(state: &mut GameState, tuning: &Tuning, rng: &mut Prng) {
    let Some(def) = tuning.worm(&state.worm.def_id) else {
        log::warn!("No chain definition '{}'; chain starts empty", state.worm.def_id);
        return;
    };
    for _ in 0..def.initial_segments.min(def.total_segments) {
        append_segment(state, def, rng);
    }
    state.worm.relayout();
    log::debug!("Chain starts with {} segments", state.worm.len());
}

/// Advance the chain by `dt`
pub fn update(state: &mut GameState, tuning: &Tuning, rng: &mut Prng, dt: f32) {
    state.worm.head_s += state.worm.speed * dt;

    // A missing definition only stops growth; the head keeps its own speed
    if let Some(def) = tuning.worm(&state.worm.def_id) {
        grow(state, def, rng, dt);
    } else {
        log::trace!("Chain definition '{}' missing, skipping spawn", state.worm.def_id);
    }

    state.worm.relayout();
    check_breach(state);
}

fn can_grow(state: &GameState, def: &WormDefinition) -> bool {
    state.worm.len() < def.max_segments as usize && state.worm.spawner.spawned_count < def.total_segments
}

fn grow(state: &mut GameState, def: &WormDefinition, rng: &mut Prng, dt: f32) {
    if !can_grow(state, def) {
        return;
    }
    state.worm.spawner.accumulator += def.spawn_rate * dt;
    while state.worm.spawner.accumulator >= 1.0 && can_grow(state, def) {
        state.worm.spawner.accumulator -= 1.0;
        append_segment(state, def, rng);
    }
}

/// Append one tail segment. Caller relayouts.
fn append_segment(state: &mut GameState, def: &WormDefinition, rng: &mut Prng) {
    state.worm.spawner.spawned_count += 1;
    let spawned = state.worm.spawner.spawned_count;
    let is_elite = def.elite_every > 0 && spawned % def.elite_every == 0;

    let mut hp = def.segment_hp
        * (1.0 + state.kills as f32 * def.kill_scale_step)
        * if is_elite { def.elite_hp_multiplier } else { 1.0 };
    if rng.next() < def.jitter_chance {
        hp *= 1.0 + rng.next() * def.jitter_max;
    }

    let id = state.next_entity_id();
    let index = state.worm.len();
    state.worm.segments.push(WormSegment {
        id,
        hp,
        max_hp: hp,
        radius: def.segment_radius,
        s: state.worm.head_s - index as f32 * state.worm.spacing,
        is_elite,
        hp_display_timer: 0.0,
    });
}

/// Lose if the head reached the goal or crossed the defend line
pub fn check_breach(state: &mut GameState) {
    if state.result.is_some() {
        return;
    }
    if state.worm.head_s >= state.worm.goal_s {
        state.finish(Outcome::Lose, ResultReason::HeadReachedGoal);
        return;
    }
    if let Some(line_y) = state.defend_line_y {
        let head = state.worm.head_pos();
        if head.is_finite() && head.y >= line_y {
            state.finish(Outcome::Lose, ResultReason::DefendLineBreached);
        }
    }
}

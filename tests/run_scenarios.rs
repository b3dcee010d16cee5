use std::collections::HashSet;

use chain_defense::consts::SIM_DT;
use chain_defense::sim::{Outcome, ResultReason, RunPhase};
use chain_defense::{Run, RunConfig, RunEvent, Tuning};
use glam::Vec2;

fn run_with(seed: u32, tuning: Tuning) -> Run {
    Run::new(
        RunConfig {
            seed,
            ..Default::default()
        },
        tuning,
    )
}

/// A straight vertical path whose head starts above the player
fn vertical_stage(mut tuning: Tuning) -> Tuning {
    tuning.stage.waypoints = vec![Vec2::new(0.0, -400.0), Vec2::new(0.0, 300.0)];
    tuning
}

#[test]
fn test_head_advance_without_breaks() {
    let mut tuning = Tuning::default();
    tuning.weapons[0].base_damage = 0.0;
    let start = tuning.worms[0].start_head_s;
    let speed = tuning.worms[0].head_speed;

    let mut run = run_with(12345, tuning);
    for _ in 0..600 {
        run.step(SIM_DT);
    }

    let state = run.state();
    assert_eq!(state.kills, 0);
    assert!(state.result.is_none());
    assert!((state.worm.head_s - (start + speed * 10.0)).abs() < 0.05);
}

#[test]
fn test_fire_countdown_count() {
    // Timer starts at zero: fire on step 1 (timer -> 0.5633), again once it
    // runs out 34 steps later, and not a third time within 58 steps.
    let mut run = run_with(12345, Tuning::default());
    for _ in 0..58 {
        run.step(SIM_DT);
    }
    assert_eq!(run.state().projectiles_fired, 2);
    assert_eq!(run.phase(), RunPhase::Playing);
}

#[test]
fn test_clearing_chain_wins_once() {
    let mut tuning = vertical_stage(Tuning::default());
    let worm = &mut tuning.worms[0];
    worm.initial_segments = 1;
    worm.total_segments = 1;
    worm.segment_hp = 10.0;
    let expected_coins = worm.coin_value + worm.clear_reward_coins;

    let mut run = run_with(31, tuning);
    let mut results = Vec::new();
    for _ in 0..600 {
        run.step(SIM_DT);
        for event in run.drain_events() {
            if let RunEvent::Result(summary) = event {
                results.push(summary);
            }
        }
    }

    assert_eq!(results.len(), 1);
    let summary = &results[0];
    assert!(summary.won);
    assert_eq!(summary.reason, Some(ResultReason::ChainCleared));
    assert_eq!(summary.remaining_segments, 0);
    assert_eq!(summary.kills, 1);
    assert_eq!(summary.coins, expected_coins);

    let state = run.state();
    assert_eq!(state.result.unwrap().outcome, Outcome::Win);
    assert!(state.clear_reward_granted);
    assert_eq!(state.run_coins, expected_coins);
    assert_eq!(run.phase(), RunPhase::Result);
}

#[test]
fn test_elite_break_offers_special_bonus_once() {
    let mut tuning = vertical_stage(Tuning::default());
    tuning.pickups.special_interval = 1.0e9;
    let worm = &mut tuning.worms[0];
    worm.initial_segments = 4;
    worm.total_segments = 4;
    worm.segment_hp = 10.0;
    worm.elite_every = 1;
    worm.elite_hp_multiplier = 1.0;

    let mut run = run_with(8, tuning);
    let mut events = Vec::new();
    for _ in 0..600 {
        run.step(SIM_DT);
        events.extend(run.drain_events());
        if !events.is_empty() {
            break;
        }
    }

    assert_eq!(events.len(), 1);
    let RunEvent::SpecialBonusOffer(choices) = &events[0] else {
        panic!("expected a special bonus offer, got {:?}", events[0]);
    };
    let categories: HashSet<_> = choices.iter().map(|c| c.category).collect();
    assert_eq!(choices.len(), 3);
    assert_eq!(categories.len(), 3);
    assert_eq!(run.phase(), RunPhase::AwaitingSpecialBonus);
    assert!(run.state().kills >= 1);

    let frozen = run.state().clone();
    for _ in 0..60 {
        run.step(SIM_DT);
    }
    assert!(run.drain_events().is_empty());
    assert_eq!(run.state(), &frozen);

    assert!(!run.choose_special_bonus("no-such-bonus"));
    assert!(run.choose_special_bonus(&choices[0].id));
    assert_eq!(run.phase(), RunPhase::Playing);
    assert!(!run.choose_special_bonus(&choices[0].id));

    run.step(SIM_DT);
    assert!(run.state().time > frozen.time);
}

#[test]
fn test_result_blocks_further_steps() {
    let mut tuning = vertical_stage(Tuning::default());
    tuning.weapons[0].base_damage = 0.0;
    tuning.stage.defend_line_y = Some(-350.0);

    let mut run = run_with(5, tuning);
    let mut steps = 0;
    while run.state().result.is_none() && steps < 1000 {
        run.step(SIM_DT);
        steps += 1;
    }
    let result = run.state().result.unwrap();
    assert_eq!(result.reason, ResultReason::DefendLineBreached);

    let frozen = run.state().clone();
    for _ in 0..30 {
        run.step(SIM_DT);
    }
    run.advance(0.1);
    assert_eq!(run.state(), &frozen);
    assert!(!run.choose_special_bonus("shots-1"));
}

#[test]
fn test_reroll_without_offer_is_noop() {
    let mut run = run_with(12345, Tuning::default());
    for _ in 0..10 {
        run.step(SIM_DT);
    }
    let before = run.state().clone();
    assert!(!run.reroll());
    assert!(!run.choose_upgrade("dmg-1"));
    assert_eq!(run.state(), &before);
    assert!(run.drain_events().is_empty());
}

#[test]
fn test_meta_modifiers_reach_the_run() {
    let meta = chain_defense::MetaProgress {
        move_level: 5,
        ..Default::default()
    };
    let mut run = Run::new(
        RunConfig {
            seed: 1,
            modifiers: meta.run_modifiers(),
        },
        Tuning::default(),
    );
    assert!((run.state().player_stats.move_speed - 130.0 * 1.15).abs() < 1e-3);

    run.set_movement(1.0);
    for _ in 0..60 {
        run.step(SIM_DT);
    }
    assert!((run.state().player.pos.x - 149.5).abs() < 0.1);
}

#[test]
fn test_tuning_overrides_from_json() {
    let tuning = Tuning::from_json(r#"{"stage": {"time_limit": 1.0}}"#).unwrap();
    assert_eq!(tuning.stage.player_lane_y, 320.0);

    let mut run = run_with(3, tuning);
    let mut summary = None;
    for _ in 0..120 {
        run.step(SIM_DT);
        for event in run.drain_events() {
            if let RunEvent::Result(s) = event {
                summary = Some(s);
            }
        }
    }
    let summary = summary.unwrap();
    assert!(summary.won);
    assert_eq!(summary.reason, Some(ResultReason::TimeLimit));
    assert!(summary.elapsed_time >= 1.0 && summary.elapsed_time < 1.05);
}

use bevy_ecs::{entity::Entity, query::With};
use breathe::error::{ConfigError, GameError};
use breathe::events::{GameCommand, SimEvent};
use breathe::game::Game;
use breathe::level::LevelCatalog;
use breathe::systems::{EntityKind, InputIntent, PlayerControlled, RunMode, RunState};
use glam::Vec2;
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

mod common;

use common::STEP;

/// A start with an exit 10 units to its right.
const EXIT_NEARBY: [&str; 2] = ["1,start,100,100,0,0,0", "1,exit,110,100,0,0,0"];

fn close(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() < 1e-3
}

#[test]
fn test_game_begins_in_menu() {
    let mut game = common::create_test_game(&EXIT_NEARBY);
    assert_eq!(game.run_state(), RunState::default());

    // Ticking outside of play changes nothing.
    game.tick(STEP).unwrap();
    assert_eq!(game.run_state().mode, RunMode::Menu);
    assert_that(&game.snapshot().entities).is_empty();
}

#[test]
fn test_confirm_starts_run() {
    let mut game = common::create_test_game(&EXIT_NEARBY);
    game.handle_command(GameCommand::Confirm).unwrap();

    let run = game.run_state();
    assert_eq!(run.mode, RunMode::Play);
    assert_eq!(run.level_id, 1);
    assert_eq!(run.max_level, 1);
    assert_eq!(run.oxygen.value(), 100.0);
    assert_eq!(common::player_position(&mut game), Vec2::new(100.0, 100.0));
}

#[test]
fn test_missing_level_data_is_fatal() {
    let mut game = Game::new(LevelCatalog::from_path("does/not/exist.csv"), Some(common::SEED));
    let result = game.handle_command(GameCommand::Confirm);

    assert_that(&matches!(result, Err(GameError::Config(ConfigError::MissingLevelData(_))))).is_true();
    assert_eq!(game.run_state().mode, RunMode::Menu);
}

#[test]
fn test_exit_reached_on_last_level_clears() {
    let mut game = common::start_test_game(&EXIT_NEARBY);
    game.set_intent(InputIntent::RIGHT);

    let ticks = common::tick_until_finished(&mut game, 10);
    let run = game.run_state();

    assert_that(&ticks).is_less_than_or_equal_to(3);
    assert_eq!(run.mode, RunMode::Clear);
    assert_that(&close(run.oxygen.value(), 100.0 - 6.0 * STEP * ticks as f32)).is_true();
    assert_eq!(game.drain_events(), vec![SimEvent::RunCleared]);
}

#[test]
fn test_exit_reached_advances_level() {
    let mut game = common::start_test_game(&[
        EXIT_NEARBY[0],
        EXIT_NEARBY[1],
        "2,start,300,300,0,0,0",
        "2,exit,800,600,0,0,0",
    ]);
    game.set_intent(InputIntent::RIGHT);

    game.tick(STEP).unwrap();

    let run = game.run_state();
    assert_eq!(run.mode, RunMode::Play);
    assert_eq!(run.level_id, 2);
    assert_eq!(run.oxygen.value(), 90.0);
    assert_that(&close(run.elapsed, STEP)).is_true();
    assert_eq!(common::player_position(&mut game), Vec2::new(300.0, 300.0));
    assert_eq!(game.drain_events(), vec![SimEvent::LevelAdvanced { level_id: 2 }]);
}

#[test]
fn test_elapsed_time_persists_across_levels() {
    let mut game = common::start_test_game(&[
        "1,start,100,100,0,0,0",
        "1,exit,300,100,0,0,0",
        "2,start,300,300,0,0,0",
        "2,exit,800,600,0,0,0",
    ]);
    game.set_intent(InputIntent::RIGHT);

    let mut ticks = 0;
    while game.run_state().level_id == 1 {
        game.tick(STEP).unwrap();
        ticks += 1;
        assert_that(&ticks).is_less_than(200);
    }

    assert_that(&ticks).is_greater_than(1);
    assert_that(&close(game.run_state().elapsed, STEP * ticks as f32)).is_true();
}

#[test]
fn test_oxygen_runs_out() {
    let mut game = common::start_test_game(&["1,start,100,100,0,0,0", "1,exit,800,600,0,0,0"]);

    let ticks = common::tick_until_finished(&mut game, 2000);
    let run = game.run_state();

    // 100 units at 6 per second is 16.67 seconds, or 1000 ticks.
    assert_that(&ticks).is_greater_than_or_equal_to(999);
    assert_that(&ticks).is_less_than_or_equal_to(1001);
    assert_eq!(run.mode, RunMode::Over);
    assert_eq!(run.oxygen.value(), 0.0);
    assert_that(&((run.elapsed - 100.0 / 6.0).abs() < 0.05)).is_true();

    let events = game.drain_events();
    assert_eq!(events, vec![SimEvent::LowOxygen, SimEvent::PlayerDied]);
}

#[test]
fn test_death_takes_precedence_over_exit() {
    let mut game = common::start_test_game(&EXIT_NEARBY);
    game.world.resource_mut::<RunState>().oxygen.set(0.05);

    game.tick(STEP).unwrap();

    assert_eq!(game.run_state().mode, RunMode::Over);
    assert_eq!(game.drain_events(), vec![SimEvent::LowOxygen, SimEvent::PlayerDied]);
}

#[test]
fn test_wall_blocks_player() {
    let mut game = common::start_test_game(&["1,start,100,100,0,0,0", "1,wall,122,100,20,100,0", "1,exit,800,600,0,0,0"]);
    game.set_intent(InputIntent::RIGHT);

    game.tick(STEP).unwrap();
    assert_eq!(common::player_position(&mut game), Vec2::new(100.0, 100.0));

    // Sliding along the wall still works.
    game.set_intent(InputIntent::RIGHT | InputIntent::UP);
    game.tick(STEP).unwrap();
    let position = common::player_position(&mut game);
    assert_eq!(position.x, 100.0);
    assert_that(&(position.y > 100.0)).is_true();
}

#[test]
fn test_simultaneous_enemy_contacts_cost_one_hit() {
    let mut game = common::start_test_game(&[
        "1,start,200,200,0,0,0",
        "1,enemy,180,200,0,0,0",
        "1,enemy,220,200,0,0,0",
        "1,exit,800,600,0,0,0",
    ]);

    game.tick(STEP).unwrap();

    assert_that(&close(game.run_state().oxygen.value(), 100.0 - 6.0 * STEP - 18.0)).is_true();
    assert_eq!(game.drain_events(), vec![SimEvent::EnemyHit { contacts: 2 }]);
}

#[test]
fn test_pickup_collected_in_play() {
    let mut game = common::start_test_game(&["1,start,100,100,0,0,0", "1,oxy,100,100,0,0,40", "1,exit,800,600,0,0,0"]);
    game.world.resource_mut::<RunState>().oxygen.set(50.0);

    game.tick(STEP).unwrap();
    game.tick(STEP).unwrap();

    assert_that(&close(game.run_state().oxygen.value(), 90.0 - 2.0 * 6.0 * STEP)).is_true();
    assert_eq!(game.drain_events(), vec![SimEvent::PickupCollected { refill: 40.0 }]);
    assert_that(&game.snapshot().of_kind(EntityKind::Pickup).count()).is_equal_to(0);
}

#[test]
fn test_restart_resets_run() {
    let mut game = common::start_test_game(&["1,start,100,100,0,0,0", "1,exit,800,600,0,0,0"]);
    game.set_intent(InputIntent::RIGHT);
    common::tick_until_finished(&mut game, 2000);
    assert_eq!(game.run_state().mode, RunMode::Over);

    // Confirm is the restart input once the run has ended.
    game.handle_command(GameCommand::Confirm).unwrap();

    let run = game.run_state();
    assert_eq!(run.mode, RunMode::Play);
    assert_eq!(run.level_id, 1);
    assert_eq!(run.oxygen.value(), 100.0);
    assert_eq!(run.elapsed, 0.0);
    assert_eq!(common::player_position(&mut game), Vec2::new(100.0, 100.0));
    assert_that(&game.snapshot().of_kind(EntityKind::Player).count()).is_equal_to(1);
}

#[test]
fn test_confirm_during_play_is_ignored() {
    let mut game = common::start_test_game(&["1,start,100,100,0,0,0", "1,exit,800,600,0,0,0"]);
    game.tick(STEP).unwrap();
    let before = game.run_state();

    game.handle_command(GameCommand::Confirm).unwrap();
    assert_eq!(game.run_state(), before);
}

#[test]
fn test_empty_level_data_clears() {
    let mut game = common::start_test_game(&[]);
    assert_eq!(game.run_state().mode, RunMode::Clear);
    assert_eq!(game.drain_events(), vec![SimEvent::RunCleared]);
}

#[test]
fn test_gap_in_levels_clears() {
    let mut game = common::start_test_game(&[EXIT_NEARBY[0], EXIT_NEARBY[1], "3,start,100,100,0,0,0"]);
    game.set_intent(InputIntent::RIGHT);
    assert_eq!(game.run_state().max_level, 3);

    game.tick(STEP).unwrap();

    assert_eq!(game.run_state().mode, RunMode::Clear);
    assert_that(&game.snapshot().entities).is_empty();
}

#[test]
fn test_exit_command_is_recorded() {
    let mut game = common::create_test_game(&EXIT_NEARBY);
    assert_that(&game.exit_requested()).is_false();
    game.handle_command(GameCommand::Exit).unwrap();
    assert_that(&game.exit_requested()).is_true();
}

#[test]
fn test_same_seed_same_simulation() {
    let rows = [
        "1,start,100,100,0,0,0",
        "1,enemy,700,500,0,0,0",
        "1,enemy,300,500,0,0,90",
        "1,wall,500,300,40,200,0",
        "1,exit,900,600,0,0,0",
    ];
    let mut a = common::start_test_game(&rows);
    let mut b = common::start_test_game(&rows);

    for _ in 0..240 {
        a.tick(STEP).unwrap();
        b.tick(STEP).unwrap();
    }

    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn test_start_inside_wall_does_not_interrupt_run() {
    let mut game = common::start_test_game(&["1,start,100,100,0,0,0", "1,wall,100,100,100,100,0", "1,exit,800,600,0,0,0"]);

    game.tick(STEP).unwrap();
    assert_eq!(common::player_position(&mut game), Vec2::new(100.0, 100.0));

    // Walking out of the wall is allowed.
    game.set_intent(InputIntent::RIGHT);
    for _ in 0..30 {
        game.tick(STEP).unwrap();
    }
    assert_that(&(common::player_position(&mut game).x > 140.0)).is_true();
    assert_eq!(game.run_state().mode, RunMode::Play);
}

#[test]
fn test_enemy_inside_wall_does_not_interrupt_run() {
    let mut game = common::start_test_game(&[
        "1,start,100,100,0,0,0",
        "1,wall,500,400,100,100,0",
        "1,enemy,500,400,0,0,0",
        "1,exit,800,600,0,0,0",
    ]);

    for _ in 0..60 {
        game.tick(STEP).unwrap();
    }

    assert_eq!(game.run_state().mode, RunMode::Play);
    assert_that(&game.snapshot().of_kind(EntityKind::Enemy).count()).is_equal_to(0);
}

#[test]
fn test_overlapping_enemies_drift_apart() {
    let mut game = common::start_test_game(&[
        "1,start,100,100,0,0,0",
        "1,enemy,600,400,0,0,0",
        "1,enemy,605,400,0,0,0",
        "1,exit,900,600,0,0,0",
    ]);

    let apart = |game: &mut Game| {
        let enemies: Vec<Vec2> = game.snapshot().of_kind(EntityKind::Enemy).map(|enemy| enemy.position).collect();
        let gap = (enemies[0] - enemies[1]).abs();
        gap.x >= 20.0 || gap.y >= 20.0
    };

    let mut ticks = 0;
    while !apart(&mut game) {
        game.tick(STEP).unwrap();
        ticks += 1;
        assert_that(&ticks).is_less_than(300);
    }
}

#[test]
fn test_missing_player_is_invalid_state() {
    let mut game = common::start_test_game(&EXIT_NEARBY);
    let player = game
        .world
        .query_filtered::<Entity, With<PlayerControlled>>()
        .single(&game.world)
        .unwrap();
    game.world.despawn(player);

    let result = game.tick(STEP);
    assert_that(&matches!(result, Err(GameError::InvalidState(_)))).is_true();
}

//! End-to-end session scenarios driven through the public API

use std::f32::consts::PI;

use arcade_core::error::RenderError;
use arcade_core::persistence::{JsonFileStore, MemoryStore, ScoreStore};
use arcade_core::platform::{Command, MoveCommand};
use arcade_core::rules::{FallingHazards, GameRules, RadialSwarm, ScrollingGates, SpawnContext};
use arcade_core::sim::{
    ArcSegment, BoundaryPolicy, Bounds, DifficultyRamp, EntityKind, GameLoop, GamePhase, Motion,
    Player, RampCurve, Renderer, Schedule, Shape, Snapshot, Spawn, shapes_overlap,
};
use arcade_core::{GameResult, HighScores, Tuning, polar_to_cartesian};
use glam::Vec2;
use rand_pcg::Pcg32;

/// Frame step that is exact in binary, so summed deltas compare exactly
const STEP: f64 = 1.0 / 16.0;

struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _snapshot: &Snapshot<'_>) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Player in the middle, nothing spawns unless a test inserts it
struct Sandbox;

impl GameRules for Sandbox {
    fn create_player(&self, bounds: &Bounds) -> Player {
        Player::new(bounds.center(), Shape::circle(10.0))
    }

    fn spawn(&mut self, _ctx: &SpawnContext, _rng: &mut Pcg32) -> GameResult<Vec<Spawn>> {
        Ok(Vec::new())
    }
}

fn sandbox_tuning(game_id: &str) -> Tuning {
    Tuning {
        game_id: game_id.into(),
        intro_delay: 0.0,
        game_over_reveal_delay: 0.0,
        ..Tuning::default()
    }
}

/// Constant speed and a spawn interval long enough that nothing spawns on its own
fn no_spawns(speed: f32) -> DifficultyRamp {
    DifficultyRamp {
        speed: RampCurve::Fixed { value: speed },
        spawn_interval: RampCurve::Fixed { value: 1000.0 },
    }
}

fn memory() -> Box<dyn ScoreStore> {
    Box::new(MemoryStore::new())
}

fn started(tuning: Tuning, rules: Box<dyn GameRules>, store: Box<dyn ScoreStore>) -> GameLoop {
    let mut game = GameLoop::new(tuning, rules, HighScores::new(store)).unwrap();
    game.start(&mut NullRenderer).unwrap();
    game
}

/// Run `frames` frames `STEP` apart after `from`; returns the last timestamp
fn advance(game: &mut GameLoop, from: f64, frames: usize) -> f64 {
    let mut t = from;
    for _ in 0..frames {
        t += STEP;
        game.frame(t, &mut NullRenderer);
    }
    t
}

fn target_on_player(game: &mut GameLoop, points: u32) -> u32 {
    let pos = game.player().pos;
    let now = game.elapsed();
    game.entities_mut().insert(
        Spawn::new(
            EntityKind::Target { points },
            Shape::circle(5.0),
            Motion::Linear { vel: Vec2::ZERO },
            pos,
        ),
        now,
    )
}

#[test]
fn pause_does_not_charge_play_time() {
    let mut game = started(sandbox_tuning("pause"), Box::new(Sandbox), memory());
    let id = game.entities_mut().insert(
        Spawn::new(
            EntityKind::Hazard,
            Shape::circle(5.0),
            Motion::Linear {
                vel: Vec2::new(10.0, 0.0),
            },
            Vec2::new(100.0, 100.0),
        ),
        0.0,
    );

    game.frame(0.0, &mut NullRenderer);
    let t = advance(&mut game, 0.0, 16);
    assert_eq!(game.elapsed(), 1.0);

    game.handle(Command::TogglePause, t).unwrap();
    assert_eq!(game.phase(), GamePhase::Paused);
    let paused_pos = game.entities().get(id).unwrap().pos;

    // Five seconds of frames while paused
    let mut now = t;
    for _ in 0..80 {
        now += STEP;
        assert_eq!(game.frame(now, &mut NullRenderer), Schedule::Idle);
    }
    assert_eq!(game.elapsed(), 1.0);
    assert_eq!(game.entities().get(id).unwrap().pos, paused_pos);

    game.handle(Command::TogglePause, now).unwrap();
    advance(&mut game, now, 16);
    assert_eq!(game.elapsed(), 2.0);
    let moved = game.entities().get(id).unwrap().pos - paused_pos;
    assert!((moved.x - 10.0).abs() < 1e-3);
}

#[test]
fn hazard_costs_exactly_one_life() {
    let tuning = Tuning {
        invincibility: 0.0,
        ..sandbox_tuning("hazard")
    };
    let mut game = started(tuning, Box::new(Sandbox), memory());
    assert_eq!(game.lives(), 3);

    let player = game.player().pos;
    let id = game.entities_mut().insert(
        Spawn::new(
            EntityKind::Hazard,
            Shape::circle(5.0),
            Motion::Linear {
                vel: Vec2::new(0.0, 120.0),
            },
            player - Vec2::new(0.0, 100.0),
        ),
        0.0,
    );

    let mut t = 0.0;
    game.frame(t, &mut NullRenderer);
    for _ in 0..40 {
        t = advance(&mut game, t, 1);
        if game.lives() < 3 {
            break;
        }
    }
    assert_eq!(game.lives(), 2);
    assert!(game.entities().get(id).is_none());
    assert!(game.player().is_flashing(game.elapsed()));

    advance(&mut game, t, 10);
    assert_eq!(game.lives(), 2);
    assert_eq!(game.phase(), GamePhase::Playing);
}

#[test]
fn last_life_ends_round_once() {
    let tuning = Tuning {
        initial_lives: 1,
        ..sandbox_tuning("last_life")
    };
    let mut game = started(tuning, Box::new(Sandbox), memory());
    let pos = game.player().pos;
    for _ in 0..3 {
        game.entities_mut().insert(
            Spawn::new(
                EntityKind::Hazard,
                Shape::circle(5.0),
                Motion::Linear { vel: Vec2::ZERO },
                pos,
            ),
            0.0,
        );
    }
    game.frame(0.0, &mut NullRenderer);
    assert_eq!(game.phase(), GamePhase::GameOver);
    assert_eq!(game.lives(), 0);
    assert!(game.is_game_over_revealed());
    assert_eq!(game.frame(STEP, &mut NullRenderer), Schedule::Idle);
}

#[test]
fn high_score_keeps_the_maximum() {
    let mut store = MemoryStore::new();
    store.set("collector_highscore", 50).unwrap();
    let mut game = started(sandbox_tuning("collector"), Box::new(Sandbox), Box::new(store));
    assert_eq!(game.score(), 0);
    assert_eq!(game.high_score(), 50);

    target_on_player(&mut game, 75);
    let t = advance(&mut game, 0.0, 1);
    assert_eq!(game.score(), 75);
    game.handle(Command::Quit, t).unwrap();
    assert_eq!(
        game.high_scores().store().get("collector_highscore").unwrap(),
        Some(75)
    );

    game.handle(Command::Restart, t).unwrap();
    assert_eq!(game.score(), 0);
    assert_eq!(game.high_score(), 75);
    target_on_player(&mut game, 40);
    let t = advance(&mut game, t, 1);
    assert_eq!(game.score(), 40);
    game.handle(Command::Quit, t).unwrap();
    assert_eq!(
        game.high_scores().store().get("collector_highscore").unwrap(),
        Some(75)
    );
    assert_eq!(game.high_score(), 75);
}

#[test]
fn high_score_survives_sessions_on_disk() {
    let path = std::env::temp_dir().join(format!("arcade_scenarios_{}.json", std::process::id()));
    std::fs::remove_file(&path).ok();

    let mut game = started(
        sandbox_tuning("disk"),
        Box::new(Sandbox),
        Box::new(JsonFileStore::new(&path)),
    );
    target_on_player(&mut game, 30);
    let t = advance(&mut game, 0.0, 1);
    game.handle(Command::Quit, t).unwrap();
    drop(game);

    let mut game = started(
        sandbox_tuning("disk"),
        Box::new(Sandbox),
        Box::new(JsonFileStore::new(&path)),
    );
    assert_eq!(game.high_score(), 30);
    game.high_scores().reset("disk");
    assert_eq!(game.high_scores().get("disk"), 0);

    std::fs::remove_file(&path).ok();
}

#[test]
fn ramp_has_no_path_dependence() {
    let mut fine = started(sandbox_tuning("ramp"), Box::new(Sandbox), memory());
    let mut coarse = started(sandbox_tuning("ramp"), Box::new(Sandbox), memory());

    fine.frame(0.0, &mut NullRenderer);
    let mut t = 0.0;
    for _ in 0..64 {
        t += 1.0 / 64.0;
        fine.frame(t, &mut NullRenderer);
    }
    coarse.frame(0.0, &mut NullRenderer);
    advance(&mut coarse, 0.0, 16);

    assert_eq!(fine.elapsed(), 1.0);
    assert_eq!(coarse.elapsed(), 1.0);
    assert_eq!(fine.difficulty(), coarse.difficulty());
    assert_eq!(fine.difficulty(), fine.tuning().difficulty.at(1.0));
}

#[test]
fn score_never_decreases_during_play() {
    let rules = FallingHazards {
        target_chance: 1.0,
        ..FallingHazards::default()
    };
    let tuning = Tuning {
        intro_delay: 0.0,
        ..FallingHazards::tuning()
    };
    let mut game = started(tuning, Box::new(rules), memory());

    let mut t = 0.0;
    let mut last = 0;
    game.frame(t, &mut NullRenderer);
    for _ in 0..(20 * 16) {
        // Stand under the lowest falling target
        let lowest = game
            .entities()
            .entities()
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Target { .. }) && !e.consumed)
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|e| e.pos.x);
        if let Some(x) = lowest {
            let y = game.player().pos.y;
            game.handle(Command::Move(MoveCommand::To(Vec2::new(x, y))), t)
                .unwrap();
        }
        t = advance(&mut game, t, 1);
        assert!(game.score() >= last);
        last = game.score();
    }
    assert_eq!(game.phase(), GamePhase::Playing);
    assert!(game.score() > 0);
}

#[test]
fn shield_blocks_and_breach_costs_a_life() {
    let tuning = Tuning {
        intro_delay: 0.0,
        difficulty: no_spawns(150.0),
        ..RadialSwarm::tuning()
    };
    let mut game = started(tuning, Box::new(RadialSwarm::default()), memory());
    let center = game.player().pos;
    let incoming = |theta: f32| {
        Spawn::new(
            EntityKind::Target { points: 1 },
            Shape::circle(8.0),
            Motion::Angular {
                center,
                radius: 200.0,
                theta,
                angular_vel: 0.0,
                radial_vel: -150.0,
            },
            center,
        )
    };

    // Shield facing the projectile blocks it
    game.handle(Command::Move(MoveCommand::Angle(0.0)), 0.0).unwrap();
    let blocked = game.entities_mut().insert(incoming(0.0), 0.0);
    game.frame(0.0, &mut NullRenderer);
    let t = advance(&mut game, 0.0, 16);
    assert_eq!(game.score(), 1);
    assert_eq!(game.lives(), 3);
    assert!(game.entities().get(blocked).is_none());

    // Flipped away, the next one reaches the core
    game.handle(Command::Action, t).unwrap();
    assert!((game.player().aim - PI).abs() < 1e-4);
    let now = game.elapsed();
    game.entities_mut().insert(incoming(0.0), now);
    advance(&mut game, t, 24);
    assert_eq!(game.score(), 1);
    assert_eq!(game.lives(), 2);
}

#[test]
fn boundaries_are_inclusive() {
    let a = Shape::circle(3.0);
    let b = Shape::circle(2.0);
    assert!(shapes_overlap(Vec2::ZERO, &a, Vec2::new(5.0, 0.0), &b));
    assert!(!shapes_overlap(Vec2::ZERO, &a, Vec2::new(6.0, 0.0), &b));

    let arc = Shape::Arc(ArcSegment::new(
        100.0,
        10.0,
        350f32.to_radians(),
        20f32.to_radians(),
    ));
    let dot = Shape::circle(1.0);
    let at = |deg: f32| polar_to_cartesian(100.0, deg.to_radians());
    assert!(shapes_overlap(at(5.0), &dot, Vec2::ZERO, &arc));
    assert!(shapes_overlap(at(355.0), &dot, Vec2::ZERO, &arc));
    assert!(!shapes_overlap(at(180.0), &dot, Vec2::ZERO, &arc));
}

#[test]
fn radial_swarm_projectiles_reach_the_shield() {
    let tuning = Tuning {
        intro_delay: 0.0,
        ..RadialSwarm::tuning()
    };
    let mut game = started(tuning, Box::new(RadialSwarm::default()), memory());

    let mut t = 0.0;
    let mut most_alive = 0;
    game.frame(t, &mut NullRenderer);
    for _ in 0..(10 * 16) {
        if game.phase() != GamePhase::Playing {
            break;
        }
        // Face the closest incoming projectile
        let center = game.player().pos;
        let closest = game
            .entities()
            .entities()
            .iter()
            .filter(|e| !e.consumed && matches!(e.kind, EntityKind::Target { .. }))
            .min_by(|a, b| {
                a.pos
                    .distance_squared(center)
                    .total_cmp(&b.pos.distance_squared(center))
            })
            .map(|e| e.pos - center);
        if let Some(offset) = closest {
            let theta = offset.y.atan2(offset.x);
            game.handle(Command::Move(MoveCommand::Angle(theta)), t)
                .unwrap();
        }
        t = advance(&mut game, t, 1);
        most_alive = most_alive.max(game.entities().len());
    }
    assert!(most_alive > 0);
    assert!(game.score() > 0);
}

#[test]
fn gate_scores_once_when_passed() {
    let tuning = Tuning {
        invincibility: 0.0,
        ..sandbox_tuning("gates")
    };
    let mut game = started(tuning, Box::new(Sandbox), memory());
    let player = game.player().pos;
    // Scrolls past just above the player without touching it
    let id = game.entities_mut().insert(
        Spawn::new(
            EntityKind::Gate { points: 3 },
            Shape::rect(20.0, 20.0),
            Motion::Linear {
                vel: Vec2::new(-200.0, 0.0),
            },
            player + Vec2::new(100.0, -100.0),
        ),
        0.0,
    );

    game.frame(0.0, &mut NullRenderer);
    let t = advance(&mut game, 0.0, 4);
    assert_eq!(game.score(), 0);
    assert!(!game.entities().get(id).unwrap().scored);

    advance(&mut game, t, 28);
    assert_eq!(game.score(), 3);
    let gate = game.entities().get(id).unwrap();
    assert!(gate.scored);
    assert!(!gate.consumed);
    assert_eq!(game.lives(), 3);
    assert_eq!(game.phase(), GamePhase::Playing);
}

#[test]
fn leaving_a_fatal_playfield_ends_the_round() {
    let tuning = Tuning {
        boundary: BoundaryPolicy::Fatal,
        player_gravity: 900.0,
        ..sandbox_tuning("fatal")
    };
    let mut game = started(tuning, Box::new(Sandbox), memory());

    game.frame(0.0, &mut NullRenderer);
    let t = advance(&mut game, 0.0, 8);
    assert_eq!(game.phase(), GamePhase::Playing);

    advance(&mut game, t, 32);
    assert_eq!(game.phase(), GamePhase::GameOver);
    assert_eq!(game.lives(), 3);
}

#[test]
fn leaving_the_playfield_costs_a_life_and_respawns() {
    let tuning = Tuning {
        boundary: BoundaryPolicy::LoseLife,
        player_gravity: 900.0,
        ..sandbox_tuning("lose_life")
    };
    let mut game = started(tuning, Box::new(Sandbox), memory());
    let spawn_point = game.player().pos;

    let mut t = 0.0;
    game.frame(t, &mut NullRenderer);
    for _ in 0..32 {
        t = advance(&mut game, t, 1);
        if game.lives() < 3 {
            break;
        }
    }
    assert_eq!(game.lives(), 2);
    assert_eq!(game.player().pos, spawn_point);
    assert_eq!(game.player().vel, Vec2::ZERO);
    assert_eq!(game.phase(), GamePhase::Playing);
}

/// Player on a ledge: stepping right of it ends the round
struct Ledge;

impl GameRules for Ledge {
    fn create_player(&self, bounds: &Bounds) -> Player {
        Player::new(bounds.center(), Shape::circle(10.0))
    }

    fn spawn(&mut self, _ctx: &SpawnContext, _rng: &mut Pcg32) -> GameResult<Vec<Spawn>> {
        Ok(Vec::new())
    }

    fn is_failed(&self, player: &Player, bounds: &Bounds) -> bool {
        player.pos.x > bounds.center().x + 100.0
    }
}

#[test]
fn rules_fail_condition_ends_the_round() {
    let mut game = started(sandbox_tuning("ledge"), Box::new(Ledge), memory());
    let start = game.player().pos;

    game.frame(0.0, &mut NullRenderer);
    game.handle(Command::Move(MoveCommand::To(start + Vec2::new(90.0, 0.0))), 0.0)
        .unwrap();
    let t = advance(&mut game, 0.0, 2);
    assert_eq!(game.phase(), GamePhase::Playing);

    game.handle(Command::Move(MoveCommand::To(start + Vec2::new(150.0, 0.0))), t)
        .unwrap();
    advance(&mut game, t, 1);
    assert_eq!(game.phase(), GamePhase::GameOver);
    assert_eq!(game.lives(), 3);
}

#[test]
fn collected_target_leaves_short_lived_debris() {
    let tuning = Tuning {
        intro_delay: 0.0,
        difficulty: no_spawns(150.0),
        ..FallingHazards::tuning()
    };
    let mut game = started(tuning, Box::new(FallingHazards::default()), memory());
    let fragments = |game: &GameLoop| {
        game.entities()
            .entities()
            .iter()
            .filter(|e| e.kind == EntityKind::Fragment)
            .count()
    };

    target_on_player(&mut game, 10);
    game.frame(0.0, &mut NullRenderer);
    assert_eq!(game.score(), 10);
    assert_eq!(fragments(&game), 3);

    // Fragments never score or hurt, and expire on their own
    advance(&mut game, 0.0, 8);
    assert_eq!(fragments(&game), 0);
    assert_eq!(game.score(), 10);
    assert_eq!(game.lives(), 3);
}

#[test]
fn scrolling_gates_free_fall_is_fatal() {
    let tuning = Tuning {
        intro_delay: 0.0,
        ..ScrollingGates::tuning()
    };
    let mut game = started(tuning, Box::new(ScrollingGates::default()), memory());

    game.frame(0.0, &mut NullRenderer);
    advance(&mut game, 0.0, 32);
    assert_eq!(game.phase(), GamePhase::GameOver);
    assert_eq!(game.score(), 0);
}

#[test]
fn scrolling_gates_score_through_the_gaps() {
    let rules = ScrollingGates::default();
    let gap = rules.gap;
    let tuning = Tuning {
        intro_delay: 0.0,
        player_gravity: 0.0,
        difficulty: DifficultyRamp {
            speed: RampCurve::Fixed { value: 150.0 },
            spawn_interval: RampCurve::Fixed { value: 2.0 },
        },
        ..ScrollingGates::tuning()
    };
    let mut game = started(tuning, Box::new(rules), memory());

    let mut t = 0.0;
    game.frame(t, &mut NullRenderer);
    for _ in 0..(10 * 16) {
        // Hover in the middle of the nearest gap not yet behind the player
        let player_x = game.player().pos.x;
        let gap_center = game
            .entities()
            .entities()
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Gate { points } if points > 0))
            .filter_map(|gate| match gate.shape {
                Shape::Rect { half_extents } => Some((gate, half_extents)),
                _ => None,
            })
            .filter(|(gate, half)| gate.pos.x + half.x >= player_x - 14.0)
            .min_by(|(a, _), (b, _)| a.pos.x.total_cmp(&b.pos.x))
            .map(|(gate, half)| gate.pos.y + half.y + gap / 2.0);
        if let Some(y) = gap_center {
            let to = Vec2::new(player_x, y);
            game.handle(Command::Move(MoveCommand::To(to)), t).unwrap();
        }
        t = advance(&mut game, t, 1);
    }
    assert_eq!(game.phase(), GamePhase::Playing);
    assert_eq!(game.lives(), 3);
    assert!(game.score() >= 2);
}

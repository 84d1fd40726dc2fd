//! Arcade Core headless runner
//!
//! Plays one scripted round of a reference game at 60 simulated frames per
//! second and prints the result.
//!
//! Usage: `arcade-core [falling_hazards|radial_swarm|scrolling_gates] [tuning.json] [scores.json]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::{Path, PathBuf};

    use arcade_core::consts::NOMINAL_FRAME_DT;
    use arcade_core::error::RenderError;
    use arcade_core::persistence::{JsonFileStore, MemoryStore, ScoreStore};
    use arcade_core::platform::{Command, MoveCommand};
    use arcade_core::rules::{FallingHazards, GameRules, RadialSwarm, ScrollingGates};
    use arcade_core::sim::{EntityKind, GameLoop, GamePhase, Renderer, Shape, Snapshot};
    use arcade_core::{GameResult, HighScores, Tuning, cartesian_to_polar};
    use glam::Vec2;

    /// Longest round the runner will simulate (seconds of host time)
    const MAX_RUN_SECONDS: f64 = 180.0;

    /// Logs a summary line once per simulated second
    #[derive(Default)]
    struct LogRenderer {
        frames: u64,
    }

    impl Renderer for LogRenderer {
        fn render(&mut self, snapshot: &Snapshot<'_>) -> Result<(), RenderError> {
            self.frames += 1;
            if self.frames % 60 == 0 {
                log::debug!(
                    "{:?} t={:.1}s score={} lives={} entities={} speed={:.0}",
                    snapshot.phase,
                    snapshot.elapsed,
                    snapshot.score,
                    snapshot.lives,
                    snapshot.entities.len(),
                    snapshot.difficulty.speed
                );
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Game {
        FallingHazards,
        RadialSwarm,
        ScrollingGates,
    }

    impl Game {
        fn parse(name: &str) -> Option<Self> {
            match name {
                "falling_hazards" => Some(Game::FallingHazards),
                "radial_swarm" => Some(Game::RadialSwarm),
                "scrolling_gates" => Some(Game::ScrollingGates),
                _ => None,
            }
        }

        fn rules(self) -> Box<dyn GameRules> {
            match self {
                Game::FallingHazards => Box::new(FallingHazards::default()),
                Game::RadialSwarm => Box::new(RadialSwarm::default()),
                Game::ScrollingGates => Box::new(ScrollingGates::default()),
            }
        }

        fn tuning(self) -> Tuning {
            match self {
                Game::FallingHazards => FallingHazards::tuning(),
                Game::RadialSwarm => RadialSwarm::tuning(),
                Game::ScrollingGates => ScrollingGates::tuning(),
            }
        }

        /// Simple scripted player
        fn autopilot(self, game: &GameLoop) -> Option<Command> {
            let player = game.player();
            let threats = game
                .entities()
                .entities()
                .iter()
                .filter(|e| !e.consumed && !matches!(e.kind, EntityKind::Fragment));

            match self {
                Game::FallingHazards => {
                    let nearest = threats
                        .filter(|e| e.kind == EntityKind::Hazard && e.pos.y < player.pos.y)
                        .min_by(|a, b| {
                            a.pos
                                .distance_squared(player.pos)
                                .total_cmp(&b.pos.distance_squared(player.pos))
                        })?;
                    let away = if nearest.pos.x > player.pos.x { -1.0 } else { 1.0 };
                    Some(Command::Move(MoveCommand::Direction(Vec2::new(away, 0.0))))
                }
                Game::RadialSwarm => {
                    let nearest = threats.min_by(|a, b| {
                        a.pos
                            .distance_squared(player.pos)
                            .total_cmp(&b.pos.distance_squared(player.pos))
                    })?;
                    let (_, theta) = cartesian_to_polar(nearest.pos - player.pos);
                    Some(Command::Move(MoveCommand::Angle(theta)))
                }
                Game::ScrollingGates => {
                    // Aim for the middle of the next gap, just under the scoring half
                    let target = threats
                        .filter(|e| matches!(e.kind, EntityKind::Gate { points } if points > 0))
                        .filter(|e| e.pos.x + 40.0 > player.pos.x)
                        .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x))
                        .map(|gate| match gate.shape {
                            Shape::Rect { half_extents } => gate.pos.y + half_extents.y + 80.0,
                            _ => gate.pos.y,
                        })
                        .unwrap_or(game.tuning().height / 2.0);
                    (player.pos.y > target && player.vel.y > 0.0).then_some(Command::Action)
                }
            }
        }
    }

    fn open_store(path: Option<&String>) -> Box<dyn ScoreStore> {
        match path {
            Some(path) => Box::new(JsonFileStore::new(PathBuf::from(path))),
            None => Box::new(MemoryStore::new()),
        }
    }

    pub fn run() -> GameResult<()> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let game = match args.first() {
            Some(name) => Game::parse(name).unwrap_or_else(|| {
                log::warn!("Unknown game {:?}, playing falling_hazards", name);
                Game::FallingHazards
            }),
            None => Game::FallingHazards,
        };
        let tuning = match args.get(1) {
            Some(path) => Tuning::load(Path::new(path))?,
            None => game.tuning(),
        };
        let high_scores = HighScores::new(open_store(args.get(2)));

        let mut session = GameLoop::new(tuning, game.rules(), high_scores)?;
        let mut renderer = LogRenderer::default();
        session.start(&mut renderer)?;

        let mut now = 0.0;
        while now < MAX_RUN_SECONDS {
            now += NOMINAL_FRAME_DT;
            if session.phase() == GamePhase::Playing {
                if let Some(command) = game.autopilot(&session) {
                    session.handle(command, now)?;
                }
            }
            session.frame(now, &mut renderer);
            match session.phase() {
                GamePhase::Intro | GamePhase::Playing => {}
                GamePhase::Error => {
                    return Err(arcade_core::GameError::Tick("session failed".into()));
                }
                GamePhase::Paused | GamePhase::GameOver => break,
            }
        }
        if session.phase() == GamePhase::Playing {
            session.handle(Command::Quit, now)?;
        }

        println!(
            "{}: score {} after {:.1}s, high score {}",
            session.tuning().game_id,
            session.score(),
            session.elapsed(),
            session.high_score()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Arcade Core (native) starting...");

    if let Err(e) = headless::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser hosts drive `GameLoop` directly from requestAnimationFrame
}

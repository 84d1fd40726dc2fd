//! Frame-driven game loop
//!
//! `GameLoop` owns one game session. The host calls [`GameLoop::frame`] once
//! per animation frame with a monotonic timestamp and forwards player input
//! through [`GameLoop::handle`]. Per frame:
//!
//! 1. turn the timestamp into a clamped `dt`
//! 2. fire due timers (intro lead-in, game over reveal)
//! 3. if playing, run one tick:
//!    ramp → spawn → advance → player → collisions → score → debris → cull
//! 4. render a read-only [`Snapshot`]
//! 5. report whether another frame is needed

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{BoundaryContact, Outcome, evaluate, player_boundary_check};
use super::difficulty::Difficulty;
use super::entity::{Entity, EntityStore};
use super::phase::{GamePhase, PhaseMachine};
use super::score::{LifeLoss, ScoreKeeper};
use super::state::Player;
use super::timers::{TimerAction, TimerRegistry};
use crate::error::{GameError, GameResult, RenderError};
use crate::highscores::HighScores;
use crate::platform::{Command, FrameClock, MoveCommand};
use crate::rules::{ActionContext, GameRules, SpawnContext};
use crate::tuning::Tuning;

/// Read-only view of the session handed to the renderer
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub player: &'a Player,
    pub entities: &'a [Entity],
    pub score: u64,
    pub lives: u8,
    pub high_score: u64,
    /// Seconds of play this round
    pub elapsed: f32,
    pub difficulty: Difficulty,
    /// Game over overlay may be shown
    pub game_over_revealed: bool,
}

/// Draws snapshots. Implementations live in the host.
pub trait Renderer {
    /// Acquire the render surface; failure stops the session before it starts
    fn init(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn render(&mut self, snapshot: &Snapshot<'_>) -> Result<(), RenderError>;
}

/// Whether the host should request another animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    NextFrame,
    Idle,
}

/// One game session: phase, timers, entities, player and score
pub struct GameLoop {
    tuning: Tuning,
    rules: Box<dyn GameRules>,
    high_scores: HighScores,
    phase: PhaseMachine,
    clock: FrameClock,
    timers: TimerRegistry,
    entities: EntityStore,
    player: Player,
    score: ScoreKeeper,
    rng: Pcg32,
    /// Seconds of play this round
    elapsed: f32,
    round: u64,
    started: bool,
    game_over_revealed: bool,
}

impl GameLoop {
    /// Build a session in `Intro`. Nothing runs until [`GameLoop::start`].
    pub fn new(
        tuning: Tuning,
        rules: Box<dyn GameRules>,
        mut high_scores: HighScores,
    ) -> GameResult<Self> {
        tuning.validate()?;
        let high_score = high_scores.get(&tuning.game_id);
        let player = rules.create_player(&tuning.bounds());
        Ok(Self {
            clock: FrameClock::new(tuning.max_frame_dt),
            rng: Pcg32::seed_from_u64(tuning.seed),
            score: ScoreKeeper::new(tuning.initial_lives, high_score),
            tuning,
            rules,
            high_scores,
            phase: PhaseMachine::new(),
            timers: TimerRegistry::new(),
            entities: EntityStore::new(),
            player,
            elapsed: 0.0,
            round: 0,
            started: false,
            game_over_revealed: false,
        })
    }

    /// Initialize the renderer and begin the intro lead-in.
    ///
    /// A renderer that cannot initialize moves the session to `Error` and the
    /// loop never starts.
    pub fn start(&mut self, renderer: &mut dyn Renderer) -> GameResult<()> {
        if self.started {
            return Ok(());
        }
        if let Err(e) = renderer.init() {
            let message = e.to_string();
            self.fail(GameError::Render(e));
            return Err(GameError::Init(message));
        }
        self.started = true;
        log::info!(
            "Starting {} (seed {}, {} lives)",
            self.tuning.game_id,
            self.tuning.seed,
            self.tuning.initial_lives
        );
        self.begin_intro()
    }

    /// Advance the session to `timestamp` (seconds) and render it
    pub fn frame(&mut self, timestamp: f64, renderer: &mut dyn Renderer) -> Schedule {
        if !self.started || self.phase() == GamePhase::Error {
            return Schedule::Idle;
        }

        let dt = self.clock.delta(timestamp);
        let was_playing = self.phase().simulates();

        if self.phase() != GamePhase::Paused {
            for action in self.timers.advance(dt) {
                if let Err(e) = self.fire(action) {
                    self.fail(e);
                    return Schedule::Idle;
                }
            }
        }

        // A round that begins during this frame starts ticking on the next one
        if was_playing && self.phase().simulates() {
            if let Err(e) = self.tick(dt) {
                self.fail(e);
                return Schedule::Idle;
            }
        }

        if let Err(e) = renderer.render(&self.snapshot()) {
            self.fail(e.into());
            return Schedule::Idle;
        }

        self.schedule()
    }

    /// Apply a player command received at `now` (seconds, same clock as `frame`)
    pub fn handle(&mut self, command: Command, now: f64) -> GameResult<()> {
        let phase = self.phase();
        if phase == GamePhase::Error {
            log::debug!("Ignoring {} in Error", command.name());
            return Ok(());
        }
        let rejected = || GameError::CommandRejected {
            command: command.name(),
            phase,
        };

        match (command, phase) {
            (Command::Move(movement), GamePhase::Playing) => {
                self.apply_move(movement);
                Ok(())
            }
            (Command::Action, GamePhase::Playing) => {
                let ctx = ActionContext {
                    bounds: self.tuning.bounds(),
                    lanes: &self.tuning.lanes,
                };
                self.rules.on_action(&mut self.player, &ctx);
                Ok(())
            }
            (Command::TogglePause, GamePhase::Playing) => self.transition(GamePhase::Paused),
            (Command::TogglePause, GamePhase::Paused) => {
                self.transition(GamePhase::Playing)?;
                // Paused wall time is never charged to the simulation
                self.clock.anchor(now);
                Ok(())
            }
            (Command::Quit, GamePhase::Intro | GamePhase::Playing | GamePhase::Paused) => {
                self.end_round()
            }
            (Command::Restart, GamePhase::GameOver) => self.restart(now),
            _ => Err(rejected()),
        }
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase.phase()
    }

    pub fn score(&self) -> u64 {
        self.score.score()
    }

    pub fn lives(&self) -> u8 {
        self.score.lives()
    }

    pub fn high_score(&self) -> u64 {
        self.score.high_score()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Current difficulty, derived from elapsed play time
    pub fn difficulty(&self) -> Difficulty {
        self.tuning.difficulty.at(self.elapsed)
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Direct entity access for scripted scenarios and editors
    pub fn entities_mut(&mut self) -> &mut EntityStore {
        &mut self.entities
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    pub fn is_game_over_revealed(&self) -> bool {
        self.game_over_revealed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn high_scores(&mut self) -> &mut HighScores {
        &mut self.high_scores
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase(),
            player: &self.player,
            entities: self.entities.entities(),
            score: self.score.score(),
            lives: self.score.lives(),
            high_score: self.score.high_score(),
            elapsed: self.elapsed,
            difficulty: self.difficulty(),
            game_over_revealed: self.game_over_revealed,
        }
    }

    // === Internals ===

    fn schedule(&self) -> Schedule {
        match self.phase() {
            GamePhase::Intro | GamePhase::Playing => Schedule::NextFrame,
            // Keep frames coming until the game over reveal has fired
            GamePhase::GameOver if self.timers.pending() > 0 => Schedule::NextFrame,
            _ => Schedule::Idle,
        }
    }

    /// Every phase exit sweeps outstanding timers
    fn transition(&mut self, to: GamePhase) -> GameResult<()> {
        self.phase.transition(to)?;
        self.timers.cancel_all();
        Ok(())
    }

    fn begin_intro(&mut self) -> GameResult<()> {
        if self.tuning.intro_delay > 0.0 {
            self.timers.schedule(self.tuning.intro_delay, TimerAction::BeginPlay);
            Ok(())
        } else {
            self.transition(GamePhase::Playing)
        }
    }

    fn fire(&mut self, action: TimerAction) -> GameResult<()> {
        match action {
            TimerAction::BeginPlay => self.transition(GamePhase::Playing),
            TimerAction::RevealGameOver => {
                self.game_over_revealed = true;
                Ok(())
            }
        }
    }

    /// One simulation step of `dt` seconds
    fn tick(&mut self, dt: f32) -> GameResult<()> {
        self.elapsed += dt;
        let difficulty = self.tuning.difficulty.at(self.elapsed);
        let bounds = self.tuning.bounds();

        let ctx = SpawnContext {
            bounds,
            player_pos: self.player.pos,
            elapsed: self.elapsed,
            speed: difficulty.speed,
        };
        self.entities.spawn_due(
            dt,
            &difficulty,
            self.rules.as_mut(),
            &ctx,
            &mut self.rng,
            self.tuning.max_spawns_per_tick,
        )?;
        self.entities.advance(dt)?;

        self.player.integrate(dt, self.tuning.player_gravity);
        if !(self.player.pos.is_finite() && self.player.vel.is_finite()) {
            return Err(GameError::Tick(format!(
                "player has a non-finite state {:?}",
                self.player.pos
            )));
        }
        self.player.expire_timers(self.elapsed);

        match player_boundary_check(&mut self.player, &bounds, self.tuning.boundary) {
            BoundaryContact::Fatal => return self.end_round(),
            BoundaryContact::LostLife => {
                if self.lose_life() {
                    return self.end_round();
                }
            }
            BoundaryContact::Inside | BoundaryContact::Clamped => {}
        }
        if self.rules.is_failed(&self.player, &bounds) {
            return self.end_round();
        }

        let contacts = evaluate(
            &mut self.player,
            self.entities.entities_mut(),
            self.elapsed,
            &self.tuning.collision_policy(),
            self.rules.as_ref(),
        );
        let mut consumed = Vec::new();
        for contact in contacts {
            match contact.outcome {
                Outcome::Hit => {
                    consumed.push(contact.entity_id);
                    if self.lose_life() {
                        return self.end_round();
                    }
                }
                Outcome::Collected { points } => {
                    consumed.push(contact.entity_id);
                    self.score.add_points(points);
                }
                Outcome::Passed { points } => self.score.add_points(points),
            }
        }

        for id in consumed {
            let Some(entity) = self.entities.get(id).cloned() else {
                continue;
            };
            for spawn in self.rules.debris(&entity, &mut self.rng) {
                self.entities.insert(spawn, self.elapsed);
            }
        }

        let culled = self.entities.cull(&bounds, self.tuning.cull_margin);
        if culled > 0 {
            log::trace!("Culled {} entities", culled);
        }
        Ok(())
    }

    /// Take one life; returns true when the last one is gone
    fn lose_life(&mut self) -> bool {
        match self.score.reduce_life() {
            LifeLoss::Lost { remaining } => {
                log::debug!("Life lost, {} remaining", remaining);
                false
            }
            LifeLoss::Depleted => true,
            LifeLoss::AlreadyDepleted => false,
        }
    }

    fn end_round(&mut self) -> GameResult<()> {
        self.transition(GamePhase::GameOver)?;
        self.score.finalize_round(&mut self.high_scores, &self.tuning.game_id);
        if self.tuning.game_over_reveal_delay > 0.0 {
            self.timers.schedule(
                self.tuning.game_over_reveal_delay,
                TimerAction::RevealGameOver,
            );
        } else {
            self.game_over_revealed = true;
        }
        Ok(())
    }

    fn restart(&mut self, now: f64) -> GameResult<()> {
        let replay_intro = self.tuning.restart_with_intro && self.tuning.intro_delay > 0.0;
        let next = if replay_intro {
            GamePhase::Intro
        } else {
            GamePhase::Playing
        };
        self.transition(next)?;

        self.round += 1;
        self.rng = Pcg32::seed_from_u64(self.tuning.seed.wrapping_add(self.round));
        self.entities.clear();
        self.player = self.rules.create_player(&self.tuning.bounds());
        let high_score = self.high_scores.get(&self.tuning.game_id);
        self.score.reset(high_score);
        self.elapsed = 0.0;
        self.game_over_revealed = false;
        self.clock.anchor(now);
        log::info!("Round {} of {}", self.round + 1, self.tuning.game_id);

        if replay_intro {
            self.timers.schedule(self.tuning.intro_delay, TimerAction::BeginPlay);
        }
        Ok(())
    }

    /// Move to `Error`: cancel every timer and stop accepting input
    fn fail(&mut self, error: GameError) {
        log::error!("{} failed: {}", self.tuning.game_id, error);
        if self.phase.transition(GamePhase::Error).is_err() {
            log::debug!("Already in Error");
        }
        self.timers.cancel_all();
    }

    fn apply_move(&mut self, movement: MoveCommand) {
        match movement {
            MoveCommand::Direction(dir) => {
                self.player.vel = dir.clamp_length_max(1.0) * self.tuning.player_speed;
            }
            MoveCommand::To(target) => {
                if target.is_finite() {
                    self.player.pos = target;
                    self.player.vel = Vec2::ZERO;
                }
            }
            MoveCommand::Angle(theta) => {
                if theta.is_finite() {
                    self.player.set_aim(theta);
                }
            }
            MoveCommand::Lane(lane) => match self.tuning.lanes.get(lane) {
                Some(&x) => {
                    self.player.lane = Some(lane);
                    self.player.pos.x = x;
                }
                None => log::debug!("Ignoring move to unknown lane {}", lane),
            },
        }
    }
}

impl std::fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoop")
            .field("game_id", &self.tuning.game_id)
            .field("phase", &self.phase())
            .field("round", &self.round)
            .field("elapsed", &self.elapsed)
            .field("score", &self.score.score())
            .field("lives", &self.score.lives())
            .field("entities", &self.entities.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::rules::FallingHazards;
    use crate::sim::{EntityKind, Motion, Shape, Spawn};

    const FRAME: f64 = 1.0 / 60.0;

    /// Renderer that records what it was shown
    #[derive(Default)]
    struct Recorder {
        frames: usize,
        last_phase: Option<GamePhase>,
        fail_init: bool,
        fail_render_after: Option<usize>,
    }

    impl Renderer for Recorder {
        fn init(&mut self) -> Result<(), RenderError> {
            if self.fail_init {
                return Err(RenderError::SurfaceUnavailable("no canvas".into()));
            }
            Ok(())
        }

        fn render(&mut self, snapshot: &Snapshot<'_>) -> Result<(), RenderError> {
            if self.fail_render_after.is_some_and(|n| self.frames >= n) {
                return Err(RenderError::DrawFailed("lost context".into()));
            }
            self.frames += 1;
            self.last_phase = Some(snapshot.phase);
            Ok(())
        }
    }

    /// Rules that never spawn on their own
    struct Quiet;

    impl GameRules for Quiet {
        fn create_player(&self, bounds: &crate::sim::Bounds) -> Player {
            Player::new(bounds.center(), Shape::circle(10.0))
        }

        fn spawn(&mut self, _ctx: &SpawnContext, _rng: &mut Pcg32) -> GameResult<Vec<Spawn>> {
            Ok(Vec::new())
        }
    }

    fn quiet_tuning() -> Tuning {
        Tuning {
            game_id: "quiet".into(),
            intro_delay: 0.0,
            ..Tuning::default()
        }
    }

    fn session(tuning: Tuning, rules: Box<dyn GameRules>) -> GameLoop {
        GameLoop::new(tuning, rules, HighScores::new(Box::new(MemoryStore::new()))).unwrap()
    }

    fn run(game: &mut GameLoop, renderer: &mut Recorder, from: f64, frames: usize) -> f64 {
        let mut t = from;
        for _ in 0..frames {
            t += FRAME;
            game.frame(t, renderer);
        }
        t
    }

    #[test]
    fn test_intro_leads_into_play() {
        let tuning = Tuning {
            intro_delay: 0.5,
            ..FallingHazards::tuning()
        };
        let mut game = session(tuning, Box::new(FallingHazards::default()));
        let mut renderer = Recorder::default();
        game.start(&mut renderer).unwrap();
        assert_eq!(game.phase(), GamePhase::Intro);
        assert_eq!(game.pending_timers(), 1);

        // Input is not accepted during the intro
        assert!(matches!(
            game.handle(Command::Action, 0.0),
            Err(GameError::CommandRejected { .. })
        ));

        assert_eq!(game.frame(0.0, &mut renderer), Schedule::NextFrame);
        run(&mut game, &mut renderer, 0.0, 40);
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.pending_timers(), 0);
        assert_eq!(renderer.last_phase, Some(GamePhase::Playing));
    }

    #[test]
    fn test_quit_during_intro_cancels_lead_in() {
        let mut game = session(FallingHazards::tuning(), Box::new(FallingHazards::default()));
        let mut renderer = Recorder::default();
        game.start(&mut renderer).unwrap();
        game.handle(Command::Quit, 0.1).unwrap();
        assert_eq!(game.phase(), GamePhase::GameOver);

        // Only the reveal timer remains; the intro timer never fires
        run(&mut game, &mut renderer, 0.1, 200);
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert!(game.is_game_over_revealed());
        assert_eq!(game.frame(10.0, &mut renderer), Schedule::Idle);
    }

    #[test]
    fn test_init_failure_enters_error() {
        let mut game = session(quiet_tuning(), Box::new(Quiet));
        let mut renderer = Recorder {
            fail_init: true,
            ..Default::default()
        };
        assert!(matches!(game.start(&mut renderer), Err(GameError::Init(_))));
        assert_eq!(game.phase(), GamePhase::Error);
        assert_eq!(game.frame(1.0, &mut renderer), Schedule::Idle);
        assert_eq!(renderer.frames, 0);
    }

    #[test]
    fn test_render_failure_enters_error_and_ignores_input() {
        let mut game = session(quiet_tuning(), Box::new(Quiet));
        let mut renderer = Recorder {
            fail_render_after: Some(3),
            ..Default::default()
        };
        game.start(&mut renderer).unwrap();
        run(&mut game, &mut renderer, 0.0, 10);
        assert_eq!(game.phase(), GamePhase::Error);
        assert_eq!(game.pending_timers(), 0);

        // Input is silently dropped
        assert!(game.handle(Command::TogglePause, 1.0).is_ok());
        assert!(game.handle(Command::Restart, 1.0).is_ok());
        assert_eq!(game.phase(), GamePhase::Error);
    }

    #[test]
    fn test_non_finite_entity_fails_tick() {
        let mut game = session(quiet_tuning(), Box::new(Quiet));
        let mut renderer = Recorder::default();
        game.start(&mut renderer).unwrap();
        game.entities_mut().insert(
            Spawn::new(
                EntityKind::Hazard,
                Shape::circle(5.0),
                Motion::Linear {
                    vel: Vec2::new(f32::INFINITY, 0.0),
                },
                Vec2::new(10.0, 10.0),
            ),
            0.0,
        );
        game.frame(0.0, &mut renderer);
        assert_eq!(game.frame(FRAME, &mut renderer), Schedule::Idle);
        assert_eq!(game.phase(), GamePhase::Error);
    }

    #[test]
    fn test_pause_rejects_gameplay_input() {
        let mut game = session(quiet_tuning(), Box::new(Quiet));
        let mut renderer = Recorder::default();
        game.start(&mut renderer).unwrap();
        game.handle(Command::TogglePause, 0.0).unwrap();
        assert_eq!(game.frame(0.5, &mut renderer), Schedule::Idle);
        assert!(game.handle(Command::Action, 0.5).is_err());
        assert!(game.handle(Command::Move(MoveCommand::Angle(1.0)), 0.5).is_err());
        assert!(game.handle(Command::Restart, 0.5).is_err());
        game.handle(Command::TogglePause, 0.6).unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_move_commands() {
        let tuning = Tuning {
            lanes: vec![100.0, 400.0, 700.0],
            ..quiet_tuning()
        };
        let mut game = session(tuning, Box::new(Quiet));
        let mut renderer = Recorder::default();
        game.start(&mut renderer).unwrap();

        game.handle(Command::Move(MoveCommand::Lane(2)), 0.0).unwrap();
        assert_eq!(game.player().pos.x, 700.0);
        assert_eq!(game.player().lane, Some(2));
        game.handle(Command::Move(MoveCommand::Lane(9)), 0.0).unwrap();
        assert_eq!(game.player().lane, Some(2));

        game.handle(Command::Move(MoveCommand::Direction(Vec2::new(3.0, 0.0))), 0.0)
            .unwrap();
        assert!((game.player().vel.x - game.tuning().player_speed).abs() < 1e-3);

        game.handle(Command::Move(MoveCommand::To(Vec2::new(50.0, 60.0))), 0.0)
            .unwrap();
        assert_eq!(game.player().pos, Vec2::new(50.0, 60.0));
        assert_eq!(game.player().vel, Vec2::ZERO);
    }

    #[test]
    fn test_restart_resets_round() {
        let mut game = session(quiet_tuning(), Box::new(Quiet));
        let mut renderer = Recorder::default();
        game.start(&mut renderer).unwrap();
        let t = run(&mut game, &mut renderer, 0.0, 30);
        assert!(game.elapsed() > 0.0);

        game.handle(Command::Quit, t).unwrap();
        assert!(game.handle(Command::TogglePause, t).is_err());
        game.handle(Command::Restart, t + 1.0).unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.round(), 1);
        assert_eq!(game.elapsed(), 0.0);
        assert_eq!(game.lives(), game.tuning().initial_lives);
        assert!(game.entities().is_empty());
        assert!(!game.is_game_over_revealed());
    }

    #[test]
    fn test_same_seed_same_session() {
        let play = || {
            let mut game = session(FallingHazards::tuning(), Box::new(FallingHazards::default()));
            let mut renderer = Recorder::default();
            game.start(&mut renderer).unwrap();
            run(&mut game, &mut renderer, 0.0, 300);
            game.entities()
                .entities()
                .iter()
                .map(|e| (e.id, e.pos))
                .collect::<Vec<_>>()
        };
        let first = play();
        assert!(!first.is_empty());
        assert_eq!(first, play());
    }
}

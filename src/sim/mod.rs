//! Game simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches a render
//! surface or a platform API:
//! - Time arrives as clamped frame deltas
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)

pub mod arc;
pub mod collision;
pub mod difficulty;
pub mod entity;
pub mod phase;
pub mod score;
pub mod state;
pub mod tick;
pub mod timers;

pub use arc::ArcSegment;
pub use collision::{
    BoundaryContact, BoundaryPolicy, Collidable, CollisionPolicy, Contact, Outcome, Shape,
    evaluate, player_boundary_check, shapes_overlap,
};
pub use difficulty::{Difficulty, DifficultyRamp, RampCurve, RampStep};
pub use entity::{Entity, EntityKind, EntityStore, Motion, Movable, Spawn};
pub use phase::{GamePhase, PhaseMachine};
pub use score::{LifeLoss, ScoreKeeper};
pub use state::{Bounds, Player};
pub use tick::{GameLoop, Renderer, Schedule, Snapshot};
pub use timers::{TimerAction, TimerHandle, TimerRegistry};

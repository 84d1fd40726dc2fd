//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (frame deltas from monotonic timestamps)
//! - Input commands (raw device events are translated by the host)

pub mod input;
pub mod time;

pub use input::{Command, MoveCommand};
pub use time::{FrameClock, TimeSource};

#[cfg(not(target_arch = "wasm32"))]
pub use time::MonotonicTime;

#[cfg(target_arch = "wasm32")]
pub use time::PerformanceTime;

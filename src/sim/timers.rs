//! Fire-once timers with revocable handles
//!
//! Timers only advance when the session feeds them time. Every phase exit
//! sweeps the registry so a stale timer can never act on a stopped session.

/// Something a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// End the intro lead-in and start play
    BeginPlay,
    /// Reveal the game over overlay
    RevealGameOver,
}

/// Handle returned by [`TimerRegistry::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    remaining: f32,
    action: TimerAction,
}

/// Outstanding timers, fired in scheduling order
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    timers: Vec<Timer>,
    next_handle: u64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire after `delay` seconds
    pub fn schedule(&mut self, delay: f32, action: TimerAction) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.timers.push(Timer {
            handle,
            remaining: delay.max(0.0),
            action,
        });
        handle
    }

    /// Cancel a timer. Unknown, fired or already-cancelled handles are ignored.
    /// Returns whether a pending timer was removed.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        before != self.timers.len()
    }

    /// Cancel everything outstanding; returns how many timers were dropped
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.timers.len();
        self.timers.clear();
        if dropped > 0 {
            log::debug!("Cancelled {} pending timers", dropped);
        }
        dropped
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Advance all timers by `dt` and return the actions that fired, in scheduling order
    pub fn advance(&mut self, dt: f32) -> Vec<TimerAction> {
        let mut fired = Vec::new();
        self.timers.retain_mut(|timer| {
            timer.remaining -= dt;
            if timer.remaining <= 0.0 {
                fired.push(timer.action);
                false
            } else {
                true
            }
        });
        fired
    }
}

//! Frame timing
//!
//! Hosts hand the loop monotonic timestamps in seconds; `FrameClock` turns
//! them into clamped simulation deltas.

/// Monotonic timestamp source, in seconds
pub trait TimeSource {
    fn now(&self) -> f64;
}

/// Native clock based on `std::time::Instant`
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TimeSource for MonotonicTime {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Browser clock based on `performance.now()`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct PerformanceTime {
    performance: Option<web_sys::Performance>,
}

#[cfg(target_arch = "wasm32")]
impl PerformanceTime {
    pub fn new() -> Self {
        Self {
            performance: web_sys::window().and_then(|w| w.performance()),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for PerformanceTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl TimeSource for PerformanceTime {
    fn now(&self) -> f64 {
        self.performance
            .as_ref()
            .map(|p| p.now() / 1000.0)
            .unwrap_or(0.0)
    }
}

/// Turns timestamps into simulation deltas
///
/// The first timestamp after construction or [`FrameClock::reset`] yields a
/// zero delta. Later deltas are clamped to `[0, max_dt]`, so a backwards
/// clock or a long stall never reaches the simulation as-is.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<f64>,
    max_dt: f32,
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self { last: None, max_dt }
    }

    pub fn max_dt(&self) -> f32 {
        self.max_dt
    }

    /// Consume `timestamp` and return the clamped delta since the previous one
    pub fn delta(&mut self, timestamp: f64) -> f32 {
        let dt = match self.last {
            Some(last) if timestamp.is_finite() => (timestamp - last) as f32,
            _ => 0.0,
        };
        if timestamp.is_finite() {
            self.last = Some(timestamp);
        }
        dt.clamp(0.0, self.max_dt)
    }

    /// Re-anchor on `timestamp` without producing a delta
    pub fn anchor(&mut self, timestamp: f64) {
        self.last = timestamp.is_finite().then_some(timestamp);
    }
}

//! Time management for the render loop.

/// Longest frame delta accepted from the host. A backgrounded tab or a debugger
/// pause would otherwise hand the simulation a multi-second step.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Simulated frame clock, advanced by deltas the host render loop supplies.
#[derive(Debug)]
pub struct Time {
    /// Total simulated time in seconds.
    elapsed: f32,
    /// Frame count since start.
    frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Advance by a host-supplied delta in seconds. Returns the delta actually
    /// applied: non-finite or negative input becomes zero, large steps are capped.
    pub fn advance(&mut self, delta_seconds: f32) -> f32 {
        let delta = sanitize_delta(delta_seconds);
        self.elapsed += delta;
        self.frame_count += 1;
        delta
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

fn sanitize_delta(delta_seconds: f32) -> f32 {
    if !delta_seconds.is_finite() || delta_seconds < 0.0 {
        log::warn!("Rejected frame delta {delta_seconds}, treating as 0");
        return 0.0;
    }
    delta_seconds.min(MAX_FRAME_DELTA)
}

//! Critically damped spring used to ease the playhead and the time label.
//!
//! Integrates `a = -k (x - target) - c v` with semi-implicit Euler, with
//! `c = 2 sqrt(k)` so the value converges without overshoot.

use std::time::Duration;

/// Largest integration step; longer frames are subdivided.
const MAX_STEP_SECS: f64 = 0.004;
const REST_THRESHOLD: f64 = 0.001;
const VELOCITY_THRESHOLD: f64 = 0.01;
/// A critically damped spring is within ~1% of its target after about
/// `6.6 / omega` seconds.
const SETTLE_OMEGA_SECS: f64 = 6.6;
const DEFAULT_STIFFNESS: f64 = 400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Smoothed {
    position: f64,
    velocity: f64,
    target: f64,
    stiffness: f64,
    at_rest: bool,
}

impl Smoothed {
    /// Starts at rest on `initial`.
    pub fn new(initial: f64) -> Self {
        Self {
            position: initial,
            velocity: 0.0,
            target: initial,
            stiffness: DEFAULT_STIFFNESS,
            at_rest: true,
        }
    }

    /// Tunes the stiffness so a full transition settles in about `settle`.
    pub fn with_settle_time(mut self, settle: Duration) -> Self {
        let secs = settle.as_secs_f64();
        if secs > 0.0 {
            let omega = SETTLE_OMEGA_SECS / secs;
            self.stiffness = omega * omega;
        }
        self
    }

    pub fn value(&self) -> f64 {
        self.position
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    pub fn set_target(&mut self, target: f64) {
        if (self.target - target).abs() > REST_THRESHOLD || !self.at_rest {
            self.target = target;
            self.at_rest = (self.position - target).abs() <= REST_THRESHOLD
                && self.velocity.abs() < VELOCITY_THRESHOLD;
        }
    }

    /// Jumps to `value` and stops there.
    pub fn snap_to(&mut self, value: f64) {
        self.position = value;
        self.target = value;
        self.velocity = 0.0;
        self.at_rest = true;
    }

    pub fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }
        let mut remaining = dt.as_secs_f64();
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP_SECS);
            self.step(step);
            remaining -= step;
        }

        if (self.position - self.target).abs() < REST_THRESHOLD
            && self.velocity.abs() < VELOCITY_THRESHOLD
        {
            self.snap_to(self.target);
        }
    }

    fn step(&mut self, dt: f64) {
        let damping = 2.0 * self.stiffness.sqrt();
        let acceleration =
            -self.stiffness * (self.position - self.target) - damping * self.velocity;
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Smoothed;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn converges_without_overshoot() {
        let mut smoothed = Smoothed::new(0.0);
        smoothed.set_target(1.0);

        let mut previous = smoothed.value();
        for _ in 0..120 {
            smoothed.advance(FRAME);
            assert!(smoothed.value() <= 1.0 + 1e-9);
            assert!(smoothed.value() >= previous - 1e-9);
            previous = smoothed.value();
        }

        assert!(smoothed.is_at_rest());
        assert_eq!(smoothed.value(), 1.0);
    }

    #[test]
    fn settle_time_controls_speed() {
        let mut fast = Smoothed::new(0.0).with_settle_time(Duration::from_millis(100));
        let mut slow = Smoothed::new(0.0).with_settle_time(Duration::from_millis(600));
        fast.set_target(1.0);
        slow.set_target(1.0);

        for _ in 0..6 {
            fast.advance(FRAME);
            slow.advance(FRAME);
        }

        assert!(fast.value() > slow.value());
        assert!(fast.value() > 0.9);
    }

    #[test]
    fn snap_stops_motion() {
        let mut smoothed = Smoothed::new(0.0);
        smoothed.set_target(1.0);
        smoothed.advance(FRAME);

        smoothed.snap_to(0.3);
        smoothed.advance(FRAME);

        assert_eq!(smoothed.value(), 0.3);
        assert!(smoothed.is_at_rest());
    }

    #[test]
    fn resting_value_ignores_time() {
        let mut smoothed = Smoothed::new(0.5);
        smoothed.advance(Duration::from_secs(1));
        assert_eq!(smoothed.value(), 0.5);
    }
}

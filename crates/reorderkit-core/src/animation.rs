#![forbid(unsafe_code)]

//! Time-based animation primitives.
//!
//! Animations are advanced explicitly with [`Animation::tick`]; nothing here
//! reads a clock. Hosts feed frame deltas from whatever loop they run, which
//! keeps playback deterministic under test.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f32) -> f32;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in (slow start).
#[inline]
pub fn ease_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out (slow end).
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-in.
#[inline]
pub fn ease_in_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * t
}

/// Cubic ease-out. Default curve for item displacement.
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Named easing curve, usable in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInCubic,
    #[default]
    EaseOutCubic,
}

impl Easing {
    /// The curve as a plain function pointer.
    #[must_use]
    pub fn function(self) -> EasingFn {
        match self {
            Self::Linear => linear,
            Self::EaseIn => ease_in,
            Self::EaseOut => ease_out,
            Self::EaseInOut => ease_in_out,
            Self::EaseInCubic => ease_in_cubic,
            Self::EaseOutCubic => ease_out_cubic,
        }
    }

    /// Evaluate the curve at `t`.
    #[inline]
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        (self.function())(t)
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current output value, clamped to [0.0, 1.0].
    fn value(&self) -> f32;

    /// Reset the animation to its initial state.
    fn reset(&mut self);
}

/// Zero durations become one nanosecond so progress never divides by zero
/// and the first tick completes the animation.
fn nonzero(duration: Duration) -> Duration {
    if duration.is_zero() {
        Duration::from_nanos(1)
    } else {
        duration
    }
}

fn progress(elapsed: Duration, duration: Duration) -> f32 {
    let t = elapsed.as_secs_f64() / duration.as_secs_f64();
    (t as f32).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Fade
// ---------------------------------------------------------------------------

/// Eased progression from 0.0 to 1.0 over a duration.
///
/// Elapsed time is kept as a [`Duration`] so repeated small ticks do not
/// accumulate floating-point drift.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Fade {
    /// Create a fade with the given duration and linear easing.
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: nonzero(duration),
            easing: linear,
        }
    }

    /// Set the easing function.
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Interpolate between `from` and `to` at the current eased progress.
    pub fn interpolate(&self, from: f32, to: f32) -> f32 {
        from + (to - from) * self.value()
    }
}

impl Animation for Fade {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(progress(self.elapsed, self.duration))
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Slide
// ---------------------------------------------------------------------------

/// Interpolates an `i16` offset between `from` and `to` over a duration.
///
/// [`Animation::value`] returns the normalized progress; use
/// [`Slide::position`] for the interpolated offset.
#[derive(Debug, Clone, Copy)]
pub struct Slide {
    from: i16,
    to: i16,
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Slide {
    /// Create a new slide from `from` to `to` over `duration`.
    pub fn new(from: i16, to: i16, duration: Duration) -> Self {
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
            duration: nonzero(duration),
            easing: ease_out,
        }
    }

    /// A slide already resting at `at`.
    pub fn settled(at: i16) -> Self {
        let mut slide = Self::new(at, at, Duration::ZERO);
        slide.elapsed = slide.duration;
        slide
    }

    /// Set the easing function (builder).
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Current interpolated offset.
    pub fn position(&self) -> i16 {
        let t = (self.easing)(progress(self.elapsed, self.duration));
        let range = f32::from(self.to) - f32::from(self.from);
        let pos = f32::from(self.from) + range * t;
        pos.round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
    }

    /// Final offset this slide is heading to.
    pub fn target(&self) -> i16 {
        self.to
    }

    /// Start a new slide toward `to` from wherever this one currently is.
    ///
    /// Interrupted slides continue from their on-screen offset, so a target
    /// that changes mid-flight never makes the item jump.
    pub fn retarget(&mut self, to: i16, duration: Duration) {
        self.from = self.position();
        self.to = to;
        self.elapsed = Duration::ZERO;
        self.duration = nonzero(duration);
    }
}

impl Animation for Slide {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(progress(self.elapsed, self.duration))
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

//! Decaying animations derived from stream events.
//!
//! Animations are purely additive: the decoder appends them and only the
//! age-based sweep in [`crate::state`] removes them. Draw-time helpers here
//! never mutate anything; a pulse past its duration simply stops drawing
//! until the sweep purges it.
//!
//! # Lifetimes
//!
//! ```text
//!            0        duration     +500ms        +1500ms      2.5 × duration
//! Pulse      |==draw==|---hidden---| swept
//! Path       |==draw==|~~~~~~~~fading~~~~~~~~~~~~| swept (cutoff may come later)
//! ```

mod palette;

pub use palette::{PaletteSequence, PATH_PALETTE};

use std::time::{Duration, Instant};

use crate::color::{Rgba, ACCENT};
use crate::coord::WorldPoint;

/// Travel time of a pulse between its endpoints.
pub const PULSE_DURATION: Duration = Duration::from_millis(1200);

/// Extra time a pulse is retained after its duration before the sweep drops it.
pub const PULSE_RETENTION: Duration = Duration::from_millis(500);

/// Extra time a path is retained after its duration before the sweep drops it.
pub const PATH_RETENTION: Duration = Duration::from_millis(1500);

/// Lower bound on a path animation's duration.
pub const PATH_MIN_DURATION: Duration = Duration::from_millis(800);

/// Path duration contributed by each projected point.
pub const PATH_DURATION_PER_POINT: Duration = Duration::from_millis(250);

/// Paths stop drawing once progress exceeds this multiple of their duration.
pub const PATH_DRAW_CUTOFF: f64 = 2.5;

/// Core stroke width of a path polyline, in pixels.
pub const PATH_WIDTH: f32 = 3.5;

/// Marker color of a travelling pulse.
pub const PULSE_COLOR: Rgba = ACCENT.with_alpha(200);

/// Progress of an animation at `now`; `None` if it has not started yet.
fn progress(started_at: Instant, duration: Duration, now: Instant) -> Option<f64> {
    let age = now.checked_duration_since(started_at)?;
    Some(age.as_secs_f64() / duration.as_secs_f64())
}

/// Age-based expiry shared by the sweep rules.
fn expired(started_at: Instant, lifetime: Duration, now: Instant) -> bool {
    now.checked_duration_since(started_at)
        .is_some_and(|age| age >= lifetime)
}

/// A point-to-point animation for one packet transit.
#[derive(Debug, Clone, PartialEq)]
pub struct Pulse {
    pub start: WorldPoint,
    pub end: WorldPoint,
    pub started_at: Instant,
    pub duration: Duration,
}

impl Pulse {
    pub fn new(start: WorldPoint, end: WorldPoint, started_at: Instant) -> Self {
        Self {
            start,
            end,
            started_at,
            duration: PULSE_DURATION,
        }
    }

    pub fn progress(&self, now: Instant) -> Option<f64> {
        progress(self.started_at, self.duration, now)
    }

    /// Interpolated marker position, or `None` when progress is outside `[0, 1]`.
    pub fn position_at(&self, now: Instant) -> Option<WorldPoint> {
        let t = self.progress(now)?;
        (0.0..=1.0)
            .contains(&t)
            .then(|| self.start.lerp(self.end, t))
    }

    /// Whether the sweep should drop this pulse.
    pub fn is_expired(&self, now: Instant) -> bool {
        expired(self.started_at, self.duration + PULSE_RETENTION, now)
    }
}

/// One layer of a path polyline as the front-end should stroke it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Rgba,
    /// Additive blending (glow) instead of alpha blending.
    pub additive: bool,
}

/// A multi-hop propagation trace drawn as a fading polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct PathAnimation {
    pub points: Vec<WorldPoint>,
    pub started_at: Instant,
    pub duration: Duration,
    pub color: Rgba,
    pub width: f32,
}

impl PathAnimation {
    /// Create a path; duration scales with the hop count of the trace,
    /// which may exceed the number of resolved points.
    pub fn new(points: Vec<WorldPoint>, hop_count: usize, started_at: Instant, color: Rgba) -> Self {
        let duration = path_duration(hop_count.max(points.len()));
        Self {
            points,
            started_at,
            duration,
            color,
            width: PATH_WIDTH,
        }
    }

    pub fn progress(&self, now: Instant) -> Option<f64> {
        progress(self.started_at, self.duration, now)
    }

    /// Opacity scale at `now`, or `None` once the draw cutoff is passed.
    ///
    /// Full opacity up to progress 1.0, then linear fade reaching zero at
    /// 2.0. The cutoff at 2.5 is independent of the sweep threshold.
    pub fn opacity_at(&self, now: Instant) -> Option<f32> {
        let t = self.progress(now)?;
        if t > PATH_DRAW_CUTOFF {
            return None;
        }
        let scale = if t <= 1.0 {
            1.0
        } else {
            (1.0 - (t - 1.0)).max(0.0)
        };
        Some(scale as f32)
    }

    /// Stroke layers, outermost first, with alpha scaled by [`Self::opacity_at`].
    pub fn strokes_at(&self, now: Instant) -> Option<[Stroke; 3]> {
        let opacity = self.opacity_at(now)?;
        let alpha = |base: f32| (base * opacity) as u8;
        Some([
            Stroke {
                width: self.width + 4.0,
                color: self.color.with_alpha(alpha(40.0)),
                additive: true,
            },
            Stroke {
                width: self.width + 2.0,
                color: self.color.with_alpha(alpha(90.0)),
                additive: true,
            },
            Stroke {
                width: self.width,
                color: self.color.with_alpha(alpha(220.0)),
                additive: false,
            },
        ])
    }

    /// Whether the sweep should drop this path.
    pub fn is_expired(&self, now: Instant) -> bool {
        expired(self.started_at, self.duration + PATH_RETENTION, now)
    }
}

/// Duration of a path with `point_count` hops: `max(800ms, n × 250ms)`.
pub fn path_duration(point_count: usize) -> Duration {
    let scaled = PATH_DURATION_PER_POINT.saturating_mul(point_count.min(u32::MAX as usize) as u32);
    scaled.max(PATH_MIN_DURATION)
}

//! Time-based value transitions.
//!
//! One generic state machine ([`InterpolationState`]) is shared by every
//! animatable attribute. What differs per attribute lives in a small strategy
//! type implementing [`InterpKind`]:
//! - [`Scalar`]: offset distance (plain numbers, epsilon equality)
//! - [`Opacity`]: scalar math with the displayed value clamped into `[0, 1]`
//! - [`Angle`]: degrees with shortest-path wrap-around
//! - [`Geo`]: longitude/latitude(/altitude) with exact equality

pub mod kinds;
pub mod state;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::easing::{self, EasingDescriptor, ResolvedEasing};

pub use kinds::{Angle, Geo, Opacity, Scalar};
pub use state::{Creation, InterpolationState};

/// How a new command is turned into an animation target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// Animate straight from the current value to the commanded value.
    #[default]
    Feedback,
    /// Animate toward a point extrapolated past the commanded value, using the
    /// previous command as the velocity baseline.
    Feedforward,
}

/// Per-command interpolation parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterpolationOptions {
    pub mode: InterpolationMode,
    #[serde(alias = "duration_ms")]
    pub duration_ms: f64,
    #[serde(
        deserialize_with = "easing::deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub easing: Option<EasingDescriptor>,
}

impl InterpolationOptions {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    pub fn feedforward(duration_ms: f64) -> Self {
        Self {
            mode: InterpolationMode::Feedforward,
            duration_ms,
            easing: None,
        }
    }

    pub fn with_easing(mut self, easing: EasingDescriptor) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Duration clamped to a finite, non-negative number of milliseconds.
    #[inline]
    pub fn normalized_duration(&self) -> f64 {
        if self.duration_ms.is_finite() && self.duration_ms > 0.0 {
            self.duration_ms
        } else {
            0.0
        }
    }

    /// True when a command with these options should be written immediately.
    #[inline]
    pub fn is_immediate(&self) -> bool {
        self.normalized_duration() <= 0.0
    }

    pub(crate) fn resolve_easing(&self) -> ResolvedEasing {
        easing::resolve(self.easing.as_ref()).0
    }
}

/// Value-kind strategy for the generic interpolation state.
pub trait InterpKind {
    type Value: Clone + Debug + PartialEq;

    /// Short label used in logs.
    const LABEL: &'static str;

    /// Equality used to decide whether a transition has anything to animate.
    fn same(a: &Self::Value, b: &Self::Value) -> bool;

    fn lerp(from: &Self::Value, to: &Self::Value, t: f64) -> Self::Value;

    /// Extrapolate one command interval past `next`, using `previous` as baseline.
    fn extrapolate(previous: &Self::Value, next: &Self::Value) -> Self::Value;

    /// Whether `previous` is usable as a feedforward baseline.
    fn can_extrapolate(previous: &Self::Value) -> bool;

    /// The literal value the animation travels to when heading for `target`.
    fn path_toward(_current: &Self::Value, target: &Self::Value) -> Self::Value {
        target.clone()
    }

    /// Normalization applied to a value before it is rendered.
    fn present(value: &Self::Value) -> Self::Value {
        value.clone()
    }

    /// Boundary normalization of caller-supplied values.
    fn sanitize(value: Self::Value) -> Self::Value {
        value
    }
}

/// Result of evaluating a state at a timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation<V> {
    pub value: V,
    pub completed: bool,
    /// Start timestamp the evaluation measured from (latched or this frame's).
    pub effective_start: f64,
}

/// Elapsed-time measurement shared by the direct and packed paths.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Progress {
    /// Non-negative raw progress; `>= 1` means the transition is over.
    pub raw: f64,
    pub effective_start: f64,
}

impl Progress {
    /// `start` is the latched start timestamp, if any. The first evaluation
    /// measures from its own timestamp.
    pub fn measure(duration_ms: f64, start: Option<f64>, timestamp: f64) -> Self {
        let effective_start = start.unwrap_or(timestamp);
        if !timestamp.is_finite() || !effective_start.is_finite() || duration_ms <= 0.0 {
            return Self {
                raw: 1.0,
                effective_start,
            };
        }
        let raw = (timestamp - effective_start) / duration_ms;
        let raw = if raw.is_finite() { raw.max(0.0) } else { 1.0 };
        Self {
            raw,
            effective_start,
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.raw >= 1.0
    }
}

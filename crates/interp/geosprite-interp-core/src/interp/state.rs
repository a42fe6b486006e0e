//! Generic interpolation state: creation from a command, evaluation per frame.

use crate::easing::ResolvedEasing;
use crate::interp::{Evaluation, InterpKind, InterpolationMode, InterpolationOptions, Progress};

/// One in-flight transition. `from` and `to` are fixed for the lifetime of the
/// state; a new command always builds a new state.
#[derive(Debug)]
pub struct InterpolationState<K: InterpKind> {
    mode: InterpolationMode,
    duration_ms: f64,
    easing: ResolvedEasing,
    from: K::Value,
    to: K::Value,
    path_target: Option<K::Value>,
    start_timestamp: Option<f64>,
}

// Manual impl: `K` itself is a marker and need not be `Clone`.
impl<K: InterpKind> Clone for InterpolationState<K> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            duration_ms: self.duration_ms,
            easing: self.easing,
            from: self.from.clone(),
            to: self.to.clone(),
            path_target: self.path_target.clone(),
            start_timestamp: self.start_timestamp,
        }
    }
}

/// Output of [`InterpolationState::create`].
#[derive(Debug)]
pub struct Creation<K: InterpKind> {
    pub state: InterpolationState<K>,
    /// False when the command should be written immediately and `state`
    /// dropped: either no duration or nothing to travel.
    pub requires_interpolation: bool,
}

impl<K: InterpKind> InterpolationState<K> {
    /// Build a transition from `current` toward `target`.
    ///
    /// `previous_command` is the last value commanded on the channel; it is only
    /// consulted in feedforward mode.
    pub fn create(
        current: &K::Value,
        target: &K::Value,
        previous_command: Option<&K::Value>,
        options: &InterpolationOptions,
    ) -> Creation<K> {
        let duration_ms = options.normalized_duration();
        let effective_target = match (options.mode, previous_command) {
            (InterpolationMode::Feedforward, Some(previous)) if K::can_extrapolate(previous) => {
                K::extrapolate(previous, target)
            }
            _ => target.clone(),
        };
        // A feedforward overshoot is only travelled towards; the state always
        // finishes on the commanded value.
        let path = K::path_toward(current, &effective_target);
        let to = target.clone();
        let requires_interpolation = duration_ms > 0.0 && !K::same(current, &path);
        let path_target = if K::same(&path, &to) { None } else { Some(path) };

        Creation {
            state: Self {
                mode: options.mode,
                duration_ms,
                easing: options.resolve_easing(),
                from: current.clone(),
                to,
                path_target,
                start_timestamp: None,
            },
            requires_interpolation,
        }
    }

    #[inline]
    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    #[inline]
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    #[inline]
    pub fn easing(&self) -> &ResolvedEasing {
        &self.easing
    }

    #[inline]
    pub fn from(&self) -> &K::Value {
        &self.from
    }

    /// Authoritative end state: the value left rendered once the transition finishes.
    #[inline]
    pub fn to(&self) -> &K::Value {
        &self.to
    }

    #[inline]
    pub fn path_target(&self) -> Option<&K::Value> {
        self.path_target.as_ref()
    }

    /// The value actually being travelled to this frame.
    #[inline]
    pub fn travel_target(&self) -> &K::Value {
        self.path_target.as_ref().unwrap_or(&self.to)
    }

    #[inline]
    pub fn start_timestamp(&self) -> Option<f64> {
        self.start_timestamp
    }

    /// Latch the start timestamp. Only the first finite timestamp sticks.
    pub fn latch_start(&mut self, timestamp: f64) {
        if self.start_timestamp.is_none() && timestamp.is_finite() {
            self.start_timestamp = Some(timestamp);
        }
    }

    /// True when evaluation finishes immediately regardless of time.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.duration_ms <= 0.0 || K::same(&self.from, self.travel_target())
    }

    /// Evaluate at `timestamp` without mutating the state.
    pub fn evaluate(&self, timestamp: f64) -> Evaluation<K::Value> {
        let progress = Progress::measure(self.duration_ms, self.start_timestamp, timestamp);
        if self.is_degenerate() || progress.is_complete() {
            return Evaluation {
                value: self.to.clone(),
                completed: true,
                effective_start: progress.effective_start,
            };
        }
        let eased = self.easing.apply(progress.raw);
        Evaluation {
            value: K::lerp(&self.from, self.travel_target(), eased),
            completed: false,
            effective_start: progress.effective_start,
        }
    }

    /// Evaluate and latch the start timestamp, as a frame step does.
    pub fn step(&mut self, timestamp: f64) -> Evaluation<K::Value> {
        let evaluation = self.evaluate(timestamp);
        self.latch_start(evaluation.effective_start);
        evaluation
    }

    /// Fresh state with every endpoint mapped through `f`, keeping timing,
    /// easing and any latched start.
    pub(crate) fn remapped(&self, f: impl Fn(&K::Value) -> K::Value) -> Self {
        Self {
            mode: self.mode,
            duration_ms: self.duration_ms,
            easing: self.easing,
            from: f(&self.from),
            to: f(&self.to),
            path_target: self.path_target.as_ref().map(&f),
            start_timestamp: self.start_timestamp,
        }
    }

    /// Reassemble a state from packed parts.
    pub(crate) fn from_parts(
        duration_ms: f64,
        easing: ResolvedEasing,
        from: K::Value,
        to: K::Value,
        path_target: Option<K::Value>,
        start_timestamp: Option<f64>,
    ) -> Self {
        Self {
            mode: InterpolationMode::Feedback,
            duration_ms,
            easing,
            from,
            to,
            path_target,
            start_timestamp,
        }
    }
}

//! Channel slot: one animatable attribute owned by exactly one entity.

use log::trace;

use crate::interp::{Evaluation, InterpKind, InterpolationOptions, InterpolationState};

/// Rendered value plus the bookkeeping needed to animate it.
///
/// `last_command` is the most recent commanded value. It feeds the next
/// feedforward extrapolation regardless of where the animation currently is.
#[derive(Debug)]
pub struct Channel<K: InterpKind> {
    current: K::Value,
    from: Option<K::Value>,
    to: Option<K::Value>,
    state: Option<InterpolationState<K>>,
    last_command: Option<K::Value>,
}

impl<K: InterpKind> Channel<K> {
    pub fn new(initial: K::Value) -> Self {
        let initial = K::sanitize(initial);
        Self {
            current: K::present(&initial),
            from: None,
            to: None,
            state: None,
            last_command: Some(initial),
        }
    }

    /// Value to feed the renderer this frame.
    #[inline]
    pub fn current(&self) -> &K::Value {
        &self.current
    }

    #[inline]
    pub fn from(&self) -> Option<&K::Value> {
        self.from.as_ref()
    }

    #[inline]
    pub fn to(&self) -> Option<&K::Value> {
        self.to.as_ref()
    }

    #[inline]
    pub fn state(&self) -> Option<&InterpolationState<K>> {
        self.state.as_ref()
    }

    #[inline]
    pub fn last_command(&self) -> Option<&K::Value> {
        self.last_command.as_ref()
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.state.is_some()
    }

    /// Command a new value. `None` options (or a non-positive duration) write
    /// the value immediately and drop any in-flight transition.
    ///
    /// Returns true when the command started an animation.
    pub fn apply_target(&mut self, value: K::Value, options: Option<&InterpolationOptions>) -> bool {
        let value = K::sanitize(value);
        let options = match options {
            Some(options) if !options.is_immediate() => options,
            _ => {
                self.write_immediate(value);
                return false;
            }
        };

        let creation = InterpolationState::<K>::create(
            &self.current,
            &value,
            self.last_command.as_ref(),
            options,
        );
        if !creation.requires_interpolation {
            self.write_immediate(value);
            return false;
        }

        trace!(
            "{} channel: animating {:?} -> {:?} over {}ms",
            K::LABEL,
            creation.state.from(),
            creation.state.to(),
            creation.state.duration_ms()
        );
        self.from = Some(creation.state.from().clone());
        self.to = Some(creation.state.to().clone());
        self.state = Some(creation.state);
        self.last_command = Some(value);
        true
    }

    fn write_immediate(&mut self, value: K::Value) {
        self.current = K::present(&value);
        self.clear();
        self.last_command = Some(value);
    }

    /// Drop any in-flight transition, leaving the rendered value where it is.
    pub fn cancel(&mut self) {
        self.clear();
    }

    /// Treat the currently rendered value as freshly commanded and drop the
    /// transition. Used when the host page is hidden.
    pub fn freeze(&mut self) {
        self.clear();
        self.last_command = Some(self.current.clone());
    }

    fn clear(&mut self) {
        self.state = None;
        self.from = None;
        self.to = None;
    }

    /// Evaluate at `timestamp` and write the result back. Returns true while
    /// the channel is still animating.
    pub fn step(&mut self, timestamp: f64) -> bool {
        let evaluation = match self.state.as_ref() {
            Some(state) => state.evaluate(timestamp),
            None => return false,
        };
        self.apply_evaluation(evaluation)
    }

    /// Write an evaluation produced for this channel's state (directly or by
    /// the packed batch path). Returns true while still animating.
    pub fn apply_evaluation(&mut self, evaluation: Evaluation<K::Value>) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if evaluation.completed {
            self.current = K::present(state.to());
            self.clear();
            return false;
        }
        state.latch_start(evaluation.effective_start);
        self.current = K::present(&evaluation.value);
        true
    }

    /// Replace the in-flight state and rendered value through `f`, keeping
    /// progress. Used when a composite channel's base shifts.
    pub(crate) fn remap(&mut self, f: impl Fn(&K::Value) -> K::Value) {
        self.current = K::present(&f(&self.current));
        self.from = self.from.as_ref().map(&f);
        self.to = self.to.as_ref().map(&f);
        self.last_command = self.last_command.as_ref().map(&f);
        if let Some(state) = self.state.as_ref() {
            self.state = Some(state.remapped(&f));
        }
    }
}

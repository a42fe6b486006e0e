//! Composite rotation: displayed angle = automatic base heading + manual rotation.

use crate::channel::Channel;
use crate::interp::{Angle, InterpolationOptions};
use crate::math::{normalize_angle_deg, normalize_delta_deg, DEGREE_EPSILON};

/// Rotation channel of one sprite image.
///
/// The displayed angle is animated as a whole. When the automatic base moves
/// (continued travel changes the heading), the manual component is recovered
/// from the displayed angle and re-applied on top of the new base, carrying any
/// in-flight manual animation over unchanged.
#[derive(Debug)]
pub struct RotationChannel {
    base_deg: f64,
    manual_deg: f64,
    displayed: Channel<Angle>,
}

impl RotationChannel {
    pub fn new(manual_deg: f64, base_deg: f64) -> Self {
        let manual_deg = normalize_angle_deg(manual_deg);
        let base_deg = normalize_angle_deg(base_deg);
        Self {
            base_deg,
            manual_deg,
            displayed: Channel::new(normalize_angle_deg(base_deg + manual_deg)),
        }
    }

    /// Angle handed to the renderer, in `[0, 360)`.
    #[inline]
    pub fn displayed_deg(&self) -> f64 {
        *self.displayed.current()
    }

    #[inline]
    pub fn base_deg(&self) -> f64 {
        self.base_deg
    }

    /// Last commanded manual rotation.
    #[inline]
    pub fn manual_deg(&self) -> f64 {
        self.manual_deg
    }

    /// Manual component currently on screen: displayed angle minus base.
    #[inline]
    pub fn displayed_manual_deg(&self) -> f64 {
        normalize_angle_deg(self.displayed_deg() - self.base_deg)
    }

    #[inline]
    pub fn channel(&self) -> &Channel<Angle> {
        &self.displayed
    }

    #[inline]
    pub(crate) fn channel_mut(&mut self) -> &mut Channel<Angle> {
        &mut self.displayed
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.displayed.is_animating()
    }

    /// Command a new manual rotation on top of the current base.
    pub fn set_manual(&mut self, manual_deg: f64, options: Option<&InterpolationOptions>) -> bool {
        let manual_deg = if manual_deg.is_finite() { manual_deg } else { 0.0 };
        self.manual_deg = normalize_angle_deg(manual_deg);
        let target = normalize_angle_deg(self.base_deg + self.manual_deg);
        self.displayed.apply_target(target, options)
    }

    /// Move the automatic base heading.
    pub fn set_base(&mut self, base_deg: f64) {
        let base_deg = normalize_angle_deg(base_deg);
        let shift = normalize_delta_deg(base_deg - self.base_deg);
        if shift.abs() <= DEGREE_EPSILON {
            return;
        }
        let recovered_manual = self.displayed_manual_deg();
        self.base_deg = base_deg;
        // Re-seat the displayed angle on the new base, then carry the in-flight
        // transition (if any) across by the same shift.
        let reseated = base_deg + recovered_manual;
        let offset = normalize_delta_deg(reseated - self.displayed_deg());
        self.displayed.remap(|angle| angle + offset);
    }

    pub fn step(&mut self, timestamp: f64) -> bool {
        self.displayed.step(timestamp)
    }

    pub fn freeze(&mut self) {
        self.displayed.freeze();
        self.manual_deg = self.displayed_manual_deg();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_starts_at_base_plus_manual() {
        let rotation = RotationChannel::new(30.0, 350.0);
        assert_eq!(rotation.displayed_deg(), 20.0);
        assert_eq!(rotation.displayed_manual_deg(), 30.0);
    }

    #[test]
    fn base_change_without_animation_follows_heading() {
        let mut rotation = RotationChannel::new(10.0, 0.0);
        rotation.set_base(90.0);
        assert_eq!(rotation.displayed_deg(), 100.0);
        assert!(!rotation.is_animating());
    }

    #[test]
    fn in_flight_manual_animation_survives_heading_drift() {
        let mut rotation = RotationChannel::new(0.0, 0.0);
        assert!(rotation.set_manual(90.0, Some(&InterpolationOptions::new(100.0))));
        rotation.step(0.0);
        rotation.step(50.0);
        assert!((rotation.displayed_deg() - 45.0).abs() < 1e-9);

        rotation.set_base(40.0);
        assert!((rotation.displayed_deg() - 85.0).abs() < 1e-9);
        assert!((rotation.displayed_manual_deg() - 45.0).abs() < 1e-9);

        rotation.step(75.0);
        assert!((rotation.displayed_deg() - (40.0 + 67.5)).abs() < 1e-9);
        assert!(!rotation.step(100.0));
        assert!((rotation.displayed_deg() - 130.0).abs() < 1e-9);
    }
}

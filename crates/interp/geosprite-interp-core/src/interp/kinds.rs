//! Value-kind strategies plugged into [`InterpolationState`](super::InterpolationState).

use crate::geo::GeoLocation;
use crate::interp::InterpKind;
use crate::math::{
    clamp01, lerp, normalize_angle_deg, normalize_delta_deg, DEGREE_EPSILON, DISTANCE_EPSILON,
};

/// Plain numeric channel (offset distance in meters).
#[derive(Copy, Clone, Debug, Default)]
pub struct Scalar;

impl InterpKind for Scalar {
    type Value = f64;
    const LABEL: &'static str = "scalar";

    #[inline]
    fn same(a: &f64, b: &f64) -> bool {
        (a - b).abs() <= DISTANCE_EPSILON
    }

    #[inline]
    fn lerp(from: &f64, to: &f64, t: f64) -> f64 {
        lerp(*from, *to, t)
    }

    #[inline]
    fn extrapolate(previous: &f64, next: &f64) -> f64 {
        next + (next - previous)
    }

    #[inline]
    fn can_extrapolate(previous: &f64) -> bool {
        previous.is_finite()
    }

    fn path_toward(current: &f64, target: &f64) -> f64 {
        current + (target - current)
    }

    fn sanitize(value: f64) -> f64 {
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

/// Scalar math with the rendered value clamped into `[0, 1]`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Opacity;

impl InterpKind for Opacity {
    type Value = f64;
    const LABEL: &'static str = "opacity";

    #[inline]
    fn same(a: &f64, b: &f64) -> bool {
        Scalar::same(a, b)
    }

    #[inline]
    fn lerp(from: &f64, to: &f64, t: f64) -> f64 {
        Scalar::lerp(from, to, t)
    }

    #[inline]
    fn extrapolate(previous: &f64, next: &f64) -> f64 {
        Scalar::extrapolate(previous, next)
    }

    #[inline]
    fn can_extrapolate(previous: &f64) -> bool {
        Scalar::can_extrapolate(previous)
    }

    fn path_toward(current: &f64, target: &f64) -> f64 {
        Scalar::path_toward(current, target)
    }

    #[inline]
    fn present(value: &f64) -> f64 {
        clamp01(*value)
    }

    /// Out-of-range commands keep their raw value so feedforward velocity is
    /// preserved; only the presented value is clamped.
    fn sanitize(value: f64) -> f64 {
        if value.is_finite() {
            value
        } else {
            1.0
        }
    }
}

/// Degrees with shortest-path travel. Values are left un-wrapped while
/// travelling (350° → 10° travels to 370°) and wrapped only when presented.
#[derive(Copy, Clone, Debug, Default)]
pub struct Angle;

impl InterpKind for Angle {
    type Value = f64;
    const LABEL: &'static str = "angle";

    #[inline]
    fn same(a: &f64, b: &f64) -> bool {
        (a - b).abs() <= DEGREE_EPSILON
    }

    #[inline]
    fn lerp(from: &f64, to: &f64, t: f64) -> f64 {
        lerp(*from, *to, t)
    }

    fn extrapolate(previous: &f64, next: &f64) -> f64 {
        next + normalize_delta_deg(next - previous)
    }

    #[inline]
    fn can_extrapolate(previous: &f64) -> bool {
        previous.is_finite()
    }

    fn path_toward(current: &f64, target: &f64) -> f64 {
        current + normalize_delta_deg(target - current)
    }

    #[inline]
    fn present(value: &f64) -> f64 {
        normalize_angle_deg(*value)
    }

    fn sanitize(value: f64) -> f64 {
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

/// Geographic location. Equality is exact.
#[derive(Copy, Clone, Debug, Default)]
pub struct Geo;

impl InterpKind for Geo {
    type Value = GeoLocation;
    const LABEL: &'static str = "location";

    #[inline]
    fn same(a: &GeoLocation, b: &GeoLocation) -> bool {
        a.same_as(b)
    }

    #[inline]
    fn lerp(from: &GeoLocation, to: &GeoLocation, t: f64) -> GeoLocation {
        from.lerp(to, t)
    }

    fn extrapolate(previous: &GeoLocation, next: &GeoLocation) -> GeoLocation {
        next.mirror_from(previous)
    }

    #[inline]
    fn can_extrapolate(previous: &GeoLocation) -> bool {
        previous.is_finite()
    }

    fn sanitize(value: GeoLocation) -> GeoLocation {
        GeoLocation {
            lng: if value.lng.is_finite() { value.lng } else { 0.0 },
            lat: if value.lat.is_finite() { value.lat } else { 0.0 },
            z: value.z.filter(|z| z.is_finite()),
        }
    }
}

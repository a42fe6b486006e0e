//! Small numeric helpers shared by the interpolation primitives.

/// Tolerance below which a scalar distance delta is treated as zero.
pub const DISTANCE_EPSILON: f64 = 1e-6;

/// Tolerance below which an angular delta (degrees) is treated as zero.
pub const DEGREE_EPSILON: f64 = 1e-6;

/// Clamp into `[0, 1]`. Non-finite input is treated as "done" and maps to `1.0`.
#[inline]
pub fn clamp01(value: f64) -> f64 {
    if !value.is_finite() {
        return 1.0;
    }
    value.clamp(0.0, 1.0)
}

/// Wrap an angle into `[0, 360)`. Non-finite angles normalize to `0`.
#[inline]
pub fn normalize_angle_deg(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle % 360.0;
    let normalized = if wrapped < 0.0 { wrapped + 360.0 } else { wrapped };
    // `-0.0 + 360.0` lands on 360.0 for tiny negatives; fold both back to zero.
    if normalized == 0.0 || normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Reduce a rotational delta into `(-180, 180]`.
///
/// Exactly `180` is left untouched while `-180` flips to `180`, so an antipodal
/// target always resolves to the same direction.
#[inline]
pub fn normalize_delta_deg(delta: f64) -> f64 {
    if !delta.is_finite() {
        return 0.0;
    }
    let mut d = delta % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

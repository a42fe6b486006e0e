//! Geographic coordinates and the few great-circle helpers the engine needs.

use serde::{Deserialize, Serialize};

/// WGS84 equatorial radius, matching the host projection.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Longitude/latitude in degrees with an optional altitude in meters.
///
/// Altitude is "don't care" unless one side of a comparison declares it: a
/// missing altitude compares equal to an explicit `0`.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lng: f64,
    pub lat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl GeoLocation {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat, z: None }
    }

    pub fn with_altitude(lng: f64, lat: f64, z: f64) -> Self {
        Self { lng, lat, z: Some(z) }
    }

    #[inline]
    pub fn has_altitude(&self) -> bool {
        self.z.is_some()
    }

    #[inline]
    pub fn altitude_or_zero(&self) -> f64 {
        self.z.unwrap_or(0.0)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite() && self.z.map_or(true, f64::is_finite)
    }

    /// Exact equality on lng/lat; altitude only matters when either side has one.
    pub fn same_as(&self, other: &GeoLocation) -> bool {
        if self.lng != other.lng || self.lat != other.lat {
            return false;
        }
        if self.z.is_none() && other.z.is_none() {
            return true;
        }
        self.altitude_or_zero() == other.altitude_or_zero()
    }

    /// Per-axis linear interpolation. Altitude is produced only when either
    /// endpoint declares one.
    pub fn lerp(&self, to: &GeoLocation, t: f64) -> GeoLocation {
        let z = if self.z.is_some() || to.z.is_some() {
            Some(crate::math::lerp(
                self.altitude_or_zero(),
                to.altitude_or_zero(),
                t,
            ))
        } else {
            None
        };
        GeoLocation {
            lng: crate::math::lerp(self.lng, to.lng, t),
            lat: crate::math::lerp(self.lat, to.lat, t),
            z,
        }
    }

    /// Mirror `self` (the newer command) away from `previous`: `self + (self - previous)`.
    pub fn mirror_from(&self, previous: &GeoLocation) -> GeoLocation {
        let z = if self.z.is_some() || previous.z.is_some() {
            let next_z = self.altitude_or_zero();
            Some(next_z + (next_z - previous.altitude_or_zero()))
        } else {
            None
        };
        GeoLocation {
            lng: self.lng + (self.lng - previous.lng),
            lat: self.lat + (self.lat - previous.lat),
            z,
        }
    }
}

impl PartialEq for GeoLocation {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

/// Haversine surface distance in meters (altitude ignored).
pub fn distance_meters(from: &GeoLocation, to: &GeoLocation) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lat = lat2 - lat1;
    let d_lng = (to.lng - from.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Initial great-circle bearing in degrees clockwise from north, in `[0, 360)`.
pub fn bearing_deg(from: &GeoLocation, to: &GeoLocation) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    crate::math::normalize_angle_deg(y.atan2(x).to_degrees())
}

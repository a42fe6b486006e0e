//! Packed batch evaluation.
//!
//! Live interpolation states are flattened into one `f64` parameter buffer,
//! evaluated in a single pass, and read back from a flat result buffer. The
//! layout is fixed so that the buffers can be handed across an FFI or worker
//! boundary unchanged:
//!
//! ```text
//! params:  [distance count, degree count, location count]
//!          distance records  x 10
//!          degree records    x 10
//!          location records  x 17
//! results: distance results  x 3   [value, completed, effective start]
//!          degree results    x 3   (value normalized to [0, 360))
//!          location results  x 6   [lng, lat, z, has z, completed, effective start]
//! ```
//!
//! Numeric record: `duration, from, path target, final, start (or -1),
//! timestamp, preset id, p0, p1, p2`. Location record: `duration, from
//! lng/lat/z, path lng/lat/z, final lng/lat/z, has z, start (or -1),
//! timestamp, preset id, p0, p1, p2`.
//!
//! Decoding rebuilds each state and evaluates it with
//! [`InterpolationState::evaluate`], so packed results match direct evaluation.

use crate::easing::{EasingPreset, ResolvedEasing};
use crate::error::BatchError;
use crate::geo::GeoLocation;
use crate::interp::{Angle, Evaluation, Geo, InterpKind, InterpolationState, Scalar};
use crate::math::normalize_angle_deg;

pub const BATCH_HEADER_LENGTH: usize = 3;
pub const DISTANCE_ITEM_LENGTH: usize = 10;
pub const DISTANCE_RESULT_LENGTH: usize = 3;
pub const DEGREE_ITEM_LENGTH: usize = 10;
pub const DEGREE_RESULT_LENGTH: usize = 3;
pub const LOCATION_ITEM_LENGTH: usize = 17;
pub const LOCATION_RESULT_LENGTH: usize = 6;

/// Sentinel for "start timestamp not latched yet".
pub const UNLATCHED_START: f64 = -1.0;

/// Record counts per section.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub distance: usize,
    pub degree: usize,
    pub location: usize,
}

impl BatchCounts {
    /// Parameter and result buffer lengths, or `None` if either overflows.
    pub fn checked_lengths(&self) -> Option<(usize, usize)> {
        [
            (self.distance, DISTANCE_ITEM_LENGTH, DISTANCE_RESULT_LENGTH),
            (self.degree, DEGREE_ITEM_LENGTH, DEGREE_RESULT_LENGTH),
            (self.location, LOCATION_ITEM_LENGTH, LOCATION_RESULT_LENGTH),
        ]
        .into_iter()
        .try_fold((BATCH_HEADER_LENGTH, 0usize), |(params, results), (count, item, result)| {
            Some((
                params.checked_add(count.checked_mul(item)?)?,
                results.checked_add(count.checked_mul(result)?)?,
            ))
        })
    }

    /// Saturates at `usize::MAX`.
    pub fn params_len(&self) -> usize {
        self.checked_lengths().map_or(usize::MAX, |(params, _)| params)
    }

    /// Saturates at `usize::MAX`.
    pub fn results_len(&self) -> usize {
        self.checked_lengths().map_or(usize::MAX, |(_, results)| results)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distance == 0 && self.degree == 0 && self.location == 0
    }

    fn degree_offset(&self) -> usize {
        self.distance * DISTANCE_RESULT_LENGTH
    }

    fn location_offset(&self) -> usize {
        self.degree_offset() + self.degree * DEGREE_RESULT_LENGTH
    }
}

fn encode_start(start: Option<f64>) -> f64 {
    start.unwrap_or(UNLATCHED_START)
}

fn decode_start(start: f64) -> Option<f64> {
    (start.is_finite() && start >= 0.0).then_some(start)
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Accumulates packed records in the order they are pushed.
#[derive(Debug, Default)]
pub struct InterpolationBatch {
    distance: Vec<f64>,
    degree: Vec<f64>,
    location: Vec<f64>,
    counts: BatchCounts,
}

impl InterpolationBatch {
    pub fn with_capacity(records: usize) -> Self {
        Self {
            distance: Vec::with_capacity(records * DISTANCE_ITEM_LENGTH),
            degree: Vec::with_capacity(records * DEGREE_ITEM_LENGTH),
            location: Vec::with_capacity(records * LOCATION_ITEM_LENGTH),
            counts: BatchCounts::default(),
        }
    }

    #[inline]
    pub fn counts(&self) -> BatchCounts {
        self.counts
    }

    pub fn clear(&mut self) {
        self.distance.clear();
        self.degree.clear();
        self.location.clear();
        self.counts = BatchCounts::default();
    }

    /// Push a scalar record (offset distance or opacity).
    pub fn push_distance<K>(&mut self, state: &InterpolationState<K>, timestamp: f64)
    where
        K: InterpKind<Value = f64>,
    {
        push_numeric(&mut self.distance, state, timestamp);
        self.counts.distance += 1;
    }

    pub fn push_degree(&mut self, state: &InterpolationState<Angle>, timestamp: f64) {
        push_numeric(&mut self.degree, state, timestamp);
        self.counts.degree += 1;
    }

    pub fn push_location(&mut self, state: &InterpolationState<Geo>, timestamp: f64) {
        let from = state.from();
        let path = state.travel_target();
        let to = state.to();
        let has_z = from.has_altitude() || path.has_altitude() || to.has_altitude();
        self.location.push(state.duration_ms());
        for point in [from, path, to] {
            self.location.push(point.lng);
            self.location.push(point.lat);
            self.location.push(point.altitude_or_zero());
        }
        self.location.push(flag(has_z));
        self.location.push(encode_start(state.start_timestamp()));
        self.location.push(timestamp);
        self.location
            .extend_from_slice(&state.easing().preset().encode());
        self.counts.location += 1;
    }

    /// Write the full parameter buffer (header included) into `params`.
    pub fn write_params(&self, params: &mut Vec<f64>) {
        params.clear();
        params.reserve(self.counts.params_len());
        params.push(self.counts.distance as f64);
        params.push(self.counts.degree as f64);
        params.push(self.counts.location as f64);
        params.extend_from_slice(&self.distance);
        params.extend_from_slice(&self.degree);
        params.extend_from_slice(&self.location);
    }
}

fn push_numeric<K>(buffer: &mut Vec<f64>, state: &InterpolationState<K>, timestamp: f64)
where
    K: InterpKind<Value = f64>,
{
    buffer.push(state.duration_ms());
    buffer.push(*state.from());
    buffer.push(*state.travel_target());
    buffer.push(*state.to());
    buffer.push(encode_start(state.start_timestamp()));
    buffer.push(timestamp);
    buffer.extend_from_slice(&state.easing().preset().encode());
}

fn read_count(value: f64, section: &'static str) -> Result<usize, BatchError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(BatchError::InvalidCount { section, value });
    }
    Ok(value as usize)
}

/// Parse and validate the header of a parameter buffer.
pub fn read_counts(params: &[f64]) -> Result<BatchCounts, BatchError> {
    if params.len() < BATCH_HEADER_LENGTH {
        return Err(BatchError::Truncated {
            expected: BATCH_HEADER_LENGTH,
            actual: params.len(),
        });
    }
    let counts = BatchCounts {
        distance: read_count(params[0], "distance")?,
        degree: read_count(params[1], "degree")?,
        location: read_count(params[2], "location")?,
    };
    if counts.checked_lengths().is_none() {
        return Err(BatchError::InvalidCount {
            section: "total",
            value: params[0] + params[1] + params[2],
        });
    }
    Ok(counts)
}

fn decode_numeric<K>(record: &[f64]) -> (InterpolationState<K>, f64)
where
    K: InterpKind<Value = f64>,
{
    let to = record[3];
    let path = record[2];
    let path_target = (!K::same(&path, &to)).then_some(path);
    let easing = ResolvedEasing::from(EasingPreset::decode(
        record[6], record[7], record[8], record[9],
    ));
    let state = InterpolationState::from_parts(
        record[0],
        easing,
        record[1],
        to,
        path_target,
        decode_start(record[4]),
    );
    (state, record[5])
}

fn decode_location(record: &[f64]) -> (InterpolationState<Geo>, f64) {
    let has_z = record[10] != 0.0;
    let point = |offset: usize| GeoLocation {
        lng: record[offset],
        lat: record[offset + 1],
        z: has_z.then_some(record[offset + 2]),
    };
    let from = point(1);
    let path = point(4);
    let to = point(7);
    let path_target = (!Geo::same(&path, &to)).then_some(path);
    let easing = ResolvedEasing::from(EasingPreset::decode(
        record[13], record[14], record[15], record[16],
    ));
    let state = InterpolationState::from_parts(
        record[0],
        easing,
        from,
        to,
        path_target,
        decode_start(record[11]),
    );
    (state, record[12])
}

/// Evaluate every record in `params`, writing results into `results`.
pub fn process_interpolations(params: &[f64], results: &mut [f64]) -> Result<BatchCounts, BatchError> {
    let counts = read_counts(params)?;
    let (params_len, results_len) = (counts.params_len(), counts.results_len());
    if params.len() < params_len {
        return Err(BatchError::Truncated {
            expected: params_len,
            actual: params.len(),
        });
    }
    if results.len() < results_len {
        return Err(BatchError::Truncated {
            expected: results_len,
            actual: results.len(),
        });
    }

    let mut cursor = BATCH_HEADER_LENGTH;
    let mut out = 0;
    for _ in 0..counts.distance {
        let (state, timestamp) =
            decode_numeric::<Scalar>(&params[cursor..cursor + DISTANCE_ITEM_LENGTH]);
        let evaluation = state.evaluate(timestamp);
        results[out] = evaluation.value;
        results[out + 1] = flag(evaluation.completed);
        results[out + 2] = evaluation.effective_start;
        cursor += DISTANCE_ITEM_LENGTH;
        out += DISTANCE_RESULT_LENGTH;
    }
    for _ in 0..counts.degree {
        let (state, timestamp) =
            decode_numeric::<Angle>(&params[cursor..cursor + DEGREE_ITEM_LENGTH]);
        let evaluation = state.evaluate(timestamp);
        results[out] = normalize_angle_deg(evaluation.value);
        results[out + 1] = flag(evaluation.completed);
        results[out + 2] = evaluation.effective_start;
        cursor += DEGREE_ITEM_LENGTH;
        out += DEGREE_RESULT_LENGTH;
    }
    for _ in 0..counts.location {
        let (state, timestamp) = decode_location(&params[cursor..cursor + LOCATION_ITEM_LENGTH]);
        let evaluation = state.evaluate(timestamp);
        let value = evaluation.value;
        results[out] = value.lng;
        results[out + 1] = value.lat;
        results[out + 2] = value.altitude_or_zero();
        results[out + 3] = flag(value.has_altitude());
        results[out + 4] = flag(evaluation.completed);
        results[out + 5] = evaluation.effective_start;
        cursor += LOCATION_ITEM_LENGTH;
        out += LOCATION_RESULT_LENGTH;
    }
    Ok(counts)
}

/// Read-only view over a result buffer produced by [`process_interpolations`].
#[derive(Debug, Clone, Copy)]
pub struct BatchResults<'a> {
    counts: BatchCounts,
    buffer: &'a [f64],
}

impl<'a> BatchResults<'a> {
    /// `buffer` must hold at least `counts.results_len()` values.
    pub fn new(counts: BatchCounts, buffer: &'a [f64]) -> Result<Self, BatchError> {
        let expected = counts.results_len();
        if buffer.len() < expected {
            return Err(BatchError::Truncated {
                expected,
                actual: buffer.len(),
            });
        }
        Ok(Self { counts, buffer })
    }

    #[inline]
    pub fn counts(&self) -> BatchCounts {
        self.counts
    }

    fn numeric(&self, offset: usize) -> Evaluation<f64> {
        Evaluation {
            value: self.buffer[offset],
            completed: self.buffer[offset + 1] != 0.0,
            effective_start: self.buffer[offset + 2],
        }
    }

    pub fn distance(&self, index: usize) -> Evaluation<f64> {
        self.numeric(index * DISTANCE_RESULT_LENGTH)
    }

    pub fn degree(&self, index: usize) -> Evaluation<f64> {
        self.numeric(self.counts.degree_offset() + index * DEGREE_RESULT_LENGTH)
    }

    pub fn location(&self, index: usize) -> Evaluation<GeoLocation> {
        let offset = self.counts.location_offset() + index * LOCATION_RESULT_LENGTH;
        let record = &self.buffer[offset..offset + LOCATION_RESULT_LENGTH];
        Evaluation {
            value: GeoLocation {
                lng: record[0],
                lat: record[1],
                z: (record[3] != 0.0).then_some(record[2]),
            },
            completed: record[4] != 0.0,
            effective_start: record[5],
        }
    }
}

/// Per-section read position used while writing results back in push order.
#[derive(Debug, Default)]
pub struct BatchCursor {
    distance: usize,
    degree: usize,
    location: usize,
}

impl BatchCursor {
    pub fn next_distance(&mut self) -> usize {
        let index = self.distance;
        self.distance += 1;
        index
    }

    pub fn next_degree(&mut self) -> usize {
        let index = self.degree;
        self.degree += 1;
        index
    }

    pub fn next_location(&mut self) -> usize {
        let index = self.location;
        self.location += 1;
        index
    }

    /// True when every record in `counts` was consumed.
    pub fn is_exhausted(&self, counts: &BatchCounts) -> bool {
        self.distance == counts.distance
            && self.degree == counts.degree
            && self.location == counts.location
    }
}

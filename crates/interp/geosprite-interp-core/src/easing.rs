//! Easing resolution: declarative descriptors in, pure progress curves out.
//!
//! Every family validates its own parameters and falls back to a documented
//! default instead of failing, so partially specified descriptors coming from
//! untrusted callers still resolve to something usable:
//!
//! | family        | parameters (default)                                   |
//! |---------------|--------------------------------------------------------|
//! | `linear`      | none                                                   |
//! | `ease`        | `power > 0` (3), `mode` (in-out)                       |
//! | `exponential` | `exponent > 0` (5), `mode` (in-out)                    |
//! | `quadratic`   | `mode` (in-out)                                        |
//! | `cubic`       | `mode` (in-out)                                        |
//! | `sine`        | `mode` (in-out), `amplitude > 0` (1)                   |
//! | `bounce`      | `bounces >= 1`, rounded (3), `decay` in `(0, 1]` (0.5) |
//! | `back`        | `overshoot`, finite and non-zero (1.70158)             |
//!
//! Only the input progress is clamped. `back` (and `sine` with an amplitude
//! above one) deliberately leave `[0, 1]` near the end of the curve.

use std::f64::consts::PI;

use serde::{Deserialize, Deserializer, Serialize};

use crate::math::clamp01;

pub const DEFAULT_EASE_POWER: f64 = 3.0;
pub const DEFAULT_EXPONENT: f64 = 5.0;
pub const DEFAULT_SINE_AMPLITUDE: f64 = 1.0;
pub const DEFAULT_BOUNCES: f64 = 3.0;
pub const DEFAULT_BOUNCE_DECAY: f64 = 0.5;
pub const DEFAULT_BACK_OVERSHOOT: f64 = 1.70158;

/// Which end(s) of the curve are shaped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EasingMode {
    #[serde(rename = "in")]
    In,
    #[serde(rename = "out")]
    Out,
    #[default]
    #[serde(rename = "in-out", alias = "inOut", alias = "in_out")]
    InOut,
}

impl EasingMode {
    fn code(self) -> f64 {
        match self {
            EasingMode::InOut => 0.0,
            EasingMode::In => 1.0,
            EasingMode::Out => 2.0,
        }
    }

    fn from_code(code: f64) -> Self {
        if code == 1.0 {
            EasingMode::In
        } else if code == 2.0 {
            EasingMode::Out
        } else {
            EasingMode::InOut
        }
    }
}

/// Caller-facing easing configuration. Any field may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EasingDescriptor {
    #[default]
    Linear,
    Ease {
        #[serde(
            default,
            deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none"
        )]
        power: Option<f64>,
        #[serde(
            default,
            deserialize_with = "lenient_mode",
            skip_serializing_if = "Option::is_none"
        )]
        mode: Option<EasingMode>,
    },
    Exponential {
        #[serde(
            default,
            deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none"
        )]
        exponent: Option<f64>,
        #[serde(
            default,
            deserialize_with = "lenient_mode",
            skip_serializing_if = "Option::is_none"
        )]
        mode: Option<EasingMode>,
    },
    Quadratic {
        #[serde(
            default,
            deserialize_with = "lenient_mode",
            skip_serializing_if = "Option::is_none"
        )]
        mode: Option<EasingMode>,
    },
    Cubic {
        #[serde(
            default,
            deserialize_with = "lenient_mode",
            skip_serializing_if = "Option::is_none"
        )]
        mode: Option<EasingMode>,
    },
    Sine {
        #[serde(
            default,
            deserialize_with = "lenient_mode",
            skip_serializing_if = "Option::is_none"
        )]
        mode: Option<EasingMode>,
        #[serde(
            default,
            deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none"
        )]
        amplitude: Option<f64>,
    },
    Bounce {
        #[serde(
            default,
            deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none"
        )]
        bounces: Option<f64>,
        #[serde(
            default,
            deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none"
        )]
        decay: Option<f64>,
    },
    Back {
        #[serde(
            default,
            deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none"
        )]
        overshoot: Option<f64>,
    },
}

// Malformed parameters fall back to the family default instead of failing
// the whole descriptor.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(serde_json::Value::deserialize(deserializer)?.as_f64())
}

fn lenient_mode<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EasingMode>, D::Error> {
    Ok(serde_json::from_value(serde_json::Value::deserialize(deserializer)?).ok())
}

/// `deserialize_with` helper for optional descriptor fields: `null` stays
/// `None`, anything else goes through [`EasingDescriptor::from_json_value`].
pub fn deserialize_lenient<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EasingDescriptor>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok((!value.is_null()).then(|| EasingDescriptor::from_json_value(&value)))
}

impl EasingDescriptor {
    /// Lenient parse: anything that is not a recognizable descriptor becomes linear.
    pub fn from_json_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// A descriptor with every parameter validated and defaulted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EasingPreset {
    Linear,
    Ease { power: f64, mode: EasingMode },
    Exponential { exponent: f64, mode: EasingMode },
    Quadratic { mode: EasingMode },
    Cubic { mode: EasingMode },
    Sine { mode: EasingMode, amplitude: f64 },
    Bounce { bounces: f64, decay: f64 },
    Back { overshoot: f64 },
}

fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => fallback,
    }
}

fn bounce_count(value: Option<f64>) -> f64 {
    positive_or(value, DEFAULT_BOUNCES).round().max(1.0)
}

fn bounce_decay(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.min(1.0),
        _ => DEFAULT_BOUNCE_DECAY,
    }
}

fn back_overshoot(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => DEFAULT_BACK_OVERSHOOT,
    }
}

impl EasingPreset {
    /// Validate a descriptor. The result is the normalized descriptor.
    pub fn from_descriptor(descriptor: &EasingDescriptor) -> Self {
        match *descriptor {
            EasingDescriptor::Linear => EasingPreset::Linear,
            EasingDescriptor::Ease { power, mode } => EasingPreset::Ease {
                power: positive_or(power, DEFAULT_EASE_POWER),
                mode: mode.unwrap_or_default(),
            },
            EasingDescriptor::Exponential { exponent, mode } => EasingPreset::Exponential {
                exponent: positive_or(exponent, DEFAULT_EXPONENT),
                mode: mode.unwrap_or_default(),
            },
            EasingDescriptor::Quadratic { mode } => EasingPreset::Quadratic {
                mode: mode.unwrap_or_default(),
            },
            EasingDescriptor::Cubic { mode } => EasingPreset::Cubic {
                mode: mode.unwrap_or_default(),
            },
            EasingDescriptor::Sine { mode, amplitude } => EasingPreset::Sine {
                mode: mode.unwrap_or_default(),
                amplitude: positive_or(amplitude, DEFAULT_SINE_AMPLITUDE),
            },
            EasingDescriptor::Bounce { bounces, decay } => EasingPreset::Bounce {
                bounces: bounce_count(bounces),
                decay: bounce_decay(decay),
            },
            EasingDescriptor::Back { overshoot } => EasingPreset::Back {
                overshoot: back_overshoot(overshoot),
            },
        }
    }

    /// Normalized descriptor with every parameter filled in.
    pub fn descriptor(&self) -> EasingDescriptor {
        match *self {
            EasingPreset::Linear => EasingDescriptor::Linear,
            EasingPreset::Ease { power, mode } => EasingDescriptor::Ease {
                power: Some(power),
                mode: Some(mode),
            },
            EasingPreset::Exponential { exponent, mode } => EasingDescriptor::Exponential {
                exponent: Some(exponent),
                mode: Some(mode),
            },
            EasingPreset::Quadratic { mode } => EasingDescriptor::Quadratic { mode: Some(mode) },
            EasingPreset::Cubic { mode } => EasingDescriptor::Cubic { mode: Some(mode) },
            EasingPreset::Sine { mode, amplitude } => EasingDescriptor::Sine {
                mode: Some(mode),
                amplitude: Some(amplitude),
            },
            EasingPreset::Bounce { bounces, decay } => EasingDescriptor::Bounce {
                bounces: Some(bounces),
                decay: Some(decay),
            },
            EasingPreset::Back { overshoot } => EasingDescriptor::Back {
                overshoot: Some(overshoot),
            },
        }
    }

    /// Packed form used by the batch layout: `[preset id, p0, p1, p2]`.
    pub fn encode(&self) -> [f64; 4] {
        match *self {
            EasingPreset::Linear => [0.0, 0.0, 0.0, 0.0],
            EasingPreset::Ease { power, mode } => [1.0, power, mode.code(), 0.0],
            EasingPreset::Exponential { exponent, mode } => [4.0, exponent, mode.code(), 0.0],
            EasingPreset::Quadratic { mode } => [5.0, mode.code(), 0.0, 0.0],
            EasingPreset::Cubic { mode } => [6.0, mode.code(), 0.0, 0.0],
            EasingPreset::Sine { mode, amplitude } => [7.0, mode.code(), amplitude, 0.0],
            EasingPreset::Bounce { bounces, decay } => [8.0, bounces, decay, 0.0],
            EasingPreset::Back { overshoot } => [9.0, overshoot, 0.0, 0.0],
        }
    }

    /// Inverse of [`EasingPreset::encode`]. Unknown ids decode as linear and
    /// parameters are re-validated with the same defaults.
    pub fn decode(id: f64, p0: f64, p1: f64, _p2: f64) -> Self {
        let id = if id.is_finite() { id as i64 } else { 0 };
        match id {
            1 => EasingPreset::Ease {
                power: positive_or(Some(p0), DEFAULT_EASE_POWER),
                mode: EasingMode::from_code(p1),
            },
            4 => EasingPreset::Exponential {
                exponent: positive_or(Some(p0), DEFAULT_EXPONENT),
                mode: EasingMode::from_code(p1),
            },
            5 => EasingPreset::Quadratic {
                mode: EasingMode::from_code(p0),
            },
            6 => EasingPreset::Cubic {
                mode: EasingMode::from_code(p0),
            },
            7 => EasingPreset::Sine {
                mode: EasingMode::from_code(p0),
                amplitude: positive_or(Some(p1), DEFAULT_SINE_AMPLITUDE),
            },
            8 => EasingPreset::Bounce {
                bounces: bounce_count(Some(p0)),
                decay: bounce_decay(Some(p1)),
            },
            9 => EasingPreset::Back {
                overshoot: back_overshoot(Some(p0)),
            },
            _ => EasingPreset::Linear,
        }
    }

    /// Map raw progress to eased progress. Input is clamped to `[0, 1]`,
    /// output is not.
    pub fn apply(&self, progress: f64) -> f64 {
        let t = clamp01(progress);
        match *self {
            EasingPreset::Linear => t,
            EasingPreset::Ease { power, mode } => shaped(t, mode, |x| x.powf(power)),
            EasingPreset::Exponential { exponent, mode } => exponential(t, exponent, mode),
            EasingPreset::Quadratic { mode } => shaped(t, mode, |x| x * x),
            EasingPreset::Cubic { mode } => shaped(t, mode, |x| x * x * x),
            EasingPreset::Sine { mode, amplitude } => match mode {
                EasingMode::In => amplitude * (1.0 - (PI / 2.0 * t).cos()),
                EasingMode::Out => amplitude * (PI / 2.0 * t).sin(),
                EasingMode::InOut => amplitude * 0.5 * (1.0 - (PI * t).cos()),
            },
            EasingPreset::Bounce { bounces, decay } => {
                let oscillation = (PI * (bounces + 0.5) * t).cos();
                let dampening = decay.powf(t * bounces);
                1.0 - oscillation.abs() * dampening
            }
            EasingPreset::Back { overshoot } => {
                let c3 = overshoot + 1.0;
                let p = t - 1.0;
                1.0 + c3 * p * p * p + overshoot * p * p
            }
        }
    }
}

/// Build in/out/in-out variants from an "in" curve.
#[inline]
fn shaped(t: f64, mode: EasingMode, curve_in: impl Fn(f64) -> f64) -> f64 {
    match mode {
        EasingMode::In => curve_in(t),
        EasingMode::Out => 1.0 - curve_in(1.0 - t),
        EasingMode::InOut => {
            if t < 0.5 {
                0.5 * curve_in(t * 2.0)
            } else {
                1.0 - 0.5 * curve_in(2.0 - t * 2.0)
            }
        }
    }
}

fn exponential(t: f64, exponent: f64, mode: EasingMode) -> f64 {
    let denom = exponent.exp_m1();
    let ease_in = |v: f64| -> f64 {
        if v == 0.0 {
            0.0
        } else if v == 1.0 {
            1.0
        } else {
            (exponent * v).exp_m1() / denom
        }
    };
    let ease_out = |v: f64| -> f64 {
        if v == 0.0 {
            0.0
        } else if v == 1.0 {
            1.0
        } else {
            1.0 - (exponent * (1.0 - v)).exp_m1() / denom
        }
    };
    match mode {
        EasingMode::In => ease_in(t),
        EasingMode::Out => ease_out(t),
        EasingMode::InOut => {
            if t < 0.5 {
                0.5 * ease_in(t * 2.0)
            } else {
                0.5 + 0.5 * ease_out(t * 2.0 - 1.0)
            }
        }
    }
}

/// A resolved easing curve, cheap to copy and evaluate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolvedEasing {
    preset: EasingPreset,
}

impl Default for ResolvedEasing {
    fn default() -> Self {
        Self {
            preset: EasingPreset::Linear,
        }
    }
}

impl ResolvedEasing {
    #[inline]
    pub fn apply(&self, progress: f64) -> f64 {
        self.preset.apply(progress)
    }

    #[inline]
    pub fn preset(&self) -> EasingPreset {
        self.preset
    }

    pub fn descriptor(&self) -> EasingDescriptor {
        self.preset.descriptor()
    }
}

impl From<EasingPreset> for ResolvedEasing {
    fn from(preset: EasingPreset) -> Self {
        Self { preset }
    }
}

/// Resolve an optional descriptor. Missing descriptors resolve to linear.
pub fn resolve(descriptor: Option<&EasingDescriptor>) -> (ResolvedEasing, EasingDescriptor) {
    let preset = descriptor
        .map(EasingPreset::from_descriptor)
        .unwrap_or(EasingPreset::Linear);
    (ResolvedEasing { preset }, preset.descriptor())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_descriptor_is_linear_and_clamps_input() {
        let (easing, normalized) = resolve(None);
        assert_eq!(normalized, EasingDescriptor::Linear);
        assert_eq!(easing.apply(-1.0), 0.0);
        assert_eq!(easing.apply(0.3), 0.3);
        assert_eq!(easing.apply(4.0), 1.0);
    }

    #[test]
    fn invalid_parameters_fall_back_to_defaults() {
        let (_, normalized) = resolve(Some(&EasingDescriptor::Bounce {
            bounces: Some(-2.0),
            decay: Some(7.0),
        }));
        assert_eq!(
            normalized,
            EasingDescriptor::Bounce {
                bounces: Some(3.0),
                decay: Some(1.0)
            }
        );

        let (_, normalized) = resolve(Some(&EasingDescriptor::Ease {
            power: Some(f64::NAN),
            mode: None,
        }));
        assert_eq!(
            normalized,
            EasingDescriptor::Ease {
                power: Some(DEFAULT_EASE_POWER),
                mode: Some(EasingMode::InOut)
            }
        );

        let (_, normalized) = resolve(Some(&EasingDescriptor::Back {
            overshoot: Some(0.0),
        }));
        assert_eq!(
            normalized,
            EasingDescriptor::Back {
                overshoot: Some(DEFAULT_BACK_OVERSHOOT)
            }
        );
    }

    #[test]
    fn bounce_rounds_count() {
        let preset = EasingPreset::from_descriptor(&EasingDescriptor::Bounce {
            bounces: Some(2.4),
            decay: None,
        });
        assert_eq!(
            preset,
            EasingPreset::Bounce {
                bounces: 2.0,
                decay: DEFAULT_BOUNCE_DECAY
            }
        );
    }

    #[test]
    fn lenient_json_parse_defaults_to_linear() {
        let parsed = EasingDescriptor::from_json_value(&serde_json::json!({ "type": "wobble" }));
        assert_eq!(parsed, EasingDescriptor::Linear);
        let parsed = EasingDescriptor::from_json_value(&serde_json::json!(42));
        assert_eq!(parsed, EasingDescriptor::Linear);
        let parsed = EasingDescriptor::from_json_value(
            &serde_json::json!({ "type": "cubic", "mode": "out" }),
        );
        assert_eq!(
            parsed,
            EasingDescriptor::Cubic {
                mode: Some(EasingMode::Out)
            }
        );
    }

    #[test]
    fn malformed_parameters_default_individually() {
        let parsed = EasingDescriptor::from_json_value(
            &serde_json::json!({ "type": "bounce", "bounces": "many", "decay": 0.25 }),
        );
        assert_eq!(
            parsed,
            EasingDescriptor::Bounce {
                bounces: None,
                decay: Some(0.25)
            }
        );
        assert_eq!(
            EasingPreset::from_descriptor(&parsed),
            EasingPreset::Bounce {
                bounces: DEFAULT_BOUNCES,
                decay: 0.25
            }
        );

        let parsed = EasingDescriptor::from_json_value(
            &serde_json::json!({ "type": "ease", "power": 2, "mode": "sideways" }),
        );
        assert_eq!(
            parsed,
            EasingDescriptor::Ease {
                power: Some(2.0),
                mode: None
            }
        );
    }

    #[test]
    fn encode_decode_preserves_normalized_presets() {
        let presets = [
            EasingPreset::Linear,
            EasingPreset::Ease {
                power: 2.5,
                mode: EasingMode::In,
            },
            EasingPreset::Exponential {
                exponent: 7.0,
                mode: EasingMode::Out,
            },
            EasingPreset::Quadratic {
                mode: EasingMode::InOut,
            },
            EasingPreset::Cubic {
                mode: EasingMode::Out,
            },
            EasingPreset::Sine {
                mode: EasingMode::In,
                amplitude: 1.5,
            },
            EasingPreset::Bounce {
                bounces: 4.0,
                decay: 0.25,
            },
            EasingPreset::Back { overshoot: 2.0 },
        ];
        for preset in presets {
            let [id, p0, p1, p2] = preset.encode();
            assert_eq!(EasingPreset::decode(id, p0, p1, p2), preset);
        }
    }

    #[test]
    fn exponential_endpoints_are_exact() {
        for mode in [EasingMode::In, EasingMode::Out, EasingMode::InOut] {
            let preset = EasingPreset::Exponential {
                exponent: DEFAULT_EXPONENT,
                mode,
            };
            assert_eq!(preset.apply(0.0), 0.0);
            assert_eq!(preset.apply(1.0), 1.0);
        }
    }
}

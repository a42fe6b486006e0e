//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How [`SpriteLayer::step`](crate::SpriteLayer::step) evaluates live channels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationBackend {
    /// Evaluate each channel in place.
    #[default]
    Direct,
    /// Gather every live state into one packed batch and evaluate it in a single pass.
    Packed,
}

/// Configuration for the sprite layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial state of the global interpolation flag.
    pub interpolation_enabled: bool,
    pub backend: EvaluationBackend,
    /// Capacity hint for the sprite table and the packed scratch buffers.
    pub sprite_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpolation_enabled: true,
            backend: EvaluationBackend::Direct,
            sprite_capacity: 256,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

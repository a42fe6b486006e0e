//! GeoSprite interpolation core (renderer-agnostic)
//!
//! Time-based transitions for geo-anchored sprites: location, composite
//! rotation, radial offset and opacity. The host drives everything by calling
//! [`SpriteLayer::step`] once per render frame and keeps scheduling frames
//! while it returns true.

pub mod batch;
pub mod channel;
pub mod clock;
pub mod config;
pub mod easing;
pub mod error;
pub mod geo;
pub mod interp;
pub mod layer;
pub mod math;
pub mod rotation;
pub mod sprite;

// Re-exports for consumers (renderers, hosts)
pub use batch::{process_interpolations, BatchCounts, BatchResults, InterpolationBatch};
pub use channel::Channel;
pub use clock::{Clock, MonotonicClock};
pub use config::{EngineConfig, EvaluationBackend};
pub use easing::{EasingDescriptor, EasingMode, EasingPreset, ResolvedEasing};
pub use error::{BatchError, InterpError, Result};
pub use geo::GeoLocation;
pub use interp::{
    Angle, Creation, Evaluation, Geo, InterpKind, InterpolationMode, InterpolationOptions,
    InterpolationState, Opacity, Progress, Scalar,
};
pub use layer::{SpriteCommand, SpriteLayer};
pub use rotation::RotationChannel;
pub use sprite::{
    ChannelKind, ChannelMask, ImageId, ImageInit, ImageInterpolation, ImageUpdate, Sprite,
    SpriteImage, SpriteImageOffset, SpriteInit, SpriteUpdate,
};

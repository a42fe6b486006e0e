//! Sprite entities: one location channel plus per-image rotation, offset and
//! opacity channels, stepped in a fixed order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::batch::{BatchCursor, BatchResults, InterpolationBatch};
use crate::channel::Channel;
use crate::geo::{bearing_deg, distance_meters, GeoLocation};
use crate::interp::{Angle, Geo, InterpolationOptions, Opacity, Scalar};
use crate::rotation::RotationChannel;

/// Image slot key. Images of one sprite are ordered by sub-layer, then order.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ImageId {
    pub sub_layer: i32,
    pub order: i32,
}

impl ImageId {
    pub fn new(sub_layer: i32, order: i32) -> Self {
        Self { sub_layer, order }
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.sub_layer, self.order)
    }
}

/// Radial offset of an image from its sprite's anchor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpriteImageOffset {
    pub offset_meters: f64,
    pub offset_deg: f64,
}

/// Per-attribute interpolation options carried by an image command. A missing
/// entry writes that attribute immediately.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageInterpolation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_deg: Option<InterpolationOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_deg: Option<InterpolationOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_meters: Option<InterpolationOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<InterpolationOptions>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageInit {
    pub rotate_deg: f64,
    pub offset: SpriteImageOffset,
    pub opacity: f64,
    pub auto_rotation: bool,
    pub auto_rotation_min_distance_meters: f64,
}

impl Default for ImageInit {
    fn default() -> Self {
        Self {
            rotate_deg: 0.0,
            offset: SpriteImageOffset::default(),
            opacity: 1.0,
            auto_rotation: false,
            auto_rotation_min_distance_meters: 0.0,
        }
    }
}

/// Partial image update. Only the present fields are commanded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<SpriteImageOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_rotation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_rotation_min_distance_meters: Option<f64>,
    pub interpolation: ImageInterpolation,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpriteInit {
    pub location: GeoLocation,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpriteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<InterpolationOptions>,
}

/// Animatable attribute of a sprite, in evaluation order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Location,
    Rotation,
    OffsetHeading,
    OffsetDistance,
    Opacity,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 5] = [
        ChannelKind::Location,
        ChannelKind::Rotation,
        ChannelKind::OffsetHeading,
        ChannelKind::OffsetDistance,
        ChannelKind::Opacity,
    ];

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of channel kinds excluded from a step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChannelMask(u8);

impl ChannelMask {
    pub const NONE: ChannelMask = ChannelMask(0);

    pub fn only(kind: ChannelKind) -> Self {
        Self(kind.bit())
    }

    pub fn with(self, kind: ChannelKind) -> Self {
        Self(self.0 | kind.bit())
    }

    #[inline]
    pub fn contains(self, kind: ChannelKind) -> bool {
        self.0 & kind.bit() != 0
    }
}

impl FromIterator<ChannelKind> for ChannelMask {
    fn from_iter<I: IntoIterator<Item = ChannelKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

fn min_distance(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[derive(Debug)]
pub struct SpriteImage {
    rotation: RotationChannel,
    offset_deg: Channel<Angle>,
    offset_meters: Channel<Scalar>,
    opacity: Channel<Opacity>,
    auto_rotation: bool,
    auto_rotation_min_distance_meters: f64,
    heading_anchor: GeoLocation,
}

impl SpriteImage {
    fn new(init: &ImageInit, anchor: GeoLocation) -> Self {
        Self {
            rotation: RotationChannel::new(init.rotate_deg, 0.0),
            offset_deg: Channel::new(init.offset.offset_deg),
            offset_meters: Channel::new(init.offset.offset_meters),
            opacity: Channel::new(init.opacity),
            auto_rotation: init.auto_rotation,
            auto_rotation_min_distance_meters: min_distance(init.auto_rotation_min_distance_meters),
            heading_anchor: anchor,
        }
    }

    #[inline]
    pub fn rotation(&self) -> &RotationChannel {
        &self.rotation
    }

    #[inline]
    pub fn offset_deg(&self) -> &Channel<Angle> {
        &self.offset_deg
    }

    #[inline]
    pub fn offset_meters(&self) -> &Channel<Scalar> {
        &self.offset_meters
    }

    #[inline]
    pub fn opacity(&self) -> &Channel<Opacity> {
        &self.opacity
    }

    #[inline]
    pub fn auto_rotation(&self) -> bool {
        self.auto_rotation
    }

    #[inline]
    pub fn heading_anchor(&self) -> &GeoLocation {
        &self.heading_anchor
    }

    /// Displayed rotation, in `[0, 360)`.
    #[inline]
    pub fn displayed_rotation_deg(&self) -> f64 {
        self.rotation.displayed_deg()
    }

    pub fn is_animating(&self) -> bool {
        self.rotation.is_animating()
            || self.offset_deg.is_animating()
            || self.offset_meters.is_animating()
            || self.opacity.is_animating()
    }

    /// Apply an update. `immediate` forces every attribute to bypass
    /// interpolation. Returns true when any attribute started animating.
    pub(crate) fn apply(&mut self, update: &ImageUpdate, immediate: bool) -> bool {
        let options = |options: &Option<InterpolationOptions>| {
            if immediate {
                None
            } else {
                options.clone()
            }
        };
        let interpolation = &update.interpolation;
        let mut animating = false;

        if let Some(enabled) = update.auto_rotation {
            if self.auto_rotation && !enabled {
                self.rotation.set_base(0.0);
            }
            self.auto_rotation = enabled;
        }
        if let Some(distance) = update.auto_rotation_min_distance_meters {
            self.auto_rotation_min_distance_meters = min_distance(distance);
        }
        if let Some(rotate_deg) = update.rotate_deg {
            animating |= self
                .rotation
                .set_manual(rotate_deg, options(&interpolation.rotate_deg).as_ref());
        }
        if let Some(offset) = update.offset {
            animating |= self
                .offset_deg
                .apply_target(offset.offset_deg, options(&interpolation.offset_deg).as_ref());
            animating |= self.offset_meters.apply_target(
                offset.offset_meters,
                options(&interpolation.offset_meters).as_ref(),
            );
        }
        if let Some(opacity) = update.opacity {
            animating |= self
                .opacity
                .apply_target(opacity, options(&interpolation.opacity).as_ref());
        }
        animating
    }

    /// React to a new commanded sprite location.
    fn observe_location(&mut self, location: &GeoLocation) {
        if !self.auto_rotation {
            return;
        }
        let travelled = distance_meters(&self.heading_anchor, location);
        if travelled > 0.0 && travelled >= self.auto_rotation_min_distance_meters {
            self.rotation
                .set_base(bearing_deg(&self.heading_anchor, location));
            self.heading_anchor = *location;
        }
    }

    fn set_heading(&mut self, heading_deg: f64) {
        if self.auto_rotation {
            self.rotation.set_base(heading_deg);
        }
    }

    fn freeze(&mut self) {
        self.rotation.freeze();
        self.offset_deg.freeze();
        self.offset_meters.freeze();
        self.opacity.freeze();
    }

    fn step(&mut self, timestamp: f64, skip: ChannelMask) -> bool {
        let mut active = false;
        if !skip.contains(ChannelKind::Rotation) {
            active |= self.rotation.step(timestamp);
        }
        if !skip.contains(ChannelKind::OffsetHeading) {
            active |= self.offset_deg.step(timestamp);
        }
        if !skip.contains(ChannelKind::OffsetDistance) {
            active |= self.offset_meters.step(timestamp);
        }
        if !skip.contains(ChannelKind::Opacity) {
            active |= self.opacity.step(timestamp);
        }
        active
    }

    fn collect(&self, timestamp: f64, skip: ChannelMask, batch: &mut InterpolationBatch) {
        if let Some(state) = self.rotation.channel().state() {
            if !skip.contains(ChannelKind::Rotation) {
                batch.push_degree(state, timestamp);
            }
        }
        if let Some(state) = self.offset_deg.state() {
            if !skip.contains(ChannelKind::OffsetHeading) {
                batch.push_degree(state, timestamp);
            }
        }
        if let Some(state) = self.offset_meters.state() {
            if !skip.contains(ChannelKind::OffsetDistance) {
                batch.push_distance(state, timestamp);
            }
        }
        if let Some(state) = self.opacity.state() {
            if !skip.contains(ChannelKind::Opacity) {
                batch.push_distance(state, timestamp);
            }
        }
    }

    fn apply_results(
        &mut self,
        skip: ChannelMask,
        results: &BatchResults<'_>,
        cursor: &mut BatchCursor,
    ) -> bool {
        let mut active = false;
        if self.rotation.is_animating() && !skip.contains(ChannelKind::Rotation) {
            let evaluation = results.degree(cursor.next_degree());
            active |= self.rotation.channel_mut().apply_evaluation(evaluation);
        }
        if self.offset_deg.is_animating() && !skip.contains(ChannelKind::OffsetHeading) {
            let evaluation = results.degree(cursor.next_degree());
            active |= self.offset_deg.apply_evaluation(evaluation);
        }
        if self.offset_meters.is_animating() && !skip.contains(ChannelKind::OffsetDistance) {
            let evaluation = results.distance(cursor.next_distance());
            active |= self.offset_meters.apply_evaluation(evaluation);
        }
        if self.opacity.is_animating() && !skip.contains(ChannelKind::Opacity) {
            let evaluation = results.distance(cursor.next_distance());
            active |= self.opacity.apply_evaluation(evaluation);
        }
        active
    }
}

/// One geo-anchored entity and its images.
#[derive(Debug)]
pub struct Sprite {
    id: String,
    location: Channel<Geo>,
    images: BTreeMap<ImageId, SpriteImage>,
}

impl Sprite {
    pub fn new(id: impl Into<String>, init: &SpriteInit) -> Self {
        Self {
            id: id.into(),
            location: Channel::new(init.location),
            images: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn location(&self) -> &Channel<Geo> {
        &self.location
    }

    pub fn image(&self, id: ImageId) -> Option<&SpriteImage> {
        self.images.get(&id)
    }

    pub(crate) fn image_mut(&mut self, id: ImageId) -> Option<&mut SpriteImage> {
        self.images.get_mut(&id)
    }

    /// Images in evaluation order.
    pub fn images(&self) -> impl Iterator<Item = (&ImageId, &SpriteImage)> {
        self.images.iter()
    }

    pub fn is_animating(&self) -> bool {
        self.location.is_animating() || self.images.values().any(SpriteImage::is_animating)
    }

    /// Attach an image, replacing any image already in that slot. The heading
    /// anchor starts at the last commanded location.
    pub(crate) fn insert_image(&mut self, id: ImageId, init: &ImageInit) -> Option<SpriteImage> {
        let anchor = self
            .location
            .last_command()
            .copied()
            .unwrap_or(*self.location.current());
        self.images.insert(id, SpriteImage::new(init, anchor))
    }

    pub(crate) fn remove_image(&mut self, id: ImageId) -> Option<SpriteImage> {
        self.images.remove(&id)
    }

    /// Command the sprite location. Returns true when the location started animating.
    pub(crate) fn apply(&mut self, update: &SpriteUpdate, immediate: bool) -> bool {
        let Some(location) = update.location else {
            return false;
        };
        let options = if immediate {
            None
        } else {
            update.interpolation.as_ref()
        };
        let animating = self.location.apply_target(location, options);
        let commanded = self
            .location
            .last_command()
            .copied()
            .unwrap_or(location);
        for image in self.images.values_mut() {
            image.observe_location(&commanded);
        }
        animating
    }

    /// Push an externally derived heading to every auto-rotating image.
    pub(crate) fn set_heading(&mut self, heading_deg: f64) {
        for image in self.images.values_mut() {
            image.set_heading(heading_deg);
        }
    }

    /// Capture every displayed value as the resting value and drop all transitions.
    pub(crate) fn freeze(&mut self) {
        self.location.freeze();
        for image in self.images.values_mut() {
            image.freeze();
        }
    }

    /// Step every non-skipped channel: location first, then each image in
    /// ascending [`ImageId`] order. Returns true while anything is animating.
    pub fn step(&mut self, timestamp: f64, skip: ChannelMask) -> bool {
        let mut active = false;
        if !skip.contains(ChannelKind::Location) {
            active |= self.location.step(timestamp);
        }
        for image in self.images.values_mut() {
            active |= image.step(timestamp, skip);
        }
        // Skipped channels that still hold a state keep the sprite alive.
        active || self.is_animating()
    }

    pub(crate) fn collect(&self, timestamp: f64, skip: ChannelMask, batch: &mut InterpolationBatch) {
        if let Some(state) = self.location.state() {
            if !skip.contains(ChannelKind::Location) {
                batch.push_location(state, timestamp);
            }
        }
        for image in self.images.values() {
            image.collect(timestamp, skip, batch);
        }
    }

    pub(crate) fn apply_results(
        &mut self,
        skip: ChannelMask,
        results: &BatchResults<'_>,
        cursor: &mut BatchCursor,
    ) -> bool {
        let mut active = false;
        if self.location.is_animating() && !skip.contains(ChannelKind::Location) {
            let evaluation = results.location(cursor.next_location());
            active |= self.location.apply_evaluation(evaluation);
        }
        for image in self.images.values_mut() {
            active |= image.apply_results(skip, results, cursor);
        }
        active || self.is_animating()
    }
}

//! Sprite layer: owns every sprite, applies commands and steps all channels
//! once per render frame.
//!
//! The layer has no scheduler of its own. The host calls [`SpriteLayer::step`]
//! with the frame timestamp and keeps scheduling frames while it returns true.

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::batch::{process_interpolations, BatchCursor, BatchResults, InterpolationBatch};
use crate::clock::Clock;
use crate::config::{EngineConfig, EvaluationBackend};
use crate::error::{BatchError, InterpError, Result};
use crate::sprite::{
    ChannelMask, ImageId, ImageInit, ImageUpdate, Sprite, SpriteImage, SpriteInit, SpriteUpdate,
};

/// Commands accepted by [`SpriteLayer::apply`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpriteCommand {
    AddSprite {
        id: String,
        #[serde(default)]
        init: SpriteInit,
    },
    RemoveSprite {
        id: String,
    },
    UpdateSprite {
        id: String,
        update: SpriteUpdate,
    },
    AddImage {
        sprite: String,
        image: ImageId,
        #[serde(default)]
        init: ImageInit,
    },
    RemoveImage {
        sprite: String,
        image: ImageId,
    },
    UpdateImage {
        sprite: String,
        image: ImageId,
        update: ImageUpdate,
    },
    SetHeading {
        sprite: String,
        #[serde(rename = "headingDeg")]
        heading_deg: f64,
    },
    SetInterpolationEnabled {
        enabled: bool,
    },
    SetPageVisible {
        visible: bool,
    },
}

#[derive(Debug)]
pub struct SpriteLayer {
    config: EngineConfig,
    sprites: IndexMap<String, Sprite>,
    interpolation_enabled: bool,
    page_visible: bool,
    batch: InterpolationBatch,
    params: Vec<f64>,
    results: Vec<f64>,
}

impl Default for SpriteLayer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SpriteLayer {
    pub fn new(config: EngineConfig) -> Self {
        let capacity = config.sprite_capacity;
        Self {
            interpolation_enabled: config.interpolation_enabled,
            page_visible: true,
            sprites: IndexMap::with_capacity(capacity),
            batch: if config.backend == EvaluationBackend::Packed {
                InterpolationBatch::with_capacity(capacity)
            } else {
                InterpolationBatch::default()
            },
            params: Vec::new(),
            results: Vec::new(),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn interpolation_enabled(&self) -> bool {
        self.interpolation_enabled
    }

    #[inline]
    pub fn page_visible(&self) -> bool {
        self.page_visible
    }

    /// True while commands are written immediately instead of animated.
    #[inline]
    pub fn bypasses_interpolation(&self) -> bool {
        !self.interpolation_enabled || !self.page_visible
    }

    pub fn sprite(&self, id: &str) -> Option<&Sprite> {
        self.sprites.get(id)
    }

    /// Sprites in insertion order.
    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.values()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn image(&self, sprite: &str, image: ImageId) -> Result<&SpriteImage> {
        self.sprite_ref(sprite)?
            .image(image)
            .ok_or_else(|| InterpError::UnknownImage {
                sprite: sprite.to_string(),
                image,
            })
    }

    /// True if any channel of any sprite holds a live transition.
    pub fn is_animating(&self) -> bool {
        self.sprites.values().any(Sprite::is_animating)
    }

    fn sprite_ref(&self, id: &str) -> Result<&Sprite> {
        self.sprites
            .get(id)
            .ok_or_else(|| InterpError::UnknownSprite { id: id.to_string() })
    }

    fn sprite_mut(&mut self, id: &str) -> Result<&mut Sprite> {
        self.sprites
            .get_mut(id)
            .ok_or_else(|| InterpError::UnknownSprite { id: id.to_string() })
    }

    fn image_mut(&mut self, sprite: &str, image: ImageId) -> Result<&mut SpriteImage> {
        self.sprite_mut(sprite)?
            .image_mut(image)
            .ok_or_else(|| InterpError::UnknownImage {
                sprite: sprite.to_string(),
                image,
            })
    }

    pub fn add_sprite(&mut self, id: impl Into<String>, init: &SpriteInit) -> Result<()> {
        let id = id.into();
        if self.sprites.contains_key(&id) {
            return Err(InterpError::DuplicateSprite { id });
        }
        debug!("sprite '{}': added at {:?}", id, init.location);
        let sprite = Sprite::new(id.clone(), init);
        self.sprites.insert(id, sprite);
        Ok(())
    }

    pub fn remove_sprite(&mut self, id: &str) -> Result<Sprite> {
        let sprite = self
            .sprites
            .shift_remove(id)
            .ok_or_else(|| InterpError::UnknownSprite { id: id.to_string() })?;
        debug!("sprite '{}': removed", id);
        Ok(sprite)
    }

    /// Returns true when the command started an animation.
    pub fn update_sprite(&mut self, id: &str, update: &SpriteUpdate) -> Result<bool> {
        let immediate = self.bypasses_interpolation();
        let animating = self.sprite_mut(id)?.apply(update, immediate);
        debug!(
            "sprite '{}': location {:?} ({})",
            id,
            update.location,
            if animating { "animated" } else { "immediate" }
        );
        Ok(animating)
    }

    /// Attach an image, replacing whatever occupied the slot.
    pub fn add_image(&mut self, sprite: &str, image: ImageId, init: &ImageInit) -> Result<()> {
        let replaced = self.sprite_mut(sprite)?.insert_image(image, init).is_some();
        debug!(
            "sprite '{}': image {} {}",
            sprite,
            image,
            if replaced { "replaced" } else { "added" }
        );
        Ok(())
    }

    pub fn remove_image(&mut self, sprite: &str, image: ImageId) -> Result<()> {
        self.sprite_mut(sprite)?
            .remove_image(image)
            .ok_or_else(|| InterpError::UnknownImage {
                sprite: sprite.to_string(),
                image,
            })?;
        debug!("sprite '{}': image {} removed", sprite, image);
        Ok(())
    }

    /// Returns true when any attribute started animating.
    pub fn update_image(&mut self, sprite: &str, image: ImageId, update: &ImageUpdate) -> Result<bool> {
        let immediate = self.bypasses_interpolation();
        let animating = self.image_mut(sprite, image)?.apply(update, immediate);
        debug!(
            "sprite '{}': image {} updated ({})",
            sprite,
            image,
            if animating { "animated" } else { "immediate" }
        );
        Ok(animating)
    }

    /// Push an externally derived heading to the sprite's auto-rotating images.
    pub fn set_heading(&mut self, sprite: &str, heading_deg: f64) -> Result<()> {
        self.sprite_mut(sprite)?.set_heading(heading_deg);
        Ok(())
    }

    /// Global pause. While disabled, [`step`](Self::step) does nothing and
    /// latched start timestamps are left alone.
    pub fn set_interpolation_enabled(&mut self, enabled: bool) {
        if self.interpolation_enabled != enabled {
            debug!("interpolation {}", if enabled { "enabled" } else { "paused" });
        }
        self.interpolation_enabled = enabled;
    }

    /// Host visibility signal. Becoming hidden captures every displayed value
    /// as its resting value and drops all transitions.
    pub fn set_page_visible(&mut self, visible: bool) {
        if self.page_visible == visible {
            return;
        }
        self.page_visible = visible;
        if !visible {
            for sprite in self.sprites.values_mut() {
                sprite.freeze();
            }
        }
        debug!("page {}", if visible { "visible" } else { "hidden, animations frozen" });
    }

    pub fn apply(&mut self, command: SpriteCommand) -> Result<()> {
        match command {
            SpriteCommand::AddSprite { id, init } => self.add_sprite(id, &init),
            SpriteCommand::RemoveSprite { id } => self.remove_sprite(&id).map(|_| ()),
            SpriteCommand::UpdateSprite { id, update } => {
                self.update_sprite(&id, &update).map(|_| ())
            }
            SpriteCommand::AddImage {
                sprite,
                image,
                init,
            } => self.add_image(&sprite, image, &init),
            SpriteCommand::RemoveImage { sprite, image } => self.remove_image(&sprite, image),
            SpriteCommand::UpdateImage {
                sprite,
                image,
                update,
            } => self.update_image(&sprite, image, &update).map(|_| ()),
            SpriteCommand::SetHeading {
                sprite,
                heading_deg,
            } => self.set_heading(&sprite, heading_deg),
            SpriteCommand::SetInterpolationEnabled { enabled } => {
                self.set_interpolation_enabled(enabled);
                Ok(())
            }
            SpriteCommand::SetPageVisible { visible } => {
                self.set_page_visible(visible);
                Ok(())
            }
        }
    }

    /// Apply commands in order, stopping at the first failure.
    pub fn apply_all(&mut self, commands: impl IntoIterator<Item = SpriteCommand>) -> Result<()> {
        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    /// Step every channel at `timestamp`. Returns true while another frame is needed.
    pub fn step(&mut self, timestamp: f64) -> bool {
        self.step_with(timestamp, ChannelMask::NONE)
    }

    pub fn step_now(&mut self, clock: &impl Clock) -> bool {
        self.step(clock.now_ms())
    }

    /// Step every channel not in `skip`. Returns false without touching
    /// anything while paused or hidden.
    pub fn step_with(&mut self, timestamp: f64, skip: ChannelMask) -> bool {
        if self.bypasses_interpolation() {
            return false;
        }
        let active = match self.config.backend {
            EvaluationBackend::Direct => self.step_direct(timestamp, skip),
            EvaluationBackend::Packed => match self.step_packed(timestamp, skip) {
                Ok(active) => active,
                Err(err) => {
                    warn!("packed evaluation rejected ({err}); stepping directly");
                    self.step_direct(timestamp, skip)
                }
            },
        };
        trace!(
            "step @{}: {} sprites, {}",
            timestamp,
            self.sprites.len(),
            if active { "animating" } else { "idle" }
        );
        active
    }

    fn step_direct(&mut self, timestamp: f64, skip: ChannelMask) -> bool {
        let mut active = false;
        for sprite in self.sprites.values_mut() {
            active |= sprite.step(timestamp, skip);
        }
        active
    }

    fn step_packed(
        &mut self,
        timestamp: f64,
        skip: ChannelMask,
    ) -> std::result::Result<bool, BatchError> {
        self.batch.clear();
        for sprite in self.sprites.values() {
            sprite.collect(timestamp, skip, &mut self.batch);
        }
        let counts = self.batch.counts();
        if counts.is_empty() {
            return Ok(self.is_animating());
        }
        self.batch.write_params(&mut self.params);
        self.results.clear();
        self.results.resize(counts.results_len(), 0.0);
        let counts = process_interpolations(&self.params, &mut self.results)?;
        let results = BatchResults::new(counts, &self.results)?;

        let mut cursor = BatchCursor::default();
        let mut active = false;
        for sprite in self.sprites.values_mut() {
            active |= sprite.apply_results(skip, &results, &mut cursor);
        }
        debug_assert!(cursor.is_exhausted(&counts), "packed results left unread");
        trace!(
            "packed step: {} distance, {} degree, {} location records",
            counts.distance,
            counts.degree,
            counts.location
        );
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::{EasingPreset, DEFAULT_BOUNCES, DEFAULT_BOUNCE_DECAY};
    use crate::geo::GeoLocation;
    use crate::interp::InterpolationOptions;
    use crate::sprite::ImageInterpolation;

    fn layer_with_sprite() -> SpriteLayer {
        let mut layer = SpriteLayer::default();
        layer
            .add_sprite(
                "bus",
                &SpriteInit {
                    location: GeoLocation::new(0.0, 0.0),
                },
            )
            .expect("add sprite");
        layer
    }

    fn move_to(lng: f64, duration_ms: f64) -> SpriteUpdate {
        SpriteUpdate {
            location: Some(GeoLocation::new(lng, 0.0)),
            interpolation: Some(InterpolationOptions::new(duration_ms)),
        }
    }

    #[test]
    fn duplicate_and_unknown_ids_are_rejected() {
        let mut layer = layer_with_sprite();
        assert!(matches!(
            layer.add_sprite("bus", &SpriteInit::default()),
            Err(InterpError::DuplicateSprite { .. })
        ));
        assert!(matches!(
            layer.update_sprite("tram", &SpriteUpdate::default()),
            Err(InterpError::UnknownSprite { .. })
        ));
        assert!(matches!(
            layer.remove_image("bus", ImageId::new(0, 0)),
            Err(InterpError::UnknownImage { .. })
        ));
    }

    #[test]
    fn step_reports_activity_until_done() {
        let mut layer = layer_with_sprite();
        assert!(layer.update_sprite("bus", &move_to(10.0, 100.0)).expect("update"));
        assert!(layer.step(0.0));
        assert!(layer.step(50.0));
        let lng = layer.sprite("bus").map(|s| s.location().current().lng);
        assert_eq!(lng, Some(5.0));
        assert!(!layer.step(100.0));
        assert!(!layer.is_animating());
    }

    #[test]
    fn pause_freezes_without_advancing_latches() {
        let mut layer = layer_with_sprite();
        layer.update_sprite("bus", &move_to(10.0, 100.0)).expect("update");
        layer.set_interpolation_enabled(false);
        assert!(!layer.step(0.0));
        let state_start = layer
            .sprite("bus")
            .and_then(|s| s.location().state())
            .and_then(|state| state.start_timestamp());
        assert_eq!(state_start, None);

        layer.set_interpolation_enabled(true);
        assert!(layer.step(20.0));
        assert!(layer.step(70.0));
        let lng = layer.sprite("bus").map(|s| s.location().current().lng);
        assert_eq!(lng, Some(5.0));
    }

    #[test]
    fn commands_while_paused_are_immediate() {
        let mut layer = layer_with_sprite();
        layer.update_sprite("bus", &move_to(10.0, 100.0)).expect("update");
        layer.step(0.0);
        layer.set_interpolation_enabled(false);
        assert!(!layer.update_sprite("bus", &move_to(3.0, 100.0)).expect("update"));
        let sprite = layer.sprite("bus").expect("sprite");
        assert_eq!(sprite.location().current().lng, 3.0);
        assert!(!sprite.is_animating());
    }

    #[test]
    fn hiding_the_page_captures_current_values() {
        let mut layer = layer_with_sprite();
        layer
            .add_image("bus", ImageId::new(0, 0), &ImageInit::default())
            .expect("add image");
        let fade = ImageUpdate {
            opacity: Some(0.0),
            interpolation: ImageInterpolation {
                opacity: Some(InterpolationOptions::new(100.0)),
                ..ImageInterpolation::default()
            },
            ..ImageUpdate::default()
        };
        layer.update_image("bus", ImageId::new(0, 0), &fade).expect("fade");
        layer.step(0.0);
        layer.step(25.0);
        layer.set_page_visible(false);
        assert!(!layer.is_animating());
        layer.set_page_visible(true);
        assert!(!layer.step(10_000.0));
        let image = layer.image("bus", ImageId::new(0, 0)).expect("image");
        assert!((*image.opacity().current() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn commands_parse_from_json() {
        let commands: Vec<SpriteCommand> = serde_json::from_str(
            r#"[
                { "AddSprite": { "id": "a", "init": { "location": { "lng": 1, "lat": 2 } } } },
                { "AddImage": { "sprite": "a", "image": { "subLayer": 0, "order": 1 } } },
                { "SetPageVisible": { "visible": false } }
            ]"#,
        )
        .expect("commands");
        let mut layer = SpriteLayer::default();
        layer.apply_all(commands).expect("apply");
        assert!(!layer.page_visible());
        assert!(layer.image("a", ImageId::new(0, 1)).is_ok());
    }

    #[test]
    fn unknown_easing_in_a_command_falls_back_to_linear() {
        let commands: Vec<SpriteCommand> = serde_json::from_str(
            r#"[
                { "UpdateSprite": { "id": "bus", "update": {
                    "location": { "lng": 10, "lat": 0 },
                    "interpolation": { "durationMs": 100, "easing": { "type": "wobble" } }
                } } },
                { "UpdateSprite": { "id": "bus", "update": {
                    "location": { "lng": 20, "lat": 0 },
                    "interpolation": { "durationMs": 100, "easing": { "type": "bounce", "bounces": "many" } }
                } } }
            ]"#,
        )
        .expect("lenient easing");

        let mut layer = layer_with_sprite();
        layer.apply(commands[0].clone()).expect("apply");
        let state = layer.sprite("bus").expect("sprite").location().state().expect("animating");
        assert_eq!(state.easing().preset(), EasingPreset::Linear);
        layer.step(0.0);
        layer.step(50.0);
        let lng = layer.sprite("bus").expect("sprite").location().current().lng;
        assert!((lng - 5.0).abs() < 1e-9);

        layer.apply(commands[1].clone()).expect("apply");
        let state = layer.sprite("bus").expect("sprite").location().state().expect("animating");
        assert_eq!(
            state.easing().preset(),
            EasingPreset::Bounce {
                bounces: DEFAULT_BOUNCES,
                decay: DEFAULT_BOUNCE_DECAY
            }
        );
    }
}

use geosprite_interp_core::{
    ChannelKind, ChannelMask, EasingDescriptor, EasingMode, EngineConfig, EvaluationBackend,
    GeoLocation, ImageId, ImageInit, ImageInterpolation, ImageUpdate, InterpolationMode,
    InterpolationOptions, SpriteImageOffset, SpriteInit, SpriteLayer, SpriteUpdate,
};

fn easing_for(i: usize) -> EasingDescriptor {
    match i % 8 {
        0 => EasingDescriptor::Linear,
        1 => EasingDescriptor::Ease {
            power: Some(2.0),
            mode: Some(EasingMode::InOut),
        },
        2 => EasingDescriptor::Exponential {
            exponent: Some(3.0),
            mode: Some(EasingMode::Out),
        },
        3 => EasingDescriptor::Quadratic {
            mode: Some(EasingMode::In),
        },
        4 => EasingDescriptor::Cubic { mode: None },
        5 => EasingDescriptor::Sine {
            mode: None,
            amplitude: None,
        },
        6 => EasingDescriptor::Bounce {
            bounces: Some(2.0),
            decay: None,
        },
        _ => EasingDescriptor::Back {
            overshoot: Some(1.2),
        },
    }
}

fn options(i: usize, duration_ms: f64) -> InterpolationOptions {
    let mode = if i % 3 == 0 {
        InterpolationMode::Feedforward
    } else {
        InterpolationMode::Feedback
    };
    InterpolationOptions {
        mode,
        duration_ms,
        easing: Some(easing_for(i)),
    }
}

fn populate(layer: &mut SpriteLayer, count: usize) {
    for i in 0..count {
        let id = format!("s{i}");
        let f = i as f64;
        layer
            .add_sprite(
                id.clone(),
                &SpriteInit {
                    location: GeoLocation::new(139.0 + f * 0.001, 35.0 - f * 0.001),
                },
            )
            .expect("add sprite");
        for order in 0..2 {
            layer
                .add_image(
                    &id,
                    ImageId::new(order - 1, order),
                    &ImageInit {
                        rotate_deg: f * 13.0,
                        offset: SpriteImageOffset {
                            offset_meters: f,
                            offset_deg: 350.0,
                        },
                        opacity: 0.5,
                        auto_rotation: order == 0,
                        auto_rotation_min_distance_meters: 5.0,
                    },
                )
                .expect("add image");
        }
    }
}

fn command(layer: &mut SpriteLayer, count: usize, round: usize) {
    for i in 0..count {
        let id = format!("s{i}");
        let f = (i + round) as f64;
        let location = if i % 2 == 0 {
            GeoLocation::new(139.0 + f * 0.002, 35.0 + f * 0.0015)
        } else {
            GeoLocation::with_altitude(139.0 - f * 0.001, 35.0, f * 3.0)
        };
        layer
            .update_sprite(
                &id,
                &SpriteUpdate {
                    location: Some(location),
                    interpolation: Some(options(i + round, 120.0 + (i % 5) as f64 * 40.0)),
                },
            )
            .expect("update sprite");
        for order in 0..2 {
            let update = ImageUpdate {
                rotate_deg: Some(f * 47.0),
                offset: Some(SpriteImageOffset {
                    offset_meters: f * 0.5,
                    offset_deg: 10.0 + f * 90.0,
                }),
                opacity: Some(if i % 2 == 0 { 1.3 } else { 0.1 }),
                interpolation: ImageInterpolation {
                    rotate_deg: Some(options(i + 1, 200.0)),
                    offset_deg: Some(options(i + 2, 90.0)),
                    offset_meters: (i % 4 != 0).then(|| options(i + 3, 150.0)),
                    opacity: Some(options(i + 4, 60.0)),
                },
                ..ImageUpdate::default()
            };
            layer
                .update_image(&id, ImageId::new(order - 1, order), &update)
                .expect("update image");
        }
    }
}

fn snapshot(layer: &SpriteLayer) -> Vec<f64> {
    let mut values = Vec::new();
    for sprite in layer.sprites() {
        let location = sprite.location().current();
        values.extend([location.lng, location.lat, location.altitude_or_zero()]);
        for (_, image) in sprite.images() {
            values.extend([
                image.displayed_rotation_deg(),
                *image.offset_deg().current(),
                *image.offset_meters().current(),
                *image.opacity().current(),
            ]);
        }
    }
    values
}

fn layer(backend: EvaluationBackend) -> SpriteLayer {
    SpriteLayer::new(EngineConfig {
        backend,
        ..EngineConfig::default()
    })
}

#[test]
fn packed_backend_matches_direct_frame_by_frame() {
    const SPRITES: usize = 40;
    let mut direct = layer(EvaluationBackend::Direct);
    let mut packed = layer(EvaluationBackend::Packed);
    populate(&mut direct, SPRITES);
    populate(&mut packed, SPRITES);

    let mut timestamp = 1_000.0;
    for round in 0..3 {
        command(&mut direct, SPRITES, round);
        command(&mut packed, SPRITES, round);
        for _ in 0..25 {
            timestamp += 16.0;
            let a = direct.step(timestamp);
            let b = packed.step(timestamp);
            assert_eq!(a, b, "activity diverged at {timestamp}");
            assert_eq!(snapshot(&direct), snapshot(&packed), "values diverged at {timestamp}");
        }
    }
    assert!(!direct.is_animating());
    assert!(!packed.is_animating());
}

#[test]
fn skip_masks_apply_to_both_backends() {
    let mut direct = layer(EvaluationBackend::Direct);
    let mut packed = layer(EvaluationBackend::Packed);
    populate(&mut direct, 6);
    populate(&mut packed, 6);
    command(&mut direct, 6, 1);
    command(&mut packed, 6, 1);

    let skip: ChannelMask = [ChannelKind::Location, ChannelKind::OffsetHeading]
        .into_iter()
        .collect();
    for step in 0..20 {
        let timestamp = step as f64 * 25.0;
        assert_eq!(
            direct.step_with(timestamp, skip),
            packed.step_with(timestamp, skip)
        );
        assert_eq!(snapshot(&direct), snapshot(&packed));
    }
    // Skipped channels are still pending.
    assert!(direct.is_animating());
    assert!(direct
        .sprites()
        .all(|sprite| sprite.location().state().is_some()));
}

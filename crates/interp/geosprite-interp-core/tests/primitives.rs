use geosprite_interp_core::math::normalize_delta_deg;
use geosprite_interp_core::{
    Angle, Channel, Geo, GeoLocation, InterpKind, InterpolationOptions, InterpolationState,
    Opacity, Scalar,
};

fn approx(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

#[test]
fn shortest_path_never_exceeds_half_turn() {
    let options = InterpolationOptions::new(100.0);
    for current in (-720..=720).step_by(15) {
        for target in (-720..=720).step_by(35) {
            let (current, target) = (current as f64 + 0.25, target as f64);
            let creation = InterpolationState::<Angle>::create(&current, &target, None, &options);
            let travelled = creation.state.travel_target() - current;
            assert!(
                travelled.abs() <= 180.0,
                "{current} -> {target} travelled {travelled}"
            );
            assert!(approx(
                Angle::present(creation.state.travel_target()),
                Angle::present(&target),
                1e-9
            ));
        }
    }

    let quarter = InterpolationState::<Angle>::create(&0.0, &270.0, None, &options);
    assert_eq!(*quarter.state.travel_target() - 0.0, -90.0);
}

#[test]
fn half_turn_tie_is_deterministic() {
    assert_eq!(normalize_delta_deg(180.0), 180.0);
    assert_eq!(normalize_delta_deg(-180.0), 180.0);
    assert_eq!(normalize_delta_deg(540.0), 180.0);
    let creation = InterpolationState::<Angle>::create(
        &10.0,
        &190.0,
        None,
        &InterpolationOptions::new(100.0),
    );
    assert_eq!(*creation.state.travel_target(), 190.0);
}

#[test]
fn completion_is_sticky_for_every_kind() {
    let options = InterpolationOptions::new(80.0);
    let mut scalar = InterpolationState::<Scalar>::create(&1.0, &4.0, None, &options).state;
    let mut angle = InterpolationState::<Angle>::create(&300.0, &20.0, None, &options).state;
    let mut geo = InterpolationState::<Geo>::create(
        &GeoLocation::new(0.0, 0.0),
        &GeoLocation::new(0.5, -0.5),
        None,
        &options,
    )
    .state;
    scalar.step(10.0);
    angle.step(10.0);
    geo.step(10.0);

    let mut timestamps = vec![90.0, 90.5, 1_000.0, 1e12, f64::INFINITY];
    timestamps.sort_by(f64::total_cmp);
    for ts in timestamps {
        let s = scalar.evaluate(ts);
        let a = angle.evaluate(ts);
        let g = geo.evaluate(ts);
        assert!(s.completed && a.completed && g.completed, "at {ts}");
        assert_eq!(s.value, 4.0);
        assert_eq!(a.value, 20.0);
        assert_eq!(g.value, GeoLocation::new(0.5, -0.5));
    }
}

#[test]
fn zero_duration_snaps_at_creation_timestamp() {
    let options = InterpolationOptions::new(0.0);
    let state = InterpolationState::<Angle>::create(&10.0, &200.0, None, &options).state;
    let evaluation = state.evaluate(0.0);
    assert!(evaluation.completed);
    assert_eq!(evaluation.value, 200.0);

    let state = InterpolationState::<Geo>::create(
        &GeoLocation::new(1.0, 1.0),
        &GeoLocation::new(2.0, 2.0),
        None,
        &options,
    )
    .state;
    assert_eq!(state.evaluate(-5.0).value, GeoLocation::new(2.0, 2.0));
}

#[test]
fn timestamps_before_start_clamp_to_from() {
    let mut state = InterpolationState::<Scalar>::create(
        &3.0,
        &9.0,
        None,
        &InterpolationOptions::new(100.0),
    )
    .state;
    state.step(500.0);
    for early in [499.0, 0.0, -1e6] {
        let evaluation = state.evaluate(early);
        assert!(!evaluation.completed);
        assert_eq!(evaluation.value, 3.0);
        assert_eq!(evaluation.effective_start, 500.0);
    }
}

#[test]
fn feedforward_doubles_the_last_step() {
    let scalar = InterpolationState::<Scalar>::create(
        &1.0,
        &2.0,
        Some(&1.0),
        &InterpolationOptions::feedforward(100.0),
    );
    assert_eq!(*scalar.state.travel_target(), 3.0);
    assert_eq!(*scalar.state.to(), 2.0);

    let previous = GeoLocation::with_altitude(1.0, 1.0, 5.0);
    let next = GeoLocation::with_altitude(2.0, 3.0, 7.0);
    let geo = InterpolationState::<Geo>::create(
        &previous,
        &next,
        Some(&previous),
        &InterpolationOptions::feedforward(100.0),
    );
    let path = *geo.state.travel_target();
    assert!(approx(path.lng, 3.0, 1e-12));
    assert!(approx(path.lat, 5.0, 1e-12));
    assert_eq!(path.z, Some(9.0));
    assert_eq!(*geo.state.to(), next);

    // Without altitude on either side, none is invented.
    let flat = InterpolationState::<Geo>::create(
        &GeoLocation::new(0.0, 0.0),
        &GeoLocation::new(1.0, 0.0),
        Some(&GeoLocation::new(0.0, 0.0)),
        &InterpolationOptions::feedforward(100.0),
    );
    assert_eq!(flat.state.travel_target().z, None);
}

#[test]
fn rotation_wrap_past_full_turn_keeps_forward_path() {
    let creation = InterpolationState::<Angle>::create(
        &359.0,
        &375.0,
        None,
        &InterpolationOptions::new(1_000.0),
    );
    assert!(creation.requires_interpolation);
    assert_eq!(*creation.state.to(), 375.0);

    let mut state = creation.state;
    state.step(0.0);
    let mid = state.evaluate(500.0);
    assert!(approx(mid.value, 367.0, 1e-9));
    assert!(approx(Angle::present(&mid.value), 7.0, 1e-9));
}

#[test]
fn opacity_fade_with_feedforward_overshoot_stays_clamped() {
    let mut opacity = Channel::<Opacity>::new(0.2);
    let options = InterpolationOptions::feedforward(200.0);
    opacity.apply_target(0.8, Some(&options));
    opacity.apply_target(1.2, Some(&options));
    opacity.step(0.0);
    let mut t = 0.0;
    while t < 200.0 {
        t += 16.0;
        opacity.step(t);
        let value = *opacity.current();
        assert!((0.0..=1.0).contains(&value), "opacity {value} at {t}");
    }
    assert!(!opacity.is_animating());
    assert_eq!(*opacity.current(), 1.0);
}

#[test]
fn non_finite_inputs_are_normalized() {
    let mut rotation = Channel::<Angle>::new(f64::NAN);
    assert_eq!(*rotation.current(), 0.0);
    assert!(!rotation.apply_target(f64::INFINITY, Some(&InterpolationOptions::new(100.0))));
    assert_eq!(*rotation.current(), 0.0);

    let mut distance = Channel::<Scalar>::new(5.0);
    assert!(!distance.apply_target(8.0, Some(&InterpolationOptions::new(f64::NAN))));
    assert_eq!(*distance.current(), 8.0);

    assert!(distance.apply_target(0.0, Some(&InterpolationOptions::new(100.0))));
    distance.step(0.0);
    assert!(!distance.step(f64::NAN));
    assert_eq!(*distance.current(), 0.0);
}

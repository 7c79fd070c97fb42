//! Integration tests for the animation module.

use proptest::prelude::*;
use reorderkit_core::animation::*;
use std::time::Duration;

const MS_100: Duration = Duration::from_millis(100);
const MS_200: Duration = Duration::from_millis(200);

#[test]
fn fade_duration_tracking() {
    let mut fade = Fade::new(MS_200);
    for _ in 0..200 {
        fade.tick(Duration::from_millis(1));
    }
    assert!(fade.is_complete(), "200x1ms should complete a 200ms fade");
    assert_eq!(fade.value(), 1.0);
}

#[test]
fn zero_duration_fade_completes_on_first_tick() {
    let mut fade = Fade::new(Duration::ZERO);
    assert!(!fade.is_complete());
    fade.tick(Duration::from_nanos(1));
    assert!(fade.is_complete());
}

#[test]
fn fade_interpolates_opacity() {
    let mut fade = Fade::new(MS_100);
    fade.tick(Duration::from_millis(50));
    let mid = fade.interpolate(0.0, 1.0);
    assert!((mid - 0.5).abs() < 1e-4, "linear fade midway: {mid}");
    assert_eq!(fade.interpolate(1.0, 1.0), 1.0);
}

#[test]
fn slide_reaches_target() {
    let mut slide = Slide::new(0, -3, MS_200);
    assert_eq!(slide.position(), 0);
    slide.tick(MS_200);
    assert!(slide.is_complete());
    assert_eq!(slide.position(), -3);
    assert_eq!(slide.target(), -3);
}

#[test]
fn slide_retarget_continues_from_current_offset() {
    let mut slide = Slide::new(0, 8, MS_200).easing(linear);
    slide.tick(MS_100);
    assert_eq!(slide.position(), 4);

    slide.retarget(0, MS_100);
    assert_eq!(slide.position(), 4, "retarget must not jump");
    slide.tick(Duration::from_millis(50));
    assert_eq!(slide.position(), 2);
    slide.tick(Duration::from_millis(50));
    assert_eq!(slide.position(), 0);
}

#[test]
fn settled_slide_is_complete() {
    let slide = Slide::settled(5);
    assert!(slide.is_complete());
    assert_eq!(slide.position(), 5);
}

#[test]
fn reset_restarts_slide() {
    let mut slide = Slide::new(0, 10, MS_100);
    slide.tick(MS_100);
    slide.reset();
    assert!(!slide.is_complete());
    assert_eq!(slide.position(), 0);
}

#[test]
fn named_easings_match_functions() {
    for easing in [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
    ] {
        assert_eq!(easing.apply(0.0), 0.0, "{easing:?} at 0");
        assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        assert_eq!(easing.apply(0.3), (easing.function())(0.3));
    }
    assert_eq!(Easing::default(), Easing::EaseOutCubic);
}

proptest! {
    #[test]
    fn easings_stay_in_unit_range(t in -1.0f32..2.0) {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
        ] {
            let v = easing.apply(t);
            prop_assert!((0.0..=1.0).contains(&v), "{:?}({}) = {}", easing, t, v);
        }
    }

    #[test]
    fn slide_position_stays_between_endpoints(
        from in -50i16..50,
        to in -50i16..50,
        ms in 0u64..400,
    ) {
        let mut slide = Slide::new(from, to, MS_200);
        slide.tick(Duration::from_millis(ms));
        let pos = slide.position();
        prop_assert!(pos >= from.min(to) && pos <= from.max(to));
    }
}

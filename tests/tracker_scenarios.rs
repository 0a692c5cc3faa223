use autotrack::{
    Advance, AutoTracker, CancelFlag, FrameFailure, MaskShape, MatchState, OwnedImage, Point,
    TargetPoint, TrackError, TrackId, TrackingMode,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FRAME: usize = 200;
const BORDER: usize = 24;

fn canvas(seed: u64) -> Vec<u8> {
    let size = FRAME + 2 * BORDER;
    let mut rng = StdRng::seed_from_u64(seed);
    (0..size * size).map(|_| rng.random_range(0..=255)).collect()
}

/// Frame whose content is the canvas moved by `(dx, dy)`.
fn shifted(canvas: &[u8], dx: isize, dy: isize) -> OwnedImage {
    let size = FRAME + 2 * BORDER;
    let mut data = Vec::with_capacity(FRAME * FRAME);
    for y in 0..FRAME {
        let sy = (y as isize + BORDER as isize - dy) as usize;
        for x in 0..FRAME {
            let sx = (x as isize + BORDER as isize - dx) as usize;
            data.push(canvas[sy * size + sx]);
        }
    }
    OwnedImage::new(data, FRAME, FRAME).unwrap()
}

fn moving(seed: u64, shifts: &[(isize, isize)]) -> Vec<OwnedImage> {
    let canvas = canvas(seed);
    shifts
        .iter()
        .map(|&(dx, dy)| shifted(&canvas, dx, dy))
        .collect()
}

fn unrelated(seed: u64) -> OwnedImage {
    shifted(&canvas(seed), 0, 0)
}

fn tracker(frames: Vec<OwnedImage>) -> AutoTracker<Vec<OwnedImage>> {
    let mut tracker = AutoTracker::new(frames);
    tracker.set_track(Some(TrackId(1)));
    tracker
}

fn assert_near(p: Point, x: f32, y: f32) {
    assert!(
        p.distance(Point::new(x, y)) <= 1.0,
        "expected near ({x}, {y}), got {p:?}"
    );
}

#[test]
fn ellipse_template_follows_shift() {
    let mut tracker = tracker(moving(1, &[(0, 0), (3, 1)]));
    assert_eq!(tracker.options().mask_shape(), MaskShape::Ellipse);
    assert_eq!(tracker.options().good_match(), 4.0);
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();

    let data = tracker.get_frame(1).unwrap();
    assert_eq!(data.state(), MatchState::GoodMatch);
    assert_near(data.location().unwrap(), 103.0, 101.0);
    assert_eq!(data.key_frame(), Some(0));
    assert_eq!(data.consecutive_failures(), 0);
}

#[test]
fn target_offset_is_preserved() {
    let mut tracker = tracker(moving(2, &[(0, 0), (3, 1), (6, 2)]));
    let key_frame = tracker
        .add_key_frame(TargetPoint::new(0, 110.0, 95.0), 100.0, 100.0)
        .unwrap();
    assert_eq!(key_frame.target_offset(), (10.0, -5.0));
    assert_eq!(key_frame.state(), MatchState::KeyFrame);

    let data = tracker.get_frame(2).unwrap();
    assert_eq!(data.state(), MatchState::GoodMatch);
    assert_near(data.location().unwrap(), 116.0, 97.0);
}

#[test]
fn steady_motion_is_tracked_over_many_frames() {
    let shifts: Vec<(isize, isize)> = (0..8).map(|i| (2 * i, -i)).collect();
    let mut tracker = tracker(moving(3, &shifts));
    tracker
        .add_key_frame(TargetPoint::new(0, 90.0, 110.0), 90.0, 110.0)
        .unwrap();

    match tracker.advance_to(7, None).unwrap() {
        Advance::Reached(data) => {
            assert_eq!(data.frame(), 7);
            assert_eq!(data.state(), MatchState::GoodMatch);
            assert_near(data.location().unwrap(), 104.0, 103.0);
        }
        other => panic!("unexpected {other:?}"),
    }
    for frame in 1..=7 {
        let cached = tracker.cached_frame(frame).unwrap();
        assert!(cached.is_valid());
        assert_eq!(cached.state(), MatchState::GoodMatch);
    }
}

#[test]
fn key_frame_invalidates_downstream_frames() {
    let mut tracker = tracker(moving(4, &[(0, 0), (2, 0), (4, 0), (6, 0)]));
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    let before = tracker.get_frame(2).unwrap();
    assert_near(before.location().unwrap(), 104.0, 100.0);
    assert_eq!(before.key_frame(), Some(0));

    tracker
        .add_key_frame(TargetPoint::new(1, 150.0, 60.0), 150.0, 60.0)
        .unwrap();
    assert!(!tracker.cached_frame(1).unwrap().is_valid());
    assert!(!tracker.cached_frame(2).unwrap().is_valid());

    let after = tracker.get_frame(2).unwrap();
    assert_eq!(after.key_frame(), Some(1));
    assert_eq!(after.state(), MatchState::GoodMatch);
    assert_near(after.location().unwrap(), 152.0, 60.0);
    assert_eq!(tracker.get_frame(1).unwrap().state(), MatchState::KeyFrame);
}

#[test]
fn later_baselines_survive_an_earlier_key_frame() {
    let mut tracker = tracker(moving(5, &[(0, 0), (2, 0), (4, 0), (6, 0), (8, 0)]));
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    tracker
        .add_key_frame(TargetPoint::new(3, 60.0, 60.0), 60.0, 60.0)
        .unwrap();
    tracker.get_frame(4).unwrap();
    tracker.get_frame(2).unwrap();

    tracker
        .add_key_frame(TargetPoint::new(1, 102.0, 100.0), 102.0, 100.0)
        .unwrap();
    assert!(!tracker.cached_frame(2).unwrap().is_valid());
    assert!(tracker.cached_frame(4).unwrap().is_valid());
}

#[test]
fn consecutive_failures_halt_auto_advance() {
    let mut frames = moving(6, &[(0, 0)]);
    frames.extend((0..5).map(|i| unrelated(100 + i)));
    let mut tracker = tracker(frames);
    assert_eq!(tracker.options().auto_skip_count(), 2);
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();

    let advance = tracker.advance_to(5, None).unwrap();
    assert_eq!(
        advance,
        Advance::Halted {
            frame: 3,
            consecutive_failures: 3
        }
    );
    for frame in 1..=3 {
        let data = tracker.cached_frame(frame).unwrap();
        assert_eq!(data.state(), MatchState::NoMatch);
        assert!(data.location().is_none());
        assert_eq!(data.failure(), Some(FrameFailure::MatchNotFound));
    }
    assert!(tracker.cached_frame(3).unwrap().is_halted());
    assert!(tracker.cached_frame(4).is_none());

    assert_eq!(tracker.get_frame(5).unwrap().state(), MatchState::Unprocessed);
    assert!(tracker.cached_frame(4).is_none());
    assert!(matches!(
        tracker.advance_to(5, None).unwrap(),
        Advance::Halted { frame: 3, .. }
    ));

    tracker
        .add_key_frame(TargetPoint::new(3, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    match tracker.advance_to(5, None).unwrap() {
        Advance::Reached(data) => {
            assert_eq!(data.frame(), 5);
            assert_eq!(data.consecutive_failures(), 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn search_window_widens_after_failures() {
    let mut frames = moving(7, &[(0, 0)]);
    frames.extend((0..2).map(|i| unrelated(200 + i)));
    let mut tracker = tracker(frames);
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    let first = tracker.get_frame(1).unwrap().search_window().unwrap();
    let second = tracker.get_frame(2).unwrap().search_window().unwrap();
    assert!(second.width > first.width);
    assert!(second.height > first.height);
}

#[test]
fn line_spread_restricts_search_to_a_band() {
    let mut tracker = tracker(moving(8, &[(0, 0), (4, 0)]));
    tracker.options_mut().set_line_spread(5);
    let key_frame = tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    assert_eq!(key_frame.geometry().mode, TrackingMode::Line { spread: 5 });
    assert_eq!(key_frame.snapshot().mask().active(), 16 * 5);

    let data = tracker.get_frame(1).unwrap();
    assert_eq!(data.state(), MatchState::GoodMatch);
    let location = data.location().unwrap();
    assert!((location.y - 100.0).abs() < 1e-4);
    assert!((location.x - 104.0).abs() <= 1.0);
}

/// Frames whose columns carry random values and whose rows are identical,
/// moved by `shifts`.
fn column_stripes(seed: u64, shifts: &[(isize, isize)]) -> Vec<OwnedImage> {
    let mut rng = StdRng::seed_from_u64(seed);
    let columns: Vec<u8> = (0..FRAME + 2 * BORDER)
        .map(|_| rng.random_range(0..=255))
        .collect();
    shifts
        .iter()
        .map(|&(dx, _)| {
            let row: Vec<u8> = (0..FRAME)
                .map(|x| columns[(x as isize + BORDER as isize - dx) as usize])
                .collect();
            OwnedImage::new(row.repeat(FRAME), FRAME, FRAME).unwrap()
        })
        .collect()
}

#[test]
fn line_search_ignores_motion_across_the_line() {
    let mut tracker = tracker(column_stripes(12, &[(0, 0), (4, 3)]));
    tracker.options_mut().set_line_spread(5);
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();

    let data = tracker.get_frame(1).unwrap();
    assert_eq!(data.state(), MatchState::GoodMatch);
    let location = data.location().unwrap();
    assert!((location.y - 100.0).abs() < 1e-4, "left the line: {location:?}");
    assert!((location.x - 104.0).abs() <= 1.0);
}

#[test]
fn fractional_key_frame_center_keeps_static_target() {
    let mut tracker = tracker(moving(13, &[(0, 0), (0, 0), (0, 0)]));
    let key_frame = tracker
        .add_key_frame(TargetPoint::new(0, 100.5, 100.5), 100.5, 100.5)
        .unwrap();
    assert_eq!(key_frame.mask_center(), Point::new(101.0, 101.0));
    assert_eq!(key_frame.target_offset(), (-0.5, -0.5));

    for frame in 1..3 {
        let data = tracker.get_frame(frame).unwrap();
        assert_eq!(data.state(), MatchState::GoodMatch);
        let location = data.location().unwrap();
        assert!(
            location.distance(Point::new(100.5, 100.5)) <= 0.1,
            "frame {frame} moved to {location:?}"
        );
    }
}

#[test]
fn geometry_changes_wait_for_next_key_frame() {
    let mut tracker = tracker(moving(14, &[(0, 0), (2, 0), (4, 0)]));
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    assert!(!tracker.geometry_pending());

    tracker.options_mut().set_good_match(5.0).unwrap();
    assert!(!tracker.geometry_pending());

    tracker.options_mut().set_mask_size(20, 12).unwrap();
    assert!(tracker.geometry_pending());
    let data = tracker.get_frame(1).unwrap();
    let template = data.template().unwrap();
    assert_eq!((template.width(), template.height()), (16, 16));

    let key_frame = tracker
        .add_key_frame(TargetPoint::new(1, 102.0, 100.0), 102.0, 100.0)
        .unwrap();
    assert_eq!((key_frame.geometry().width, key_frame.geometry().height), (20, 12));
    assert!(!tracker.geometry_pending());
}

#[test]
fn negative_line_spread_uses_mask_shape() {
    let mut tracker = tracker(moving(9, &[(0, 0)]));
    tracker.options_mut().set_mask_shape(MaskShape::Rectangle);
    let key_frame = tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    assert_eq!(key_frame.geometry().mode, TrackingMode::Area);
    assert_eq!(key_frame.snapshot().mask().active(), 256);

    tracker.options_mut().set_mask_shape(MaskShape::Ellipse);
    let key_frame = tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    assert!(key_frame.snapshot().mask().active() < 256);
}

/// Halves contrast and brightens each frame so matched patches differ from
/// the key-frame template while correlating perfectly.
fn brightening(frames: Vec<OwnedImage>) -> Vec<OwnedImage> {
    frames
        .into_iter()
        .enumerate()
        .map(|(k, frame)| {
            let data = frame
                .data()
                .iter()
                .map(|&v| v / 2 + 20 * k as u8)
                .collect();
            OwnedImage::new(data, FRAME, FRAME).unwrap()
        })
        .collect()
}

#[test]
fn zero_alpha_keeps_template_and_full_alpha_copies_patch() {
    let frames = brightening(moving(10, &[(0, 0), (3, 1), (6, 2), (9, 3)]));
    let mut tracker = tracker(frames.clone());
    tracker.options_mut().set_evolve_alpha(0);
    let snapshot = tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap()
        .snapshot()
        .clone();
    let data = tracker.get_frame(3).unwrap();
    assert_eq!(data.state(), MatchState::GoodMatch);
    assert_eq!(data.template().unwrap().pixels(), snapshot.pixels());

    let mut tracker = tracker_with_alpha(frames.clone(), 255);
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    let data = tracker.get_frame(1).unwrap();
    assert_eq!(data.state(), MatchState::GoodMatch);
    let patch = frames[1].view().roi(95, 93, 16, 16).unwrap();
    let patch = OwnedImage::from_view(patch).unwrap();
    assert_eq!(data.template().unwrap().pixels(), patch.data());
    assert_ne!(patch.data(), snapshot.pixels());
}

fn tracker_with_alpha(frames: Vec<OwnedImage>, alpha: u8) -> AutoTracker<Vec<OwnedImage>> {
    let mut tracker = tracker(frames);
    tracker.options_mut().set_evolve_alpha(alpha);
    tracker
}

#[test]
fn option_changes_do_not_rewrite_cached_frames() {
    let mut tracker = tracker(moving(11, &[(0, 0), (3, 1), (6, 2)]));
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    let first = tracker.get_frame(1).unwrap();
    assert_eq!(first.state(), MatchState::GoodMatch);
    let revision = tracker.options_revision();

    tracker.options_mut().set_good_match(100.0).unwrap();
    assert_eq!(tracker.options_revision(), revision + 1);
    assert_eq!(tracker.get_frame(1).unwrap(), first);

    let second = tracker.get_frame(2).unwrap();
    assert_eq!(second.state(), MatchState::PossibleMatch);
    assert!(second.location().is_some());
    assert_eq!(second.options_revision(), revision + 1);
    assert_eq!(second.consecutive_failures(), 1);
}

#[test]
fn preconditions_are_reported() {
    let frames = moving(12, &[(0, 0), (1, 0)]);
    let mut unbound = AutoTracker::new(frames.clone());
    assert_eq!(unbound.get_frame(0).unwrap_err(), TrackError::NoTrackBound);

    let mut tracker = tracker(frames);
    assert_eq!(
        tracker.get_frame(2).unwrap_err(),
        TrackError::FrameOutOfRange { index: 2, len: 2 }
    );
    assert_eq!(tracker.get_frame(1).unwrap().state(), MatchState::Unprocessed);
    assert_eq!(tracker.advance_to(1, None).unwrap(), Advance::NoKeyFrame);
    assert!(matches!(
        tracker.add_key_frame(TargetPoint::new(0, 3.0, 100.0), 3.0, 100.0),
        Err(TrackError::RoiOutOfBounds { .. })
    ));
    assert!(tracker.key_frames().next().is_none());
}

#[test]
fn cancel_stops_before_the_next_frame() {
    let mut tracker = tracker(moving(13, &[(0, 0), (1, 0), (2, 0)]));
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    let cancel = CancelFlag::new();
    cancel.cancel();
    assert_eq!(
        tracker.advance_to(2, Some(&cancel)).unwrap(),
        Advance::Cancelled { last_frame: 0 }
    );
    assert!(tracker.cached_frame(1).is_none());
}

#[test]
fn switching_tracks_clears_state() {
    let mut tracker = tracker(moving(14, &[(0, 0), (1, 0)]));
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    tracker.get_frame(1).unwrap();

    assert_eq!(tracker.set_track(Some(TrackId(1))), Some(TrackId(1)));
    assert_eq!(tracker.key_frames().count(), 1);

    assert_eq!(tracker.set_track(Some(TrackId(2))), Some(TrackId(1)));
    assert_eq!(tracker.key_frames().count(), 0);
    assert!(tracker.cached_frame(1).is_none());
}

#[test]
fn removing_a_key_frame_hands_frames_back() {
    let mut tracker = tracker(moving(15, &[(0, 0), (2, 0), (4, 0)]));
    tracker
        .add_key_frame(TargetPoint::new(0, 100.0, 100.0), 100.0, 100.0)
        .unwrap();
    tracker
        .add_key_frame(TargetPoint::new(1, 60.0, 60.0), 60.0, 60.0)
        .unwrap();
    assert_eq!(tracker.get_frame(2).unwrap().key_frame(), Some(1));

    assert!(tracker.remove_key_frame(1).unwrap().is_some());
    let data = tracker.get_frame(2).unwrap();
    assert_eq!(data.key_frame(), Some(0));
    assert_near(data.location().unwrap(), 104.0, 100.0);
    assert!(tracker.remove_key_frame(1).unwrap().is_none());
}

use std::collections::HashSet;

use ducktrack::{Observation, PathTracker, TrackerConfig};

fn obs(x: f32, y: f32) -> Observation {
    Observation::new(x, y, 0.9, 0)
}

#[test]
fn test_basic_tracking() {
    let mut tracker = PathTracker::new(TrackerConfig {
        max_disappeared: 2,
        match_distance_threshold: 100.0,
        ..TrackerConfig::default()
    });

    // Frame 1: one detection seeds track 0
    let tracks = tracker.update(&[Observation::new(0.0, 0.0, 0.9, 0)]).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[&0].history(), &[Observation::new(0.0, 0.0, 0.9, 0)]);

    // Frame 2: same object moved ~14.1 px
    let tracks = tracker.update(&[Observation::new(10.0, 10.0, 0.9, 0)]).unwrap();
    assert_eq!(tracks[&0].hits(), 2);
    assert_eq!(tracks[&0].missed(), 0);

    // Frames 3 and 4: object missing but kept
    let tracks = tracker.update(&[]).unwrap();
    assert_eq!(tracks[&0].missed(), 1);
    let tracks = tracker.update(&[]).unwrap();
    assert_eq!(tracks[&0].missed(), 2);

    // Frame 5: missed count exceeds max_disappeared
    let tracks = tracker.update(&[]).unwrap();
    assert!(tracks.is_empty());
}

#[test]
fn test_threshold_boundary() {
    let mut tracker = PathTracker::default();
    tracker.update(&[obs(0.0, 0.0)]).unwrap();

    // 3-4-5 triangle scaled to exactly 100
    let tracks = tracker.update(&[obs(60.0, 80.0)]).unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[&0].hits(), 1);
    assert_eq!(tracks[&0].missed(), 1);

    let mut tracker = PathTracker::default();
    tracker.update(&[obs(0.0, 0.0)]).unwrap();
    let tracks = tracker.update(&[obs(60.0, 79.9)]).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[&0].hits(), 2);
}

#[test]
fn test_ids_never_reused() {
    let mut tracker = PathTracker::new(TrackerConfig {
        max_disappeared: 0,
        ..TrackerConfig::default()
    });
    let mut seen = HashSet::new();

    for round in 0..5 {
        let x = 1000.0 * round as f32;
        let tracks = tracker.update(&[obs(x, 0.0), obs(x, 500.0)]).unwrap();
        let fresh: Vec<u64> = tracks
            .values()
            .filter(|t| t.hits() == 1 && t.missed() == 0)
            .map(|t| t.id())
            .collect();
        assert_eq!(fresh.len(), 2);
        for id in fresh {
            assert!(seen.insert(id), "id {id} issued twice");
        }
        // Drop everything before the next round
        assert!(tracker.update(&[]).unwrap().is_empty());
    }
    assert_eq!(tracker.next_id(), 10);
}

#[test]
fn test_one_to_one_matching() {
    let mut tracker = PathTracker::default();
    tracker.update(&[obs(0.0, 0.0), obs(50.0, 0.0)]).unwrap();

    // Three detections all within range of both tracks
    let tracks = tracker
        .update(&[obs(10.0, 0.0), obs(20.0, 0.0), obs(40.0, 0.0)])
        .unwrap();

    assert_eq!(tracks.len(), 3);
    let appended: Vec<Observation> = tracks
        .values()
        .filter(|t| t.hits() == 2)
        .map(|t| *t.last())
        .collect();
    assert_eq!(appended.len(), 2);
    assert_ne!(appended[0], appended[1]);
    assert!(tracks.values().all(|t| t.hits() <= 2));

    // Track 0 takes (10, 0) and track 1 takes (40, 0); (20, 0) starts track 2
    assert_eq!(tracks[&0].last(), &obs(10.0, 0.0));
    assert_eq!(tracks[&1].last(), &obs(40.0, 0.0));
    assert_eq!(tracks[&2].last(), &obs(20.0, 0.0));
}

#[test]
fn test_detection_order_does_not_matter_for_distinct_distances() {
    let frame1 = [obs(0.0, 0.0), obs(300.0, 0.0)];

    let mut a = PathTracker::default();
    a.update(&frame1).unwrap();
    let a_tracks = a.update(&[obs(5.0, 0.0), obs(310.0, 0.0)]).unwrap().clone();

    let mut b = PathTracker::default();
    b.update(&frame1).unwrap();
    let b_tracks = b.update(&[obs(310.0, 0.0), obs(5.0, 0.0)]).unwrap().clone();

    assert_eq!(a_tracks, b_tracks);
}

#[test]
fn test_eventual_removal_with_default_config() {
    let mut tracker = PathTracker::default();
    tracker.update(&[obs(0.0, 0.0)]).unwrap();
    for _ in 0..10 {
        assert_eq!(tracker.update(&[]).unwrap().len(), 1);
    }
    assert!(tracker.update(&[]).unwrap().is_empty());
}

#[test]
fn test_lost_track_reacquired() {
    let mut tracker = PathTracker::new(TrackerConfig {
        max_disappeared: 3,
        ..TrackerConfig::default()
    });
    tracker.update(&[obs(100.0, 100.0)]).unwrap();
    tracker.update(&[]).unwrap();
    tracker.update(&[]).unwrap();
    let tracks = tracker.update(&[obs(120.0, 110.0)]).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[&0].hits(), 2);
    assert_eq!(tracks[&0].missed(), 0);
}

#[test]
fn test_independent_sessions() {
    let mut a = PathTracker::default();
    let mut b = PathTracker::default();
    a.update(&[obs(0.0, 0.0), obs(500.0, 0.0)]).unwrap();
    let tracks = b.update(&[obs(0.0, 0.0)]).unwrap();
    assert_eq!(tracks.keys().copied().collect::<Vec<_>>(), vec![0]);
    assert_eq!(a.next_id(), 2);
}

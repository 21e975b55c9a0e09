//! Physical-unit trajectories and speed estimates derived from tracker output.

use std::collections::BTreeMap;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::calibration::ScaleCalibrator;
use crate::tracker::{TrackId, Tracks};

/// A position in physical units, stamped with the frame it was recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub x: f32,
    pub y: f32,
    pub frame: u64,
}

impl TrajectoryPoint {
    pub fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    /// Seconds since the start of the stream
    pub time: f32,
    /// Units per second
    pub speed: f32,
}

/// Speed between the last two points, in units per `dt`.
///
/// Returns 0 when fewer than two points are given or `dt` is not a positive finite number.
pub fn speed(points: &[Point2<f32>], dt: f32) -> f32 {
    let [.., p1, p2] = points else {
        return 0.0;
    };
    if !(dt.is_finite() && dt > 0.0) {
        return 0.0;
    }
    nalgebra::distance(p1, p2) / dt
}

/// Speed over time for one trajectory.
///
/// Each consecutive pair with a positive frame gap yields one sample at the later point's
/// timestamp. Pairs with a zero or negative gap are skipped.
pub fn speed_profile(trajectory: &[TrajectoryPoint], fps: f32) -> Vec<SpeedSample> {
    if !(fps.is_finite() && fps > 0.0) {
        return Vec::new();
    }
    trajectory
        .windows(2)
        .filter_map(|w| {
            let (a, b) = (&w[0], &w[1]);
            if b.frame <= a.frame {
                return None;
            }
            let elapsed = (b.frame - a.frame) as f32 / fps;
            Some(SpeedSample {
                time: b.frame as f32 / fps,
                speed: nalgebra::distance(&a.position(), &b.position()) / elapsed,
            })
        })
        .collect()
}

/// Accumulates physical-unit trajectories frame by frame.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryRecorder {
    trajectories: BTreeMap<TrackId, Vec<TrajectoryPoint>>,
}

impl TrajectoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest position of every track matched this frame.
    ///
    /// Does nothing until the calibrator has a scale. Tracks with a single observation are
    /// skipped, so each trajectory starts at a track's second match. Tracks that went unmatched
    /// this frame are skipped too, rather than repeating their stale last position as a point.
    pub fn record(&mut self, frame: u64, tracks: &Tracks, calibrator: &ScaleCalibrator) {
        if !calibrator.is_calibrated() {
            return;
        }
        for (&id, track) in tracks {
            if track.missed() > 0 || track.hits() < 2 {
                continue;
            }
            let last = track.last();
            if let Some(p) = calibrator.to_physical(last.x, last.y) {
                self.trajectories.entry(id).or_default().push(TrajectoryPoint {
                    x: p.x,
                    y: p.y,
                    frame,
                });
            }
        }
    }

    pub fn get(&self, id: TrackId) -> Option<&[TrajectoryPoint]> {
        self.trajectories.get(&id).map(Vec::as_slice)
    }

    pub fn trajectories(&self) -> &BTreeMap<TrackId, Vec<TrajectoryPoint>> {
        &self.trajectories
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn clear(&mut self) {
        self.trajectories.clear();
    }
}

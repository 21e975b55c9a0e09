//! TrackerPipeline for combining detection with tracking.

use std::collections::BTreeMap;

use nalgebra::Point2;
use serde::Serialize;
use tracing::debug;

use crate::calibration::{GridLine, ScaleCalibrator};
use crate::config::Config;
use crate::error::Error;
use crate::kinematics::{self, SpeedSample, TrajectoryPoint, TrajectoryRecorder};
use crate::tracker::{PathTracker, Track, TrackId, TrackState};

use super::{DetectionFilter, DetectionSource};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError<E: std::error::Error + 'static> {
    #[error("detection failed: {0}")]
    Detection(#[source] E),
    #[error(transparent)]
    Tracking(#[from] Error),
}

/// Per-track summary produced for every processed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackReport {
    pub id: TrackId,
    pub state: TrackState,
    /// Last matched centroid in pixels
    pub pixel: [f32; 2],
    pub missed: u32,
    pub hits: usize,
    /// Last matched centroid in physical units, once calibrated
    pub position: Option<[f32; 2]>,
    /// Units per second between the last two observations, once calibrated
    pub speed: Option<f32>,
}

impl TrackReport {
    fn new(track: &Track, calibrator: &ScaleCalibrator, dt: f32) -> Self {
        let last = track.last();
        let (position, speed) = match track.previous() {
            Some(prev) => {
                let p1 = calibrator.to_physical(prev.x, prev.y);
                let p2 = calibrator.to_physical(last.x, last.y);
                match (p1, p2) {
                    (Some(p1), Some(p2)) => {
                        (Some([p2.x, p2.y]), Some(kinematics::speed(&[p1, p2], dt)))
                    }
                    _ => (None, None),
                }
            }
            None => (None, None),
        };
        Self {
            id: track.id(),
            state: track.state(),
            pixel: [last.x, last.y],
            missed: track.missed(),
            hits: track.hits(),
            position,
            speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    /// 1-based index of the processed frame
    pub frame: u64,
    pub tracks: Vec<TrackReport>,
}

/// End-of-run summary: physical trajectories and their speed profiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub pixels_per_unit: Option<f32>,
    pub fps: f32,
    pub frames: u64,
    /// Trajectories with at least two points
    pub trajectories: BTreeMap<TrackId, Vec<TrajectoryPoint>>,
    /// Speed over time for trajectories with at least three points
    pub speed_profiles: BTreeMap<TrackId, Vec<SpeedSample>>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }
}

/// A combined tracker that bundles a detector with the PathTracker.
///
/// The pipeline owns every piece of per-session state, so two pipelines never share tracks or
/// ids.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    filter: DetectionFilter,
    tracker: PathTracker,
    calibrator: ScaleCalibrator,
    recorder: TrajectoryRecorder,
    frame: u64,
    fps: f32,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new pipeline from a validated application config.
    pub fn new(detector: D, config: &Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            detector,
            filter: config.filter.clone(),
            tracker: PathTracker::new(config.tracker.clone()),
            calibrator: ScaleCalibrator::new(config.grid_square_size)?,
            recorder: TrajectoryRecorder::new(),
            frame: 0,
            fps: config.fps,
        })
    }

    pub fn with_default_config(detector: D) -> Self {
        let config = Config::default();
        Self {
            detector,
            filter: config.filter,
            tracker: PathTracker::new(config.tracker),
            calibrator: ScaleCalibrator::default(),
            recorder: TrajectoryRecorder::new(),
            frame: 0,
            fps: config.fps,
        }
    }

    /// Replace the calibrator, e.g. with one locked to a known scale.
    pub fn with_calibrator(mut self, calibrator: ScaleCalibrator) -> Self {
        self.calibrator = calibrator;
        self
    }

    /// Offer grid lines to the calibrator. Ignored once a scale is known.
    pub fn calibrate(&mut self, lines: &[GridLine]) -> Option<f32> {
        self.calibrator.observe(lines)
    }

    /// Detect, filter, track and record one frame.
    pub fn process_frame(
        &mut self,
        input: &D::Frame,
    ) -> Result<FrameReport, PipelineError<D::Error>> {
        self.frame += 1;
        let boxes = self
            .detector
            .detect(input)
            .map_err(PipelineError::Detection)?;
        let observations = self.filter.apply(&boxes);
        debug!(
            frame = self.frame,
            boxes = boxes.len(),
            kept = observations.len(),
            "detections filtered"
        );

        let tracks = self.tracker.update(&observations)?;
        self.recorder.record(self.frame, tracks, &self.calibrator);

        let dt = 1.0 / self.fps;
        Ok(FrameReport {
            frame: self.frame,
            tracks: tracks
                .values()
                .map(|t| TrackReport::new(t, &self.calibrator, dt))
                .collect(),
        })
    }

    pub fn report(&self) -> Report {
        let trajectories: BTreeMap<TrackId, Vec<TrajectoryPoint>> = self
            .recorder
            .trajectories()
            .iter()
            .filter(|(_, traj)| traj.len() >= 2)
            .map(|(&id, traj)| (id, traj.clone()))
            .collect();
        let speed_profiles = trajectories
            .iter()
            .filter(|(_, traj)| traj.len() >= 3)
            .map(|(&id, traj)| (id, kinematics::speed_profile(traj, self.fps)))
            .filter(|(_, profile)| !profile.is_empty())
            .collect();
        Report {
            pixels_per_unit: self.calibrator.scale(),
            fps: self.fps,
            frames: self.frame,
            trajectories,
            speed_profiles,
        }
    }

    /// Physical position of a track's last observation, if calibrated.
    pub fn physical_position(&self, id: TrackId) -> Option<Point2<f32>> {
        let last = self.tracker.get(id)?.last();
        self.calibrator.to_physical(last.x, last.y)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn tracker(&self) -> &PathTracker {
        &self.tracker
    }

    pub fn calibrator(&self) -> &ScaleCalibrator {
        &self.calibrator
    }

    pub fn recorder(&self) -> &TrajectoryRecorder {
        &self.recorder
    }
}

//! Centroid-based multi-object tracking.
//!
//! [`PathTracker`] turns unordered per-frame detections into persistent
//! trajectories. [`ScaleCalibrator`] derives a pixels-per-unit factor from a
//! reference grid, and the [`kinematics`] module converts trajectories into
//! physical units and speed profiles. The [`integration`] module wires a
//! black-box detector into a frame loop.

pub mod calibration;
pub mod config;
pub mod error;
pub mod integration;
pub mod kinematics;
pub mod tracker;

pub use calibration::{GridLine, ScaleCalibrator};
pub use config::Config;
pub use error::{Error, Result};
pub use integration::{DetectionFilter, DetectionSource, TrackerPipeline};
pub use tracker::{
    AssociationStrategy, BoundingBox, BoxDetection, Observation, PathTracker, Track, TrackId,
    TrackState, TrackerConfig, Tracks,
};

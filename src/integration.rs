//! Integration module for connecting object detectors with the PathTracker.
//!
//! A detector is anything implementing [`DetectionSource`]. Its boxes pass through a
//! [`DetectionFilter`] and are reduced to centroid observations before the tracker sees them.
//! [`TrackerPipeline`] runs that loop one frame at a time and layers scale calibration and
//! speed estimation on top.

mod builder;
mod detector;
mod filter;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use filter::DetectionFilter;
pub use pipeline::{FrameReport, PipelineError, Report, TrackReport, TrackerPipeline};

use serde::{Deserialize, Serialize};

use crate::tracker::{BoxDetection, Observation};

/// Pre-tracking gate applied to raw detector boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionFilter {
    /// Minimum confidence to keep a box
    pub confidence_threshold: f32,
    /// Class ids to keep; empty keeps every class
    pub classes: Vec<u32>,
    /// Boxes must be strictly larger than this area (pixels squared)
    pub area_threshold: f32,
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            classes: vec![0],
            area_threshold: 500.0,
        }
    }
}

impl DetectionFilter {
    pub fn accepts(&self, det: &BoxDetection) -> bool {
        det.confidence >= self.confidence_threshold
            && (self.classes.is_empty() || self.classes.contains(&det.class_id))
            && det.bbox.area() > self.area_threshold
    }

    /// Keep the accepted boxes and reduce each one to its centroid.
    pub fn apply(&self, detections: &[BoxDetection]) -> Vec<Observation> {
        detections
            .iter()
            .filter(|d| self.accepts(d))
            .map(BoxDetection::to_observation)
            .collect()
    }
}

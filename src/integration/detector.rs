//! Trait for object detection backends.

use crate::tracker::BoxDetection;

/// Trait for object detection backends.
///
/// Implement this trait to connect any detection model to the tracker. The detector is a black
/// box: it only has to turn one frame into a list of boxes.
///
/// # Example
///
/// ```
/// use ducktrack::tracker::BoxDetection;
/// use ducktrack::DetectionSource;
///
/// struct Replay {
///     frames: Vec<Vec<BoxDetection>>,
/// }
///
/// impl DetectionSource for Replay {
///     type Frame = usize;
///     type Error = std::convert::Infallible;
///
///     fn detect(&mut self, frame: &usize) -> Result<Vec<BoxDetection>, Self::Error> {
///         Ok(self.frames.get(*frame).cloned().unwrap_or_default())
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Whatever the backend consumes per frame (decoded image, recorded record, ...).
    type Frame;

    /// Error type for detection failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run detection on one frame.
    fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<BoxDetection>, Self::Error>;
}

/// Helper trait for converting model-specific outputs to `BoxDetection`.
pub trait IntoDetections {
    fn into_detections(self) -> Vec<BoxDetection>;
}

impl IntoDetections for Vec<BoxDetection> {
    fn into_detections(self) -> Vec<BoxDetection> {
        self
    }
}

/// Rows of `[x1, y1, x2, y2, confidence, class_id]`, the usual flattened YOLO output.
impl IntoDetections for Vec<[f32; 6]> {
    fn into_detections(self) -> Vec<BoxDetection> {
        self.into_iter()
            .map(|[x1, y1, x2, y2, conf, cls]| {
                super::DetectionBuilder::new()
                    .tlbr(x1, y1, x2, y2)
                    .score(conf)
                    .class_id(cls.max(0.0) as u32)
                    .build()
            })
            .collect()
    }
}

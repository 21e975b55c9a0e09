mod matching;
mod path_tracker;
mod rect;
mod track;
mod track_state;

pub use matching::{
    AssignmentResult, Observation, centroid_distance, greedy_assignment, linear_assignment,
};
pub use path_tracker::{AssociationStrategy, PathTracker, TrackerConfig, Tracks};
pub use rect::{BoundingBox, BoxDetection};
pub use track::{Track, TrackId};
pub use track_state::TrackState;

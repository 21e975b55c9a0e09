use serde::{Deserialize, Serialize};

/// Lifecycle state of a live track, derived from its history and missed counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    /// Created this frame from an unmatched detection
    #[default]
    New,
    /// Matched in the most recent frame
    Tracked,
    /// Unmatched for at least one frame but not yet retired
    Lost,
}

//! A single persistent identity and its observation history.

use serde::Serialize;

use crate::tracker::matching::Observation;
use crate::tracker::track_state::TrackState;

/// Track identifier. Issued sequentially by a `PathTracker` and never reused.
pub type TrackId = u64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    id: TrackId,
    /// Matched observations in frame arrival order. Never empty.
    history: Vec<Observation>,
    /// Consecutive frames without a matching detection
    missed: u32,
}

impl Track {
    pub(crate) fn new(id: TrackId, first: Observation) -> Self {
        Self {
            id,
            history: vec![first],
            missed: 0,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Every observation matched to this track, oldest first.
    pub fn history(&self) -> &[Observation] {
        &self.history
    }

    /// The most recent observation; this is what new detections are matched against.
    pub fn last(&self) -> &Observation {
        &self.history[self.history.len() - 1]
    }

    /// The observation before [`Track::last`], if the track has been matched more than once.
    pub fn previous(&self) -> Option<&Observation> {
        self.history.iter().rev().nth(1)
    }

    pub fn missed(&self) -> u32 {
        self.missed
    }

    /// Number of observations in the history.
    pub fn hits(&self) -> usize {
        self.history.len()
    }

    pub fn state(&self) -> TrackState {
        if self.missed > 0 {
            TrackState::Lost
        } else if self.history.len() == 1 {
            TrackState::New
        } else {
            TrackState::Tracked
        }
    }

    pub(crate) fn update(&mut self, observation: Observation) {
        self.history.push(observation);
        self.missed = 0;
    }

    /// Bump the missed counter and return its new value.
    pub(crate) fn mark_missed(&mut self) -> u32 {
        self.missed += 1;
        self.missed
    }
}

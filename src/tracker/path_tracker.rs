//! Main centroid tracking algorithm.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::tracker::matching::{self, AssignmentResult, Observation};
use crate::tracker::track::{Track, TrackId};

/// How detections are paired with existing tracks each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationStrategy {
    /// Commit the globally closest pair until the closest remaining pair fails the threshold.
    #[default]
    Greedy,
    /// Minimum total distance assignment, then drop pairs at or above the threshold.
    Optimal,
}

/// Configuration for the PathTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames a track may stay unmatched before it is removed
    pub max_disappeared: u32,
    /// Centroid distance (pixels) a match must be strictly below
    pub match_distance_threshold: f32,
    pub strategy: AssociationStrategy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_disappeared: 10,
            match_distance_threshold: 100.0,
            strategy: AssociationStrategy::Greedy,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.match_distance_threshold.is_finite() && self.match_distance_threshold > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "match_distance_threshold must be positive, got {}",
                self.match_distance_threshold
            )));
        }
        Ok(())
    }
}

/// Live tracks keyed by id, iterated in ascending id order.
pub type Tracks = BTreeMap<TrackId, Track>;

/// Assigns persistent ids to unordered per-frame detections.
///
/// Each call to [`PathTracker::update`] is one frame. Tracks that go unmatched for more than
/// `max_disappeared` consecutive frames are dropped and their ids are never issued again.
#[derive(Debug, Clone, Default)]
pub struct PathTracker {
    tracks: Tracks,
    next_id: TrackId,
    config: TrackerConfig,
}

impl PathTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: Tracks::new(),
            next_id: 0,
            config,
        }
    }

    /// Feed one frame of detections and return the live tracks.
    ///
    /// Detections are matched against each track's last observation. Unmatched detections start
    /// new tracks and unmatched tracks age by one frame. A frame containing a non-finite position
    /// is rejected with [`Error::InvalidInput`] and leaves the tracker untouched.
    pub fn update(&mut self, detections: &[Observation]) -> Result<&Tracks> {
        if let Some((idx, bad)) = detections.iter().enumerate().find(|(_, d)| !d.is_finite()) {
            warn!(index = idx, x = bad.x, y = bad.y, "rejecting frame with non-finite detection");
            return Err(Error::InvalidInput(format!(
                "detection {idx} has a non-finite position ({}, {})",
                bad.x, bad.y
            )));
        }

        if detections.is_empty() {
            let ids: Vec<TrackId> = self.tracks.keys().copied().collect();
            self.mark_missed(&ids);
            return Ok(&self.tracks);
        }

        if self.tracks.is_empty() {
            for det in detections {
                self.register(*det);
            }
            return Ok(&self.tracks);
        }

        // Rows follow ascending track id, columns follow input order.
        let ids: Vec<TrackId> = self.tracks.keys().copied().collect();
        let last_positions: Vec<Observation> = self.tracks.values().map(|t| *t.last()).collect();
        let dists = matching::centroid_distance(&last_positions, detections);

        let thresh = self.config.match_distance_threshold;
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = match self.config.strategy {
            AssociationStrategy::Greedy => matching::greedy_assignment(&dists, thresh),
            AssociationStrategy::Optimal => matching::linear_assignment(&dists, thresh),
        };

        for (row, col) in matches {
            if let Some(track) = self.tracks.get_mut(&ids[row]) {
                track.update(detections[col]);
            }
        }

        for col in unmatched_detections {
            self.register(detections[col]);
        }

        let missing: Vec<TrackId> = unmatched_tracks.into_iter().map(|row| ids[row]).collect();
        self.mark_missed(&missing);

        Ok(&self.tracks)
    }

    fn register(&mut self, observation: Observation) {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, x = observation.x, y = observation.y, "new track");
        self.tracks.insert(id, Track::new(id, observation));
    }

    fn mark_missed(&mut self, ids: &[TrackId]) {
        for id in ids {
            let Some(track) = self.tracks.get_mut(id) else {
                continue;
            };
            if track.mark_missed() > self.config.max_disappeared {
                debug!(id, hits = track.hits(), "track removed");
                self.tracks.remove(id);
            }
        }
    }

    pub fn tracks(&self) -> &Tracks {
        &self.tracks
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Iterate `(id, history)` pairs in ascending id order.
    pub fn paths(&self) -> impl Iterator<Item = (TrackId, &[Observation])> {
        self.tracks.iter().map(|(&id, t)| (id, t.history()))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The id the next new track will receive.
    pub fn next_id(&self) -> TrackId {
        self.next_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Drop all live tracks. Id assignment continues from where it was, so ids issued before
    /// the reset are never handed out again; build a new `PathTracker` for an unrelated session.
    pub fn reset(&mut self) {
        self.tracks.clear();
    }
}

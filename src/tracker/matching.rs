//! Matching utilities for centroid tracking.

use nalgebra::Point2;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};

/// A single detection as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Centroid x in pixels
    pub x: f32,
    /// Centroid y in pixels
    pub y: f32,
    /// Detection confidence score, carried through but not used for matching
    pub confidence: f32,
    /// Detector class id, carried through but not used for matching
    pub class_id: u32,
}

impl Observation {
    pub fn new(x: f32, y: f32, confidence: f32, class_id: u32) -> Self {
        Self {
            x,
            y,
            confidence,
            class_id,
        }
    }

    #[inline]
    pub fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }

    /// Euclidean distance between the two centroids.
    #[inline]
    pub fn distance(&self, other: &Observation) -> f32 {
        nalgebra::distance(&self.position(), &other.position())
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32, f32, u32)> for Observation {
    fn from((x, y, confidence, class_id): (f32, f32, f32, u32)) -> Self {
        Self::new(x, y, confidence, class_id)
    }
}

/// Build an observation from a raw `[x, y, confidence?, class?]` row.
///
/// A missing confidence defaults to 1.0 and a missing class to 0.
impl TryFrom<&[f32]> for Observation {
    type Error = Error;

    fn try_from(row: &[f32]) -> Result<Self> {
        let [x, y, rest @ ..] = row else {
            return Err(Error::InvalidInput(format!(
                "observation needs at least 2 values (x, y), got {}",
                row.len()
            )));
        };
        let confidence = rest.first().copied().unwrap_or(1.0);
        let class_id = match rest.get(1) {
            None => 0,
            Some(&c) if c.is_finite() && c >= 0.0 => c as u32,
            Some(&c) => {
                return Err(Error::InvalidInput(format!("invalid class id {c}")));
            }
        };
        Ok(Self::new(*x, *y, confidence, class_id))
    }
}

/// Distance matrix between each track's last position (rows) and each detection (columns).
pub fn centroid_distance(
    track_positions: &[Observation],
    detections: &[Observation],
) -> Array2<f32> {
    let mut dists = Array2::zeros((track_positions.len(), detections.len()));
    for (i, t) in track_positions.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            dists[[i, j]] = t.distance(d);
        }
    }
    dists
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn from_masks(matches: Vec<(usize, usize)>, rows: &[bool], cols: &[bool]) -> Self {
        let unclaimed = |mask: &[bool]| {
            mask.iter()
                .enumerate()
                .filter_map(|(i, &claimed)| if claimed { None } else { Some(i) })
                .collect()
        };
        Self {
            matches,
            unmatched_tracks: unclaimed(rows),
            unmatched_detections: unclaimed(cols),
        }
    }
}

/// Greedy global-minimum assignment.
///
/// Repeatedly commits the smallest cost among unclaimed rows and columns while it is strictly
/// below `thresh`, and stops at the first minimum that is not. The minimum is found by a
/// row-major scan and the first occurrence wins ties, so the result only depends on the order
/// of rows and columns.
pub fn greedy_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    let mut row_claimed = vec![false; num_rows];
    let mut col_claimed = vec![false; num_cols];
    let mut matches = Vec::new();

    while matches.len() < num_rows.min(num_cols) {
        let mut best: Option<(usize, usize, f32)> = None;
        for ((i, j), &cost) in cost_matrix.indexed_iter() {
            if row_claimed[i] || col_claimed[j] {
                continue;
            }
            if best.is_none_or(|(_, _, best_cost)| cost < best_cost) {
                best = Some((i, j, cost));
            }
        }

        let Some((i, j, cost)) = best else {
            break;
        };
        if cost.is_nan() || cost >= thresh {
            break;
        }

        trace!(row = i, col = j, cost, "greedy match");
        row_claimed[i] = true;
        col_claimed[j] = true;
        matches.push((i, j));
    }

    AssignmentResult::from_masks(matches, &row_claimed, &col_claimed)
}

/// Minimum total cost assignment (Jonker-Volgenant), keeping only pairs strictly below `thresh`.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    if num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: vec![],
        };
    }

    const PAD_COST: f64 = 1e6;
    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), PAD_COST);

    for ((i, j), &cost) in cost_matrix.indexed_iter() {
        padded[[i, j]] = if cost.is_finite() {
            (cost as f64).min(PAD_COST)
        } else {
            PAD_COST
        };
    }

    let mut row_claimed = vec![false; num_rows];
    let mut col_claimed = vec![false; num_cols];
    let mut matches = vec![];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate().take(num_rows) {
                if col_idx < num_cols && cost_matrix[[row_idx, col_idx]] < thresh {
                    trace!(row = row_idx, col = col_idx, "optimal match");
                    matches.push((row_idx, col_idx));
                    row_claimed[row_idx] = true;
                    col_claimed[col_idx] = true;
                }
            }
        }
        Err(err) => {
            tracing::warn!(?err, "linear assignment failed, leaving all pairs unmatched");
        }
    }

    AssignmentResult::from_masks(matches, &row_claimed, &col_claimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_observation_from_short_row_is_rejected() {
        let row: &[f32] = &[12.0];
        assert!(matches!(
            Observation::try_from(row),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_observation_from_row_defaults() {
        let row: &[f32] = &[12.0, 7.5];
        let obs = Observation::try_from(row).unwrap();
        assert_eq!(obs, Observation::new(12.0, 7.5, 1.0, 0));

        let row: &[f32] = &[1.0, 2.0, 0.4, 3.0];
        assert_eq!(
            Observation::try_from(row).unwrap(),
            Observation::new(1.0, 2.0, 0.4, 3)
        );

        let row: &[f32] = &[1.0, 2.0, 0.4, -1.0];
        assert!(Observation::try_from(row).is_err());
    }

    #[test]
    fn test_centroid_distance() {
        let tracks = [Observation::new(0.0, 0.0, 1.0, 0)];
        let dets = [
            Observation::new(3.0, 4.0, 1.0, 0),
            Observation::new(0.0, 10.0, 1.0, 0),
        ];
        let d = centroid_distance(&tracks, &dets);
        assert_eq!(d.dim(), (1, 2));
        assert_eq!(d[[0, 0]], 5.0);
        assert_eq!(d[[0, 1]], 10.0);
    }

    #[test]
    fn test_greedy_picks_global_minimum_first() {
        let cost = array![[10.0_f32, 2.0], [1.0, 50.0]];
        let result = greedy_assignment(&cost, 100.0);
        assert_eq!(result.matches, vec![(1, 0), (0, 1)]);
        assert!(result.unmatched_tracks.is_empty());
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_greedy_stops_at_threshold() {
        let cost = array![[20.0_f32, 150.0], [120.0, 140.0]];
        let result = greedy_assignment(&cost, 100.0);
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_tracks, vec![1]);
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_greedy_threshold_is_strict() {
        let cost = array![[100.0_f32]];
        assert!(greedy_assignment(&cost, 100.0).matches.is_empty());
        let cost = array![[99.99_f32]];
        assert_eq!(greedy_assignment(&cost, 100.0).matches, vec![(0, 0)]);
    }

    #[test]
    fn test_greedy_ties_resolve_row_major() {
        let cost = array![[5.0_f32, 5.0], [5.0, 5.0]];
        let result = greedy_assignment(&cost, 100.0);
        assert_eq!(result.matches, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_greedy_rectangular() {
        let cost = array![[4.0_f32, 1.0, 9.0]];
        let result = greedy_assignment(&cost, 100.0);
        assert_eq!(result.matches, vec![(0, 1)]);
        assert_eq!(result.unmatched_detections, vec![0, 2]);
    }

    #[test]
    fn test_linear_assignment_minimises_total_cost() {
        // Greedy would take (1, 0) first and then fail on (0, 1).
        let cost = array![[60.0_f32, 150.0], [20.0, 70.0]];
        let greedy = greedy_assignment(&cost, 100.0);
        assert_eq!(greedy.matches, vec![(1, 0)]);

        let optimal = linear_assignment(&cost, 100.0);
        assert_eq!(optimal.matches, vec![(0, 0), (1, 1)]);
        assert!(optimal.unmatched_tracks.is_empty());
        assert!(optimal.unmatched_detections.is_empty());
    }

    #[test]
    fn test_linear_assignment_empty_sides() {
        let cost = Array2::<f32>::zeros((0, 3));
        let result = linear_assignment(&cost, 100.0);
        assert_eq!(result.unmatched_detections, vec![0, 1, 2]);

        let cost = Array2::<f32>::zeros((2, 0));
        let result = linear_assignment(&cost, 100.0);
        assert_eq!(result.unmatched_tracks, vec![0, 1]);
    }
}

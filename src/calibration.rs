//! Pixel-to-physical scale estimation from a reference grid.
//!
//! The grid lines themselves come from an external line detector (typically a Hough
//! transform) in `(rho, theta)` normal form. Only near-horizontal lines are used: their
//! `rho` values are the grid rows' distances from the image origin, so the spacing between
//! consecutive distinct values is the grid pitch in pixels.

use std::collections::BTreeSet;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Minimum `|sin(theta)|` for a line to count as a horizontal grid row.
const HORIZONTAL_SIN_MIN: f32 = 0.9;

/// A line in Hough normal form: `x * cos(theta) + y * sin(theta) = rho`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    /// Distance from the image origin, in pixels
    pub rho: f32,
    /// Angle of the line normal, in radians
    pub theta: f32,
}

impl GridLine {
    pub fn new(rho: f32, theta: f32) -> Self {
        Self { rho, theta }
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.theta.sin().abs() > HORIZONTAL_SIN_MIN
    }
}

/// Estimates pixels per physical unit once and then keeps that value for the rest of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleCalibrator {
    /// Physical size of one grid square (e.g. centimetres)
    grid_square_size: f32,
    pixels_per_unit: Option<f32>,
}

impl ScaleCalibrator {
    pub fn new(grid_square_size: f32) -> Result<Self> {
        check_grid_square_size(grid_square_size)?;
        Ok(Self {
            grid_square_size,
            pixels_per_unit: None,
        })
    }

    /// A calibrator that is already locked to a known scale.
    pub fn with_scale(grid_square_size: f32, pixels_per_unit: f32) -> Result<Self> {
        check_grid_square_size(grid_square_size)?;
        if !(pixels_per_unit.is_finite() && pixels_per_unit > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "pixels_per_unit must be positive, got {pixels_per_unit}"
            )));
        }
        Ok(Self {
            grid_square_size,
            pixels_per_unit: Some(pixels_per_unit),
        })
    }

    pub fn grid_square_size(&self) -> f32 {
        self.grid_square_size
    }

    pub fn scale(&self) -> Option<f32> {
        self.pixels_per_unit
    }

    pub fn is_calibrated(&self) -> bool {
        self.pixels_per_unit.is_some()
    }

    /// Try to calibrate from one frame's grid lines.
    ///
    /// Returns the current scale. Once a scale has been found, later calls return it unchanged.
    pub fn observe(&mut self, lines: &[GridLine]) -> Option<f32> {
        if self.pixels_per_unit.is_some() {
            return self.pixels_per_unit;
        }

        let Some(pitch) = grid_pitch(lines) else {
            debug!(lines = lines.len(), "not enough horizontal grid lines to calibrate");
            return None;
        };

        let scale = pitch / self.grid_square_size;
        info!(pixels_per_unit = scale, pitch, "scale calibrated");
        self.pixels_per_unit = Some(scale);
        self.pixels_per_unit
    }

    /// Convert a pixel position to physical units, if calibrated.
    pub fn to_physical(&self, x: f32, y: f32) -> Option<Point2<f32>> {
        self.pixels_per_unit
            .map(|scale| Point2::new(x / scale, y / scale))
    }
}

impl Default for ScaleCalibrator {
    /// Uncalibrated, with 10 unit grid squares.
    fn default() -> Self {
        Self {
            grid_square_size: 10.0,
            pixels_per_unit: None,
        }
    }
}

fn check_grid_square_size(size: f32) -> Result<()> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "grid_square_size must be positive, got {size}"
        )))
    }
}

/// Median spacing in pixels between distinct, integer-rounded `rho` values of horizontal lines.
pub fn grid_pitch(lines: &[GridLine]) -> Option<f32> {
    let rhos: BTreeSet<i64> = lines
        .iter()
        .filter(|l| l.rho.is_finite() && l.is_horizontal())
        .map(|l| l.rho.round() as i64)
        .collect();

    if rhos.len() < 2 {
        return None;
    }

    let rhos: Vec<i64> = rhos.into_iter().collect();
    let mut diffs: Vec<i64> = rhos.windows(2).map(|w| w[1] - w[0]).collect();
    diffs.sort_unstable();

    let mid = diffs.len() / 2;
    let median = if diffs.len() % 2 == 0 {
        (diffs[mid - 1] + diffs[mid]) as f32 / 2.0
    } else {
        diffs[mid] as f32
    };
    Some(median)
}

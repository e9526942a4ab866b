// src/analysis/roi_filter.rs
//
// Region-of-interest gate applied to every detection before tracking.
//
// Containment is decided by the box's top-left corner only. The bottom-right
// corner is never consulted, so a box may spill past the right or bottom edge
// of the ROI and still count.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Axis-aligned rectangle in frame pixel coordinates, fixed for a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Roi {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict containment of `(x1, y1)`; `(x2, y2)` is accepted but ignored.
    pub fn contains_box(&self, x1: f32, y1: f32, _x2: f32, _y2: f32) -> bool {
        self.x < x1 && x1 < self.right() && self.y < y1 && y1 < self.bottom()
    }
}

/// Free-function form of [`Roi::contains_box`]
pub fn is_in_roi(x1: f32, y1: f32, x2: f32, y2: f32, roi: &Roi) -> bool {
    roi.contains_box(x1, y1, x2, y2)
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.0}, {:.0}) {:.0}x{:.0}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Parses `x,y,width,height`, the format printed by interactive ROI pickers
impl FromStr for Roi {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            bail!("expected 4 comma-separated values, got {}", parts.len());
        }

        let mut values = [0.0f32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .with_context(|| format!("'{}' is not a number", part))?;
        }

        Ok(Roi::new(values[0], values[1], values[2], values[3]))
    }
}

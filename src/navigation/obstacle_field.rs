//! Obstacle field
//!
//! Reads the front and flank sectors of a LiDAR sweep and derives the two
//! avoidance tiers: a hard "something is right in front of us" signal and a
//! soft heading nudge, plus the per-side obstacle memory.

use ordered_float::OrderedFloat;

use crate::common::{AngleSector, ObstacleMemory, RangeReading};
use crate::config::ObstacleConfig;

/// Avoidance signals for one scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleAssessment {
    /// A front reading is below the critical distance
    pub critical_front: bool,
    /// Signed nudge added to the heading error, zero when both flanks are clear
    pub heading_bias: f64,
    /// Closest valid front reading, `INFINITY` when the sector is empty
    pub front_min: f64,
    pub left_min: f64,
    pub right_min: f64,
}

impl ObstacleAssessment {
    pub fn clear() -> Self {
        Self {
            critical_front: false,
            heading_bias: 0.0,
            front_min: f64::INFINITY,
            left_min: f64::INFINITY,
            right_min: f64::INFINITY,
        }
    }

    /// +1.0 when the left flank is at least as open as the right (turn
    /// counter-clockwise), -1.0 otherwise
    pub fn escape_sign(&self) -> f64 {
        if self.left_min >= self.right_min {
            1.0
        } else {
            -1.0
        }
    }
}

pub struct ObstacleField {
    critical_distance: f64,
    non_critical_distance: f64,
    bias: f64,
    front: AngleSector,
    left: AngleSector,
    right: AngleSector,
}

impl ObstacleField {
    /// `bias` is the magnitude of the soft nudge, normally the turn gain.
    pub fn new(config: &ObstacleConfig, bias: f64) -> Self {
        ObstacleField {
            critical_distance: config.critical_distance,
            non_critical_distance: config.non_critical_distance,
            bias,
            front: config.front,
            left: config.left,
            right: config.right,
        }
    }

    /// Assess a scan and overwrite `memory` with this scan's flank state.
    pub fn assess(&self, scan: &RangeReading, memory: &mut ObstacleMemory) -> ObstacleAssessment {
        let front_min = sector_min(scan, self.front);
        let left_min = sector_min(scan, self.left);
        let right_min = sector_min(scan, self.right);

        memory.left = left_min < self.critical_distance;
        memory.right = right_min < self.critical_distance;

        let heading_bias = if left_min < self.non_critical_distance {
            -self.bias
        } else if right_min < self.non_critical_distance {
            self.bias
        } else {
            0.0
        };

        ObstacleAssessment {
            critical_front: front_min < self.critical_distance,
            heading_bias,
            front_min,
            left_min,
            right_min,
        }
    }
}

/// Closest valid reading in `sector`; an empty sector reads as `INFINITY`.
pub fn sector_min(scan: &RangeReading, sector: AngleSector) -> f64 {
    scan.in_sector(sector)
        .map(OrderedFloat)
        .min()
        .map_or(f64::INFINITY, |d| d.into_inner())
}

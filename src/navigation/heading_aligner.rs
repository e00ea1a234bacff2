//! In-place heading alignment run once before the rover starts translating

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::common::{NavError, NavResult, Point2D, Pose2D, Rover, WheelCommand};
use crate::config::AlignmentConfig;
use crate::utils::heading_delta;

/// How the alignment phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentOutcome {
    /// Facing the goal after this many rotation commands
    Aligned { iterations: usize },
    /// The running flag was cleared between ticks
    Cancelled,
}

pub struct HeadingAligner {
    threshold: f64,
    tick: Duration,
    max_iterations: usize,
    turn_gain: f64,
}

impl HeadingAligner {
    pub fn new(config: &AlignmentConfig, turn_gain: f64) -> NavResult<Self> {
        Ok(HeadingAligner {
            threshold: config.heading_threshold,
            tick: config.tick()?,
            max_iterations: config.max_iterations,
            turn_gain,
        })
    }

    /// Signed rotation needed for `pose` to face `goal` (radians)
    pub fn error_to(&self, pose: &Pose2D, goal: Point2D) -> f64 {
        let target_heading = (goal.y - pose.y).atan2(goal.x - pose.x);
        heading_delta(target_heading, pose.heading_rad())
    }

    /// Rotate in place until facing `goal` within the threshold.
    ///
    /// Sends the zero command once aligned. Gives up with
    /// [`NavError::AlignmentDiverged`] after `max_iterations` rotation commands.
    pub fn align<R: Rover>(
        &self,
        rover: &mut R,
        goal: Point2D,
        running: &AtomicBool,
    ) -> NavResult<AlignmentOutcome> {
        for iteration in 0..self.max_iterations {
            if !running.load(Ordering::SeqCst) {
                return Ok(AlignmentOutcome::Cancelled);
            }

            let delta = self.error_to(&rover.pose(), goal);
            if delta.abs() <= self.threshold {
                rover.send_command(WheelCommand::zero());
                info!("Aligned to goal after {} iterations (error {:.3} rad)", iteration, delta);
                return Ok(AlignmentOutcome::Aligned { iterations: iteration });
            }

            debug!("align: delta = {:.3} rad", delta);
            rover.send_command(WheelCommand::rotate(delta * self.turn_gain));
            rover.wait(self.tick);
        }

        let residual = self.error_to(&rover.pose(), goal);
        if residual.abs() <= self.threshold {
            rover.send_command(WheelCommand::zero());
            return Ok(AlignmentOutcome::Aligned { iterations: self.max_iterations });
        }

        warn!(
            "Heading alignment gave up after {} iterations, residual {:.3} rad",
            self.max_iterations, residual
        );
        Err(NavError::AlignmentDiverged {
            iterations: self.max_iterations,
            residual,
        })
    }
}
